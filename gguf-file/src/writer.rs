use crate::{GGmlType, GGufFileHeader, GGufMetaDataValueType};
use std::io::{BufWriter, Result, Write};

/// Little-endian serializer for the GGUF on-disk structures.
pub(crate) struct GGufWriter<T: Write> {
    writer: BufWriter<T>,
    written: usize,
}

impl<T: Write> GGufWriter<T> {
    #[inline]
    pub fn new(writer: T) -> Self {
        Self {
            writer: BufWriter::new(writer),
            written: 0,
        }
    }

    #[inline]
    pub const fn written_bytes(&self) -> usize {
        self.written
    }

    pub fn write_bytes(&mut self, val: &[u8]) -> Result<()> {
        self.written += val.len();
        self.writer.write_all(val)
    }

    #[inline]
    pub fn write_u32(&mut self, val: u32) -> Result<()> {
        self.write_bytes(&val.to_le_bytes())
    }

    #[inline]
    pub fn write_u64(&mut self, val: u64) -> Result<()> {
        self.write_bytes(&val.to_le_bytes())
    }

    pub fn write_str(&mut self, val: &str) -> Result<()> {
        self.write_u64(val.len() as u64)?;
        self.write_bytes(val.as_bytes())
    }

    pub fn write_header(&mut self, header: &GGufFileHeader) -> Result<()> {
        self.write_bytes(&header.to_le_bytes())
    }

    pub fn write_meta_kv(
        &mut self,
        key: &str,
        ty: GGufMetaDataValueType,
        val: &[u8],
    ) -> Result<()> {
        self.write_str(key)?;
        self.write_u32(ty as u32)?;
        self.write_bytes(val)
    }

    pub fn write_tensor_info(
        &mut self,
        name: &str,
        shape: &[u64],
        ty: GGmlType,
        offset: u64,
    ) -> Result<()> {
        self.write_str(name)?;
        self.write_u32(shape.len() as u32)?;
        for &dim in shape {
            self.write_u64(dim)?;
        }
        self.write_u32(ty as u32)?;
        self.write_u64(offset)
    }

    pub fn write_padding(&mut self, len: usize) -> Result<()> {
        for _ in 0..len {
            self.write_bytes(&[0])?;
        }
        Ok(())
    }

    #[inline]
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()
    }
}

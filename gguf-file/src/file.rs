use crate::{
    pad, writer::GGufWriter, GGmlType, GGuf, GGufError, GGufFileHeader, GGufMetaDataValueType,
    GGufReader, GGufStream, DEFAULT_ALIGNMENT, GENERAL_ALIGNMENT,
};
use log::debug;
use memmap2::MmapMut;
use std::{
    fs::{File, OpenOptions},
    io::{Seek, SeekFrom},
    path::Path,
};

/// A GGUF file mapped read-write shared, with append-only growth.
///
/// Readers borrow the current mapping through [`stream`](Self::stream) or
/// [`view`](Self::view); every append takes `&mut self` and re-maps, so
/// the borrow checker enforces that no pointer into the old mapping
/// survives a write.
pub struct GGufFile {
    map: MmapMut,
    file: File,
    alignment: usize,
}

impl GGufFile {
    /// Maps an existing file and validates its header. The metadata
    /// section is scanned once so the effective alignment is known before
    /// any payload is appended.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GGufError> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Self::with_file(file)
    }

    /// Creates a file holding nothing but a version-3 header with both
    /// counts zero, then maps it. Refuses to clobber an existing file
    /// unless `overwrite` is set.
    pub fn create(path: impl AsRef<Path>, overwrite: bool) -> Result<Self, GGufError> {
        let file = if overwrite {
            OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?
        } else {
            OpenOptions::new()
                .read(true)
                .write(true)
                .create_new(true)
                .open(path)?
        };
        let mut writer = GGufWriter::new(&file);
        writer.write_header(&GGufFileHeader::new(3, 0, 0))?;
        writer.flush()?;
        drop(writer);
        Self::with_file(file)
    }

    fn with_file(file: File) -> Result<Self, GGufError> {
        if (file.metadata()?.len() as usize) < GGufFileHeader::NBYTES {
            return Err(GGufError::Truncated);
        }
        let map = unsafe { MmapMut::map_mut(&file) }?;
        let mut ans = Self {
            map,
            file,
            alignment: DEFAULT_ALIGNMENT,
        };
        let mut stream = GGufStream::new(&ans.map)?;
        stream.skip_meta_kvs()?;
        ans.alignment = stream.alignment();
        Ok(ans)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.map
    }

    pub fn header(&self) -> GGufFileHeader {
        GGufReader::new(&self.map).read_header().unwrap()
    }

    #[inline]
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    #[inline]
    pub fn stream(&self) -> Result<GGufStream<'_>, GGufError> {
        GGufStream::new(&self.map)
    }

    #[inline]
    pub fn view(&self) -> Result<GGuf<'_>, GGufError> {
        GGuf::new(&self.map)
    }

    /// Appends one key-value entry and bumps the header count.
    ///
    /// Fails with [`GGufError::Order`] once any tensor info has been
    /// written; the caller provides the raw value bytes, already laid out
    /// for `ty`.
    pub fn append_meta_kv(
        &mut self,
        key: &str,
        ty: GGufMetaDataValueType,
        value: &[u8],
    ) -> Result<(), GGufError> {
        let header = self.header();
        if header.tensor_count != 0 {
            return Err(GGufError::Order);
        }
        self.append_with(|w| w.write_meta_kv(key, ty, value))?;
        self.set_metadata_kv_count(header.metadata_kv_count + 1);
        if key == GENERAL_ALIGNMENT && ty == GGufMetaDataValueType::U32 {
            if let &[a, b, c, d] = value {
                self.alignment = u32::from_le_bytes([a, b, c, d]) as usize;
                debug!("alignment set to {}", self.alignment);
            }
        }
        Ok(())
    }

    /// Appends one tensor descriptor and bumps the header count. The
    /// offset is relative to the data section; computing monotonic,
    /// aligned offsets is the caller's responsibility.
    pub fn append_tensor_info(
        &mut self,
        name: &str,
        shape: &[u64],
        ty: GGmlType,
        offset: u64,
    ) -> Result<(), GGufError> {
        let header = self.header();
        self.append_with(|w| w.write_tensor_info(name, shape, ty, offset))?;
        self.set_tensor_count(header.tensor_count + 1);
        Ok(())
    }

    /// Appends one tensor payload, zero-padding the file up to the next
    /// alignment multiple first.
    pub fn append_tensor_data(&mut self, data: &[u8]) -> Result<(), GGufError> {
        let padding = pad(self.map.len(), self.alignment);
        self.append_with(|w| {
            w.write_padding(padding)?;
            w.write_bytes(data)
        })
    }

    fn append_with(
        &mut self,
        f: impl FnOnce(&mut GGufWriter<&File>) -> std::io::Result<()>,
    ) -> Result<(), GGufError> {
        self.file.seek(SeekFrom::End(0))?;
        let mut writer = GGufWriter::new(&self.file);
        f(&mut writer)?;
        writer.flush()?;
        drop(writer);
        self.remap()
    }

    /// Every mutation that grows the file is followed by a re-map so the
    /// view covers the new length.
    fn remap(&mut self) -> Result<(), GGufError> {
        self.map = unsafe { MmapMut::map_mut(&self.file) }?;
        Ok(())
    }

    fn set_tensor_count(&mut self, count: u64) {
        self.map[8..16].copy_from_slice(&count.to_le_bytes());
    }

    fn set_metadata_kv_count(&mut self, count: u64) {
        self.map[16..24].copy_from_slice(&count.to_le_bytes());
    }
}

impl Drop for GGufFile {
    fn drop(&mut self) {
        // The mapping is written through; push it out before the
        // descriptor closes.
        let _ = self.map.flush();
    }
}

use crate::{
    pad, GGmlType, GGufError, GGufFileHeader, GGufMetaDataValueType, GGufMetaKV, GGufReader,
    GGufTensorInfo, DEFAULT_ALIGNMENT, GENERAL_ALIGNMENT, MAX_DIMS,
};
use log::debug;

/// Streaming reader over a mapped GGUF file.
///
/// The key-value section must be consumed before the tensor section; the
/// data-section base is computed exactly once, on the first successful
/// [`next_tensor`](Self::next_tensor) call, so every descriptor can be
/// returned with an absolute offset and its payload bytes.
pub struct GGufStream<'a> {
    data: &'a [u8],
    reader: GGufReader<'a>,
    header: GGufFileHeader,
    left_kv: u64,
    left_tensors: u64,
    alignment: usize,
    data_offset: usize,
}

impl<'a> GGufStream<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self, GGufError> {
        let mut reader = GGufReader::new(data);
        let header = reader.read_header().map_err(|_| GGufError::Truncated)?;
        if !header.is_magic_correct() {
            return Err(GGufError::MagicMismatch);
        }
        if header.version != 3 {
            return Err(GGufError::VersionNotSupport(header.version));
        }
        Ok(Self {
            data,
            reader,
            left_kv: header.metadata_kv_count,
            left_tensors: header.tensor_count,
            header,
            alignment: DEFAULT_ALIGNMENT,
            data_offset: 0,
        })
    }

    #[inline]
    pub const fn header(&self) -> &GGufFileHeader {
        &self.header
    }

    #[inline]
    pub const fn alignment(&self) -> usize {
        self.alignment
    }

    /// Absolute offset of the data section; 0 until the first tensor has
    /// been read.
    #[inline]
    pub const fn data_offset(&self) -> usize {
        self.data_offset
    }

    #[inline]
    pub fn cursor(&self) -> usize {
        self.reader.cursor()
    }

    /// Restarts iteration just past the header, re-seeding both section
    /// counters. The alignment and data offset learned so far are kept.
    pub fn rewind(&mut self) {
        let mut reader = GGufReader::new(self.data);
        self.header = reader.read_header().unwrap();
        self.reader = reader;
        self.left_kv = self.header.metadata_kv_count;
        self.left_tensors = self.header.tensor_count;
    }

    /// Consumes the next key-value entry, or returns `None` when the
    /// section is exhausted. A `general.alignment` entry of type `U32`
    /// updates the alignment used for all subsequent offset computations.
    pub fn next_meta_kv(&mut self) -> Result<Option<GGufMetaKV<'a>>, GGufError> {
        if self.left_kv == 0 {
            return Ok(None);
        }
        let kv = self.reader.read_meta_kv()?;
        self.left_kv -= 1;
        if kv.key() == GENERAL_ALIGNMENT && kv.ty() == GGufMetaDataValueType::U32 {
            self.alignment = kv.value_reader().read_u32()? as usize;
            debug!("alignment set to {}", self.alignment);
        }
        Ok(Some(kv))
    }

    /// Consumes all remaining key-value entries.
    pub fn skip_meta_kvs(&mut self) -> Result<(), GGufError> {
        while self.next_meta_kv()?.is_some() {}
        Ok(())
    }

    /// Consumes the next tensor descriptor. Returns `None` when the
    /// section is exhausted or while key-value entries remain. After the
    /// last descriptor the cursor also crosses the alignment padding, so
    /// it rests exactly on the data section.
    pub fn next_tensor(&mut self) -> Result<Option<GGufTensorInfo<'a>>, GGufError> {
        if self.left_tensors == 0 || self.left_kv != 0 {
            return Ok(None);
        }
        if self.data_offset == 0 {
            self.set_data_offset()?;
        }

        let name = self.reader.read_str()?;
        let ndim = self.reader.read_u32()?;
        if ndim as usize > MAX_DIMS {
            return Err(GGufError::TooManyDims(ndim));
        }
        let mut shape = [1u64; MAX_DIMS];
        for dim in &mut shape[..ndim as usize] {
            *dim = self.reader.read_u64()?;
        }
        let tag = self.reader.read_u32()?;
        let ty = GGmlType::try_from(tag).map_err(GGufError::InvalidTensorType)?;
        if ty.features().items_per_block == 0 {
            return Err(GGufError::InvalidTensorType(tag));
        }
        let relative = self.reader.read_u64()?;

        self.left_tensors -= 1;
        if self.left_tensors == 0 {
            let padding = pad(self.reader.cursor(), self.alignment);
            self.reader.skip(padding).map_err(|_| GGufError::Truncated)?;
        }

        let mut tensor = GGufTensorInfo {
            name,
            ndim: ndim as usize,
            shape,
            ty,
            offset: self.data_offset as u64 + relative,
            data: &[],
        };
        let offset = tensor.offset as usize;
        let end = offset
            .checked_add(tensor.nbytes() as usize)
            .ok_or(GGufError::Truncated)?;
        tensor.data = self.data.get(offset..end).ok_or(GGufError::Truncated)?;
        Ok(Some(tensor))
    }

    /// Scans forward over all tensor descriptors without moving the main
    /// cursor, then records the padded end as the data-section base.
    fn set_data_offset(&mut self) -> Result<(), GGufError> {
        let mut scan = self.reader.clone();
        for _ in 0..self.left_tensors {
            scan.read_str()?;
            let ndim = scan.read_u32()? as usize;
            scan.skip(ndim * size_of::<u64>() + size_of::<u32>() + size_of::<u64>())?;
        }
        let end = scan.cursor();
        self.data_offset = end + pad(end, self.alignment);
        debug!("data section starts at {}", self.data_offset);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::GGufWriter;

    fn minimal(tensor_count: u64, metadata_kv_count: u64) -> Vec<u8> {
        GGufFileHeader::new(3, tensor_count, metadata_kv_count)
            .to_le_bytes()
            .to_vec()
    }

    /// Header, one `general.alignment` entry, one 2x2 F32 tensor.
    fn single_f32_tensor(alignment: u32) -> Vec<u8> {
        let mut bytes = vec![];
        let mut writer = GGufWriter::new(&mut bytes);
        writer
            .write_header(&GGufFileHeader::new(3, 1, 1))
            .unwrap();
        writer
            .write_meta_kv(GENERAL_ALIGNMENT, GGufMetaDataValueType::U32, &alignment.to_le_bytes())
            .unwrap();
        writer
            .write_tensor_info("t", &[2, 2], GGmlType::F32, 0)
            .unwrap();
        let padding = pad(writer.written_bytes(), alignment as usize);
        writer.write_padding(padding).unwrap();
        for x in [1.0f32, 2.0, 3.0, 4.0] {
            writer.write_bytes(&x.to_le_bytes()).unwrap();
        }
        writer.flush().unwrap();
        drop(writer);
        bytes
    }

    #[test]
    fn minimal_file_has_nothing_to_stream() {
        let bytes = minimal(0, 0);
        let mut stream = GGufStream::new(&bytes).unwrap();
        assert!(stream.next_meta_kv().unwrap().is_none());
        assert!(stream.next_tensor().unwrap().is_none());
        assert_eq!(stream.cursor(), GGufFileHeader::NBYTES);
    }

    #[test]
    fn header_is_validated_first() {
        assert!(matches!(
            GGufStream::new(&[0u8; 12]),
            Err(GGufError::Truncated)
        ));

        let mut bytes = minimal(0, 0);
        bytes[0] = b'X';
        assert!(matches!(
            GGufStream::new(&bytes),
            Err(GGufError::MagicMismatch)
        ));

        let bytes = GGufFileHeader::new(2, 0, 0).to_le_bytes();
        assert!(matches!(
            GGufStream::new(&bytes),
            Err(GGufError::VersionNotSupport(2))
        ));
    }

    #[test]
    fn single_tensor_is_resolved_to_absolute_offset() {
        let bytes = single_f32_tensor(32);
        let mut stream = GGufStream::new(&bytes).unwrap();

        let kv = stream.next_meta_kv().unwrap().unwrap();
        assert_eq!(kv.key(), GENERAL_ALIGNMENT);
        assert!(stream.next_meta_kv().unwrap().is_none());

        let t = stream.next_tensor().unwrap().unwrap();
        assert_eq!(t.name(), "t");
        assert_eq!(t.shape(), [2, 2]);
        assert_eq!(t.nelements(), 4);
        assert_eq!(t.nbytes(), 16);
        assert_eq!(t.offset() % 32, 0);
        assert_eq!(t.offset() as usize, stream.data_offset());
        assert_eq!(t.data(), {
            let mut expected = vec![];
            for x in [1.0f32, 2.0, 3.0, 4.0] {
                expected.extend_from_slice(&x.to_le_bytes());
            }
            expected
        });

        // Both counters exhausted, cursor parked on the data section.
        assert!(stream.next_tensor().unwrap().is_none());
        assert_eq!(stream.cursor(), stream.data_offset());
    }

    #[test]
    fn alignment_override_shifts_the_data_section() {
        let at_32 = {
            let bytes = single_f32_tensor(32);
            let mut stream = GGufStream::new(&bytes).unwrap();
            stream.skip_meta_kvs().unwrap();
            stream.next_tensor().unwrap().unwrap().offset()
        };
        let at_64 = {
            let bytes = single_f32_tensor(64);
            let mut stream = GGufStream::new(&bytes).unwrap();
            stream.skip_meta_kvs().unwrap();
            stream.next_tensor().unwrap().unwrap().offset()
        };
        assert_eq!(at_64 % 64, 0);
        assert!(at_64 > at_32);
    }

    #[test]
    fn tensors_are_refused_while_kvs_remain() {
        let bytes = single_f32_tensor(32);
        let mut stream = GGufStream::new(&bytes).unwrap();
        assert!(stream.next_tensor().unwrap().is_none());
        stream.skip_meta_kvs().unwrap();
        assert!(stream.next_tensor().unwrap().unwrap().name() == "t");
    }

    #[test]
    fn rewind_restarts_iteration() {
        let bytes = single_f32_tensor(32);
        let mut stream = GGufStream::new(&bytes).unwrap();
        stream.skip_meta_kvs().unwrap();
        assert!(stream.next_tensor().unwrap().is_some());

        stream.rewind();
        let kv = stream.next_meta_kv().unwrap().unwrap();
        assert_eq!(kv.key(), GENERAL_ALIGNMENT);
    }

    #[test]
    fn truncated_payload_is_terminal() {
        let mut bytes = single_f32_tensor(32);
        bytes.truncate(bytes.len() - 8);
        let mut stream = GGufStream::new(&bytes).unwrap();
        stream.skip_meta_kvs().unwrap();
        assert!(matches!(stream.next_tensor(), Err(GGufError::Truncated)));
    }
}

use crate::{GGufError, GGufFileHeader, GGufMetaKV, GGufStream, GGufTensorInfo};
use indexmap::IndexMap;

/// A fully scanned GGUF file: every key-value entry and tensor descriptor
/// collected into maps that keep file order and allow lookup by name.
pub struct GGuf<'a> {
    pub header: GGufFileHeader,
    pub alignment: usize,
    pub data_offset: usize,
    pub meta_kvs: IndexMap<&'a str, GGufMetaKV<'a>>,
    pub tensors: IndexMap<&'a str, GGufTensorInfo<'a>>,
}

impl<'a> GGuf<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self, GGufError> {
        let mut stream = GGufStream::new(data)?;
        let header = *stream.header();

        let mut meta_kvs = IndexMap::with_capacity(header.metadata_kv_count as _);
        while let Some(kv) = stream.next_meta_kv()? {
            let key = kv.key();
            if meta_kvs.insert(key, kv).is_some() {
                return Err(GGufError::DuplicateMetaKey(key.into()));
            }
        }

        let mut tensors = IndexMap::with_capacity(header.tensor_count as _);
        while let Some(tensor) = stream.next_tensor()? {
            let name = tensor.name();
            if tensors.insert(name, tensor).is_some() {
                return Err(GGufError::DuplicateTensorName(name.into()));
            }
        }

        Ok(Self {
            header,
            alignment: stream.alignment(),
            data_offset: stream.data_offset(),
            meta_kvs,
            tensors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{writer::GGufWriter, GGmlType, GGufMetaDataValueType};

    #[test]
    fn duplicate_keys_are_rejected() {
        let mut bytes = vec![];
        let mut writer = GGufWriter::new(&mut bytes);
        writer.write_header(&GGufFileHeader::new(3, 0, 2)).unwrap();
        for _ in 0..2 {
            writer
                .write_meta_kv("twice", GGufMetaDataValueType::U8, &[1])
                .unwrap();
        }
        writer.flush().unwrap();
        drop(writer);

        assert!(matches!(
            GGuf::new(&bytes),
            Err(GGufError::DuplicateMetaKey(k)) if k == "twice"
        ));
    }

    #[test]
    fn tensors_keep_file_order_and_stay_monotonic() {
        let shapes: [&[u64]; 3] = [&[8], &[3], &[16]];
        let mut bytes = vec![];
        let mut writer = GGufWriter::new(&mut bytes);
        writer.write_header(&GGufFileHeader::new(3, 3, 0)).unwrap();
        let mut offset = 0;
        let mut offsets = vec![];
        for (i, shape) in shapes.iter().enumerate() {
            offsets.push(offset);
            writer
                .write_tensor_info(&format!("t{i}"), shape, GGmlType::F32, offset)
                .unwrap();
            let nbytes = shape.iter().product::<u64>() * 4;
            offset += nbytes + crate::pad((offset + nbytes) as usize, 32) as u64;
        }
        let padding = crate::pad(writer.written_bytes(), 32);
        writer.write_padding(padding).unwrap();
        let total = offsets.last().unwrap() + 16 * 4;
        writer.write_padding(total as usize).unwrap();
        writer.flush().unwrap();
        drop(writer);

        let gguf = GGuf::new(&bytes).unwrap();
        assert_eq!(
            gguf.tensors.keys().copied().collect::<Vec<_>>(),
            ["t0", "t1", "t2"]
        );
        let abs = gguf
            .tensors
            .values()
            .map(|t| t.offset())
            .collect::<Vec<_>>();
        for (i, pair) in abs.windows(2).enumerate() {
            assert!(pair[1] >= pair[0] + gguf.tensors[i].nbytes());
        }
        for t in gguf.tensors.values() {
            assert_eq!(t.offset() as usize % gguf.alignment, 0);
        }
    }
}

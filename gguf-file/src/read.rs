use crate::types::GGufMetaDataValueType;
use std::{
    error::Error,
    fmt,
    str::{from_utf8, Utf8Error},
};

/// Bounds-checked little-endian cursor over a borrowed byte buffer.
///
/// Every read is checked against the end of the buffer; corrupted input
/// surfaces as [`GGufReadError::Eos`] instead of stepping out of bounds.
#[derive(Clone)]
pub struct GGufReader<'a> {
    data: &'a [u8],
    cursor: usize,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum GGufReadError {
    Eos,
    Utf8(Utf8Error),
    Bool(u8),
    ValueType(u32),
    ArrayDepth,
}

impl fmt::Display for GGufReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eos => f.write_str("unexpected end of data"),
            Self::Utf8(e) => write!(f, "string is not utf-8: {e}"),
            Self::Bool(v) => write!(f, "invalid boolean value {v}"),
            Self::ValueType(tag) => write!(f, "invalid value type {tag}"),
            Self::ArrayDepth => f.write_str("array nesting too deep"),
        }
    }
}

impl Error for GGufReadError {}

macro_rules! read_le {
    ($( $fn:ident: $ty:ty; )+) => {
        $(
            pub fn $fn(&mut self) -> Result<$ty, GGufReadError> {
                let bytes = self.take(size_of::<$ty>())?;
                Ok(<$ty>::from_le_bytes(bytes.try_into().unwrap()))
            }
        )+
    };
}

impl<'a> GGufReader<'a> {
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, cursor: 0 }
    }

    #[inline]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.cursor..]
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8], GGufReadError> {
        match self.data[self.cursor..].split_at_checked(len) {
            Some((head, _)) => {
                self.cursor += len;
                Ok(head)
            }
            None => Err(GGufReadError::Eos),
        }
    }

    /// The bytes consumed since `start`, a cursor position saved earlier.
    pub(crate) fn taken_since(&self, start: usize) -> &'a [u8] {
        &self.data[start..self.cursor]
    }

    pub fn skip(&mut self, len: usize) -> Result<&mut Self, GGufReadError> {
        self.take(len)?;
        Ok(self)
    }

    read_le! {
        read_u8 : u8 ;
        read_i8 : i8 ;
        read_u16: u16;
        read_i16: i16;
        read_u32: u32;
        read_i32: i32;
        read_u64: u64;
        read_i64: i64;
        read_f32: f32;
        read_f64: f64;
    }

    pub fn read_bool(&mut self) -> Result<bool, GGufReadError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            e => Err(GGufReadError::Bool(e)),
        }
    }

    pub fn read_str(&mut self) -> Result<&'a str, GGufReadError> {
        let len = self.read_u64()? as usize;
        from_utf8(self.take(len)?).map_err(GGufReadError::Utf8)
    }

    pub fn read_value_type(&mut self) -> Result<GGufMetaDataValueType, GGufReadError> {
        let tag = self.read_u32()?;
        GGufMetaDataValueType::try_from(tag).map_err(GGufReadError::ValueType)
    }

    pub fn read_arr_header(&mut self) -> Result<(GGufMetaDataValueType, u64), GGufReadError> {
        Ok((self.read_value_type()?, self.read_u64()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_are_little_endian() {
        let mut reader = GGufReader::new(&[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(reader.read_u32(), Ok(0x04030201));
        assert_eq!(reader.cursor(), 4);
        assert_eq!(reader.read_u8(), Err(GGufReadError::Eos));
    }

    #[test]
    fn read_str_checks_length_and_utf8() {
        let mut bytes = 5u64.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"hello");
        assert_eq!(GGufReader::new(&bytes).read_str(), Ok("hello"));

        let bytes = 100u64.to_le_bytes();
        let mut reader = GGufReader::new(&bytes);
        assert_eq!(reader.read_str(), Err(GGufReadError::Eos));

        let mut bytes = 2u64.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        assert!(matches!(
            GGufReader::new(&bytes).read_str(),
            Err(GGufReadError::Utf8(_))
        ));
    }

    #[test]
    fn read_bool_rejects_junk() {
        assert_eq!(GGufReader::new(&[1]).read_bool(), Ok(true));
        assert_eq!(GGufReader::new(&[0]).read_bool(), Ok(false));
        assert_eq!(GGufReader::new(&[7]).read_bool(), Err(GGufReadError::Bool(7)));
    }
}

use crate::{GGufMetaDataValueType, GGufReadError, GGufReader};
use std::fmt;

/// Array nesting bound; deeper files are treated as corrupt.
pub const MAX_ARRAY_DEPTH: usize = 64;

/// One metadata entry, borrowed from the mapped file.
///
/// The raw value bytes are carried along so the entry can be traversed
/// again without touching the section cursor.
#[derive(Clone, Copy, Debug)]
pub struct GGufMetaKV<'a> {
    key: &'a str,
    ty: GGufMetaDataValueType,
    value: &'a [u8],
}

/// A single primitive inside a metadata value.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum GGufValue<'a> {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    F32(f32),
    Bool(bool),
    String(&'a str),
    U64(u64),
    I64(i64),
    F64(f64),
}

/// Events produced while walking a metadata value in file order.
///
/// `ArrayStart` fires before the first element of an array and `ArrayEnd`
/// after the last; both carry the element count.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum GGufValueEvent<'a> {
    ArrayStart(u64),
    Scalar(GGufValue<'a>),
    ArrayEnd(u64),
}

impl<'a> GGufReader<'a> {
    /// Consumes one whole key-value entry, leaving the cursor on the next
    /// entry boundary.
    pub fn read_meta_kv(&mut self) -> Result<GGufMetaKV<'a>, GGufReadError> {
        let key = self.read_str()?;
        let ty = self.read_value_type()?;
        let start = self.cursor();
        skip_value(self, ty, 1, 0)?;
        Ok(GGufMetaKV {
            key,
            ty,
            value: self.taken_since(start),
        })
    }
}

fn skip_value(
    reader: &mut GGufReader,
    ty: GGufMetaDataValueType,
    len: u64,
    depth: usize,
) -> Result<(), GGufReadError> {
    use GGufMetaDataValueType as Ty;
    match ty {
        Ty::Bool => {
            for _ in 0..len {
                reader.read_bool()?;
            }
            Ok(())
        }
        Ty::String => {
            for _ in 0..len {
                reader.read_str()?;
            }
            Ok(())
        }
        Ty::Array => {
            if depth >= MAX_ARRAY_DEPTH {
                return Err(GGufReadError::ArrayDepth);
            }
            let (ty, len) = reader.read_arr_header()?;
            skip_value(reader, ty, len, depth + 1)
        }
        _ => {
            let size = ty.fixed_size().unwrap();
            for _ in 0..len {
                reader.skip(size)?;
            }
            Ok(())
        }
    }
}

fn visit_value<'a>(
    reader: &mut GGufReader<'a>,
    ty: GGufMetaDataValueType,
    in_array: u64,
    array_len: u64,
    depth: usize,
    f: &mut impl FnMut(GGufValueEvent<'a>, u64, u64),
) -> Result<(), GGufReadError> {
    use GGufMetaDataValueType as Ty;
    if ty == Ty::Array {
        if depth >= MAX_ARRAY_DEPTH {
            return Err(GGufReadError::ArrayDepth);
        }
        let (ety, len) = reader.read_arr_header()?;
        f(GGufValueEvent::ArrayStart(len), in_array, len);
        for j in 0..len {
            visit_value(reader, ety, j + 1, len, depth + 1, f)?;
        }
        f(GGufValueEvent::ArrayEnd(len), in_array, len);
        return Ok(());
    }
    let value = match ty {
        Ty::U8 => GGufValue::U8(reader.read_u8()?),
        Ty::I8 => GGufValue::I8(reader.read_i8()?),
        Ty::U16 => GGufValue::U16(reader.read_u16()?),
        Ty::I16 => GGufValue::I16(reader.read_i16()?),
        Ty::U32 => GGufValue::U32(reader.read_u32()?),
        Ty::I32 => GGufValue::I32(reader.read_i32()?),
        Ty::F32 => GGufValue::F32(reader.read_f32()?),
        Ty::Bool => GGufValue::Bool(reader.read_bool()?),
        Ty::String => GGufValue::String(reader.read_str()?),
        Ty::U64 => GGufValue::U64(reader.read_u64()?),
        Ty::I64 => GGufValue::I64(reader.read_i64()?),
        Ty::F64 => GGufValue::F64(reader.read_f64()?),
        Ty::Array => unreachable!(),
    };
    f(GGufValueEvent::Scalar(value), in_array, array_len);
    Ok(())
}

impl<'a> GGufMetaKV<'a> {
    #[inline]
    pub fn key(&self) -> &'a str {
        self.key
    }

    #[inline]
    pub fn ty(&self) -> GGufMetaDataValueType {
        self.ty
    }

    #[inline]
    pub fn value_bytes(&self) -> &'a [u8] {
        self.value
    }

    #[inline]
    pub fn value_reader(&self) -> GGufReader<'a> {
        GGufReader::new(self.value)
    }

    /// Walks the value, calling `f` for every event with the 1-based index
    /// of the element inside its enclosing array (0 outside arrays) and the
    /// enclosing array's length.
    pub fn visit(&self, mut f: impl FnMut(GGufValueEvent<'a>, u64, u64)) -> Result<(), GGufReadError> {
        visit_value(&mut self.value_reader(), self.ty, 0, 0, 0, &mut f)
    }
}

impl fmt::Display for GGufValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::U8(v) => write!(f, "{v}"),
            Self::I8(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
        }
    }
}

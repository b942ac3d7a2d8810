use std::fmt;

/// Tag of a metadata value as stored on disk.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u32)]
pub enum GGufMetaDataValueType {
    /// The value is a 8-bit unsigned integer.
    U8 = 0,
    /// The value is a 8-bit signed integer.
    I8 = 1,
    /// The value is a 16-bit unsigned little-endian integer.
    U16 = 2,
    /// The value is a 16-bit signed little-endian integer.
    I16 = 3,
    /// The value is a 32-bit unsigned little-endian integer.
    U32 = 4,
    /// The value is a 32-bit signed little-endian integer.
    I32 = 5,
    /// The value is a 32-bit IEEE754 floating point number.
    F32 = 6,
    /// The value is a boolean.
    ///
    /// 1-byte value where 0 is false and 1 is true.
    /// Anything else is invalid, and should be treated as either the model being invalid or the reader being buggy.
    Bool = 7,
    /// The value is a UTF-8 non-null-terminated string, with length prepended.
    String = 8,
    /// The value is an array of other values, with the length and type prepended.
    ///
    /// Arrays can be nested, and the length of the array is the number of elements in the array, not the number of bytes.
    Array = 9,
    /// The value is a 64-bit unsigned little-endian integer.
    U64 = 10,
    /// The value is a 64-bit signed little-endian integer.
    I64 = 11,
    /// The value is a 64-bit IEEE754 floating point number.
    F64 = 12,
}

impl TryFrom<u32> for GGufMetaDataValueType {
    type Error = u32;

    fn try_from(tag: u32) -> Result<Self, u32> {
        use GGufMetaDataValueType::*;
        Ok(match tag {
            0 => U8,
            1 => I8,
            2 => U16,
            3 => I16,
            4 => U32,
            5 => I32,
            6 => F32,
            7 => Bool,
            8 => String,
            9 => Array,
            10 => U64,
            11 => I64,
            12 => F64,
            _ => return Err(tag),
        })
    }
}

impl GGufMetaDataValueType {
    pub const fn name(self) -> &'static str {
        use GGufMetaDataValueType::*;
        match self {
            U8 => "uint8",
            I8 => "int8",
            U16 => "uint16",
            I16 => "int16",
            U32 => "uint32",
            I32 => "int32",
            F32 => "float32",
            Bool => "bool",
            String => "string",
            Array => "array",
            U64 => "uint64",
            I64 => "int64",
            F64 => "float64",
        }
    }

    /// On-disk width of one value, or `None` for strings and arrays,
    /// whose width is only known by consuming them.
    pub const fn fixed_size(self) -> Option<usize> {
        use GGufMetaDataValueType::*;
        match self {
            U8 | I8 | Bool => Some(1),
            U16 | I16 => Some(2),
            U32 | I32 | F32 => Some(4),
            U64 | I64 | F64 => Some(8),
            String | Array => None,
        }
    }
}

/// Name for any value-type tag, including ones this codec does not know.
pub fn value_type_name(tag: u32) -> &'static str {
    match GGufMetaDataValueType::try_from(tag) {
        Ok(ty) => ty.name(),
        Err(_) => "unknown",
    }
}

/// Storage format of a tensor payload.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u32)]
pub enum GGmlType {
    F32 = 0,
    F16 = 1,
    Q4_0 = 2,
    Q4_1 = 3,
    #[deprecated = "support removed"]
    Q4_2 = 4,
    #[deprecated = "support removed"]
    Q4_3 = 5,
    Q5_0 = 6,
    Q5_1 = 7,
    Q8_0 = 8,
    Q8_1 = 9,
    Q2K = 10,
    Q3K = 11,
    Q4K = 12,
    Q5K = 13,
    Q6K = 14,
    Q8K = 15,
    IQ2XXS = 16,
    IQ2XS = 17,
    IQ3XXS = 18,
    IQ1S = 19,
    IQ4NL = 20,
    IQ3S = 21,
    IQ2S = 22,
    IQ4XS = 23,
    I8 = 24,
    I16 = 25,
    I32 = 26,
    I64 = 27,
    F64 = 28,
    IQ1M = 29,
    BF16 = 30,
}

/// Block geometry of a tensor type: how many weights pack into one block
/// and how many bytes the packed block occupies.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct GGmlTypeFeatures {
    pub name: &'static str,
    pub items_per_block: usize,
    pub bytes_per_block: usize,
}

impl TryFrom<u32> for GGmlType {
    type Error = u32;

    #[allow(deprecated)]
    fn try_from(tag: u32) -> Result<Self, u32> {
        use GGmlType::*;
        Ok(match tag {
            0 => F32,
            1 => F16,
            2 => Q4_0,
            3 => Q4_1,
            4 => Q4_2,
            5 => Q4_3,
            6 => Q5_0,
            7 => Q5_1,
            8 => Q8_0,
            9 => Q8_1,
            10 => Q2K,
            11 => Q3K,
            12 => Q4K,
            13 => Q5K,
            14 => Q6K,
            15 => Q8K,
            16 => IQ2XXS,
            17 => IQ2XS,
            18 => IQ3XXS,
            19 => IQ1S,
            20 => IQ4NL,
            21 => IQ3S,
            22 => IQ2S,
            23 => IQ4XS,
            24 => I8,
            25 => I16,
            26 => I32,
            27 => I64,
            28 => F64,
            29 => IQ1M,
            30 => BF16,
            _ => return Err(tag),
        })
    }
}

macro_rules! features {
    ($name:literal, $items:literal, $bytes:literal) => {
        GGmlTypeFeatures {
            name: $name,
            items_per_block: $items,
            bytes_per_block: $bytes,
        }
    };
}

impl GGmlType {
    /// Block geometry table.
    ///
    /// The deprecated slots report a zero geometry; tensors using them are
    /// rejected before any size computation.
    #[allow(deprecated)]
    pub const fn features(self) -> GGmlTypeFeatures {
        use GGmlType::*;
        match self {
            F32 => features!("f32", 1, 4),
            F16 => features!("f16", 1, 2),
            Q4_0 => features!("q4_0", 32, 18),
            Q4_1 => features!("q4_1", 32, 20),
            Q4_2 => features!("q4_2 deprecated", 0, 0),
            Q4_3 => features!("q4_3 deprecated", 0, 0),
            Q5_0 => features!("q5_0", 32, 22),
            Q5_1 => features!("q5_1", 32, 24),
            Q8_0 => features!("q8_0", 32, 34),
            Q8_1 => features!("q8_1", 32, 40),
            Q2K => features!("q2_k", 256, 84),
            Q3K => features!("q3_k", 256, 110),
            Q4K => features!("q4_k", 256, 144),
            Q5K => features!("q5_k", 256, 176),
            Q6K => features!("q6_k", 256, 210),
            Q8K => features!("q8_k", 256, 292),
            IQ2XXS => features!("iq2_xxs", 256, 66),
            IQ2XS => features!("iq2_xs", 256, 74),
            IQ3XXS => features!("iq3_xxs", 256, 98),
            IQ1S => features!("iq1_s", 256, 110),
            IQ4NL => features!("iq4_nl", 256, 50),
            IQ3S => features!("iq3_s", 256, 110),
            IQ2S => features!("iq2_s", 256, 82),
            IQ4XS => features!("iq4_xs", 256, 136),
            I8 => features!("i8", 1, 1),
            I16 => features!("i16", 1, 2),
            I32 => features!("i32", 1, 4),
            I64 => features!("i64", 1, 8),
            F64 => features!("f64", 1, 8),
            IQ1M => features!("iq1_m", 256, 56),
            BF16 => features!("bf16", 1, 2),
        }
    }

    pub const fn name(self) -> &'static str {
        self.features().name
    }
}

impl fmt::Display for GGmlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name for any tensor-type tag, including ones this codec does not know.
pub fn tensor_type_name(tag: u32) -> &'static str {
    match GGmlType::try_from(tag) {
        Ok(ty) => ty.name(),
        Err(_) => "unknown",
    }
}

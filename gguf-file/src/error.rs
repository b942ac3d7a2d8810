use crate::{read::GGufReadError, tensor_type_name};
use std::{error::Error, fmt, io};

/// Everything that can go wrong opening, scanning or extending a GGUF file.
#[derive(Debug)]
pub enum GGufError {
    Io(io::Error),
    MagicMismatch,
    VersionNotSupport(u32),
    Truncated,
    Order,
    TooManyDims(u32),
    InvalidTensorType(u32),
    DuplicateMetaKey(String),
    DuplicateTensorName(String),
    Reading(GGufReadError),
}

impl fmt::Display for GGufError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::MagicMismatch => f.write_str("magic mismatch"),
            Self::VersionNotSupport(v) => write!(f, "gguf version {v} not supported"),
            Self::Truncated => f.write_str("file truncated"),
            Self::Order => f.write_str("tensor info already written, metadata section is sealed"),
            Self::TooManyDims(n) => write!(f, "tensor has {n} dimensions, at most 4 supported"),
            Self::InvalidTensorType(t) => {
                write!(f, "invalid tensor type {t} ({})", tensor_type_name(*t))
            }
            Self::DuplicateMetaKey(key) => write!(f, "duplicate meta key: {key}"),
            Self::DuplicateTensorName(name) => write!(f, "duplicate tensor name: {name}"),
            Self::Reading(e) => write!(f, "reading error: {e}"),
        }
    }
}

impl Error for GGufError {}

impl From<io::Error> for GGufError {
    #[inline]
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<GGufReadError> for GGufError {
    #[inline]
    fn from(e: GGufReadError) -> Self {
        Self::Reading(e)
    }
}

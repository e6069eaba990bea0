//! Error taxonomy for schema construction, encoding and decoding.
use thiserror::Error;

use crate::path::Path;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Invalid schema definition: duplicate names, bad lengths, too many variants.
    #[error("invalid schema: {0}")]
    SchemaConstruction(String),

    /// The value (or raw decoded tree) disagrees with the schema.
    #[error("schema mismatch at {path}: expected {expected}, found {found}")]
    SchemaMismatch {
        path: Path,
        expected: String,
        found: String,
    },

    #[error("unknown enum variant `{variant}` at {path}")]
    UnknownEnumVariant { path: Path, variant: String },

    #[error("invalid enum discriminant {index} at {path}: only {count} variants declared")]
    InvalidEnumDiscriminant { path: Path, index: u8, count: usize },

    /// Does not fit the target width, or is not an exact integer.
    #[error("integer out of range at {path}: {value} is not a valid {target}")]
    IntegerOutOfRange {
        path: Path,
        value: String,
        target: String,
    },

    #[error("duplicate set element at {path}")]
    DuplicateSetElement { path: Path },

    /// Borsh forbids non-empty collections whose elements take no bytes: the
    /// count alone would decide how much memory a decoder allocates.
    #[error("collection of zero-sized elements at {path} must be empty, found {len} elements")]
    ZeroSizedElements { path: Path, len: usize },

    #[error("unexpected end of buffer at {path}: need {needed} bytes, have {available}")]
    UnexpectedEndOfBuffer {
        path: Path,
        needed: usize,
        available: usize,
    },

    #[error("invalid bool byte {byte:#04x} at {path}")]
    InvalidBool { path: Path, byte: u8 },

    #[error("invalid option tag {byte:#04x} at {path}")]
    InvalidOptionTag { path: Path, byte: u8 },

    #[error("invalid utf-8 string at {path}")]
    InvalidUtf8 { path: Path },

    #[error("{remaining} trailing bytes after {consumed} decoded bytes")]
    TrailingBytes { consumed: usize, remaining: usize },
}

impl Error {
    pub(crate) fn construction(msg: impl Into<String>) -> Self {
        Error::SchemaConstruction(msg.into())
    }

    pub(crate) fn mismatch(path: &Path, expected: impl ToString, found: impl ToString) -> Self {
        Error::SchemaMismatch {
            path: path.clone(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub(crate) fn out_of_range(path: &Path, value: impl ToString, target: impl ToString) -> Self {
        Error::IntegerOutOfRange {
            path: path.clone(),
            value: value.to_string(),
            target: target.to_string(),
        }
    }

    /// Breadcrumb of the failing node, when the error has one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Error::SchemaMismatch { path, .. }
            | Error::UnknownEnumVariant { path, .. }
            | Error::InvalidEnumDiscriminant { path, .. }
            | Error::IntegerOutOfRange { path, .. }
            | Error::DuplicateSetElement { path }
            | Error::ZeroSizedElements { path, .. }
            | Error::UnexpectedEndOfBuffer { path, .. }
            | Error::InvalidBool { path, .. }
            | Error::InvalidOptionTag { path, .. }
            | Error::InvalidUtf8 { path } => Some(path),
            Error::SchemaConstruction(_) | Error::TrailingBytes { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

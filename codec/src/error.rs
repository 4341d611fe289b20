//! Error types for codec operations.

use std::fmt;

use bitstream::BitError;
use schema::{AnnotationKey, SchemaError};
use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
///
/// Any error aborts the whole call; there is no partial result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A required input is missing or has the wrong root kind.
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// The shape has no defined wire encoding.
    #[error("unsupported shape {type_name}")]
    UnsupportedShape { type_name: String },

    /// An annotation was used where it is not allowed.
    #[error("annotation {key} not supported here: {reason}")]
    UnsupportedOption {
        key: AnnotationKey,
        reason: &'static str,
    },

    /// A back-reference names a field that is not in scope.
    #[error("annotation {key} references {name:?}, which is not in scope")]
    UnresolvedReference { key: AnnotationKey, name: String },

    /// A resolved size or width is negative or exceeds its target.
    #[error("annotation {key} resolved to {value}, outside 0..={max}")]
    InvalidSize {
        key: AnnotationKey,
        value: i128,
        max: u64,
    },

    /// A read needed more bits than remain.
    #[error("attempted to read {requested} bits but only {available} bits available")]
    EndOfData { requested: usize, available: usize },

    /// A value does not have the kind its shape requires.
    #[error("expected {expected} but got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// A fixed array value has the wrong number of elements.
    #[error("fixed array expects {expected} elements, got {found}")]
    ArrayLength { expected: usize, found: usize },

    /// A record value does not hold one value per declared field.
    #[error("record {record} declares {expected} fields, value has {found}")]
    FieldCount {
        record: String,
        expected: usize,
        found: usize,
    },

    /// A configured limit was exceeded.
    #[error("{kind} limit exceeded: {actual} > {limit}")]
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },

    /// A self-describing type failed to produce or consume its bits.
    #[error("self-describing type {type_id} failed: {message}")]
    Marshal { type_id: String, message: String },

    /// Decoded text bytes are not UTF-8.
    #[error("decoded text is not valid UTF-8")]
    InvalidText,

    /// Error raised by a registered extension.
    #[error("{0}")]
    Custom(String),

    /// Bit buffer error.
    #[error("bitstream error: {0}")]
    Bitstream(#[source] BitError),

    /// Schema construction or value conversion error.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
}

impl CodecError {
    /// Creates a [`CodecError::Custom`] error.
    pub fn custom(message: impl fmt::Display) -> Self {
        Self::Custom(message.to_string())
    }

    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub(crate) const fn mismatch(expected: &'static str, found: &'static str) -> Self {
        Self::TypeMismatch { expected, found }
    }
}

impl From<BitError> for CodecError {
    fn from(err: BitError) -> Self {
        match err {
            BitError::EndOfData {
                requested,
                available,
            } => Self::EndOfData {
                requested,
                available,
            },
            other => Self::Bitstream(other),
        }
    }
}

/// Specific limit that was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    Depth,
    Elements,
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Depth => "nesting depth",
            Self::Elements => "element count",
        };
        write!(f, "{name}")
    }
}

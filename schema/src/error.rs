//! Schema construction and value conversion errors.

use thiserror::Error;

use crate::annotations::AnnotationKey;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur when building a schema or converting values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Field name is empty or not an identifier.
    #[error("invalid field name {field:?}")]
    InvalidFieldName { field: String },

    /// Two fields of one record share a name.
    #[error("duplicate field {field:?} in record {record}")]
    DuplicateField { record: String, field: String },

    /// Annotation tag names a key that is not recognized.
    #[error("unknown annotation key {key:?}")]
    UnknownAnnotation { key: String },

    /// Annotation key given more than once in one tag.
    #[error("annotation {key} given more than once")]
    DuplicateAnnotation { key: AnnotationKey },

    /// Annotation value cannot be interpreted for its key.
    #[error("invalid value {value:?} for annotation {key}")]
    InvalidAnnotation { key: AnnotationKey, value: String },

    /// Annotation tag is not a sequence of `key:"value"` pairs.
    #[error("malformed annotation tag {tag:?}")]
    MalformedTag { tag: String },

    /// Annotation used where it is not allowed.
    #[error("annotation {key} not supported on field {field:?}: {reason}")]
    UnsupportedOption {
        field: String,
        key: AnnotationKey,
        reason: &'static str,
    },

    /// Literal bit width outside `1..=natural width`.
    #[error("bit width {bits} on field {field:?} outside 1..={max_bits}")]
    InvalidBitWidth {
        field: String,
        bits: u64,
        max_bits: u32,
    },

    /// Value does not have the kind a conversion expected.
    #[error("expected {expected} but got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

//! Error types for bit buffer operations.

use thiserror::Error;

/// Result type for bit buffer operations.
pub type BitResult<T> = Result<T, BitError>;

/// Errors that can occur during bit-level reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitError {
    /// Attempted to read with the cursor already at (or too close to) the end.
    #[error("attempted to read {requested} bits but only {available} bits available")]
    EndOfData {
        /// Number of bits requested.
        requested: usize,
        /// Number of bits available.
        available: usize,
    },

    /// A bulk write stored fewer items than it was handed.
    ///
    /// The growable buffer never produces this in practice; it guards the
    /// construction helpers.
    #[error("expected to store {expected} items in buffer but stored {written}")]
    IncompleteWrite {
        /// Number of items handed to the write.
        expected: usize,
        /// Number of items actually stored.
        written: usize,
    },

    /// Byte-group access wider than a `u64`.
    #[error("invalid byte length {len}, maximum allowed is {max}")]
    InvalidByteLength {
        /// The requested byte length.
        len: usize,
        /// Maximum allowed byte length.
        max: usize,
    },
}

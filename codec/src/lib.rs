//! Annotation-driven struct-to-binary encoding for the bitform codec.
//!
//! This is the main codec crate that ties together bitstream and schema to
//! turn record values into an exact bit layout and back.
//!
//! # Features
//!
//! - Full-width and sub-byte integer fields, per-field byte order
//! - Sequences and text sized by literals or by earlier fields
//! - Truncate-or-pad sizing, so annotated fields always have the same length
//! - Self-describing types and caller-registered extensions
//!
//! # Design Principles
//!
//! - **No framing** - The wire format is the concatenation of the fields;
//!   there is no header, length prefix or magic number.
//! - **Scopes flow downward** - A nested record sees a copy of its parent's
//!   resolved values and never writes back.
//! - **Deterministic** - Same inputs produce same outputs.
//!
//! # Example
//!
//! ```
//! use codec::{decode, encode, Extensions};
//! use schema::{FieldDef, RecordShape, Shape, Value};
//!
//! let shape = Shape::Record(
//!     RecordShape::new("Packet", vec![
//!         FieldDef::new("N", Shape::U8),
//!         FieldDef::new("data", Shape::sequence(Shape::U8)).size("N"),
//!     ])
//!     .unwrap(),
//! );
//! let value = Value::record([Value::U8(3), Value::from(vec![9u8, 9, 9, 9, 9])]);
//!
//! let bytes = encode(&value, &shape, &Extensions::new()).unwrap();
//! assert_eq!(bytes, vec![3, 9, 9, 9]);
//!
//! let decoded = decode(&bytes, &shape, &Extensions::new()).unwrap();
//! assert_eq!(decoded, Value::record([Value::U8(3), Value::from(vec![9u8, 9, 9])]));
//! ```

mod bitfield;
mod decode;
mod encode;
mod error;
mod extension;
mod facade;
mod limits;
mod record;
mod scope;
mod walk;

pub use bitfield::{pack_bits, sign_extend, unpack_bits};
pub use decode::Decoder;
pub use encode::Encoder;
pub use error::{CodecError, CodecResult, LimitKind};
pub use extension::{DecodeFn, EncodeFn, Extension, ExtensionTarget, Extensions};
pub use facade::{decode, decode_into, encode, size_of, try_size_of, Codec};
pub use limits::CodecLimits;
pub use record::{decode_record, encode_record, size_of_record, BitRecord};
pub use scope::Scope;
pub use walk::FieldCtx;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_exports() {
        let _ = Extensions::new();
        let _ = CodecLimits::default();
        let _ = Scope::new();
        let _ = Codec::default();

        let _: CodecResult<()> = Ok(());
    }

    #[test]
    fn sign_extend_reads_packed_bits() {
        let mut buffer = bitstream::BitBuffer::new();
        pack_bits(&mut buffer, -3i64 as u64, 5, bitstream::Endian::Little);
        buffer.reset_to_start();
        let raw = unpack_bits(&mut buffer, 5, bitstream::Endian::Little).unwrap();
        assert_eq!(sign_extend(raw, 5), -3);
    }
}

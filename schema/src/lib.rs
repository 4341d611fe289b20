//! Shape descriptions for the bitform codec.
//!
//! This crate describes what the codec walks:
//! - Shapes: primitives, text, arrays, sequences, optionals, records,
//!   self-describing and open types
//! - Per-field annotations (`endian`, `bits`, `size`, `strlen`, `omit`)
//! - Dynamic values that mirror shapes
//! - Deterministic shape hashing
//!
//! # Design Principles
//!
//! - **Explicit shapes** - No reflection; records are described once and
//!   validated when built.
//! - **Annotations resolve per leaf** - Containers never impose their own
//!   byte order or widths on nested fields.
//! - **Deterministic hashing** - The shape hash is stable given the same
//!   definition.

mod annotations;
mod error;
mod hash;
mod marshal;
mod shape;
mod value;

pub use annotations::{AnnotationKey, Annotations, SizeSpec};
pub use bitstream::Endian;
pub use error::{SchemaError, SchemaResult};
pub use hash::shape_hash;
pub use marshal::{BitMarshal, MarshalError};
pub use shape::{
    CustomShape, FieldDef, OpenShape, Primitive, RecordBuilder, RecordShape, Shape, ShapeId,
};
pub use value::Value;

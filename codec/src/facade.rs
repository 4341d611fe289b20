//! Public entry points: encode, decode and size.

use bitstream::BitBuffer;
use schema::{Annotations, RecordShape, Shape, Value};
use tracing::{debug, trace};

use crate::decode::Decoder;
use crate::encode::Encoder;
use crate::error::{CodecError, CodecResult};
use crate::extension::Extensions;
use crate::limits::CodecLimits;
use crate::scope::Scope;
use crate::walk::FieldCtx;

/// Encodes a record value into bytes with default limits.
///
/// Optional root shapes are unwrapped first; the value underneath must be a
/// present record.
pub fn encode(value: &Value, shape: &Shape, extensions: &Extensions) -> CodecResult<Vec<u8>> {
    encode_with_limits(value, shape, extensions, &CodecLimits::default())
}

/// Decodes bytes into a record value with default limits.
pub fn decode(bytes: &[u8], shape: &Shape, extensions: &Extensions) -> CodecResult<Value> {
    decode_with_limits(bytes, shape, extensions, &CodecLimits::default())
}

/// Decodes bytes into caller-provided storage.
///
/// `destination` is only replaced if decoding succeeds.
pub fn decode_into(
    bytes: &[u8],
    destination: &mut Value,
    shape: &Shape,
    extensions: &Extensions,
) -> CodecResult<()> {
    *destination = decode(bytes, shape, extensions)?;
    Ok(())
}

/// Length in bytes of the encoding of `value`.
///
/// # Panics
///
/// Panics if the value cannot be encoded; there is no meaningful partial
/// size. Use [`try_size_of`] to handle the error instead.
pub fn size_of(value: &Value, shape: &Shape, extensions: &Extensions) -> usize {
    match try_size_of(value, shape, extensions) {
        Ok(size) => size,
        Err(err) => panic!("size_of: value cannot be encoded: {err}"),
    }
}

/// Length in bytes of the encoding of `value`, or the encoding error.
pub fn try_size_of(value: &Value, shape: &Shape, extensions: &Extensions) -> CodecResult<usize> {
    encode(value, shape, extensions).map(|bytes| bytes.len())
}

pub(crate) fn encode_with_limits(
    value: &Value,
    shape: &Shape,
    extensions: &Extensions,
    limits: &CodecLimits,
) -> CodecResult<Vec<u8>> {
    let (record, value) = encode_root(shape, value)?;
    trace!(root = %record.id(), "encoding record");

    let annotations = Annotations::default();
    let mut encoder = Encoder::new(extensions, limits);
    encoder.encode_field(
        FieldCtx::root(&annotations),
        root_shape(shape),
        value,
        &mut Scope::new(),
    )?;

    let buffer = encoder.into_buffer();
    debug!(root = %record.id(), bits = buffer.len(), "encoded record");
    Ok(buffer.to_bytes())
}

pub(crate) fn decode_with_limits(
    bytes: &[u8],
    shape: &Shape,
    extensions: &Extensions,
    limits: &CodecLimits,
) -> CodecResult<Value> {
    let Shape::Record(record) = shape else {
        return Err(CodecError::invalid_argument(format!(
            "decode destination must be a record, not {}",
            shape.kind_name()
        )));
    };
    trace!(root = %record.id(), bytes = bytes.len(), "decoding record");

    let annotations = Annotations::default();
    let mut decoder = Decoder::new(BitBuffer::from_bytes(bytes)?, extensions, limits);
    let value = decoder.decode_field(FieldCtx::root(&annotations), shape, &mut Scope::new())?;

    debug!(
        root = %record.id(),
        unread_bits = decoder.bits_remaining(),
        "decoded record"
    );
    Ok(value)
}

/// Strips optional layers off the root.
fn root_shape(shape: &Shape) -> &Shape {
    match shape {
        Shape::Optional(inner) => root_shape(inner),
        other => other,
    }
}

fn encode_root<'v>(shape: &'v Shape, value: &'v Value) -> CodecResult<(&'v RecordShape, &'v Value)> {
    match (shape, value) {
        (Shape::Optional(inner), Value::Optional(Some(present))) => encode_root(inner, present),
        (Shape::Optional(_), Value::Optional(None)) => {
            Err(CodecError::invalid_argument("cannot encode an absent root value"))
        }
        (Shape::Record(record), value) => Ok((record, value)),
        (other, _) => Err(CodecError::invalid_argument(format!(
            "encode root must be a record, not {}",
            other.kind_name()
        ))),
    }
}

/// Encoder and decoder configuration bundled for repeated use.
///
/// ```
/// use codec::{Codec, Extensions};
/// use schema::{FieldDef, RecordShape, Shape, Value};
///
/// let shape = Shape::Record(
///     RecordShape::new("Pair", vec![
///         FieldDef::new("a", Shape::U8).bits("4"),
///         FieldDef::new("b", Shape::U8).bits("4"),
///     ])
///     .unwrap(),
/// );
/// let codec = Codec::new(Extensions::new());
/// let value = Value::record([Value::U8(5), Value::U8(4)]);
///
/// let bytes = codec.encode(&value, &shape).unwrap();
/// assert_eq!(bytes, vec![0x45]);
/// assert_eq!(codec.decode(&bytes, &shape).unwrap(), value);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Codec {
    extensions: Extensions,
    limits: CodecLimits,
}

impl Codec {
    /// Creates a codec with default limits.
    #[must_use]
    pub fn new(extensions: Extensions) -> Self {
        Self {
            extensions,
            limits: CodecLimits::default(),
        }
    }

    /// Replaces the limits.
    #[must_use]
    pub fn with_limits(mut self, limits: CodecLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub const fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    #[must_use]
    pub const fn limits(&self) -> &CodecLimits {
        &self.limits
    }

    pub fn encode(&self, value: &Value, shape: &Shape) -> CodecResult<Vec<u8>> {
        encode_with_limits(value, shape, &self.extensions, &self.limits)
    }

    pub fn decode(&self, bytes: &[u8], shape: &Shape) -> CodecResult<Value> {
        decode_with_limits(bytes, shape, &self.extensions, &self.limits)
    }

    pub fn decode_into(&self, bytes: &[u8], destination: &mut Value, shape: &Shape) -> CodecResult<()> {
        *destination = self.decode(bytes, shape)?;
        Ok(())
    }

    /// See [`size_of`].
    ///
    /// # Panics
    ///
    /// Panics if the value cannot be encoded.
    pub fn size_of(&self, value: &Value, shape: &Shape) -> usize {
        match self.try_size_of(value, shape) {
            Ok(size) => size,
            Err(err) => panic!("size_of: value cannot be encoded: {err}"),
        }
    }

    pub fn try_size_of(&self, value: &Value, shape: &Shape) -> CodecResult<usize> {
        self.encode(value, shape).map(|bytes| bytes.len())
    }
}

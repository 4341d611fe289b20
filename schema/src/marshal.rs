//! Self-describing capability for types that own their wire encoding.

use std::fmt;

use bitstream::BitBuffer;

use crate::value::Value;

/// Error returned by a [`BitMarshal`] implementation.
pub type MarshalError = Box<dyn std::error::Error + Send + Sync>;

/// A type that produces and consumes its own bit sequence.
///
/// When a shape carries a marshaler, the codec hands the value to it and
/// bypasses every other rule, including registered extensions.
///
/// ```
/// use bitstream::{BitBuffer, Endian};
/// use schema::{BitMarshal, MarshalError, Value};
///
/// #[derive(Debug)]
/// struct WideCounter;
///
/// impl BitMarshal for WideCounter {
///     fn marshal_bits(&self, value: &Value) -> Result<BitBuffer, MarshalError> {
///         let Value::I32(count) = value else {
///             return Err("expected i32".into());
///         };
///         let mut buffer = BitBuffer::new();
///         buffer.write_uint(i64::from(*count) as u64, 8, Endian::Little)?;
///         Ok(buffer)
///     }
///
///     fn unmarshal_bits(&self, buffer: &mut BitBuffer) -> Result<Value, MarshalError> {
///         let raw = buffer.read_uint(8, Endian::Little)?;
///         Ok(Value::I32(i32::try_from(raw as i64)?))
///     }
///
///     fn zero_value(&self) -> Value {
///         Value::I32(0)
///     }
/// }
/// ```
pub trait BitMarshal: fmt::Debug + Send + Sync {
    /// Produces the complete bit sequence for `value`.
    fn marshal_bits(&self, value: &Value) -> Result<BitBuffer, MarshalError>;

    /// Consumes this type's bit sequence from the cursor of `buffer`.
    fn unmarshal_bits(&self, buffer: &mut BitBuffer) -> Result<Value, MarshalError>;

    /// The value used when the field is absent or omitted.
    fn zero_value(&self) -> Value {
        Value::Nil
    }
}

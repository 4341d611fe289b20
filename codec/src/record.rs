//! Typed records on top of the dynamic value model.

use schema::{Shape, Value};

use crate::error::CodecResult;
use crate::extension::Extensions;
use crate::facade::{decode, encode, size_of};

/// A Rust type with a fixed record shape.
///
/// ```
/// use codec::{decode_record, encode_record, BitRecord, CodecResult, Extensions};
/// use schema::{FieldDef, RecordShape, Shape, Value};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Frame {
///     len: u8,
///     body: Vec<u8>,
/// }
///
/// impl BitRecord for Frame {
///     fn shape() -> Shape {
///         RecordShape::new("Frame", vec![
///             FieldDef::new("len", Shape::U8),
///             FieldDef::new("body", Shape::sequence(Shape::U8)).size("len"),
///         ])
///         .unwrap()
///         .into()
///     }
///
///     fn to_value(&self) -> Value {
///         Value::record([Value::from(self.len), Value::from(self.body.clone())])
///     }
///
///     fn from_value(value: Value) -> CodecResult<Self> {
///         let mut fields = value.into_record()?.into_iter();
///         let (Some(len), Some(body)) = (fields.next(), fields.next()) else {
///             return Err(codec::CodecError::custom("frame needs two fields"));
///         };
///         Ok(Self { len: len.try_into()?, body: body.into_vec()? })
///     }
/// }
///
/// let frame = Frame { len: 2, body: vec![7, 8, 9] };
/// let bytes = encode_record(&frame, &Extensions::new()).unwrap();
/// assert_eq!(bytes, vec![2, 7, 8]);
///
/// let mut decoded = Frame::default();
/// decode_record(&bytes, &mut decoded, &Extensions::new()).unwrap();
/// assert_eq!(decoded, Frame { len: 2, body: vec![7, 8] });
/// ```
pub trait BitRecord: Sized {
    /// The record shape, built once per call.
    fn shape() -> Shape;

    /// Field values in declaration order.
    fn to_value(&self) -> Value;

    /// Rebuilds the type from a decoded record value.
    fn from_value(value: Value) -> CodecResult<Self>;
}

/// Encodes a typed record.
pub fn encode_record<T: BitRecord>(record: &T, extensions: &Extensions) -> CodecResult<Vec<u8>> {
    encode(&record.to_value(), &T::shape(), extensions)
}

/// Decodes into an existing typed record.
///
/// `destination` is only replaced if decoding succeeds.
pub fn decode_record<T: BitRecord>(
    bytes: &[u8],
    destination: &mut T,
    extensions: &Extensions,
) -> CodecResult<()> {
    *destination = T::from_value(decode(bytes, &T::shape(), extensions)?)?;
    Ok(())
}

/// Encoded length of a typed record.
///
/// # Panics
///
/// Panics if the record cannot be encoded.
pub fn size_of_record<T: BitRecord>(record: &T, extensions: &Extensions) -> usize {
    size_of(&record.to_value(), &T::shape(), extensions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use schema::{FieldDef, RecordShape};

    #[derive(Debug, Default, PartialEq)]
    struct Reading {
        sensor: u8,
        celsius: i16,
    }

    impl BitRecord for Reading {
        fn shape() -> Shape {
            RecordShape::new(
                "Reading",
                vec![
                    FieldDef::new("sensor", Shape::U8).bits("4"),
                    FieldDef::new("celsius", Shape::I16).bits("12"),
                ],
            )
            .unwrap()
            .into()
        }

        fn to_value(&self) -> Value {
            Value::record([Value::from(self.sensor), Value::from(self.celsius)])
        }

        fn from_value(value: Value) -> CodecResult<Self> {
            let fields = value.into_record()?;
            let [sensor, celsius]: [Value; 2] = fields
                .try_into()
                .map_err(|_| CodecError::custom("reading needs two fields"))?;
            Ok(Self {
                sensor: sensor.try_into()?,
                celsius: celsius.try_into()?,
            })
        }
    }

    #[test]
    fn typed_roundtrip() {
        let reading = Reading {
            sensor: 9,
            celsius: -40,
        };
        let bytes = encode_record(&reading, &Extensions::new()).unwrap();
        assert_eq!(bytes.len(), 2);
        assert_eq!(size_of_record(&reading, &Extensions::new()), 2);

        let mut decoded = Reading::default();
        decode_record(&bytes, &mut decoded, &Extensions::new()).unwrap();
        assert_eq!(decoded, reading);
    }

    #[test]
    fn failed_decode_leaves_destination() {
        let mut decoded = Reading {
            sensor: 1,
            celsius: 1,
        };
        assert!(decode_record(&[], &mut decoded, &Extensions::new()).is_err());
        assert_eq!(
            decoded,
            Reading {
                sensor: 1,
                celsius: 1
            }
        );
    }
}

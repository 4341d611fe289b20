//! Decoding walk.

use bitstream::BitBuffer;
use schema::{AnnotationKey, BitMarshal, Primitive, RecordShape, Shape, Value};

use crate::bitfield::unpack_bits;
use crate::error::{CodecError, CodecResult, LimitKind};
use crate::extension::Extensions;
use crate::limits::CodecLimits;
use crate::scope::Scope;
use crate::walk::{select, shape_label, value_from_raw, FieldCtx, Strategy};

/// Reads values from one bit buffer.
///
/// Mirrors [`Encoder`](crate::Encoder): extensions read raw bits through
/// [`Decoder::buffer_mut`] or hand shapes back to [`Decoder::decode_field`].
#[derive(Debug)]
pub struct Decoder<'a> {
    buffer: BitBuffer,
    extensions: &'a Extensions,
    limits: &'a CodecLimits,
    depth: usize,
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(buffer: BitBuffer, extensions: &'a Extensions, limits: &'a CodecLimits) -> Self {
        Self {
            buffer,
            extensions,
            limits,
            depth: 0,
        }
    }

    /// The buffer being read.
    pub fn buffer_mut(&mut self) -> &mut BitBuffer {
        &mut self.buffer
    }

    /// Number of bits not yet consumed.
    #[must_use]
    pub fn bits_remaining(&self) -> usize {
        self.buffer.remaining()
    }

    /// Decodes a field of `shape` at the cursor.
    pub fn decode_field(
        &mut self,
        field: FieldCtx<'_>,
        shape: &Shape,
        scope: &mut Scope,
    ) -> CodecResult<Value> {
        self.depth += 1;
        let result = if self.depth > self.limits.max_depth {
            Err(CodecError::LimitsExceeded {
                kind: LimitKind::Depth,
                limit: self.limits.max_depth,
                actual: self.depth,
            })
        } else {
            self.dispatch(field, shape, scope)
        };
        self.depth -= 1;
        result
    }

    fn dispatch(&mut self, field: FieldCtx<'_>, shape: &Shape, scope: &mut Scope) -> CodecResult<Value> {
        let extensions = self.extensions;
        match select(shape, extensions) {
            Strategy::SelfDescribing(marshaler) => self.unmarshal(shape, marshaler),
            Strategy::Extension(extension) => {
                extension.decode(self, field, shape, &mut scope.child())
            }
            Strategy::Structural => self.decode_structural(field, shape, scope),
        }
    }

    fn unmarshal(&mut self, shape: &Shape, marshaler: &dyn BitMarshal) -> CodecResult<Value> {
        marshaler
            .unmarshal_bits(&mut self.buffer)
            .map_err(|err| CodecError::Marshal {
                type_id: shape_label(shape),
                message: err.to_string(),
            })
    }

    fn decode_structural(
        &mut self,
        field: FieldCtx<'_>,
        shape: &Shape,
        scope: &mut Scope,
    ) -> CodecResult<Value> {
        match shape {
            Shape::Primitive(primitive) => self.decode_primitive(field, *primitive, scope),
            Shape::Text => self.decode_text(field, scope),
            Shape::Array { len, element } => {
                let mut items = Vec::with_capacity((*len).min(self.limits.max_elements));
                for _ in 0..*len {
                    items.push(self.decode_field(field.element(), element, scope)?);
                }
                Ok(Value::List(items))
            }
            Shape::Sequence(element) => self.decode_sequence(field, element, scope),
            Shape::Optional(inner) => Ok(Value::some(self.decode_field(field, inner, scope)?)),
            Shape::Record(record) => self.decode_record(record, scope),
            Shape::SelfDescribing(custom) => self.unmarshal(shape, custom.marshaler()),
            Shape::Open(_) | Shape::Opaque { .. } => Err(CodecError::UnsupportedShape {
                type_name: shape_label(shape),
            }),
        }
    }

    fn decode_record(&mut self, record: &RecordShape, scope: &Scope) -> CodecResult<Value> {
        let mut scope = scope.child();
        let mut values = Vec::with_capacity(record.fields().len());
        for def in record.fields() {
            if def.annotations().omit {
                values.push(def.shape().zero_value());
                continue;
            }
            values.push(self.decode_field(def.into(), def.shape(), &mut scope)?);
        }
        Ok(Value::Record(values))
    }

    fn decode_sequence(
        &mut self,
        field: FieldCtx<'_>,
        element: &Shape,
        scope: &mut Scope,
    ) -> CodecResult<Value> {
        let Some(spec) = &field.annotations().size else {
            return self.decode_to_end(field, element, scope);
        };

        let count = scope.resolve_count(AnnotationKey::Size, spec)?;
        self.check_elements(count)?;
        // count comes off the wire; never reserve more than one slot per remaining bit
        let mut items = Vec::with_capacity(count.min(self.buffer.remaining()));
        for _ in 0..count {
            items.push(self.decode_field(field.element(), element, scope)?);
        }
        Ok(Value::List(items))
    }

    /// Reads elements until the buffer is exhausted.
    fn decode_to_end(
        &mut self,
        field: FieldCtx<'_>,
        element: &Shape,
        scope: &mut Scope,
    ) -> CodecResult<Value> {
        let mut items = Vec::new();
        while !self.buffer.at_end() {
            self.check_elements(items.len() + 1)?;
            let before = self.buffer.position();
            items.push(self.decode_field(field.element(), element, scope)?);
            if self.buffer.position() == before {
                break;
            }
        }
        Ok(Value::List(items))
    }

    fn decode_text(&mut self, field: FieldCtx<'_>, scope: &Scope) -> CodecResult<Value> {
        let bytes = match &field.annotations().strlen {
            Some(spec) => {
                let len = scope.resolve_count(AnnotationKey::Strlen, spec)?;
                self.check_elements(len)?;
                let available = self.buffer.remaining();
                if len > available.div_ceil(8) {
                    return Err(CodecError::EndOfData {
                        requested: len.saturating_mul(8),
                        available,
                    });
                }
                let mut bytes = vec![0u8; len];
                if len > 0 {
                    self.buffer.read_bytes(&mut bytes)?;
                }
                bytes
            }
            None => {
                let len = self.buffer.remaining().div_ceil(8);
                self.check_elements(len)?;
                let mut bytes = vec![0u8; len];
                if len > 0 {
                    self.buffer.read_bytes(&mut bytes)?;
                }
                bytes
            }
        };
        String::from_utf8(bytes)
            .map(Value::Text)
            .map_err(|_| CodecError::InvalidText)
    }

    fn decode_primitive(
        &mut self,
        field: FieldCtx<'_>,
        primitive: Primitive,
        scope: &mut Scope,
    ) -> CodecResult<Value> {
        let endian = field.annotations().endian;
        let (raw, width) = match &field.annotations().bits {
            Some(_) if primitive.is_float() => {
                return Err(CodecError::UnsupportedOption {
                    key: AnnotationKey::Bits,
                    reason: "floats are always encoded at full width",
                });
            }
            Some(spec) => {
                let width = scope.resolve_width(spec, primitive)?;
                (unpack_bits(&mut self.buffer, width, endian)?, width)
            }
            None => (
                self.buffer.read_uint(primitive.byte_len(), endian)?,
                primitive.bit_width(),
            ),
        };

        let value = value_from_raw(primitive, raw, width);
        if let (Some(name), Some(resolved)) = (field.name(), value.as_integer()) {
            scope.publish(name, resolved);
        }
        Ok(value)
    }

    fn check_elements(&self, count: usize) -> CodecResult<()> {
        if count > self.limits.max_elements {
            return Err(CodecError::LimitsExceeded {
                kind: LimitKind::Elements,
                limit: self.limits.max_elements,
                actual: count,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
impl Decoder<'static> {
    pub(crate) fn for_testing(bytes: &[u8]) -> Self {
        static EXTENSIONS: Extensions = Extensions::new();
        static LIMITS: CodecLimits = CodecLimits::for_testing();
        let buffer = BitBuffer::from_bytes(bytes).unwrap();
        Self::new(buffer, &EXTENSIONS, &LIMITS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitstream::Endian;
    use schema::Annotations;

    fn decode_leaf(bytes: &[u8], shape: &Shape, annotations: &Annotations) -> CodecResult<Value> {
        let mut decoder = Decoder::for_testing(bytes);
        decoder.decode_field(FieldCtx::new("v", annotations), shape, &mut Scope::new())
    }

    #[test]
    fn full_width_integers_honor_endian() {
        let big = Annotations::new().with_endian(Endian::Big);
        assert_eq!(
            decode_leaf(&[0x81, 0xff], &Shape::I16, &Annotations::new()).unwrap(),
            Value::I16(-127)
        );
        assert_eq!(
            decode_leaf(&[0xff, 0x81], &Shape::I16, &big).unwrap(),
            Value::I16(-127)
        );
        assert_eq!(
            decode_leaf(&[63, 240, 0, 0, 0, 0, 0, 0], &Shape::F64, &big).unwrap(),
            Value::F64(1.0)
        );
    }

    #[test]
    fn short_read_is_end_of_data() {
        let err = decode_leaf(&[1], &Shape::U32, &Annotations::new()).unwrap_err();
        assert_eq!(
            err,
            CodecError::EndOfData {
                requested: 32,
                available: 8
            }
        );
    }

    #[test]
    fn sized_text_reads_exact_bytes() {
        let sized = Annotations::new().with_strlen("4");
        assert_eq!(
            decode_leaf(b"Hell world", &Shape::Text, &sized).unwrap(),
            Value::from("Hell")
        );
        assert!(matches!(
            decode_leaf(b"He", &Shape::Text, &sized),
            Err(CodecError::EndOfData { .. })
        ));
    }

    #[test]
    fn unsized_text_reads_to_end() {
        assert_eq!(
            decode_leaf(b"Hello", &Shape::Text, &Annotations::new()).unwrap(),
            Value::from("Hello")
        );
        assert_eq!(
            decode_leaf(&[], &Shape::Text, &Annotations::new()).unwrap(),
            Value::from("")
        );
        assert_eq!(
            decode_leaf(&[0xff, 0xfe], &Shape::Text, &Annotations::new()).unwrap_err(),
            CodecError::InvalidText
        );
    }

    #[test]
    fn unsized_sequence_reads_to_end() {
        assert_eq!(
            decode_leaf(&[1, 2, 3], &Shape::sequence(Shape::U8), &Annotations::new()).unwrap(),
            Value::from(vec![1u8, 2, 3])
        );
    }

    #[test]
    fn zero_width_elements_do_not_loop() {
        let empty = RecordShape::new("Empty", vec![]).unwrap();
        let value = decode_leaf(
            &[1],
            &Shape::sequence(Shape::Record(empty)),
            &Annotations::new(),
        )
        .unwrap();
        assert_eq!(value, Value::list([Value::record([])]));
    }

    #[test]
    fn optional_is_always_present() {
        assert_eq!(
            decode_leaf(&[0, 0], &Shape::optional(Shape::U16), &Annotations::new()).unwrap(),
            Value::some(Value::U16(0))
        );
    }

    #[test]
    fn signed_bits_sign_extend() {
        let narrow = Annotations::new().with_bits("4");
        assert_eq!(
            decode_leaf(&[0x09], &Shape::I8, &narrow).unwrap(),
            Value::I8(-7)
        );
        assert_eq!(
            decode_leaf(&[0x07], &Shape::I8, &narrow).unwrap(),
            Value::I8(7)
        );
    }

    #[test]
    fn unresolved_size_reference() {
        let sized = Annotations::new().with_size("N");
        let err = decode_leaf(&[1], &Shape::sequence(Shape::U8), &sized).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnresolvedReference {
                key: AnnotationKey::Size,
                name: "N".into()
            }
        );
    }
}

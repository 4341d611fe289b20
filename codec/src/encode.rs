//! Encoding walk.

use bitstream::BitBuffer;
use schema::{AnnotationKey, BitMarshal, Primitive, RecordShape, Shape, Value};

use crate::bitfield::pack_bits;
use crate::error::{CodecError, CodecResult, LimitKind};
use crate::extension::Extensions;
use crate::limits::CodecLimits;
use crate::scope::Scope;
use crate::walk::{raw_from_value, select, shape_label, text_prefix, FieldCtx, Strategy};

const TEXT_PAD: u8 = b' ';

/// Writes values into one bit buffer.
///
/// Extensions receive the encoder so they can write raw bits through
/// [`Encoder::buffer_mut`] or hand values back to [`Encoder::encode_field`].
#[derive(Debug)]
pub struct Encoder<'a> {
    buffer: BitBuffer,
    extensions: &'a Extensions,
    limits: &'a CodecLimits,
    depth: usize,
}

impl<'a> Encoder<'a> {
    pub(crate) fn new(extensions: &'a Extensions, limits: &'a CodecLimits) -> Self {
        Self {
            buffer: BitBuffer::new(),
            extensions,
            limits,
            depth: 0,
        }
    }

    /// The buffer being written.
    pub fn buffer_mut(&mut self) -> &mut BitBuffer {
        &mut self.buffer
    }

    /// Number of bits written so far.
    #[must_use]
    pub fn bits_written(&self) -> usize {
        self.buffer.len()
    }

    pub(crate) fn into_buffer(self) -> BitBuffer {
        self.buffer
    }

    /// Encodes `value` as a field of `shape`.
    ///
    /// Self-describing shapes are handed to their marshaler, registered
    /// extensions come next, and everything else is walked structurally.
    pub fn encode_field(
        &mut self,
        field: FieldCtx<'_>,
        shape: &Shape,
        value: &Value,
        scope: &mut Scope,
    ) -> CodecResult<()> {
        self.depth += 1;
        let result = if self.depth > self.limits.max_depth {
            Err(CodecError::LimitsExceeded {
                kind: LimitKind::Depth,
                limit: self.limits.max_depth,
                actual: self.depth,
            })
        } else {
            self.dispatch(field, shape, value, scope)
        };
        self.depth -= 1;
        result
    }

    fn dispatch(
        &mut self,
        field: FieldCtx<'_>,
        shape: &Shape,
        value: &Value,
        scope: &mut Scope,
    ) -> CodecResult<()> {
        let extensions = self.extensions;
        match select(shape, extensions) {
            Strategy::SelfDescribing(marshaler) => self.marshal(shape, marshaler, value),
            Strategy::Extension(extension) => {
                extension.encode(self, field, value, &mut scope.child())
            }
            Strategy::Structural => self.encode_structural(field, shape, value, scope),
        }
    }

    fn marshal(&mut self, shape: &Shape, marshaler: &dyn BitMarshal, value: &Value) -> CodecResult<()> {
        let bits = marshaler
            .marshal_bits(value)
            .map_err(|err| CodecError::Marshal {
                type_id: shape_label(shape),
                message: err.to_string(),
            })?;
        self.buffer.write_bits(bits.as_bits());
        Ok(())
    }

    fn encode_structural(
        &mut self,
        field: FieldCtx<'_>,
        shape: &Shape,
        value: &Value,
        scope: &mut Scope,
    ) -> CodecResult<()> {
        match shape {
            Shape::Primitive(primitive) => self.encode_primitive(field, *primitive, value, scope),
            Shape::Text => self.encode_text(field, value, scope),
            Shape::Array { len, element } => {
                let items = expect_list(value)?;
                if items.len() != *len {
                    return Err(CodecError::ArrayLength {
                        expected: *len,
                        found: items.len(),
                    });
                }
                for item in items {
                    self.encode_field(field.element(), element, item, scope)?;
                }
                Ok(())
            }
            Shape::Sequence(element) => self.encode_sequence(field, element, value, scope),
            Shape::Optional(inner) => match value {
                Value::Optional(Some(present)) => self.encode_field(field, inner, present, scope),
                Value::Optional(None) => {
                    let zero = inner.zero_value();
                    self.encode_field(field, inner, &zero, scope)
                }
                other => Err(CodecError::mismatch("optional", other.kind_name())),
            },
            Shape::Record(record) => self.encode_record(record, value, scope),
            Shape::SelfDescribing(custom) => self.marshal(shape, custom.marshaler(), value),
            Shape::Open(_) | Shape::Opaque { .. } => Err(CodecError::UnsupportedShape {
                type_name: shape_label(shape),
            }),
        }
    }

    fn encode_record(&mut self, record: &RecordShape, value: &Value, scope: &Scope) -> CodecResult<()> {
        let values = value
            .as_record()
            .ok_or_else(|| CodecError::mismatch("record", value.kind_name()))?;
        if values.len() != record.fields().len() {
            return Err(CodecError::FieldCount {
                record: record.id().to_string(),
                expected: record.fields().len(),
                found: values.len(),
            });
        }

        let mut scope = scope.child();
        for (def, value) in record.fields().iter().zip(values) {
            if def.annotations().omit {
                continue;
            }
            self.encode_field(def.into(), def.shape(), value, &mut scope)?;
        }
        Ok(())
    }

    fn encode_sequence(
        &mut self,
        field: FieldCtx<'_>,
        element: &Shape,
        value: &Value,
        scope: &mut Scope,
    ) -> CodecResult<()> {
        let items = expect_list(value)?;
        let Some(spec) = &field.annotations().size else {
            self.check_elements(items.len())?;
            for item in items {
                self.encode_field(field.element(), element, item, scope)?;
            }
            return Ok(());
        };

        let count = scope.resolve_count(AnnotationKey::Size, spec)?;
        self.check_elements(count)?;
        for item in items.iter().take(count) {
            self.encode_field(field.element(), element, item, scope)?;
        }
        if count > items.len() {
            let zero = element.zero_value();
            for _ in items.len()..count {
                self.encode_field(field.element(), element, &zero, scope)?;
            }
        }
        Ok(())
    }

    fn encode_text(&mut self, field: FieldCtx<'_>, value: &Value, scope: &Scope) -> CodecResult<()> {
        let Value::Text(text) = value else {
            return Err(CodecError::mismatch("text", value.kind_name()));
        };
        let Some(spec) = &field.annotations().strlen else {
            self.check_elements(text.len())?;
            self.buffer.write_bytes(text.as_bytes());
            return Ok(());
        };

        let len = scope.resolve_count(AnnotationKey::Strlen, spec)?;
        self.check_elements(len)?;
        let prefix = text_prefix(text, len);
        self.buffer.write_bytes(prefix.as_bytes());
        self.buffer.write_bytes(&vec![TEXT_PAD; len - prefix.len()]);
        Ok(())
    }

    fn encode_primitive(
        &mut self,
        field: FieldCtx<'_>,
        primitive: Primitive,
        value: &Value,
        scope: &mut Scope,
    ) -> CodecResult<()> {
        let raw = raw_from_value(primitive, value)?;
        let endian = field.annotations().endian;
        match &field.annotations().bits {
            Some(_) if primitive.is_float() => {
                return Err(CodecError::UnsupportedOption {
                    key: AnnotationKey::Bits,
                    reason: "floats are always encoded at full width",
                });
            }
            Some(spec) => {
                let width = scope.resolve_width(spec, primitive)?;
                pack_bits(&mut self.buffer, raw, width, endian);
            }
            None => self.buffer.write_uint(raw, primitive.byte_len(), endian)?,
        }

        if let (Some(name), Some(resolved)) = (field.name(), value.as_integer()) {
            scope.publish(name, resolved);
        }
        Ok(())
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
impl Encoder<'static> {
    pub(crate) fn for_testing() -> Self {
        static EXTENSIONS: Extensions = Extensions::new();
        static LIMITS: CodecLimits = CodecLimits::for_testing();
        Self::new(&EXTENSIONS, &LIMITS)
    }
}

fn expect_list(value: &Value) -> CodecResult<&[Value]> {
    value
        .as_list()
        .ok_or_else(|| CodecError::mismatch("list", value.kind_name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitstream::Endian;
    use schema::Annotations;

    fn encode_leaf(shape: &Shape, annotations: &Annotations, value: &Value) -> CodecResult<Vec<u8>> {
        let mut encoder = Encoder::for_testing();
        let mut scope = Scope::new();
        encoder.encode_field(FieldCtx::new("v", annotations), shape, value, &mut scope)?;
        Ok(encoder.into_buffer().to_bytes())
    }

    #[test]
    fn full_width_integers_honor_endian() {
        let big = Annotations::new().with_endian(Endian::Big);
        assert_eq!(
            encode_leaf(&Shape::U16, &big, &Value::U16(0x0102)).unwrap(),
            vec![1, 2]
        );
        assert_eq!(
            encode_leaf(&Shape::I16, &Annotations::new(), &Value::I16(-127)).unwrap(),
            vec![0x81, 0xff]
        );
        assert_eq!(
            encode_leaf(&Shape::I16, &big, &Value::I16(-127)).unwrap(),
            vec![0xff, 0x81]
        );
    }

    #[test]
    fn floats_use_ieee_bits() {
        assert_eq!(
            encode_leaf(&Shape::F32, &Annotations::new(), &Value::F32(1.0)).unwrap(),
            vec![0, 0, 128, 63]
        );
        let big = Annotations::new().with_endian(Endian::Big);
        assert_eq!(
            encode_leaf(&Shape::F64, &big, &Value::F64(1.0)).unwrap(),
            vec![63, 240, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn bits_on_float_is_unsupported() {
        let narrow = Annotations::new().with_bits("8");
        let err = encode_leaf(&Shape::F32, &narrow, &Value::F32(1.0)).unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnsupportedOption {
                key: AnnotationKey::Bits,
                ..
            }
        ));
    }

    #[test]
    fn bool_is_one_byte() {
        assert_eq!(
            encode_leaf(&Shape::BOOL, &Annotations::new(), &Value::Bool(true)).unwrap(),
            vec![1]
        );
    }

    #[test]
    fn integers_publish_but_elements_do_not() {
        let mut encoder = Encoder::for_testing();
        let mut scope = Scope::new();
        let annotations = Annotations::new();
        encoder
            .encode_field(
                FieldCtx::new("N", &annotations),
                &Shape::U8,
                &Value::U8(3),
                &mut scope,
            )
            .unwrap();
        encoder
            .encode_field(
                FieldCtx::new("xs", &annotations),
                &Shape::array(2, Shape::U8),
                &Value::from(vec![7u8, 8]),
                &mut scope,
            )
            .unwrap();
        encoder
            .encode_field(
                FieldCtx::new("flag", &annotations),
                &Shape::BOOL,
                &Value::Bool(true),
                &mut scope,
            )
            .unwrap();
        assert_eq!(scope.get("N"), Some(3));
        assert_eq!(scope.get("xs"), None);
        assert_eq!(scope.get("flag"), None);
        assert_eq!(encoder.bits_written(), 32);
    }

    #[test]
    fn array_length_is_checked() {
        let err = encode_leaf(
            &Shape::array(3, Shape::U8),
            &Annotations::new(),
            &Value::from(vec![1u8]),
        )
        .unwrap_err();
        assert_eq!(
            err,
            CodecError::ArrayLength {
                expected: 3,
                found: 1
            }
        );
    }

    #[test]
    fn absent_optional_encodes_zero_value() {
        assert_eq!(
            encode_leaf(
                &Shape::optional(Shape::U16),
                &Annotations::new(),
                &Value::none()
            )
            .unwrap(),
            vec![0, 0]
        );
    }

    #[test]
    fn open_without_extension_is_unsupported() {
        let err = encode_leaf(&Shape::open("Thing"), &Annotations::new(), &Value::U8(1)).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnsupportedShape {
                type_name: "Thing".into()
            }
        );
        let err = encode_leaf(
            &Shape::opaque("map"),
            &Annotations::new(),
            &Value::Nil,
        )
        .unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedShape { .. }));
    }

    #[test]
    fn depth_limit_is_enforced() {
        let mut shape = Shape::U8;
        let mut value = Value::U8(1);
        for _ in 0..CodecLimits::for_testing().max_depth {
            shape = Shape::optional(shape);
            value = Value::some(value);
        }
        let err = encode_leaf(&shape, &Annotations::new(), &value).unwrap_err();
        assert!(matches!(
            err,
            CodecError::LimitsExceeded {
                kind: LimitKind::Depth,
                ..
            }
        ));
    }

    #[test]
    fn element_limit_is_enforced() {
        let padded = Annotations::new().with_size("100000");
        let err = encode_leaf(&Shape::sequence(Shape::U8), &padded, &Value::list([])).unwrap_err();
        assert!(matches!(
            err,
            CodecError::LimitsExceeded {
                kind: LimitKind::Elements,
                ..
            }
        ));
    }
}

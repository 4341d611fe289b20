//! Strategy selection and the leaf conversions shared by both walk directions.

use schema::{Annotations, BitMarshal, FieldDef, Primitive, Shape, Value};

use crate::bitfield::sign_extend;
use crate::error::{CodecError, CodecResult};
use crate::extension::{Extension, ExtensionTarget, Extensions};

/// The field a value is being walked as: its name and annotations.
///
/// Array and sequence elements carry the annotations of the field that
/// declares them but no name, so they never publish to the scope.
#[derive(Debug, Clone, Copy)]
pub struct FieldCtx<'f> {
    name: Option<&'f str>,
    annotations: &'f Annotations,
}

impl<'f> FieldCtx<'f> {
    /// A named field.
    #[must_use]
    pub const fn new(name: &'f str, annotations: &'f Annotations) -> Self {
        Self {
            name: Some(name),
            annotations,
        }
    }

    /// An unnamed position, such as the root value.
    #[must_use]
    pub const fn root(annotations: &'f Annotations) -> Self {
        Self {
            name: None,
            annotations,
        }
    }

    /// The context for one element of this field.
    #[must_use]
    pub const fn element(self) -> Self {
        Self {
            name: None,
            annotations: self.annotations,
        }
    }

    /// Field name; `None` for elements and the root, which never publish.
    #[must_use]
    pub const fn name(&self) -> Option<&'f str> {
        self.name
    }

    /// Annotations of the enclosing field, shared by its elements.
    #[must_use]
    pub const fn annotations(&self) -> &'f Annotations {
        self.annotations
    }
}

impl<'f> From<&'f FieldDef> for FieldCtx<'f> {
    fn from(field: &'f FieldDef) -> Self {
        Self::new(field.name(), field.annotations())
    }
}

/// How one value is handled. Probed in declaration order.
pub(crate) enum Strategy<'s> {
    SelfDescribing(&'s dyn BitMarshal),
    Extension(&'s Extension),
    Structural,
}

pub(crate) fn select<'s>(shape: &'s Shape, extensions: &'s Extensions) -> Strategy<'s> {
    if let Some(marshaler) = shape.marshaler() {
        return Strategy::SelfDescribing(marshaler);
    }
    let registered = match shape {
        Shape::Record(record) => extensions.find(record.id(), ExtensionTarget::Record),
        Shape::Open(open) => extensions.find(open.id(), ExtensionTarget::Open),
        _ => None,
    };
    registered.map_or(Strategy::Structural, Strategy::Extension)
}

/// Name used for a shape in error messages.
pub(crate) fn shape_label(shape: &Shape) -> String {
    match shape {
        Shape::Record(record) => record.id().to_string(),
        Shape::SelfDescribing(custom) => custom.id().to_string(),
        Shape::Open(open) => open.id().to_string(),
        Shape::Opaque { type_name } => type_name.clone(),
        other => other.kind_name().to_owned(),
    }
}

/// Raw bits of a primitive value: two's complement for signed, IEEE 754 for floats.
pub(crate) fn raw_from_value(primitive: Primitive, value: &Value) -> CodecResult<u64> {
    let raw = match (primitive, value) {
        (Primitive::Bool, Value::Bool(v)) => u64::from(*v),
        (Primitive::U8, Value::U8(v)) => u64::from(*v),
        (Primitive::U16, Value::U16(v)) => u64::from(*v),
        (Primitive::U32, Value::U32(v)) => u64::from(*v),
        (Primitive::U64, Value::U64(v)) => *v,
        (Primitive::I8, Value::I8(v)) => i64::from(*v) as u64,
        (Primitive::I16, Value::I16(v)) => i64::from(*v) as u64,
        (Primitive::I32, Value::I32(v)) => i64::from(*v) as u64,
        (Primitive::I64, Value::I64(v)) => *v as u64,
        (Primitive::F32, Value::F32(v)) => u64::from(v.to_bits()),
        (Primitive::F64, Value::F64(v)) => v.to_bits(),
        (primitive, value) => {
            return Err(CodecError::mismatch(primitive.name(), value.kind_name()));
        }
    };
    Ok(raw)
}

/// Rebuilds a primitive value from the low `width` bits of `raw`.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn value_from_raw(primitive: Primitive, raw: u64, width: u32) -> Value {
    match primitive {
        Primitive::Bool => Value::Bool(raw != 0),
        Primitive::U8 => Value::U8(raw as u8),
        Primitive::U16 => Value::U16(raw as u16),
        Primitive::U32 => Value::U32(raw as u32),
        Primitive::U64 => Value::U64(raw),
        Primitive::I8 => Value::I8(sign_extend(raw, width) as i8),
        Primitive::I16 => Value::I16(sign_extend(raw, width) as i16),
        Primitive::I32 => Value::I32(sign_extend(raw, width) as i32),
        Primitive::I64 => Value::I64(sign_extend(raw, width)),
        Primitive::F32 => Value::F32(f32::from_bits(raw as u32)),
        Primitive::F64 => Value::F64(f64::from_bits(raw)),
    }
}

/// Longest prefix of `text` that fits in `len` bytes without splitting a character.
pub(crate) fn text_prefix(text: &str, len: usize) -> &str {
    let mut end = len.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::Extension;
    use schema::{CustomShape, FieldDef, MarshalError, RecordShape};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Empty;

    impl BitMarshal for Empty {
        fn marshal_bits(&self, _: &Value) -> Result<bitstream::BitBuffer, MarshalError> {
            Ok(bitstream::BitBuffer::new())
        }

        fn unmarshal_bits(&self, _: &mut bitstream::BitBuffer) -> Result<Value, MarshalError> {
            Ok(Value::Nil)
        }
    }

    fn point() -> RecordShape {
        RecordShape::new("Point", vec![FieldDef::new("x", Shape::U8)]).unwrap()
    }

    fn passthrough(target: &'static str) -> Extension {
        Extension::for_record(target, |_, _, _, _| Ok(()), |_, _, _, _| Ok(Value::Nil))
    }

    #[test]
    fn structural_by_default() {
        let extensions = Extensions::new();
        assert!(matches!(
            select(&Shape::Record(point()), &extensions),
            Strategy::Structural
        ));
        assert!(matches!(select(&Shape::U8, &extensions), Strategy::Structural));
    }

    #[test]
    fn extension_matches_record_identity() {
        let extensions = Extensions::new().with(passthrough("Point"));
        assert!(matches!(
            select(&Shape::Record(point()), &extensions),
            Strategy::Extension(_)
        ));
        let other = RecordShape::new("Other", vec![]).unwrap();
        assert!(matches!(
            select(&Shape::Record(other), &extensions),
            Strategy::Structural
        ));
    }

    #[test]
    fn self_describing_beats_extension() {
        let extensions = Extensions::new().with(passthrough("Point"));
        let shape = Shape::Record(point().with_marshaler(Arc::new(Empty)));
        assert!(matches!(
            select(&shape, &extensions),
            Strategy::SelfDescribing(_)
        ));
        let custom = Shape::SelfDescribing(CustomShape::new("Point", Arc::new(Empty)));
        assert!(matches!(
            select(&custom, &extensions),
            Strategy::SelfDescribing(_)
        ));
    }

    #[test]
    fn primitive_raw_conversions() {
        assert_eq!(raw_from_value(Primitive::I8, &Value::I8(-1)).unwrap(), u64::MAX);
        assert_eq!(
            raw_from_value(Primitive::F32, &Value::F32(1.0)).unwrap(),
            0x3F80_0000
        );
        assert_eq!(value_from_raw(Primitive::I8, 0b1001, 4), Value::I8(-7));
        assert_eq!(value_from_raw(Primitive::U16, 0x1FF, 16), Value::U16(0x1FF));
        assert_eq!(value_from_raw(Primitive::Bool, 1, 1), Value::Bool(true));
        assert!(matches!(
            raw_from_value(Primitive::U16, &Value::U8(1)),
            Err(CodecError::TypeMismatch {
                expected: "u16",
                found: "u8"
            })
        ));
    }

    #[test]
    fn text_prefix_respects_char_boundaries() {
        assert_eq!(text_prefix("Hello", 4), "Hell");
        assert_eq!(text_prefix("Hi", 4), "Hi");
        assert_eq!(text_prefix("héllo", 2), "h");
        assert_eq!(text_prefix("", 3), "");
    }

    #[test]
    fn element_context_drops_name() {
        let field = FieldDef::new("data", Shape::sequence(Shape::U8)).size("N");
        let ctx = FieldCtx::from(&field);
        assert_eq!(ctx.name(), Some("data"));
        let element = ctx.element();
        assert_eq!(element.name(), None);
        assert_eq!(element.annotations(), field.annotations());
    }
}

//! Shape tree: the structural kinds the codec dispatches on.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::annotations::{is_identifier, AnnotationKey, Annotations, SizeSpec};
use crate::error::{SchemaError, SchemaResult};
use crate::marshal::BitMarshal;
use crate::value::Value;

/// Fixed-width leaf kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Bool,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl Primitive {
    /// Natural width in bits. A bool occupies one byte.
    #[must_use]
    pub const fn bit_width(self) -> u32 {
        match self {
            Self::Bool | Self::U8 | Self::I8 => 8,
            Self::U16 | Self::I16 => 16,
            Self::U32 | Self::I32 | Self::F32 => 32,
            Self::U64 | Self::I64 | Self::F64 => 64,
        }
    }

    /// Natural width in bytes.
    #[must_use]
    pub const fn byte_len(self) -> usize {
        (self.bit_width() / 8) as usize
    }

    #[must_use]
    pub const fn is_signed(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    #[must_use]
    pub const fn zero_value(self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::U8 => Value::U8(0),
            Self::U16 => Value::U16(0),
            Self::U32 => Value::U32(0),
            Self::U64 => Value::U64(0),
            Self::I8 => Value::I8(0),
            Self::I16 => Value::I16(0),
            Self::I32 => Value::I32(0),
            Self::I64 => Value::I64(0),
            Self::F32 => Value::F32(0.0),
            Self::F64 => Value::F64(0.0),
        }
    }
}

/// Exact type identity used to match registered extensions.
///
/// Two shapes match only if their identities are equal; there is no
/// structural comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(Cow<'static, str>);

impl ShapeId {
    /// Creates an identity from a name.
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Identity of the Rust type `T`.
    #[must_use]
    pub fn of<T: ?Sized>() -> Self {
        Self(Cow::Borrowed(std::any::type_name::<T>()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for ShapeId {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl From<String> for ShapeId {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The structural kind of a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Integer, boolean or float leaf.
    Primitive(Primitive),
    /// Byte string, sized by `strlen`.
    Text,
    /// Fixed number of elements, all sharing the field's annotations.
    Array { len: usize, element: Box<Shape> },
    /// Growable sequence, sized by `size`.
    Sequence(Box<Shape>),
    /// Indirection that may be absent.
    Optional(Box<Shape>),
    Record(RecordShape),
    /// A type that encodes itself.
    SelfDescribing(CustomShape),
    /// A capability set with no single concrete shape.
    Open(OpenShape),
    /// Describable but without a wire encoding (maps, channels, functions, ...).
    Opaque { type_name: String },
}

impl Shape {
    pub const BOOL: Self = Self::Primitive(Primitive::Bool);
    pub const U8: Self = Self::Primitive(Primitive::U8);
    pub const U16: Self = Self::Primitive(Primitive::U16);
    pub const U32: Self = Self::Primitive(Primitive::U32);
    pub const U64: Self = Self::Primitive(Primitive::U64);
    pub const I8: Self = Self::Primitive(Primitive::I8);
    pub const I16: Self = Self::Primitive(Primitive::I16);
    pub const I32: Self = Self::Primitive(Primitive::I32);
    pub const I64: Self = Self::Primitive(Primitive::I64);
    pub const F32: Self = Self::Primitive(Primitive::F32);
    pub const F64: Self = Self::Primitive(Primitive::F64);

    #[must_use]
    pub fn array(len: usize, element: Self) -> Self {
        Self::Array {
            len,
            element: Box::new(element),
        }
    }

    #[must_use]
    pub fn sequence(element: Self) -> Self {
        Self::Sequence(Box::new(element))
    }

    #[must_use]
    pub fn optional(inner: Self) -> Self {
        Self::Optional(Box::new(inner))
    }

    #[must_use]
    pub fn open(id: impl Into<ShapeId>) -> Self {
        Self::Open(OpenShape::new(id))
    }

    #[must_use]
    pub fn opaque(type_name: impl Into<String>) -> Self {
        Self::Opaque {
            type_name: type_name.into(),
        }
    }

    /// Short name of the shape kind, for diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Primitive(primitive) => primitive.name(),
            Self::Text => "text",
            Self::Array { .. } => "array",
            Self::Sequence(_) => "sequence",
            Self::Optional(_) => "optional",
            Self::Record(_) => "record",
            Self::SelfDescribing(_) => "self-describing",
            Self::Open(_) => "open",
            Self::Opaque { .. } => "opaque",
        }
    }

    /// The self-describing capability, if this shape has one.
    #[must_use]
    pub fn marshaler(&self) -> Option<&dyn BitMarshal> {
        match self {
            Self::SelfDescribing(custom) => Some(custom.marshaler()),
            Self::Record(record) => record.marshaler(),
            _ => None,
        }
    }

    /// The shape an annotation on this field finally applies to.
    ///
    /// Arrays, sequences and optionals pass their annotations to their
    /// elements.
    #[must_use]
    pub fn leaf(&self) -> &Self {
        match self {
            Self::Array { element, .. } | Self::Sequence(element) | Self::Optional(element) => {
                element.leaf()
            }
            other => other,
        }
    }

    /// The value a field of this shape holds before anything is assigned.
    #[must_use]
    pub fn zero_value(&self) -> Value {
        match self {
            Self::Primitive(primitive) => primitive.zero_value(),
            Self::Text => Value::Text(String::new()),
            Self::Array { len, element } => Value::List(vec![element.zero_value(); *len]),
            Self::Sequence(_) => Value::List(Vec::new()),
            Self::Optional(_) => Value::Optional(None),
            Self::Record(record) => record.zero_value(),
            Self::SelfDescribing(custom) => custom.marshaler().zero_value(),
            Self::Open(_) | Self::Opaque { .. } => Value::Nil,
        }
    }
}

impl From<Primitive> for Shape {
    fn from(primitive: Primitive) -> Self {
        Self::Primitive(primitive)
    }
}

impl From<RecordShape> for Shape {
    fn from(record: RecordShape) -> Self {
        Self::Record(record)
    }
}

impl From<CustomShape> for Shape {
    fn from(custom: CustomShape) -> Self {
        Self::SelfDescribing(custom)
    }
}

/// A capability set with no single concrete shape.
///
/// Fields of this shape can only be encoded and decoded through a registered
/// extension for its identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OpenShape {
    id: ShapeId,
}

impl OpenShape {
    #[must_use]
    pub fn new(id: impl Into<ShapeId>) -> Self {
        Self { id: id.into() }
    }

    #[must_use]
    pub const fn id(&self) -> &ShapeId {
        &self.id
    }
}

/// A standalone self-describing type.
#[derive(Debug, Clone)]
pub struct CustomShape {
    id: ShapeId,
    marshaler: Arc<dyn BitMarshal>,
}

impl CustomShape {
    #[must_use]
    pub fn new(id: impl Into<ShapeId>, marshaler: Arc<dyn BitMarshal>) -> Self {
        Self {
            id: id.into(),
            marshaler,
        }
    }

    #[must_use]
    pub const fn id(&self) -> &ShapeId {
        &self.id
    }

    #[must_use]
    pub fn marshaler(&self) -> &dyn BitMarshal {
        self.marshaler.as_ref()
    }
}

impl PartialEq for CustomShape {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Field definition within a record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    name: String,
    shape: Shape,
    annotations: Annotations,
}

impl FieldDef {
    /// Creates a field with no annotations.
    #[must_use]
    pub fn new(name: impl Into<String>, shape: impl Into<Shape>) -> Self {
        Self {
            name: name.into(),
            shape: shape.into(),
            annotations: Annotations::default(),
        }
    }

    /// Creates a field from struct-tag syntax, e.g. `bits:"4" endian:"big"`.
    pub fn tagged(name: impl Into<String>, shape: impl Into<Shape>, tag: &str) -> SchemaResult<Self> {
        Ok(Self::new(name, shape).with_annotations(tag.parse()?))
    }

    #[must_use]
    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }

    #[must_use]
    pub fn endian(mut self, endian: bitstream::Endian) -> Self {
        self.annotations.endian = endian;
        self
    }

    #[must_use]
    pub fn bits(mut self, bits: impl Into<SizeSpec>) -> Self {
        self.annotations.bits = Some(bits.into());
        self
    }

    #[must_use]
    pub fn size(mut self, size: impl Into<SizeSpec>) -> Self {
        self.annotations.size = Some(size.into());
        self
    }

    #[must_use]
    pub fn strlen(mut self, strlen: impl Into<SizeSpec>) -> Self {
        self.annotations.strlen = Some(strlen.into());
        self
    }

    #[must_use]
    pub fn omit(mut self) -> Self {
        self.annotations.omit = true;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn shape(&self) -> &Shape {
        &self.shape
    }

    #[must_use]
    pub const fn annotations(&self) -> &Annotations {
        &self.annotations
    }
}

/// A record: ordered, named fields under one identity.
#[derive(Debug, Clone)]
pub struct RecordShape {
    id: ShapeId,
    fields: Vec<FieldDef>,
    marshaler: Option<Arc<dyn BitMarshal>>,
}

impl RecordShape {
    /// Creates a record after validating its fields.
    pub fn new(id: impl Into<ShapeId>, fields: Vec<FieldDef>) -> SchemaResult<Self> {
        let record = Self {
            id: id.into(),
            fields,
            marshaler: None,
        };
        record.validate()?;
        Ok(record)
    }

    /// Creates a record builder.
    #[must_use]
    pub fn builder(id: impl Into<ShapeId>) -> RecordBuilder {
        RecordBuilder {
            id: id.into(),
            fields: Vec::new(),
        }
    }

    /// Attaches a self-describing capability to this record.
    #[must_use]
    pub fn with_marshaler(mut self, marshaler: Arc<dyn BitMarshal>) -> Self {
        self.marshaler = Some(marshaler);
        self
    }

    #[must_use]
    pub const fn id(&self) -> &ShapeId {
        &self.id
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Looks a field up by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|field| field.name == name)
    }

    #[must_use]
    pub fn marshaler(&self) -> Option<&dyn BitMarshal> {
        self.marshaler.as_deref()
    }

    #[must_use]
    pub fn zero_value(&self) -> Value {
        Value::Record(
            self.fields
                .iter()
                .map(|field| field.shape.zero_value())
                .collect(),
        )
    }

    /// Validates record invariants.
    pub fn validate(&self) -> SchemaResult<()> {
        let mut names = HashSet::new();
        for field in &self.fields {
            if !is_identifier(&field.name) {
                return Err(SchemaError::InvalidFieldName {
                    field: field.name.clone(),
                });
            }
            if !names.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    record: self.id.to_string(),
                    field: field.name.clone(),
                });
            }
            validate_field(field)?;
        }
        Ok(())
    }
}

impl PartialEq for RecordShape {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.fields == other.fields
            && self.marshaler.is_some() == other.marshaler.is_some()
    }
}

/// Builder for `RecordShape`.
#[derive(Debug)]
pub struct RecordBuilder {
    id: ShapeId,
    fields: Vec<FieldDef>,
}

impl RecordBuilder {
    /// Adds a field definition.
    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Builds the record after validation.
    pub fn build(self) -> SchemaResult<RecordShape> {
        RecordShape::new(self.id, self.fields)
    }
}

fn validate_field(field: &FieldDef) -> SchemaResult<()> {
    let annotations = &field.annotations;
    for (key, spec) in annotations.size_specs() {
        if let Some(name) = spec.reference() {
            if !is_identifier(name) {
                return Err(SchemaError::InvalidAnnotation {
                    key,
                    value: name.to_owned(),
                });
            }
        }
    }

    let (Some(bits), Shape::Primitive(primitive)) = (&annotations.bits, field.shape.leaf()) else {
        return Ok(());
    };
    if primitive.is_float() {
        return Err(SchemaError::UnsupportedOption {
            field: field.name.clone(),
            key: AnnotationKey::Bits,
            reason: "floats are always encoded at full width",
        });
    }
    if let SizeSpec::Literal(width) = *bits {
        let max_bits = primitive.bit_width();
        if width == 0 || width > u64::from(max_bits) {
            return Err(SchemaError::InvalidBitWidth {
                field: field.name.clone(),
                bits: width,
                max_bits,
            });
        }
        if primitive.is_signed() && width < 2 {
            return Err(SchemaError::UnsupportedOption {
                field: field.name.clone(),
                key: AnnotationKey::Bits,
                reason: "signed fields need at least 2 bits",
            });
        }
    }
    Ok(())
}

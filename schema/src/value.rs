//! Dynamic values walked by the codec.

use crate::error::{SchemaError, SchemaResult};

/// A value in decoded form.
///
/// Records hold their field values positionally, in declaration order.
/// Fixed arrays and growable sequences are both [`Value::List`]; the shape
/// decides which rules apply.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Text(String),
    List(Vec<Value>),
    Optional(Option<Box<Value>>),
    Record(Vec<Value>),
    /// Absent open (polymorphic) value.
    Nil,
}

impl Value {
    /// Builds a record value from field values in declaration order.
    pub fn record(fields: impl IntoIterator<Item = Self>) -> Self {
        Self::Record(fields.into_iter().collect())
    }

    /// Builds a list value.
    pub fn list(items: impl IntoIterator<Item = Self>) -> Self {
        Self::List(items.into_iter().collect())
    }

    /// Builds a present optional value.
    #[must_use]
    pub fn some(value: Self) -> Self {
        Self::Optional(Some(Box::new(value)))
    }

    /// Builds an absent optional value.
    #[must_use]
    pub const fn none() -> Self {
        Self::Optional(None)
    }

    /// Short name of the value kind, for diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Optional(_) => "optional",
            Self::Record(_) => "record",
            Self::Nil => "nil",
        }
    }

    /// Returns the integer payload widened to `i128`.
    #[must_use]
    pub fn as_integer(&self) -> Option<i128> {
        match *self {
            Self::U8(v) => Some(i128::from(v)),
            Self::U16(v) => Some(i128::from(v)),
            Self::U32(v) => Some(i128::from(v)),
            Self::U64(v) => Some(i128::from(v)),
            Self::I8(v) => Some(i128::from(v)),
            Self::I16(v) => Some(i128::from(v)),
            Self::I32(v) => Some(i128::from(v)),
            Self::I64(v) => Some(i128::from(v)),
            _ => None,
        }
    }

    /// Returns the record fields, if this is a record.
    #[must_use]
    pub fn as_record(&self) -> Option<&[Self]> {
        match self {
            Self::Record(fields) => Some(fields),
            _ => None,
        }
    }

    /// Returns the list items, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Consumes a record value into its fields.
    pub fn into_record(self) -> SchemaResult<Vec<Self>> {
        match self {
            Self::Record(fields) => Ok(fields),
            other => Err(mismatch("record", &other)),
        }
    }

    /// Consumes a list value into its items.
    pub fn into_list(self) -> SchemaResult<Vec<Self>> {
        match self {
            Self::List(items) => Ok(items),
            other => Err(mismatch("list", &other)),
        }
    }

    /// Consumes a list value, converting every item.
    pub fn into_vec<T>(self) -> SchemaResult<Vec<T>>
    where
        T: TryFrom<Self, Error = SchemaError>,
    {
        self.into_list()?.into_iter().map(T::try_from).collect()
    }

    /// Consumes an optional value.
    pub fn into_optional(self) -> SchemaResult<Option<Self>> {
        match self {
            Self::Optional(inner) => Ok(inner.map(|boxed| *boxed)),
            other => Err(mismatch("optional", &other)),
        }
    }
}

fn mismatch(expected: &'static str, found: &Value) -> SchemaError {
    SchemaError::TypeMismatch {
        expected,
        found: found.kind_name(),
    }
}

macro_rules! primitive_conversions {
    ($($ty:ty => $variant:ident, $name:literal;)*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }

            impl TryFrom<Value> for $ty {
                type Error = SchemaError;

                fn try_from(value: Value) -> SchemaResult<Self> {
                    match value {
                        Value::$variant(inner) => Ok(inner),
                        other => Err(mismatch($name, &other)),
                    }
                }
            }
        )*
    };
}

primitive_conversions! {
    bool => Bool, "bool";
    u8 => U8, "u8";
    u16 => U16, "u16";
    u32 => U32, "u32";
    u64 => U64, "u64";
    i8 => I8, "i8";
    i16 => I16, "i16";
    i32 => I32, "i32";
    i64 => I64, "i64";
    f32 => F32, "f32";
    f64 => F64, "f64";
    String => Text, "text";
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        Self::Optional(value.map(|inner| Box::new(inner.into())))
    }
}

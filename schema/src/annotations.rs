//! Per-field annotations: endianness, bit width, element count, text length, omission.

use std::fmt;
use std::str::FromStr;

use bitstream::Endian;

use crate::error::{SchemaError, SchemaResult};

/// The recognized annotation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationKey {
    Endian,
    Bits,
    Size,
    Strlen,
    Omit,
}

impl AnnotationKey {
    /// All keys, in tag order.
    pub const ALL: [Self; 5] = [Self::Endian, Self::Bits, Self::Size, Self::Strlen, Self::Omit];

    /// Parses a tag key.
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|candidate| candidate.as_str() == key)
    }

    /// Returns the tag spelling of the key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Endian => "endian",
            Self::Bits => "bits",
            Self::Size => "size",
            Self::Strlen => "strlen",
            Self::Omit => "omit",
        }
    }
}

impl fmt::Display for AnnotationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A numeric annotation: either a literal or a back-reference to an
/// earlier integer field in scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SizeSpec {
    Literal(u64),
    Reference(String),
}

impl SizeSpec {
    /// Parses a literal first, falling back to a field reference.
    ///
    /// Fails if the value is neither a non-negative integer nor an identifier.
    pub fn parse(key: AnnotationKey, value: &str) -> SchemaResult<Self> {
        if let Ok(literal) = value.parse::<u64>() {
            return Ok(Self::Literal(literal));
        }
        if is_identifier(value) {
            return Ok(Self::Reference(value.to_owned()));
        }
        Err(SchemaError::InvalidAnnotation {
            key,
            value: value.to_owned(),
        })
    }

    /// Returns the referenced field name, if this is a back-reference.
    #[must_use]
    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::Literal(_) => None,
            Self::Reference(name) => Some(name),
        }
    }
}

impl From<u64> for SizeSpec {
    fn from(value: u64) -> Self {
        Self::Literal(value)
    }
}

/// Literal if the text is a non-negative integer, a reference otherwise.
///
/// Reference names are checked when the owning record is built.
impl From<&str> for SizeSpec {
    fn from(value: &str) -> Self {
        value
            .parse::<u64>()
            .map_or_else(|_| Self::Reference(value.to_owned()), Self::Literal)
    }
}

impl From<String> for SizeSpec {
    fn from(value: String) -> Self {
        match value.parse::<u64>() {
            Ok(literal) => Self::Literal(literal),
            Err(_) => Self::Reference(value),
        }
    }
}

impl fmt::Display for SizeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{value}"),
            Self::Reference(name) => f.write_str(name),
        }
    }
}

/// The annotation set attached to one field.
///
/// Aggregates never pass their own endianness down; every leaf resolves its
/// own. Elements of arrays and sequences share the annotations of the field
/// that declares them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Annotations {
    pub endian: Endian,
    pub bits: Option<SizeSpec>,
    pub size: Option<SizeSpec>,
    pub strlen: Option<SizeSpec>,
    pub omit: bool,
}

impl Annotations {
    /// Creates an empty annotation set (little-endian, nothing else).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the byte order.
    #[must_use]
    pub fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    /// Sets the bit width.
    #[must_use]
    pub fn with_bits(mut self, bits: impl Into<SizeSpec>) -> Self {
        self.bits = Some(bits.into());
        self
    }

    /// Sets the sequence element count.
    #[must_use]
    pub fn with_size(mut self, size: impl Into<SizeSpec>) -> Self {
        self.size = Some(size.into());
        self
    }

    /// Sets the text length in bytes.
    #[must_use]
    pub fn with_strlen(mut self, strlen: impl Into<SizeSpec>) -> Self {
        self.strlen = Some(strlen.into());
        self
    }

    /// Marks the field as omitted from the wire.
    #[must_use]
    pub fn omitted(mut self) -> Self {
        self.omit = true;
        self
    }

    /// Iterates the numeric annotations that are present.
    pub fn size_specs(&self) -> impl Iterator<Item = (AnnotationKey, &SizeSpec)> {
        [
            (AnnotationKey::Bits, self.bits.as_ref()),
            (AnnotationKey::Size, self.size.as_ref()),
            (AnnotationKey::Strlen, self.strlen.as_ref()),
        ]
        .into_iter()
        .filter_map(|(key, spec)| spec.map(|spec| (key, spec)))
    }

    fn apply(&mut self, key: AnnotationKey, value: &str) -> SchemaResult<()> {
        match key {
            AnnotationKey::Endian => {
                self.endian =
                    Endian::parse(value).ok_or_else(|| SchemaError::InvalidAnnotation {
                        key,
                        value: value.to_owned(),
                    })?;
            }
            AnnotationKey::Bits => self.bits = Some(SizeSpec::parse(key, value)?),
            AnnotationKey::Size => self.size = Some(SizeSpec::parse(key, value)?),
            AnnotationKey::Strlen => self.strlen = Some(SizeSpec::parse(key, value)?),
            AnnotationKey::Omit => self.omit = true,
        }
        Ok(())
    }
}

/// Parses struct-tag syntax: whitespace-separated `key:"value"` pairs.
///
/// ```
/// use schema::{Annotations, SizeSpec};
/// use bitstream::Endian;
///
/// let tag: Annotations = r#"bits:"13" endian:"big""#.parse().unwrap();
/// assert_eq!(tag.bits, Some(SizeSpec::Literal(13)));
/// assert_eq!(tag.endian, Endian::Big);
/// ```
impl FromStr for Annotations {
    type Err = SchemaError;

    fn from_str(tag: &str) -> SchemaResult<Self> {
        let malformed = || SchemaError::MalformedTag {
            tag: tag.to_owned(),
        };

        let mut annotations = Self::default();
        let mut seen = Vec::new();
        let mut rest = tag.trim_start();
        while !rest.is_empty() {
            let (key, after) = rest.split_once(':').ok_or_else(malformed)?;
            let quoted = after.strip_prefix('"').ok_or_else(malformed)?;
            let (value, remainder) = quoted.split_once('"').ok_or_else(malformed)?;

            let key = AnnotationKey::parse(key).ok_or_else(|| SchemaError::UnknownAnnotation {
                key: key.to_owned(),
            })?;
            if seen.contains(&key) {
                return Err(SchemaError::DuplicateAnnotation { key });
            }
            seen.push(key);
            annotations.apply(key, value)?;
            rest = remainder.trim_start();
        }
        Ok(annotations)
    }
}

/// Returns `true` for names usable as back-references.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tag_is_default() {
        let tag: Annotations = "".parse().unwrap();
        assert_eq!(tag, Annotations::default());
        assert_eq!(tag.endian, Endian::Little);
    }

    #[test]
    fn parses_all_keys() {
        let tag: Annotations = r#"endian:"big" bits:"4" size:"N" strlen:"8" omit:"""#
            .parse()
            .unwrap();
        assert_eq!(tag.endian, Endian::Big);
        assert_eq!(tag.bits, Some(SizeSpec::Literal(4)));
        assert_eq!(tag.size, Some(SizeSpec::Reference("N".into())));
        assert_eq!(tag.strlen, Some(SizeSpec::Literal(8)));
        assert!(tag.omit);
    }

    #[test]
    fn rejects_unknown_key() {
        let err = r#"width:"4""#.parse::<Annotations>().unwrap_err();
        assert!(matches!(err, SchemaError::UnknownAnnotation { key } if key == "width"));
    }

    #[test]
    fn rejects_invalid_endian() {
        let err = r#"endian:"middle""#.parse::<Annotations>().unwrap_err();
        assert!(matches!(
            err,
            SchemaError::InvalidAnnotation {
                key: AnnotationKey::Endian,
                ..
            }
        ));
    }

    #[test]
    fn rejects_negative_size() {
        let err = r#"size:"-1""#.parse::<Annotations>().unwrap_err();
        assert!(matches!(
            err,
            SchemaError::InvalidAnnotation {
                key: AnnotationKey::Size,
                ..
            }
        ));
    }

    #[test]
    fn rejects_malformed_tags() {
        for tag in ["bits", r#"bits:4"#, r#"bits:"4"#] {
            let err = tag.parse::<Annotations>().unwrap_err();
            assert!(matches!(err, SchemaError::MalformedTag { .. }), "{tag}");
        }
    }

    #[test]
    fn rejects_duplicate_keys() {
        let err = r#"bits:"4" bits:"5""#.parse::<Annotations>().unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateAnnotation {
                key: AnnotationKey::Bits
            }
        );
    }

    #[test]
    fn size_spec_from_str_prefers_literal() {
        assert_eq!(SizeSpec::from("12"), SizeSpec::Literal(12));
        assert_eq!(SizeSpec::from("len"), SizeSpec::Reference("len".into()));
        assert_eq!(SizeSpec::from(String::from("7")), SizeSpec::Literal(7));
    }

    #[test]
    fn builder_sets_fields() {
        let tag = Annotations::new()
            .with_endian(Endian::Big)
            .with_bits("13")
            .with_size("count")
            .omitted();
        assert_eq!(tag.endian, Endian::Big);
        assert_eq!(tag.bits, Some(SizeSpec::Literal(13)));
        assert_eq!(tag.size.as_ref().and_then(SizeSpec::reference), Some("count"));
        assert!(tag.omit);
        assert_eq!(tag.size_specs().count(), 2);
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("N"));
        assert!(is_identifier("_len2"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("2len"));
        assert!(!is_identifier("a-b"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_roundtrip() {
        let tag = Annotations::new().with_endian(Endian::Big).with_strlen("4");
        let json = serde_json::to_string(&tag).unwrap();
        assert!(json.contains("\"big\""));
        let back: Annotations = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tag);
    }
}

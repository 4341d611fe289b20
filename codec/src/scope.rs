//! Back-reference resolution.

use std::collections::HashMap;

use schema::{AnnotationKey, Primitive, SizeSpec};

use crate::error::{CodecError, CodecResult};

/// Integer values of the fields processed so far at one nesting level.
///
/// A nested record starts from a copy of its parent's scope; nothing it
/// publishes is visible to the parent afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    values: HashMap<String, i128>,
}

impl Scope {
    /// Creates an empty root scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of this scope for a nested record.
    #[must_use]
    pub fn child(&self) -> Self {
        self.clone()
    }

    /// Records the value of a field, replacing any earlier value.
    pub fn publish(&mut self, name: &str, value: i128) {
        self.values.insert(name.to_owned(), value);
    }

    /// The last value published under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<i128> {
        self.values.get(name).copied()
    }

    /// Resolves a literal or back-reference to a non-negative value.
    pub fn resolve(&self, key: AnnotationKey, spec: &SizeSpec) -> CodecResult<u64> {
        let value = match spec {
            SizeSpec::Literal(value) => return Ok(*value),
            SizeSpec::Reference(name) => {
                self.get(name)
                    .ok_or_else(|| CodecError::UnresolvedReference {
                        key,
                        name: name.clone(),
                    })?
            }
        };
        u64::try_from(value).map_err(|_| CodecError::InvalidSize {
            key,
            value,
            max: u64::MAX,
        })
    }

    /// Resolves an element or byte count.
    pub fn resolve_count(&self, key: AnnotationKey, spec: &SizeSpec) -> CodecResult<usize> {
        let value = self.resolve(key, spec)?;
        usize::try_from(value).map_err(|_| CodecError::InvalidSize {
            key,
            value: i128::from(value),
            max: usize::MAX as u64,
        })
    }

    /// Resolves a `bits` width for `primitive`.
    ///
    /// The width must lie in `1..=` the natural width, and signed fields need
    /// at least two bits.
    pub fn resolve_width(&self, spec: &SizeSpec, primitive: Primitive) -> CodecResult<u32> {
        let value = self.resolve(AnnotationKey::Bits, spec)?;
        let max = primitive.bit_width();
        let min = if primitive.is_signed() { 2 } else { 1 };
        match u32::try_from(value) {
            Ok(width) if (min..=max).contains(&width) => Ok(width),
            _ => Err(CodecError::InvalidSize {
                key: AnnotationKey::Bits,
                value: i128::from(value),
                max: u64::from(max),
            }),
        }
    }
}

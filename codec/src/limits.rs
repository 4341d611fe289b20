//! Limits for codec-level encoding and decoding.

/// Limits enforced while walking a shape.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CodecLimits {
    /// Maximum structural nesting depth.
    pub max_depth: usize,
    /// Maximum number of elements in one sequence or bytes in one text field.
    pub max_elements: usize,
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_depth: 128,
            max_elements: 1 << 24,
        }
    }
}

impl CodecLimits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_depth: 16,
            max_elements: 4096,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_depth: usize::MAX,
            max_elements: usize::MAX,
        }
    }
}

//! Byte order for multi-byte and multi-bit fields.

use std::fmt;

/// Byte order of a field on the wire.
///
/// Defaults to little-endian. Bit order inside a byte is always
/// least-significant-first regardless of this setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Endian {
    /// Least-significant byte first.
    #[default]
    Little,
    /// Most-significant byte first.
    Big,
}

impl Endian {
    /// Parses the annotation spelling (`little` or `big`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "little" => Some(Self::Little),
            "big" => Some(Self::Big),
            _ => None,
        }
    }

    /// Returns the annotation spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Little => "little",
            Self::Big => "big",
        }
    }
}

impl fmt::Display for Endian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

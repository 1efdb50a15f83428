#![forbid(unsafe_code)]

//! Trap path: the one logical location a lock session pins navigation to.

use core::fmt;

use thiserror::Error;

/// Longest accepted trap path, in bytes.
pub const TRAP_PATH_MAX_LEN: usize = 256;

/// Why a candidate trap path was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrapPathError {
    #[error("trap path is empty")]
    Empty,
    #[error("trap path is {len} bytes, limit is {max}", max = TRAP_PATH_MAX_LEN)]
    TooLong { len: usize },
    #[error("trap path contains whitespace or a control character at byte {index}")]
    InvalidCharacter { index: usize },
}

/// Immutable logical location used for every corrective history entry.
///
/// The path is stored without a leading slash (`"timeout"`). Hosts that need
/// a URL form use [`TrapPath::href`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrapPath(String);

impl TrapPath {
    /// Validate and normalize a trap path. A single leading `/` is accepted
    /// and stripped.
    pub fn new(raw: &str) -> Result<Self, TrapPathError> {
        let trimmed = raw.strip_prefix('/').unwrap_or(raw);
        if trimmed.is_empty() {
            return Err(TrapPathError::Empty);
        }
        if trimmed.len() > TRAP_PATH_MAX_LEN {
            return Err(TrapPathError::TooLong { len: trimmed.len() });
        }
        if let Some((index, _)) = trimmed
            .char_indices()
            .find(|(_, ch)| ch.is_whitespace() || ch.is_control())
        {
            return Err(TrapPathError::InvalidCharacter { index });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Logical location, e.g. `"timeout"`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Root-relative URL form, e.g. `"/timeout"`.
    #[must_use]
    pub fn href(&self) -> String {
        format!("/{}", self.0)
    }
}

impl fmt::Display for TrapPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TrapPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for TrapPath {
    type Error = TrapPathError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

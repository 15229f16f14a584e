//! Administrative level of a location node.
//!
//! Top-level nodes carry a user-assigned level. Every other node's level is
//! derived from its parent's via [`AdminLevel::child_of`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Deepest supported administrative level.
pub const MAX_ADMIN_LEVEL: u8 = 5;

/// Stored value marking a level beyond [`MAX_ADMIN_LEVEL`].
pub const ADMIN_LEVEL_OUT_OF_RANGE: u16 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum AdminLevel {
    /// A supported level in `0..=5`
    Level(u8),
    /// Deeper than the supported range
    OutOfRange,
}

impl AdminLevel {
    pub const ROOT: AdminLevel = AdminLevel::Level(0);

    /// Every supported (in-range) level, shallowest first.
    pub fn supported() -> impl Iterator<Item = AdminLevel> {
        (0..=MAX_ADMIN_LEVEL).map(AdminLevel::Level)
    }

    /// A user-assigned level. Only the supported range is accepted.
    pub fn new(level: u8) -> Result<Self, DomainError> {
        if level > MAX_ADMIN_LEVEL {
            return Err(DomainError::validation(format!(
                "Admin level must be between 0 and {}, got {}",
                MAX_ADMIN_LEVEL, level
            )));
        }
        Ok(Self::Level(level))
    }

    /// Level of a node whose parent is at `parent_level`.
    ///
    /// A parent without a recorded level counts as level 0. Anything past
    /// [`MAX_ADMIN_LEVEL`] collapses to [`AdminLevel::OutOfRange`].
    pub fn child_of(parent_level: Option<AdminLevel>) -> AdminLevel {
        match parent_level.unwrap_or(Self::ROOT) {
            Self::Level(level) if level < MAX_ADMIN_LEVEL => Self::Level(level + 1),
            _ => Self::OutOfRange,
        }
    }

    /// The stored integer form: `0..=5`, or 100 when out of range.
    pub fn value(self) -> u16 {
        match self {
            Self::Level(level) => u16::from(level),
            Self::OutOfRange => ADMIN_LEVEL_OUT_OF_RANGE,
        }
    }

    pub fn is_out_of_range(self) -> bool {
        matches!(self, Self::OutOfRange)
    }
}

impl fmt::Display for AdminLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl TryFrom<u16> for AdminLevel {
    type Error = DomainError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            ADMIN_LEVEL_OUT_OF_RANGE => Ok(Self::OutOfRange),
            v => u8::try_from(v)
                .map_err(|_| DomainError::parse(format!("Unknown admin level: {}", v)))
                .and_then(|v| {
                    Self::new(v).map_err(|_| DomainError::parse(format!("Unknown admin level: {}", v)))
                }),
        }
    }
}

impl From<AdminLevel> for u16 {
    fn from(level: AdminLevel) -> u16 {
        level.value()
    }
}

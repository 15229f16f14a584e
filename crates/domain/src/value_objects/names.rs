//! Validated name newtypes for location nodes
//!
//! These newtypes ensure that names are valid by construction:
//! - Non-empty
//! - Within length limits
//! - Trimmed of leading/trailing whitespace

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;
use crate::value_objects::path_codec::SEPARATOR;

/// Maximum length for a placename
const MAX_PLACENAME_LENGTH: usize = 200;

/// Maximum length for a location code
const MAX_CODE_LENGTH: usize = 64;

// ============================================================================
// Placename
// ============================================================================

/// A validated placename (non-empty, <=200 chars, trimmed, no `::`)
///
/// The placename is a node's own leaf name. It never contains the compound
/// name separator, so a compound name always decodes back to the same path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Placename(String);

impl Placename {
    /// Create a new validated placename.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if:
    /// - The name is empty after trimming
    /// - The name exceeds 200 characters after trimming
    /// - The name contains the `::` separator
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Placename cannot be empty"));
        }
        if trimmed.chars().count() > MAX_PLACENAME_LENGTH {
            return Err(DomainError::validation(format!(
                "Placename cannot exceed {} characters",
                MAX_PLACENAME_LENGTH
            )));
        }
        if trimmed.contains(SEPARATOR) {
            return Err(DomainError::validation(format!(
                "Placename cannot contain '{}'",
                SEPARATOR
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Placename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Placename {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Placename> for String {
    fn from(name: Placename) -> String {
        name.0
    }
}

impl AsRef<str> for Placename {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// LocationCode
// ============================================================================

/// A validated administrative code (non-empty, <=64 chars, trimmed)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocationCode(String);

impl LocationCode {
    pub fn new(code: impl Into<String>) -> Result<Self, DomainError> {
        let code = code.into();
        let trimmed = code.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Location code cannot be empty"));
        }
        if trimmed.chars().count() > MAX_CODE_LENGTH {
            return Err(DomainError::validation(format!(
                "Location code cannot exceed {} characters",
                MAX_CODE_LENGTH
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for LocationCode {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<LocationCode> for String {
    fn from(code: LocationCode) -> String {
        code.0
    }
}

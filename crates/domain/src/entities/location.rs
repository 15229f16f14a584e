//! Location type vocabulary.
//!
//! Informational only: the type never constrains where a node may sit in the
//! tree, it just feeds the type-filtered index views.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// The kind of administrative area a location represents
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    Country,
    Region,
    Province,
    District,
    Governorate,
    Chiefdom,
    County,
    State,
    City,
    Camp,
    Site,
    Village,
    Zone,
    /// Anything not covered above
    #[default]
    Other,
}

impl LocationType {
    pub const ALL: [LocationType; 14] = [
        Self::Country,
        Self::Region,
        Self::Province,
        Self::District,
        Self::Governorate,
        Self::Chiefdom,
        Self::County,
        Self::State,
        Self::City,
        Self::Camp,
        Self::Site,
        Self::Village,
        Self::Zone,
        Self::Other,
    ];

    /// Get the string representation for storage and index keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::Region => "region",
            Self::Province => "province",
            Self::District => "district",
            Self::Governorate => "governorate",
            Self::Chiefdom => "chiefdom",
            Self::County => "county",
            Self::State => "state",
            Self::City => "city",
            Self::Camp => "camp",
            Self::Site => "site",
            Self::Village => "village",
            Self::Zone => "zone",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocationType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| DomainError::parse(format!("Unknown location type: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("District".parse::<LocationType>(), Ok(LocationType::District));
        assert_eq!(" camp ".parse::<LocationType>(), Ok(LocationType::Camp));
    }

    #[test]
    fn rejects_unknown_types() {
        assert!(matches!(
            "moon".parse::<LocationType>(),
            Err(DomainError::Parse(_))
        ));
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&LocationType::Governorate).expect("serialize");
        assert_eq!(json, "\"governorate\"");
    }

    #[test]
    fn every_type_round_trips_through_as_str() {
        for t in LocationType::ALL {
            assert_eq!(t.as_str().parse::<LocationType>(), Ok(t));
        }
    }
}

//! Errors surfaced by hierarchy operations.

use placetree_domain::{DomainError, LocationId};

use crate::infrastructure::ports::RepoError;

#[derive(Debug, thiserror::Error)]
pub enum HierarchyError {
    /// Rejected before any write happened
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A target the operation needs does not exist
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Depth bound exceeded, cycle detected, or an impossible move
    #[error("Structural error: {0}")]
    Structural(String),

    /// The store failed. `last_written` is the last node a cascade managed
    /// to persist before the failure; nodes after it are unchanged.
    #[error("Persistence failed (last written: {}): {source}", describe_last(.last_written))]
    Persistence {
        last_written: Option<LocationId>,
        #[source]
        source: RepoError,
    },
}

fn describe_last(last_written: &Option<LocationId>) -> String {
    match last_written {
        Some(id) => id.to_string(),
        None => "none".to_string(),
    }
}

impl HierarchyError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    pub fn structural(msg: impl Into<String>) -> Self {
        Self::Structural(msg.into())
    }

    pub fn persistence(last_written: Option<LocationId>, source: RepoError) -> Self {
        Self::Persistence {
            last_written,
            source,
        }
    }

    /// Fill in `last_written` on a persistence error that does not carry one.
    /// A cascade that fails before its own first write reports the last write
    /// of whatever step ran before it.
    pub fn or_last_written(self, fallback: Option<LocationId>) -> Self {
        match self {
            Self::Persistence {
                last_written: None,
                source,
            } => Self::Persistence {
                last_written: fallback,
                source,
            },
            other => other,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural(_))
    }
}

impl From<DomainError> for HierarchyError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => Self::Validation(msg),
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<RepoError> for HierarchyError {
    fn from(err: RepoError) -> Self {
        Self::persistence(None, err)
    }
}

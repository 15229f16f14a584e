//! Storage failures surfaced through [`super::LocationRepo`].

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// The backing store could not complete `operation`.
    #[error("Storage error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    /// A write would break an index constraint, such as a taken compound name.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl RepoError {
    pub fn database(operation: &'static str, message: impl ToString) -> Self {
        Self::Database {
            operation,
            message: message.to_string(),
        }
    }

    pub fn constraint(message: impl ToString) -> Self {
        Self::ConstraintViolation(message.to_string())
    }
}

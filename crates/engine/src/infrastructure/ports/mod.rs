//! Port traits for infrastructure boundaries.
//!
//! Storage is the only abstraction the engine needs: the in-memory adapter
//! and the caching decorator both implement [`LocationRepo`].

mod error;
mod repos;

pub use error::RepoError;
pub use repos::LocationRepo;

// =============================================================================
// Test-Only Mock Repositories (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use repos::MockLocationRepo;

//! Repository port for location storage.

use async_trait::async_trait;
use placetree_domain::{Location, LocationId};

use super::error::RepoError;
use crate::infrastructure::index::IndexQuery;

// =============================================================================
// Location Storage
// =============================================================================

/// Storage collaborator for location nodes.
///
/// Every `put` is independently durable and updates the index views before
/// it returns, so a `lookup` issued after a `put` observes the write. No
/// multi-record transaction is offered.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationRepo: Send + Sync {
    async fn get(&self, id: LocationId) -> Result<Option<Location>, RepoError>;

    /// Fetch several records. Missing ids are skipped; order follows `ids`.
    async fn get_many(&self, ids: &[LocationId]) -> Result<Vec<Location>, RepoError>;

    /// Insert or replace a record and re-index it.
    async fn put(&self, location: &Location) -> Result<(), RepoError>;

    async fn exists(&self, id: LocationId) -> Result<bool, RepoError>;

    /// Ids listed under one index key. A missing key yields an empty list.
    async fn lookup(&self, query: &IndexQuery) -> Result<Vec<LocationId>, RepoError>;
}

//! Shared fixtures for hierarchy tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use placetree_domain::{Location, LocationId, LocationType, Placename};

use crate::infrastructure::index::IndexQuery;
use crate::infrastructure::ports::{LocationRepo, RepoError};

pub(crate) fn place(name: &str, location_type: LocationType) -> Location {
    Location::new(Placename::new(name).expect("valid placename"), location_type)
}

/// Repo wrapper whose writes start failing after a fixed number of successes.
pub(crate) struct FlakyRepo {
    inner: Arc<dyn LocationRepo>,
    puts_left: AtomicUsize,
}

impl FlakyRepo {
    pub(crate) fn failing_after(inner: Arc<dyn LocationRepo>, successful_puts: usize) -> Self {
        Self {
            inner,
            puts_left: AtomicUsize::new(successful_puts),
        }
    }
}

#[async_trait]
impl LocationRepo for FlakyRepo {
    async fn get(&self, id: LocationId) -> Result<Option<Location>, RepoError> {
        self.inner.get(id).await
    }

    async fn get_many(&self, ids: &[LocationId]) -> Result<Vec<Location>, RepoError> {
        self.inner.get_many(ids).await
    }

    async fn put(&self, location: &Location) -> Result<(), RepoError> {
        let allowed = self
            .puts_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if !allowed {
            return Err(RepoError::database("put", "connection reset"));
        }
        self.inner.put(location).await
    }

    async fn exists(&self, id: LocationId) -> Result<bool, RepoError> {
        self.inner.exists(id).await
    }

    async fn lookup(&self, query: &IndexQuery) -> Result<Vec<LocationId>, RepoError> {
        self.inner.lookup(query).await
    }
}

//! Caching decorator for a [`LocationRepo`].
//!
//! Applied at composition time when the query cache is enabled. Index lookups
//! are served from a [`QueryCache`] keyed by the [`IndexQuery`]; every `put`
//! invalidates the whole cache, so a read after a write never sees stale ids.
//! Record reads always go to the wrapped store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use placetree_domain::{Location, LocationId};

use super::cache::QueryCache;
use super::index::IndexQuery;
use super::ports::{LocationRepo, RepoError};

pub struct CachedLocationRepo {
    inner: Arc<dyn LocationRepo>,
    lookups: QueryCache<IndexQuery, Vec<LocationId>>,
}

impl CachedLocationRepo {
    pub fn new(inner: Arc<dyn LocationRepo>, ttl: Duration) -> Self {
        Self {
            inner,
            lookups: QueryCache::new(ttl),
        }
    }

    #[cfg(test)]
    async fn cached_lookups(&self) -> usize {
        self.lookups.len().await
    }
}

#[async_trait]
impl LocationRepo for CachedLocationRepo {
    async fn get(&self, id: LocationId) -> Result<Option<Location>, RepoError> {
        self.inner.get(id).await
    }

    async fn get_many(&self, ids: &[LocationId]) -> Result<Vec<Location>, RepoError> {
        self.inner.get_many(ids).await
    }

    async fn put(&self, location: &Location) -> Result<(), RepoError> {
        let result = self.inner.put(location).await;
        self.lookups.invalidate_all().await;
        result
    }

    async fn exists(&self, id: LocationId) -> Result<bool, RepoError> {
        self.inner.exists(id).await
    }

    async fn lookup(&self, query: &IndexQuery) -> Result<Vec<LocationId>, RepoError> {
        let generation = self.lookups.generation().await;
        if let Some(ids) = self.lookups.get(query).await {
            tracing::trace!(?query, "Index lookup served from cache");
            return Ok(ids);
        }

        let ids = self.inner.lookup(query).await?;
        self.lookups
            .insert_if_current(query.clone(), ids.clone(), generation)
            .await;
        Ok(ids)
    }
}

//! In-memory location store for development and testing
//!
//! Records and the hierarchy index live behind one lock, so a `put` updates
//! both atomically and every later `lookup` sees the new index state. Nothing
//! is persisted across process restarts.

use std::collections::HashMap;

use async_trait::async_trait;
use placetree_domain::{Location, LocationId};
use tokio::sync::RwLock;

use crate::infrastructure::index::{HierarchyIndex, IndexQuery};
use crate::infrastructure::ports::{LocationRepo, RepoError};

#[derive(Default)]
struct State {
    records: HashMap<LocationId, Location>,
    index: HierarchyIndex,
}

/// In-memory [`LocationRepo`] implementation
#[derive(Default)]
pub struct InMemoryLocationRepo {
    state: RwLock<State>,
}

impl InMemoryLocationRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.records.is_empty()
    }
}

#[async_trait]
impl LocationRepo for InMemoryLocationRepo {
    async fn get(&self, id: LocationId) -> Result<Option<Location>, RepoError> {
        Ok(self.state.read().await.records.get(&id).cloned())
    }

    async fn get_many(&self, ids: &[LocationId]) -> Result<Vec<Location>, RepoError> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.records.get(id).cloned())
            .collect())
    }

    async fn put(&self, location: &Location) -> Result<(), RepoError> {
        let mut state = self.state.write().await;
        let State { records, index } = &mut *state;

        index
            .apply(records.get(&location.id()), location)
            .map_err(RepoError::constraint)?;
        records.insert(location.id(), location.clone());

        tracing::debug!(
            location_id = %location.id(),
            compound_name = location.compound_name(),
            indexed = index.len(),
            "Stored location"
        );
        Ok(())
    }

    async fn exists(&self, id: LocationId) -> Result<bool, RepoError> {
        Ok(self.state.read().await.records.contains_key(&id))
    }

    async fn lookup(&self, query: &IndexQuery) -> Result<Vec<LocationId>, RepoError> {
        Ok(self.state.read().await.index.lookup(query))
    }
}

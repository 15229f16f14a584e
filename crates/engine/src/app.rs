//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::cached_location_repo::CachedLocationRepo;
use crate::infrastructure::config::EngineConfig;
use crate::infrastructure::memory::InMemoryLocationRepo;
use crate::infrastructure::ports::LocationRepo;
use crate::use_cases::HierarchyStore;

/// Main application state.
pub struct App {
    pub config: EngineConfig,
    pub locations: Arc<dyn LocationRepo>,
    pub hierarchy: HierarchyStore,
}

impl App {
    /// Compose the engine over the in-memory store.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_repo(config, Arc::new(InMemoryLocationRepo::new()))
    }

    /// Compose the engine over any store. The lookup cache wraps it when
    /// enabled in `config`.
    pub fn with_repo(config: EngineConfig, repo: Arc<dyn LocationRepo>) -> Self {
        let locations: Arc<dyn LocationRepo> = if config.query_cache {
            tracing::info!(
                ttl_secs = config.query_cache_ttl.as_secs(),
                "Lookup cache enabled"
            );
            Arc::new(CachedLocationRepo::new(repo, config.query_cache_ttl))
        } else {
            repo
        };
        let hierarchy = HierarchyStore::new(Arc::clone(&locations), config.max_depth);

        Self {
            config,
            locations,
            hierarchy,
        }
    }
}

//! Invalidation-aware query cache.
//!
//! Entries expire after a TTL and are dropped wholesale by [`QueryCache::invalidate_all`].
//! Every invalidation bumps a generation counter; a value computed before an
//! invalidation is refused by [`QueryCache::insert_if_current`], so a slow
//! reader can never re-populate the cache with a pre-write result.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// A thread-safe cache keyed by query signature.
pub struct QueryCache<K, V> {
    inner: RwLock<Inner<K, V>>,
    ttl: Duration,
}

struct Inner<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    generation: u64,
}

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    /// Create a new cache with the specified TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: HashMap::new(),
                generation: 0,
            }),
            ttl,
        }
    }

    /// Current generation. Read it before computing a value to cache.
    pub async fn generation(&self) -> u64 {
        self.inner.read().await.generation
    }

    /// Insert a value unless the cache was invalidated since `generation`.
    /// Returns whether the value was stored. Expired entries are swept on
    /// every insert.
    pub async fn insert_if_current(&self, key: K, value: V, generation: u64) -> bool {
        let mut guard = self.inner.write().await;
        if guard.generation != generation {
            return false;
        }
        let ttl = self.ttl;
        let before = guard.entries.len();
        guard.entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);
        let swept = before - guard.entries.len();
        if swept > 0 {
            tracing::debug!(swept, "Dropped expired cache entries");
        }
        guard.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
        true
    }

    /// Insert a value with an explicit timestamp (tests only).
    #[cfg(test)]
    pub async fn insert_at(&self, key: K, value: V, inserted_at: Instant) {
        let entry = CacheEntry { value, inserted_at };
        self.inner.write().await.entries.insert(key, entry);
    }

    /// Get a value if it exists and hasn't expired.
    pub async fn get(&self, key: &K) -> Option<V> {
        let guard = self.inner.read().await;
        guard.entries.get(key).and_then(|entry| {
            if entry.inserted_at.elapsed() < self.ttl {
                Some(entry.value.clone())
            } else {
                None
            }
        })
    }

    /// Drop every entry and start a new generation.
    pub async fn invalidate_all(&self) {
        let mut guard = self.inner.write().await;
        guard.entries.clear();
        guard.generation = guard.generation.wrapping_add(1);
    }

    /// Number of entries, expired ones included.
    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    #[cfg(test)]
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }
}

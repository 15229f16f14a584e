//! Per-subtree write serialization.
//!
//! Structural writes read a node, derive new state from its ancestors and
//! write it back. Two such writes interleaving inside one tree could each
//! act on a stale ancestor snapshot, so every write to a tree holds the lock
//! of its top-level node. Disjoint trees proceed in parallel.

use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = DashMap<String, Arc<Mutex<()>>>;

/// Async locks keyed by the compound name of a top-level node.
///
/// An entry lives only while some writer holds or waits for it.
#[derive(Default)]
pub struct SubtreeLocks {
    locks: Arc<LockMap>,
}

/// Held for the duration of one structural write.
pub struct SubtreeGuard {
    roots: Vec<String>,
    guards: Vec<OwnedMutexGuard<()>>,
    locks: Arc<LockMap>,
}

impl SubtreeGuard {
    pub fn roots(&self) -> &[String] {
        &self.roots
    }
}

impl Drop for SubtreeGuard {
    fn drop(&mut self) {
        self.guards.clear();
        // The map's own handle is the only one left when nobody is waiting.
        for root in &self.roots {
            self.locks
                .remove_if(root, |_, lock| Arc::strong_count(lock) == 1);
        }
    }
}

impl SubtreeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock every named tree. Keys are taken in sorted order so two writers
    /// spanning the same pair of trees cannot deadlock.
    pub async fn acquire<I, S>(&self, roots: I) -> SubtreeGuard
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let roots: BTreeSet<String> = roots.into_iter().map(Into::into).collect();
        let mut guards = Vec::with_capacity(roots.len());
        for root in &roots {
            let lock = self.locks.entry(root.clone()).or_default().value().clone();
            guards.push(lock.lock_owned().await);
        }
        SubtreeGuard {
            roots: roots.into_iter().collect(),
            guards,
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of trees with a live lock entry.
    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn keys_are_deduplicated_and_sorted() {
        let locks = SubtreeLocks::new();
        let guard = locks.acquire(["Sierra Leone", "Liberia", "Sierra Leone"]).await;
        assert_eq!(
            guard.roots().to_vec(),
            vec!["Liberia".to_string(), "Sierra Leone".to_string()]
        );
    }

    #[tokio::test]
    async fn same_tree_is_exclusive() {
        let locks = Arc::new(SubtreeLocks::new());
        let guard = locks.acquire(["Sierra Leone"]).await;

        let contender = Arc::clone(&locks);
        let waiting = tokio::spawn(async move {
            let _guard = contender.acquire(["Sierra Leone"]).await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());

        drop(guard);
        waiting.await.expect("contender finishes once released");
    }

    #[tokio::test]
    async fn disjoint_trees_do_not_block() {
        let locks = SubtreeLocks::new();
        let _first = locks.acquire(["Sierra Leone"]).await;
        let second = tokio::time::timeout(Duration::from_millis(100), locks.acquire(["Liberia"])).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn released_locks_are_evicted() {
        let locks = SubtreeLocks::new();
        let guard = locks.acquire(["Sierra Leone", "Liberia"]).await;
        assert_eq!(locks.len(), 2);

        drop(guard);
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn lock_with_a_waiter_survives_release() {
        let locks = Arc::new(SubtreeLocks::new());
        let guard = locks.acquire(["Sierra Leone"]).await;

        let contender = Arc::clone(&locks);
        let (acquired_tx, acquired_rx) = tokio::sync::oneshot::channel();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let waiting = tokio::spawn(async move {
            let _guard = contender.acquire(["Sierra Leone"]).await;
            acquired_tx.send(()).expect("test still listening");
            release_rx.await.ok();
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(guard);
        assert_eq!(locks.len(), 1);

        acquired_rx.await.expect("contender acquires");
        assert_eq!(locks.len(), 1);
        release_tx.send(()).expect("contender still running");
        waiting.await.expect("contender finishes");
        assert_eq!(locks.len(), 0);
    }
}

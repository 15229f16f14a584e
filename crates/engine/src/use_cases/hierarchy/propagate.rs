//! Admin level propagation down a subtree.

use std::collections::HashSet;
use std::sync::Arc;

use placetree_domain::{AdminLevel, Location, LocationId};

use super::error::HierarchyError;
use super::tree;
use crate::infrastructure::ports::LocationRepo;

/// Outcome of one propagation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationReport {
    /// Descendants examined
    pub visited: usize,
    /// Descendants whose stored record changed
    pub updated: usize,
    pub last_written: Option<LocationId>,
}

struct Frame {
    node: Location,
    parent_level: Option<AdminLevel>,
    depth: usize,
}

/// Recomputes the admin level of every descendant of a node.
///
/// The walk is an explicit depth-first traversal: a node is written before
/// any of its children is read, so each child is derived from a parent whose
/// stored level is already correct. Nodes already consistent are not
/// rewritten, which makes a second pass a no-op and a pass after a partial
/// failure resume where the first stopped.
pub struct DescendantPropagator {
    repo: Arc<dyn LocationRepo>,
    max_depth: usize,
}

impl DescendantPropagator {
    pub fn new(repo: Arc<dyn LocationRepo>, max_depth: usize) -> Self {
        Self { repo, max_depth }
    }

    /// Walk every descendant of `start`, using `start`'s current level.
    ///
    /// # Errors
    ///
    /// - `Structural` if the walk goes deeper than `max_depth` or meets a node twice
    /// - `Persistence` on the first failed read or write; `last_written` names
    ///   the last descendant this pass stored
    pub async fn propagate(&self, start: &Location) -> Result<PropagationReport, HierarchyError> {
        let mut report = PropagationReport::default();
        let mut visited: HashSet<LocationId> = HashSet::from([start.id()]);

        let children = tree::direct_children(self.repo.as_ref(), start)
            .await
            .map_err(|e| HierarchyError::persistence(None, e))?;
        let mut stack: Vec<Frame> = children
            .into_iter()
            .rev()
            .map(|node| Frame {
                node,
                parent_level: start.admin_level(),
                depth: 1,
            })
            .collect();

        while let Some(Frame {
            mut node,
            parent_level,
            depth,
        }) = stack.pop()
        {
            if depth > self.max_depth {
                return Err(HierarchyError::structural(format!(
                    "'{}' sits {} levels below '{}', deeper than the limit of {}",
                    node.compound_name(),
                    depth,
                    start.compound_name(),
                    self.max_depth
                )));
            }
            if !visited.insert(node.id()) {
                return Err(HierarchyError::structural(format!(
                    "'{}' was reached twice while walking '{}'; the hierarchy contains a cycle",
                    node.compound_name(),
                    start.compound_name()
                )));
            }
            report.visited += 1;

            // A top-level node keeps its assigned level and heads its own tree.
            if node.is_top_level() {
                continue;
            }

            let level_changed = node.apply_derived_admin_level(parent_level);
            let name_changed = node.refresh_compound_name();
            if level_changed || name_changed {
                self.repo
                    .put(&node)
                    .await
                    .map_err(|e| HierarchyError::persistence(report.last_written, e))?;
                report.updated += 1;
                report.last_written = Some(node.id());
                tracing::debug!(
                    location_id = %node.id(),
                    compound_name = node.compound_name(),
                    admin_level = ?node.admin_level(),
                    "Recalculated admin level"
                );
            }

            let children = tree::direct_children(self.repo.as_ref(), &node)
                .await
                .map_err(|e| HierarchyError::persistence(report.last_written, e))?;
            let level = node.admin_level();
            stack.extend(children.into_iter().rev().map(|child| Frame {
                node: child,
                parent_level: level,
                depth: depth + 1,
            }));
        }

        tracing::info!(
            location_id = %start.id(),
            compound_name = start.compound_name(),
            visited = report.visited,
            updated = report.updated,
            "Propagated admin levels"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::index::IndexQuery;
    use crate::infrastructure::memory::InMemoryLocationRepo;
    use crate::infrastructure::ports::{MockLocationRepo, RepoError};
    use crate::use_cases::hierarchy::test_support::{place, FlakyRepo};
    use placetree_domain::LocationType;

    async fn store(repo: &dyn LocationRepo, locations: &[&Location]) {
        for location in locations {
            repo.put(location).await.expect("put");
        }
    }

    async fn level_of(repo: &dyn LocationRepo, id: LocationId) -> Option<AdminLevel> {
        repo.get(id)
            .await
            .expect("get")
            .and_then(|l| l.admin_level())
    }

    #[tokio::test]
    async fn levels_follow_a_changed_root() {
        let repo: Arc<dyn LocationRepo> = Arc::new(InMemoryLocationRepo::new());
        let mut country = place("Sierra Leone", LocationType::Country).with_admin_level(AdminLevel::ROOT);
        let mut district = place("Bo", LocationType::District).under(&country);
        district.apply_derived_admin_level(Some(AdminLevel::ROOT));
        let mut town = place("Bo Town", LocationType::City).under(&district);
        town.apply_derived_admin_level(Some(AdminLevel::Level(1)));
        store(repo.as_ref(), &[&country, &district, &town]).await;

        country.set_admin_level(AdminLevel::Level(2)).expect("root level");
        repo.put(&country).await.expect("put");

        let propagator = DescendantPropagator::new(Arc::clone(&repo), 32);
        let report = propagator.propagate(&country).await.expect("propagate");

        assert_eq!(report.visited, 2);
        assert_eq!(report.updated, 2);
        assert_eq!(report.last_written, Some(town.id()));
        assert_eq!(level_of(repo.as_ref(), district.id()).await, Some(AdminLevel::Level(3)));
        assert_eq!(level_of(repo.as_ref(), town.id()).await, Some(AdminLevel::Level(4)));
    }

    #[tokio::test]
    async fn second_pass_changes_nothing() {
        let repo: Arc<dyn LocationRepo> = Arc::new(InMemoryLocationRepo::new());
        let country = place("Sierra Leone", LocationType::Country).with_admin_level(AdminLevel::ROOT);
        let district = place("Bo", LocationType::District).under(&country);
        let town = place("Bo Town", LocationType::City).under(&district);
        store(repo.as_ref(), &[&country, &district, &town]).await;

        let propagator = DescendantPropagator::new(Arc::clone(&repo), 32);
        propagator.propagate(&country).await.expect("first pass");
        let second = propagator.propagate(&country).await.expect("second pass");

        assert_eq!(second.visited, 2);
        assert_eq!(second.updated, 0);
        assert_eq!(level_of(repo.as_ref(), town.id()).await, Some(AdminLevel::Level(2)));
    }

    #[tokio::test]
    async fn deep_chains_clamp_to_out_of_range() {
        let repo: Arc<dyn LocationRepo> = Arc::new(InMemoryLocationRepo::new());
        let root = place("L0", LocationType::Country).with_admin_level(AdminLevel::ROOT);
        repo.put(&root).await.expect("put");

        let mut parent = root.clone();
        let mut ids = Vec::new();
        for depth in 1..=7 {
            let child = place(&format!("L{}", depth), LocationType::Zone).under(&parent);
            repo.put(&child).await.expect("put");
            ids.push(child.id());
            parent = child;
        }

        DescendantPropagator::new(Arc::clone(&repo), 32)
            .propagate(&root)
            .await
            .expect("propagate");

        assert_eq!(level_of(repo.as_ref(), ids[4]).await, Some(AdminLevel::Level(5)));
        assert_eq!(level_of(repo.as_ref(), ids[5]).await, Some(AdminLevel::OutOfRange));
        assert_eq!(level_of(repo.as_ref(), ids[6]).await, Some(AdminLevel::OutOfRange));
    }

    #[tokio::test]
    async fn depth_bound_is_a_structural_error() {
        let repo: Arc<dyn LocationRepo> = Arc::new(InMemoryLocationRepo::new());
        let root = place("L0", LocationType::Country).with_admin_level(AdminLevel::ROOT);
        let l1 = place("L1", LocationType::Region).under(&root);
        let l2 = place("L2", LocationType::District).under(&l1);
        let l3 = place("L3", LocationType::Village).under(&l2);
        store(repo.as_ref(), &[&root, &l1, &l2, &l3]).await;

        let err = DescendantPropagator::new(Arc::clone(&repo), 2)
            .propagate(&root)
            .await
            .unwrap_err();
        assert!(err.is_structural());
    }

    #[tokio::test]
    async fn same_placename_elsewhere_is_left_alone() {
        let repo: Arc<dyn LocationRepo> = Arc::new(InMemoryLocationRepo::new());
        let a = place("Sierra Leone", LocationType::Country).with_admin_level(AdminLevel::ROOT);
        let b = place("Liberia", LocationType::Country).with_admin_level(AdminLevel::Level(3));
        let a_central = place("Central", LocationType::Region).under(&a);
        let b_central = place("Central", LocationType::Region).under(&b);
        let mut a_town = place("Town", LocationType::City).under(&a_central);
        a_town.apply_derived_admin_level(Some(AdminLevel::Level(1)));
        let mut b_town = place("Town", LocationType::City).under(&b_central);
        b_town.apply_derived_admin_level(Some(AdminLevel::Level(4)));
        store(repo.as_ref(), &[&a, &b, &a_central, &b_central, &a_town, &b_town]).await;

        DescendantPropagator::new(Arc::clone(&repo), 32)
            .propagate(&a)
            .await
            .expect("propagate");

        assert_eq!(level_of(repo.as_ref(), a_town.id()).await, Some(AdminLevel::Level(2)));
        assert_eq!(level_of(repo.as_ref(), b_town.id()).await, Some(AdminLevel::Level(5)));
        assert_eq!(level_of(repo.as_ref(), b_central.id()).await, None);
    }

    #[tokio::test]
    async fn write_failure_reports_last_written_and_resumes() {
        let inner = Arc::new(InMemoryLocationRepo::new());
        let country = place("Sierra Leone", LocationType::Country).with_admin_level(AdminLevel::ROOT);
        let district = place("Bo", LocationType::District).under(&country);
        let town = place("Bo Town", LocationType::City).under(&district);
        let village = place("Tikonko", LocationType::Village).under(&town);
        store(inner.as_ref(), &[&country, &district, &town, &village]).await;

        // Second write of the pass fails.
        let flaky: Arc<dyn LocationRepo> = Arc::new(FlakyRepo::failing_after(Arc::clone(&inner) as Arc<dyn LocationRepo>, 1));
        let err = DescendantPropagator::new(Arc::clone(&flaky), 32)
            .propagate(&country)
            .await
            .unwrap_err();

        match err {
            HierarchyError::Persistence { last_written, .. } => {
                assert_eq!(last_written, Some(district.id()))
            }
            other => panic!("Expected Persistence, got {other:?}"),
        }
        assert_eq!(level_of(inner.as_ref(), district.id()).await, Some(AdminLevel::Level(1)));
        assert_eq!(level_of(inner.as_ref(), town.id()).await, None);

        let healthy: Arc<dyn LocationRepo> = inner.clone();
        let resumed = DescendantPropagator::new(healthy, 32)
            .propagate(&country)
            .await
            .expect("resume");
        assert_eq!(resumed.updated, 2);
        assert_eq!(level_of(inner.as_ref(), village.id()).await, Some(AdminLevel::Level(3)));
    }

    #[tokio::test]
    async fn failed_child_lookup_is_a_persistence_error() {
        let mut repo = MockLocationRepo::new();
        repo.expect_lookup()
            .withf(|query| matches!(query, IndexQuery::ByParent(_)))
            .returning(|_| Err(RepoError::database("lookup", "index offline")));

        let country = place("Sierra Leone", LocationType::Country).with_admin_level(AdminLevel::ROOT);
        let err = DescendantPropagator::new(Arc::new(repo), 32)
            .propagate(&country)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            HierarchyError::Persistence {
                last_written: None,
                source: RepoError::Database { .. }
            }
        ));
    }
}

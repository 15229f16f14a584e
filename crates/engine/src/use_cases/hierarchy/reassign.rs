//! Moving a node, with its whole subtree, under a new parent.

use std::collections::HashSet;
use std::sync::Arc;

use placetree_domain::{HierarchyPath, Location, LocationId};

use super::error::HierarchyError;
use super::propagate::DescendantPropagator;
use super::tree;
use crate::infrastructure::index::IndexQuery;
use crate::infrastructure::ports::LocationRepo;

/// Rewrite a descendant's hierarchy after its ancestor `anchor`, expected at
/// `anchor_depth`, moved to `new_prefix`.
///
/// Everything from the anchor onward is kept and re-rooted at `new_prefix`.
/// If the anchor cannot be found the insertion point is the end of the path,
/// so the result is `new_prefix` alone; the second value reports that case.
pub(crate) fn rebase(
    hierarchy: &HierarchyPath,
    anchor_depth: usize,
    anchor: &str,
    new_prefix: &HierarchyPath,
) -> (HierarchyPath, bool) {
    let segments = hierarchy.segments();
    let position = if hierarchy.get(anchor_depth) == Some(anchor) {
        Some(anchor_depth)
    } else {
        segments.iter().position(|segment| segment == anchor)
    };

    match position {
        Some(index) => (new_prefix.join(&segments[index..]), false),
        None => (new_prefix.clone(), true),
    }
}

pub struct ParentReassigner {
    repo: Arc<dyn LocationRepo>,
    propagator: Arc<DescendantPropagator>,
}

impl ParentReassigner {
    pub fn new(repo: Arc<dyn LocationRepo>, propagator: Arc<DescendantPropagator>) -> Self {
        Self { repo, propagator }
    }

    /// Move `node` under `new_parent`, or make it top-level when `None`.
    ///
    /// The node is written first, then its descendants shallowest first, then
    /// admin levels are propagated from the node. Descendants left behind by
    /// an interrupted move are still collected from the node's new position,
    /// so re-running any move of the node finishes the job.
    ///
    /// # Errors
    ///
    /// - `Structural` when the new parent is the node or one of its descendants
    /// - `Validation` when a rewritten compound name is already taken outside
    ///   the subtree; nothing has been written in that case
    /// - `Persistence` on a failed read or write, carrying the last node stored
    pub async fn set_parent(
        &self,
        node: &Location,
        new_parent: Option<&Location>,
    ) -> Result<Location, HierarchyError> {
        if let Some(parent) = new_parent {
            if parent.id() == node.id() {
                return Err(HierarchyError::structural(format!(
                    "'{}' cannot be its own parent",
                    node.compound_name()
                )));
            }
            if node.is_ancestor_of(parent) {
                return Err(HierarchyError::structural(format!(
                    "'{}' cannot move under its own descendant '{}'",
                    node.compound_name(),
                    parent.compound_name()
                )));
            }
        }

        let new_prefix = new_parent
            .map(Location::path_to_self)
            .unwrap_or_else(HierarchyPath::root);

        let mut moved = node.clone();
        moved.set_hierarchy(new_prefix.clone());
        if let Some(parent) = new_parent {
            moved.apply_derived_admin_level(parent.admin_level());
        }

        let members = tree::subtree(self.repo.as_ref(), node).await?;
        let rebased: Vec<Location> = members
            .into_iter()
            .map(|tree::Member { location: mut descendant, anchor }| {
                let (hierarchy, fell_back) = rebase(
                    descendant.hierarchy(),
                    anchor,
                    node.placename().as_str(),
                    &new_prefix,
                );
                if fell_back {
                    tracing::warn!(
                        location_id = %descendant.id(),
                        compound_name = descendant.compound_name(),
                        anchor = node.placename().as_str(),
                        "Moved ancestor missing from descendant hierarchy; re-rooting at the new prefix"
                    );
                }
                descendant.set_hierarchy(hierarchy);
                descendant
            })
            .collect();

        self.ensure_names_free(&moved, &rebased).await?;

        let mut last_written: Option<LocationId> = None;
        for location in std::iter::once(&moved).chain(rebased.iter()) {
            self.repo
                .put(location)
                .await
                .map_err(|e| HierarchyError::persistence(last_written, e))?;
            last_written = Some(location.id());
        }

        tracing::info!(
            location_id = %moved.id(),
            from = node.compound_name(),
            to = moved.compound_name(),
            descendants = rebased.len(),
            "Reassigned parent"
        );

        self.propagator
            .propagate(&moved)
            .await
            .map_err(|e| e.or_last_written(last_written))?;
        Ok(moved)
    }

    /// Reject the move if any rewritten compound name belongs to a node
    /// outside the moving subtree.
    async fn ensure_names_free(
        &self,
        moved: &Location,
        rebased: &[Location],
    ) -> Result<(), HierarchyError> {
        let subtree: HashSet<LocationId> = std::iter::once(moved.id())
            .chain(rebased.iter().map(Location::id))
            .collect();

        for location in std::iter::once(moved).chain(rebased.iter()) {
            let holders = self
                .repo
                .lookup(&IndexQuery::ByCompoundName(location.compound_name().to_string()))
                .await?;
            if holders.iter().any(|id| !subtree.contains(id)) {
                return Err(HierarchyError::validation(format!(
                    "Compound name '{}' is already taken",
                    location.compound_name()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::InMemoryLocationRepo;
    use crate::use_cases::hierarchy::test_support::{place, FlakyRepo};
    use placetree_domain::{AdminLevel, LocationType};

    fn path(segments: &[&str]) -> HierarchyPath {
        HierarchyPath::from(segments.to_vec())
    }

    #[test]
    fn rebase_keeps_the_tail_below_the_anchor() {
        let (rebased, fell_back) = rebase(
            &path(&["Sierra Leone", "Bo", "Bo Town"]),
            1,
            "Bo",
            &path(&["Region X"]),
        );
        assert_eq!(rebased, path(&["Region X", "Bo", "Bo Town"]));
        assert!(!fell_back);
    }

    #[test]
    fn rebase_to_top_level_drops_the_old_prefix() {
        let (rebased, _) = rebase(&path(&["Sierra Leone", "Bo"]), 1, "Bo", &HierarchyPath::root());
        assert_eq!(rebased, path(&["Bo"]));
    }

    #[test]
    fn rebase_prefers_the_anchor_depth_over_earlier_matches() {
        // "Central" appears twice; only the one at the anchor depth moved.
        let (rebased, _) = rebase(
            &path(&["Central", "North", "Central", "Hamlet"]),
            2,
            "Central",
            &path(&["South"]),
        );
        assert_eq!(rebased, path(&["South", "Central", "Hamlet"]));
    }

    #[test]
    fn rebase_without_anchor_falls_back_to_new_prefix() {
        let (rebased, fell_back) =
            rebase(&path(&["Sierra Leone", "Kenema"]), 1, "Bo", &path(&["Region X"]));
        assert_eq!(rebased, path(&["Region X"]));
        assert!(fell_back);
    }

    struct Fixture {
        repo: Arc<dyn LocationRepo>,
        country: Location,
        district: Location,
        town: Location,
        region: Location,
    }

    async fn fixture(repo: Arc<dyn LocationRepo>) -> Fixture {
        let country = place("Sierra Leone", LocationType::Country).with_admin_level(AdminLevel::ROOT);
        let mut district = place("Bo", LocationType::District).under(&country);
        district.apply_derived_admin_level(country.admin_level());
        let mut town = place("Bo Town", LocationType::City).under(&district);
        town.apply_derived_admin_level(district.admin_level());
        let region = place("Region X", LocationType::Region).with_admin_level(AdminLevel::ROOT);
        for location in [&country, &district, &town, &region] {
            repo.put(location).await.expect("put");
        }
        Fixture {
            repo,
            country,
            district,
            town,
            region,
        }
    }

    fn reassigner(repo: &Arc<dyn LocationRepo>) -> ParentReassigner {
        let propagator = Arc::new(DescendantPropagator::new(Arc::clone(repo), 32));
        ParentReassigner::new(Arc::clone(repo), propagator)
    }

    #[tokio::test]
    async fn moves_node_and_descendants() {
        let f = fixture(Arc::new(InMemoryLocationRepo::new())).await;

        let moved = reassigner(&f.repo)
            .set_parent(&f.district, Some(&f.region))
            .await
            .expect("set_parent");

        assert_eq!(moved.compound_name(), "Region X::Bo");
        assert_eq!(moved.admin_level(), Some(AdminLevel::Level(1)));

        let town = f.repo.get(f.town.id()).await.expect("get").expect("town");
        assert_eq!(town.hierarchy(), &path(&["Region X", "Bo"]));
        assert_eq!(town.compound_name(), "Region X::Bo::Bo Town");
        assert_eq!(town.admin_level(), Some(AdminLevel::Level(2)));

        let under_old_root = f
            .repo
            .lookup(&IndexQuery::ByAncestor("Sierra Leone".into()))
            .await
            .expect("lookup");
        assert!(under_old_root.is_empty());
    }

    #[tokio::test]
    async fn removing_the_parent_keeps_the_level() {
        let f = fixture(Arc::new(InMemoryLocationRepo::new())).await;

        let moved = reassigner(&f.repo)
            .set_parent(&f.district, None)
            .await
            .expect("set_parent");

        assert!(moved.is_top_level());
        assert_eq!(moved.admin_level(), Some(AdminLevel::Level(1)));
        let town = f.repo.get(f.town.id()).await.expect("get").expect("town");
        assert_eq!(town.compound_name(), "Bo::Bo Town");
        assert_eq!(town.admin_level(), Some(AdminLevel::Level(2)));
    }

    #[tokio::test]
    async fn moving_under_a_descendant_is_structural() {
        let f = fixture(Arc::new(InMemoryLocationRepo::new())).await;
        let r = reassigner(&f.repo);

        let err = r.set_parent(&f.country, Some(&f.town)).await.unwrap_err();
        assert!(err.is_structural());
        let err = r.set_parent(&f.district, Some(&f.district)).await.unwrap_err();
        assert!(err.is_structural());
    }

    #[tokio::test]
    async fn collision_is_rejected_before_any_write() {
        let f = fixture(Arc::new(InMemoryLocationRepo::new())).await;
        let mut clash = place("Bo", LocationType::District).under(&f.region);
        clash.apply_derived_admin_level(f.region.admin_level());
        f.repo.put(&clash).await.expect("put");

        let err = reassigner(&f.repo)
            .set_parent(&f.district, Some(&f.region))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let district = f.repo.get(f.district.id()).await.expect("get").expect("district");
        assert_eq!(district.compound_name(), "Sierra Leone::Bo");
    }

    #[tokio::test]
    async fn interrupted_move_resumes_from_stored_state() {
        let inner: Arc<dyn LocationRepo> = Arc::new(InMemoryLocationRepo::new());
        let f = fixture(Arc::clone(&inner)).await;
        let flaky: Arc<dyn LocationRepo> = Arc::new(FlakyRepo::failing_after(Arc::clone(&inner), 1));

        let err = reassigner(&flaky)
            .set_parent(&f.district, Some(&f.region))
            .await
            .unwrap_err();
        match err {
            HierarchyError::Persistence { last_written, .. } => {
                assert_eq!(last_written, Some(f.district.id()))
            }
            other => panic!("Expected Persistence, got {other:?}"),
        }

        let district = inner.get(f.district.id()).await.expect("get").expect("district");
        let town = inner.get(f.town.id()).await.expect("get").expect("town");
        assert_eq!(district.compound_name(), "Region X::Bo");
        assert_eq!(town.compound_name(), "Sierra Leone::Bo::Bo Town");

        reassigner(&inner)
            .set_parent(&district, Some(&f.region))
            .await
            .expect("retry");
        let district = inner.get(f.district.id()).await.expect("get").expect("district");
        let town = inner.get(f.town.id()).await.expect("get").expect("town");
        assert_eq!(district.compound_name(), "Region X::Bo");
        assert_eq!(town.compound_name(), "Region X::Bo::Bo Town");
        assert_eq!(town.admin_level(), Some(AdminLevel::Level(2)));
        assert!(!f.country.is_ancestor_of(&town));
    }

    #[tokio::test]
    async fn detached_descendants_follow_a_later_move() {
        let inner: Arc<dyn LocationRepo> = Arc::new(InMemoryLocationRepo::new());
        let f = fixture(Arc::clone(&inner)).await;
        let flaky: Arc<dyn LocationRepo> = Arc::new(FlakyRepo::failing_after(Arc::clone(&inner), 1));
        reassigner(&flaky)
            .set_parent(&f.district, Some(&f.region))
            .await
            .unwrap_err();
        let district = inner.get(f.district.id()).await.expect("get").expect("district");

        let moved = reassigner(&inner)
            .set_parent(&district, Some(&f.country))
            .await
            .expect("move back");

        assert_eq!(moved.compound_name(), "Sierra Leone::Bo");
        let town = inner.get(f.town.id()).await.expect("get").expect("town");
        assert_eq!(town.compound_name(), "Sierra Leone::Bo::Bo Town");
        assert!(town.is_child_of(&moved));
    }
}

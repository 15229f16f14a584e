//! `HierarchyStore` - the read and write surface over the location forest.

use std::sync::Arc;

use placetree_domain::{
    AdminLevel, HierarchyPath, Location, LocationCode, LocationId, LocationType, Placename,
};

use super::error::HierarchyError;
use super::locks::{SubtreeGuard, SubtreeLocks};
use super::propagate::{DescendantPropagator, PropagationReport};
use super::reassign::ParentReassigner;
use super::tree;
use crate::infrastructure::index::IndexQuery;
use crate::infrastructure::ports::LocationRepo;

/// Input for [`HierarchyStore::create`].
#[derive(Debug, Clone, Default)]
pub struct NewLocation {
    pub placename: String,
    pub location_type: LocationType,
    /// Parent to create under; `None` creates a top-level node.
    pub parent: Option<LocationId>,
    /// Required for top-level nodes. Ignored below the top level, where the
    /// level is derived from the parent.
    pub admin_level: Option<AdminLevel>,
    pub location_code: Option<String>,
    pub disabled: bool,
}

pub struct HierarchyStore {
    repo: Arc<dyn LocationRepo>,
    propagator: Arc<DescendantPropagator>,
    reassigner: ParentReassigner,
    locks: SubtreeLocks,
}

impl HierarchyStore {
    pub fn new(repo: Arc<dyn LocationRepo>, max_depth: usize) -> Self {
        let propagator = Arc::new(DescendantPropagator::new(Arc::clone(&repo), max_depth));
        let reassigner = ParentReassigner::new(Arc::clone(&repo), Arc::clone(&propagator));
        Self {
            repo,
            propagator,
            reassigner,
            locks: SubtreeLocks::new(),
        }
    }

    // =========================================================================
    // Index reads
    // =========================================================================

    pub async fn get(&self, id: LocationId) -> Result<Option<Location>, HierarchyError> {
        Ok(self.repo.get(id).await?)
    }

    /// Every node whose hierarchy names `placename`, by compound name.
    pub async fn find_by_ancestor_placename(
        &self,
        placename: &str,
    ) -> Result<Vec<Location>, HierarchyError> {
        self.find(IndexQuery::ByAncestor(placename.to_string())).await
    }

    /// Every node whose direct parent is named `placename`.
    pub async fn find_direct_children(
        &self,
        placename: &str,
    ) -> Result<Vec<Location>, HierarchyError> {
        self.find(IndexQuery::ByParent(placename.to_string())).await
    }

    pub async fn find_by_type(
        &self,
        location_type: LocationType,
        enabled_only: bool,
    ) -> Result<Vec<Location>, HierarchyError> {
        self.find(IndexQuery::ByType {
            location_type,
            enabled_only,
        })
        .await
    }

    pub async fn find_by_admin_level(
        &self,
        level: AdminLevel,
        enabled_only: bool,
    ) -> Result<Vec<Location>, HierarchyError> {
        self.find(IndexQuery::ByAdminLevel {
            level,
            enabled_only,
        })
        .await
    }

    pub async fn find_by_compound_name(
        &self,
        compound_name: &str,
    ) -> Result<Option<Location>, HierarchyError> {
        let found = self
            .find(IndexQuery::ByCompoundName(compound_name.to_string()))
            .await?;
        Ok(found.into_iter().next())
    }

    /// Batch lookup. Results follow the input order; unknown names are skipped.
    pub async fn find_by_compound_names<S: AsRef<str>>(
        &self,
        compound_names: &[S],
    ) -> Result<Vec<Location>, HierarchyError> {
        let mut found = Vec::with_capacity(compound_names.len());
        for name in compound_names {
            if let Some(location) = self.find_by_compound_name(name.as_ref()).await? {
                found.push(location);
            }
        }
        Ok(found)
    }

    pub async fn find_by_placename(&self, placename: &str) -> Result<Vec<Location>, HierarchyError> {
        self.find(IndexQuery::ByPlacename(placename.to_string())).await
    }

    /// First node named `placename`, by compound name.
    pub async fn get_by_placename(
        &self,
        placename: &str,
    ) -> Result<Option<Location>, HierarchyError> {
        Ok(self.find_by_placename(placename).await?.into_iter().next())
    }

    pub async fn find_top_level(&self) -> Result<Vec<Location>, HierarchyError> {
        self.find(IndexQuery::TopLevel).await
    }

    /// The first node named `placename` followed by its descendants.
    pub async fn find_with_descendants(
        &self,
        placename: &str,
    ) -> Result<Vec<Location>, HierarchyError> {
        let Some(node) = self.get_by_placename(placename).await? else {
            return Ok(Vec::new());
        };
        let descendants = self.get_descendants(&node).await?;
        Ok(std::iter::once(node).chain(descendants).collect())
    }

    /// Along the path named by `compound_name` (ancestors and the node
    /// itself), the deepest node of the first type in `types` that occurs.
    pub async fn find_type_in_path(
        &self,
        compound_name: &str,
        types: &[LocationType],
    ) -> Result<Option<Location>, HierarchyError> {
        let mut names = HierarchyPath::from_compound_name(compound_name).ancestor_prefixes();
        names.push(compound_name.to_string());
        let path = self.find_by_compound_names(names.as_slice()).await?;

        Ok(types.iter().find_map(|wanted| {
            path.iter()
                .rev()
                .find(|location| location.location_type() == *wanted)
                .cloned()
        }))
    }

    /// Compound names of all enabled nodes, sorted.
    pub async fn enabled_compound_names(&self) -> Result<Vec<String>, HierarchyError> {
        Ok(self
            .find(IndexQuery::Enabled)
            .await?
            .into_iter()
            .map(|location| location.compound_name().to_string())
            .collect())
    }

    // =========================================================================
    // Traversals
    // =========================================================================

    pub async fn get_parent(&self, node: &Location) -> Result<Option<Location>, HierarchyError> {
        match node.parent_compound_name() {
            Some(name) => self.find_by_compound_name(&name).await,
            None => Ok(None),
        }
    }

    /// Ancestors, root first.
    pub async fn get_ancestors(&self, node: &Location) -> Result<Vec<Location>, HierarchyError> {
        let names = node.ancestor_compound_names();
        self.find_by_compound_names(names.as_slice()).await
    }

    /// `node` itself if it has the type, else the nearest-to-root ancestor that does.
    pub async fn get_ancestor_of_type(
        &self,
        node: &Location,
        location_type: LocationType,
    ) -> Result<Option<Location>, HierarchyError> {
        if node.location_type() == location_type {
            return Ok(Some(node.clone()));
        }
        Ok(self
            .get_ancestors(node)
            .await?
            .into_iter()
            .find(|ancestor| ancestor.location_type() == location_type))
    }

    /// Every node below `node`, shallowest first.
    pub async fn get_descendants(&self, node: &Location) -> Result<Vec<Location>, HierarchyError> {
        Ok(tree::descendants(self.repo.as_ref(), node).await?)
    }

    pub async fn get_direct_descendants(
        &self,
        node: &Location,
    ) -> Result<Vec<Location>, HierarchyError> {
        Ok(tree::direct_children(self.repo.as_ref(), node).await?)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Create and store a node, under `parent` when one is named.
    pub async fn create(&self, new: NewLocation) -> Result<Location, HierarchyError> {
        let mut location = Location::new(Placename::new(new.placename)?, new.location_type);
        if let Some(code) = new.location_code {
            location = location.with_location_code(LocationCode::new(code)?);
        }
        if let Some(level) = new.admin_level {
            location = location.with_admin_level(level);
        }
        if new.disabled {
            location = location.disabled();
        }

        let location = match new.parent {
            Some(parent_id) => {
                let (_guard, parent) = self.lock_one(parent_id).await?;
                self.save_locked(location.under(&parent)).await?
            }
            None => {
                location.validate()?;
                let _guard = self.locks.acquire([location.compound_name()]).await;
                self.save_locked(location).await?
            }
        };

        tracing::info!(
            location_id = %location.id(),
            compound_name = location.compound_name(),
            location_code = location.location_code().map(LocationCode::as_str),
            admin_level = ?location.admin_level(),
            "Created location"
        );
        Ok(location)
    }

    /// Store a node, re-deriving its compound name and, below the top level,
    /// its admin level. Saving a top-level node propagates its level down.
    ///
    /// # Errors
    ///
    /// - `Validation` for a top-level node without a level, a taken compound
    ///   name, or a rename or move of a node that has descendants
    /// - `NotFound` if the parent named by the hierarchy does not exist
    /// - `Persistence` from the store or the propagation that follows
    pub async fn save(&self, mut location: Location) -> Result<Location, HierarchyError> {
        location.refresh_compound_name();
        location.validate()?;

        loop {
            let previous_root = self
                .repo
                .get(location.id())
                .await?
                .map(|previous| previous.root_compound_name().to_string());
            let mut roots = vec![location.root_compound_name().to_string()];
            roots.extend(previous_root.clone());

            let guard = self.locks.acquire(roots).await;
            let current_root = self
                .repo
                .get(location.id())
                .await?
                .map(|previous| previous.root_compound_name().to_string());
            if current_root == previous_root {
                let saved = self.save_locked(location).await;
                drop(guard);
                return saved;
            }
            tracing::debug!(location_id = %location.id(), "Tree changed while waiting for its lock, retrying");
        }
    }

    /// Move a node, with its subtree, under `parent`; `None` makes it top-level.
    pub async fn set_parent(
        &self,
        id: LocationId,
        parent: Option<LocationId>,
    ) -> Result<Location, HierarchyError> {
        let ids: Vec<LocationId> = std::iter::once(id).chain(parent).collect();
        let (_guard, nodes) = self.lock_nodes(&ids).await?;
        let mut nodes = nodes.into_iter();
        let node = nodes
            .next()
            .ok_or_else(|| HierarchyError::not_found("Location", id))?;
        let parent = nodes.next();

        self.reassigner.set_parent(&node, parent.as_ref()).await
    }

    pub async fn remove_parent(&self, id: LocationId) -> Result<Location, HierarchyError> {
        self.set_parent(id, None).await
    }

    pub async fn set_disabled(
        &self,
        id: LocationId,
        disabled: bool,
    ) -> Result<Location, HierarchyError> {
        let (_guard, mut location) = self.lock_one(id).await?;
        if location.is_disabled() == disabled {
            return Ok(location);
        }
        location.set_disabled(disabled);
        self.repo.put(&location).await?;

        tracing::info!(
            location_id = %id,
            compound_name = location.compound_name(),
            disabled,
            "Changed location status"
        );
        Ok(location)
    }

    /// Re-run admin level propagation below a stored node.
    pub async fn recalculate_levels(
        &self,
        id: LocationId,
    ) -> Result<PropagationReport, HierarchyError> {
        let (_guard, location) = self.lock_one(id).await?;
        self.propagator.propagate(&location).await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn find(&self, query: IndexQuery) -> Result<Vec<Location>, HierarchyError> {
        let ids = self.repo.lookup(&query).await?;
        Ok(tree::load_sorted(self.repo.as_ref(), &ids).await?)
    }

    async fn require(&self, id: LocationId) -> Result<Location, HierarchyError> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| HierarchyError::not_found("Location", id))
    }

    async fn lock_one(&self, id: LocationId) -> Result<(SubtreeGuard, Location), HierarchyError> {
        let (guard, nodes) = self.lock_nodes(&[id]).await?;
        let location = nodes
            .into_iter()
            .next()
            .ok_or_else(|| HierarchyError::not_found("Location", id))?;
        Ok((guard, location))
    }

    /// Load the nodes, lock their trees, and hand back the state read under
    /// the lock. A node that changed trees while we waited is retried.
    async fn lock_nodes(
        &self,
        ids: &[LocationId],
    ) -> Result<(SubtreeGuard, Vec<Location>), HierarchyError> {
        loop {
            let mut roots = Vec::with_capacity(ids.len());
            for id in ids {
                roots.push(self.require(*id).await?.root_compound_name().to_string());
            }

            let guard = self.locks.acquire(roots.iter().cloned()).await;
            let mut nodes = Vec::with_capacity(ids.len());
            for id in ids {
                nodes.push(self.require(*id).await?);
            }

            if nodes
                .iter()
                .map(Location::root_compound_name)
                .eq(roots.iter().map(String::as_str))
            {
                return Ok((guard, nodes));
            }
            tracing::debug!(roots = ?guard.roots(), "Tree changed while waiting for its lock, retrying");
        }
    }

    async fn save_locked(&self, mut location: Location) -> Result<Location, HierarchyError> {
        if let Some(previous) = self.repo.get(location.id()).await? {
            let moved = previous.placename() != location.placename()
                || previous.hierarchy() != location.hierarchy();
            if moved && !tree::descendants(self.repo.as_ref(), &previous).await?.is_empty() {
                return Err(HierarchyError::validation(format!(
                    "'{}' has descendants; it cannot be renamed and only set_parent can move it",
                    previous.compound_name()
                )));
            }
        }

        let holders = self
            .repo
            .lookup(&IndexQuery::ByCompoundName(location.compound_name().to_string()))
            .await?;
        if holders.iter().any(|holder| *holder != location.id()) {
            return Err(HierarchyError::validation(format!(
                "Compound name '{}' is already taken",
                location.compound_name()
            )));
        }

        if let Some(parent_name) = location.parent_compound_name() {
            let parent = self
                .find_by_compound_name(&parent_name)
                .await?
                .ok_or_else(|| HierarchyError::not_found("Location", &parent_name))?;
            location.apply_derived_admin_level(parent.admin_level());
        }

        self.repo.put(&location).await?;
        tracing::debug!(
            location_id = %location.id(),
            compound_name = location.compound_name(),
            "Saved location"
        );

        if location.is_top_level() {
            self.propagator
                .propagate(&location)
                .await
                .map_err(|e| e.or_last_written(Some(location.id())))?;
        }
        Ok(location)
    }
}

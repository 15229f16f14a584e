//! Location aggregate - a node in the administrative location forest
//!
//! # Materialized Hierarchy
//!
//! A node does not point at its parent by id. It carries its whole ancestor
//! chain as placenames (`hierarchy`, root first), and its compound name is
//! derived from that chain plus its own placename. Index views over the
//! ancestor chain answer subtree queries without walking the tree.
//!
//! # Rustic DDD Design
//!
//! - **Private fields**: All fields are encapsulated
//! - **Newtypes**: `Placename`, `LocationCode`, `HierarchyPath`, `AdminLevel`
//! - **Derived state**: `compound_name` is recomputed by every mutator that
//!   touches `placename` or `hierarchy`
//! - **Builder pattern**: Fluent API for optional fields

use serde::{Deserialize, Serialize};

use crate::entities::LocationType;
use crate::error::DomainError;
use crate::value_objects::{AdminLevel, HierarchyPath, LocationCode, Placename};
use crate::LocationId;

/// A location node.
///
/// # Invariants
///
/// - `placename` is non-empty and never contains `::` (enforced by `Placename`)
/// - `compound_name == hierarchy.compound_name(placename)` after any mutation
/// - only top-level nodes accept a user-assigned admin level
///
/// # Example
///
/// ```
/// use placetree_domain::{AdminLevel, Location, LocationType, Placename};
///
/// let country = Location::new(Placename::new("Sierra Leone").unwrap(), LocationType::Country)
///     .with_admin_level(AdminLevel::ROOT);
///
/// assert!(country.is_top_level());
/// assert_eq!(country.compound_name(), "Sierra Leone");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    // Identity
    id: LocationId,

    // Core attributes
    placename: Placename,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location_code: Option<LocationCode>,
    #[serde(rename = "type", default)]
    location_type: LocationType,

    // Position in the forest
    #[serde(default)]
    hierarchy: HierarchyPath,
    /// Persisted lookup key; always derived, never set directly
    compound_name: String,
    #[serde(default)]
    admin_level: Option<AdminLevel>,

    #[serde(default)]
    disabled: bool,
}

impl Location {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create a new top-level location with no admin level assigned yet.
    pub fn new(placename: Placename, location_type: LocationType) -> Self {
        let compound_name = placename.as_str().to_string();
        Self {
            id: LocationId::new(),
            placename,
            location_code: None,
            location_type,
            hierarchy: HierarchyPath::root(),
            compound_name,
            admin_level: None,
            disabled: false,
        }
    }

    /// Reconstruct a location from storage.
    ///
    /// The compound name is recomputed rather than trusted.
    pub fn from_parts(
        id: LocationId,
        placename: Placename,
        location_code: Option<LocationCode>,
        location_type: LocationType,
        hierarchy: HierarchyPath,
        admin_level: Option<AdminLevel>,
        disabled: bool,
    ) -> Self {
        let compound_name = hierarchy.compound_name(placename.as_str());
        Self {
            id,
            placename,
            location_code,
            location_type,
            hierarchy,
            compound_name,
            admin_level,
            disabled,
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Place the new node under `parent`. Use before the node is first stored;
    /// moving a stored node goes through re-parenting instead.
    pub fn under(mut self, parent: &Location) -> Self {
        self.set_hierarchy(parent.path_to_self());
        self
    }

    pub fn with_admin_level(mut self, level: AdminLevel) -> Self {
        self.admin_level = Some(level);
        self
    }

    pub fn with_location_code(mut self, code: LocationCode) -> Self {
        self.location_code = Some(code);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> LocationId {
        self.id
    }

    #[inline]
    pub fn placename(&self) -> &Placename {
        &self.placename
    }

    #[inline]
    pub fn location_code(&self) -> Option<&LocationCode> {
        self.location_code.as_ref()
    }

    #[inline]
    pub fn location_type(&self) -> LocationType {
        self.location_type
    }

    #[inline]
    pub fn hierarchy(&self) -> &HierarchyPath {
        &self.hierarchy
    }

    /// The node's external identity: `hierarchy ++ [placename]` joined by `::`.
    #[inline]
    pub fn compound_name(&self) -> &str {
        &self.compound_name
    }

    #[inline]
    pub fn admin_level(&self) -> Option<AdminLevel> {
        self.admin_level
    }

    #[inline]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        !self.disabled
    }

    /// Top-level nodes have an empty hierarchy.
    #[inline]
    pub fn is_top_level(&self) -> bool {
        self.hierarchy.is_top_level()
    }

    // =========================================================================
    // Path Helpers
    // =========================================================================

    /// The hierarchy a direct child of this node carries.
    pub fn path_to_self(&self) -> HierarchyPath {
        self.hierarchy.child(self.placename.as_str())
    }

    /// Compound name of the direct parent, if any.
    pub fn parent_compound_name(&self) -> Option<String> {
        self.hierarchy.parent_compound_name()
    }

    /// Compound names of every ancestor, root first.
    pub fn ancestor_compound_names(&self) -> Vec<String> {
        self.hierarchy.ancestor_prefixes()
    }

    /// Compound name of the top-level node this node hangs from (itself if top-level).
    pub fn root_compound_name(&self) -> &str {
        self.hierarchy
            .first()
            .unwrap_or_else(|| self.placename.as_str())
    }

    /// Whether `other` sits somewhere below this node.
    pub fn is_ancestor_of(&self, other: &Location) -> bool {
        other.hierarchy.starts_with(&self.path_to_self())
    }

    /// Whether this node is a direct child of `other`.
    pub fn is_child_of(&self, other: &Location) -> bool {
        self.hierarchy == other.path_to_self()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub fn set_placename(&mut self, placename: Placename) {
        self.placename = placename;
        self.refresh_compound_name();
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// Assign the admin level of a top-level node.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a non-root node, whose level is
    /// always derived from its parent.
    pub fn set_admin_level(&mut self, level: AdminLevel) -> Result<(), DomainError> {
        if !self.is_top_level() {
            return Err(DomainError::validation(format!(
                "Admin level of '{}' is derived from its parent and cannot be edited",
                self.compound_name
            )));
        }
        self.admin_level = Some(level);
        Ok(())
    }

    /// Record a level derived from the parent's. Returns whether it changed.
    pub fn apply_derived_admin_level(&mut self, parent_level: Option<AdminLevel>) -> bool {
        let level = AdminLevel::child_of(parent_level);
        let changed = self.admin_level != Some(level);
        self.admin_level = Some(level);
        changed
    }

    /// Replace the ancestor chain. The compound name follows.
    pub fn set_hierarchy(&mut self, hierarchy: HierarchyPath) {
        self.hierarchy = hierarchy;
        self.refresh_compound_name();
    }

    /// Recompute the compound name from `hierarchy` and `placename`.
    /// Returns whether the stored value was stale.
    pub fn refresh_compound_name(&mut self) -> bool {
        let fresh = self.hierarchy.compound_name(self.placename.as_str());
        if fresh == self.compound_name {
            return false;
        }
        self.compound_name = fresh;
        true
    }

    /// Check the invariants a node must satisfy before it is stored.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if a top-level node has no admin level.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.is_top_level() && self.admin_level.is_none() {
            return Err(DomainError::validation(format!(
                "Top-level location '{}' requires an admin level",
                self.compound_name
            )));
        }
        Ok(())
    }
}

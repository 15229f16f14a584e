//! Hierarchy index - read-optimized views over the location collection.
//!
//! Each view maps a key to the set of location ids satisfying it. The index is
//! maintained incrementally: a write removes every key the previous version
//! of the record contributed and inserts the keys of the new version.

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

use placetree_domain::{AdminLevel, Location, LocationId, LocationType};

/// One index view plus the key to read from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexQuery {
    /// Every node listing the placename anywhere in its hierarchy
    ByAncestor(String),
    /// Every node whose hierarchy ends with the placename
    ByParent(String),
    ByType {
        location_type: LocationType,
        enabled_only: bool,
    },
    ByAdminLevel {
        level: AdminLevel,
        enabled_only: bool,
    },
    /// At most one id
    ByCompoundName(String),
    ByPlacename(String),
    TopLevel,
    Enabled,
}

/// A write would give a compound name a second owner.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("compound name '{compound_name}' already belongs to location {existing}")]
pub struct CompoundNameConflict {
    pub compound_name: String,
    pub existing: LocationId,
}

#[derive(Debug)]
struct KeyedIds<K> {
    entries: HashMap<K, BTreeSet<LocationId>>,
}

impl<K> Default for KeyedIds<K> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> KeyedIds<K> {
    fn insert(&mut self, key: K, id: LocationId) {
        self.entries.entry(key).or_default().insert(id);
    }

    fn remove(&mut self, key: &K, id: LocationId) {
        if let Some(ids) = self.entries.get_mut(key) {
            ids.remove(&id);
            if ids.is_empty() {
                self.entries.remove(key);
            }
        }
    }

    fn get(&self, key: &K) -> Vec<LocationId> {
        self.entries
            .get(key)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Default)]
pub struct HierarchyIndex {
    by_ancestor: KeyedIds<String>,
    by_parent: KeyedIds<String>,
    by_type: KeyedIds<LocationType>,
    by_type_enabled: KeyedIds<LocationType>,
    by_admin_level: KeyedIds<AdminLevel>,
    by_admin_level_enabled: KeyedIds<AdminLevel>,
    by_placename: KeyedIds<String>,
    by_compound_name: HashMap<String, LocationId>,
    top_level: BTreeSet<LocationId>,
    enabled: BTreeSet<LocationId>,
}

impl HierarchyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-index one record. `previous` is the version currently stored, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CompoundNameConflict`] without touching any view if another
    /// record already owns `next`'s compound name.
    pub fn apply(
        &mut self,
        previous: Option<&Location>,
        next: &Location,
    ) -> Result<(), CompoundNameConflict> {
        self.check(next)?;
        if let Some(previous) = previous {
            self.remove(previous);
        }
        self.insert(next);
        Ok(())
    }

    /// Whether `location` could be written without a compound name conflict.
    pub fn check(&self, location: &Location) -> Result<(), CompoundNameConflict> {
        match self.by_compound_name.get(location.compound_name()) {
            Some(&existing) if existing != location.id() => Err(CompoundNameConflict {
                compound_name: location.compound_name().to_string(),
                existing,
            }),
            _ => Ok(()),
        }
    }

    pub fn lookup(&self, query: &IndexQuery) -> Vec<LocationId> {
        match query {
            IndexQuery::ByAncestor(placename) => self.by_ancestor.get(placename),
            IndexQuery::ByParent(placename) => self.by_parent.get(placename),
            IndexQuery::ByType {
                location_type,
                enabled_only: true,
            } => self.by_type_enabled.get(location_type),
            IndexQuery::ByType {
                location_type,
                enabled_only: false,
            } => self.by_type.get(location_type),
            IndexQuery::ByAdminLevel {
                level,
                enabled_only: true,
            } => self.by_admin_level_enabled.get(level),
            IndexQuery::ByAdminLevel {
                level,
                enabled_only: false,
            } => self.by_admin_level.get(level),
            IndexQuery::ByCompoundName(name) => {
                self.by_compound_name.get(name).copied().into_iter().collect()
            }
            IndexQuery::ByPlacename(placename) => self.by_placename.get(placename),
            IndexQuery::TopLevel => self.top_level.iter().copied().collect(),
            IndexQuery::Enabled => self.enabled.iter().copied().collect(),
        }
    }

    /// Number of indexed records.
    pub fn len(&self) -> usize {
        self.by_compound_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_compound_name.is_empty()
    }

    fn insert(&mut self, location: &Location) {
        let id = location.id();
        let hierarchy = location.hierarchy();

        for ancestor in hierarchy.iter() {
            self.by_ancestor.insert(ancestor.to_string(), id);
        }
        match hierarchy.last() {
            Some(parent) => self.by_parent.insert(parent.to_string(), id),
            None => {
                self.top_level.insert(id);
            }
        }

        self.by_type.insert(location.location_type(), id);
        if let Some(level) = location.admin_level() {
            self.by_admin_level.insert(level, id);
        }
        if location.is_enabled() {
            self.by_type_enabled.insert(location.location_type(), id);
            if let Some(level) = location.admin_level() {
                self.by_admin_level_enabled.insert(level, id);
            }
            self.enabled.insert(id);
        }

        self.by_placename
            .insert(location.placename().as_str().to_string(), id);
        self.by_compound_name
            .insert(location.compound_name().to_string(), id);
    }

    fn remove(&mut self, location: &Location) {
        let id = location.id();
        let hierarchy = location.hierarchy();

        for ancestor in hierarchy.iter() {
            self.by_ancestor.remove(&ancestor.to_string(), id);
        }
        match hierarchy.last() {
            Some(parent) => self.by_parent.remove(&parent.to_string(), id),
            None => {
                self.top_level.remove(&id);
            }
        }

        self.by_type.remove(&location.location_type(), id);
        self.by_type_enabled.remove(&location.location_type(), id);
        if let Some(level) = location.admin_level() {
            self.by_admin_level.remove(&level, id);
            self.by_admin_level_enabled.remove(&level, id);
        }
        self.enabled.remove(&id);

        self.by_placename
            .remove(&location.placename().as_str().to_string(), id);
        if self.by_compound_name.get(location.compound_name()) == Some(&id) {
            self.by_compound_name.remove(location.compound_name());
        }
    }
}

//! Loading seed entries into the store.

use std::collections::BTreeMap;

use placetree_domain::Location;

use crate::infrastructure::seed_file::SeedEntry;
use crate::use_cases::hierarchy::{HierarchyError, HierarchyStore, NewLocation};

/// Counts over the locations a seed created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub created: usize,
    /// Keyed by stored admin level (100 for out of range)
    pub by_level: BTreeMap<u16, usize>,
    /// Keyed by the compound name of each tree's top-level node
    pub by_root: BTreeMap<String, usize>,
}

impl SeedSummary {
    fn record(&mut self, location: &Location) {
        self.created += 1;
        let level = location.admin_level().map(|level| level.value()).unwrap_or_default();
        *self.by_level.entry(level).or_default() += 1;
        *self
            .by_root
            .entry(location.root_compound_name().to_string())
            .or_default() += 1;
    }
}

/// Create every entry in order. Parents are resolved by compound name, so
/// an entry must come after its parent.
///
/// Stops at the first failing entry; entries before it stay created.
pub async fn apply_seed(
    store: &HierarchyStore,
    entries: Vec<SeedEntry>,
) -> Result<SeedSummary, HierarchyError> {
    let mut summary = SeedSummary::default();

    for entry in entries {
        let parent = match &entry.parent {
            Some(name) => Some(
                store
                    .find_by_compound_name(name)
                    .await?
                    .ok_or_else(|| HierarchyError::not_found("Location", name))?
                    .id(),
            ),
            None => None,
        };

        let location = store
            .create(NewLocation {
                placename: entry.placename,
                location_type: entry.location_type,
                parent,
                admin_level: entry.admin_level,
                location_code: entry.location_code,
                disabled: entry.disabled,
            })
            .await?;
        summary.record(&location);
    }

    tracing::info!(
        created = summary.created,
        trees = summary.by_root.len(),
        "Applied seed"
    );
    Ok(summary)
}

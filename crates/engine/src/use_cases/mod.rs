//! Use cases over the location forest.

pub mod hierarchy;
pub mod seed;

pub use hierarchy::{HierarchyError, HierarchyStore, NewLocation};
pub use seed::{apply_seed, SeedSummary};

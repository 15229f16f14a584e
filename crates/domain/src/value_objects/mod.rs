//! Value objects - Immutable objects defined by their attributes

mod admin_level;
mod hierarchy_path;
mod names;
pub mod path_codec;

pub use admin_level::{AdminLevel, ADMIN_LEVEL_OUT_OF_RANGE, MAX_ADMIN_LEVEL};
pub use hierarchy_path::HierarchyPath;
pub use names::{LocationCode, Placename};

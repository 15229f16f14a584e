//! placetree Domain - location nodes and the invariants of the location forest.
//!
//! Pure types only: no storage, no async. The engine crate owns persistence,
//! indexing and the cascading use cases built on these types.

extern crate self as placetree_domain;

pub mod aggregates;
pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

pub use aggregates::Location;
pub use entities::LocationType;
pub use error::DomainError;
pub use ids::LocationId;
pub use value_objects::{
    path_codec, AdminLevel, HierarchyPath, LocationCode, Placename, ADMIN_LEVEL_OUT_OF_RANGE,
    MAX_ADMIN_LEVEL,
};

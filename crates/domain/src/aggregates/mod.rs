//! Aggregates - entities that own and protect their invariants

pub mod location;

pub use location::Location;

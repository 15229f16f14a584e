//! Domain entities - Core business objects and their vocabularies

mod location;

pub use location::LocationType;

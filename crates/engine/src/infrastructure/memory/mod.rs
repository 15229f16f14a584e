//! In-memory storage adapters.

mod location_repo;

pub use location_repo::InMemoryLocationRepo;

//! Infrastructure: storage port, index, adapters and configuration.

pub mod cache;
pub mod cached_location_repo;
pub mod config;
pub mod index;
pub mod memory;
pub mod ports;
pub mod seed_file;

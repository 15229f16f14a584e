//! placetree Engine library.
//!
//! ## Structure
//!
//! - `infrastructure/` - storage port, hierarchy index, adapters, config
//! - `use_cases/` - the hierarchy store and its cascades, seeding
//! - `app` - application composition

pub mod app;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;

pub mod models;
pub mod store;

pub use models::{NewSighting, SightingChangeset, SightingModel};
pub use store::{SightingSession, SqliteSightingStore};

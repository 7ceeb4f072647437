/// UFO sighting records and their store
///
/// Architecture:
/// - Domain: the sighting entity and the store session ports
/// - Infrastructure: Diesel/SQLite models and the session-based store
pub mod domain;
pub mod infrastructure;

// Re-exports for easy access
pub use domain::{
    entities::{FieldValue, Sighting, SightingField, SIGHTING_DATE_FORMAT},
    repository::{RecordHandle, SessionFactory, StoreSession},
};
pub use infrastructure::SqliteSightingStore;

pub mod entities;
pub mod repository;

pub use entities::{FieldValue, Sighting, SightingField, SIGHTING_DATE_FORMAT};
pub use repository::{RecordHandle, SessionFactory, StoreSession};

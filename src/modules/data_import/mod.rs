pub mod application;
pub mod domain;

// Re-exports for easy external access
pub use application::service::ImportService;
pub use domain::{ImportHandle, ImportOperation};

// Re-export common types for shorter imports
pub use domain::services::import_components::types::{
    ImportError, ImportEvent, ImportReport, ImportState, RecordRejection, SkippedSighting,
};

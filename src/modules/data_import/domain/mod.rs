pub mod services;

// Re-exports for easy access
pub use services::import_components::{
    FieldMapper, ImportHandle, ImportOperation, ProgressTracker, RecordMaterializer,
    UniquenessResolver,
};

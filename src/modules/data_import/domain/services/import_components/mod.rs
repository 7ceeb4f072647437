pub mod document;
pub mod field_mapper;
pub mod import_operation;
pub mod progress_tracker;
pub mod record_materializer;
pub mod types;
pub mod uniqueness_resolver;

// Re-export main types for public API
pub use field_mapper::{FieldMapper, NormalizedSighting};
pub use import_operation::{ImportHandle, ImportOperation};
pub use progress_tracker::{CompletionCallback, ProgressCallback, ProgressTracker};
pub use record_materializer::{MaterializedRecord, RecordMaterializer};
pub use types::*;
pub use uniqueness_resolver::{Resolution, UniquenessResolver};

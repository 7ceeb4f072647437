pub mod modules;
mod schema;
pub mod shared;

use std::path::PathBuf;
use std::sync::Arc;

use modules::data_import::domain::services::import_components::ProgressCallback;
use modules::data_import::{ImportReport, ImportService};
use modules::sightings::SqliteSightingStore;
use shared::errors::{AppError, AppResult};
use shared::{AppConfig, Database};

// Re-exports for embedding the importer
pub use modules::data_import::{ImportHandle, ImportOperation, ImportState};
pub use modules::sightings::{Sighting, SightingField};

/// Open the configured store, bring its schema up to date and import `source`
///
/// Falls back to `IMPORT_FILE` when no source is given.
pub async fn run(config: &AppConfig, source: Option<PathBuf>) -> AppResult<ImportReport> {
    let source = source
        .or_else(|| config.import_file.clone())
        .ok_or_else(|| {
            AppError::ConfigError("No source file given and IMPORT_FILE is not set".to_string())
        })?;

    let db = Arc::new(Database::new(config)?);
    let applied = db.run_migrations()?;
    if applied > 0 {
        log_info!("Applied {} pending migrations", applied);
    }

    let store = Arc::new(SqliteSightingStore::new(Arc::clone(&db)));
    let service = ImportService::new(store.clone());

    let on_progress: ProgressCallback = Arc::new(|fraction: f64| {
        log_info!("Import progress: {:.1}%", fraction * 100.0);
    });
    let handle = service.start_import(source, Some(on_progress));
    let report = handle.wait().await?;

    log_info!("Store now holds {} sightings", store.count().await?);
    Ok(report)
}

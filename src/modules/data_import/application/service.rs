use crate::log_info;
use crate::modules::sightings::SessionFactory;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::super::domain::services::import_components::{
    ImportHandle, ImportOperation, ImportReport, ImportState, ProgressCallback,
};

/// Import service - starts sighting imports and tracks the ones in flight
///
/// Runs against the same store are serialized by the store's writer lock, so
/// starting several imports at once is safe.
#[derive(Clone)]
pub struct ImportService {
    sessions: Arc<dyn SessionFactory>,
    active: Arc<Mutex<HashMap<Uuid, CancellationToken>>>,
    shutdown: CancellationToken,
}

impl ImportService {
    pub fn new(sessions: Arc<dyn SessionFactory>) -> Self {
        Self {
            sessions,
            active: Arc::new(Mutex::new(HashMap::new())),
            shutdown: CancellationToken::new(),
        }
    }

    /// Schedule an import of `source` on a background task
    pub fn start_import(
        &self,
        source: impl Into<PathBuf>,
        progress_callback: Option<ProgressCallback>,
    ) -> ImportHandle {
        let token = self.shutdown.child_token();
        let mut operation = ImportOperation::new(Arc::clone(&self.sessions), source)
            .with_cancellation_token(token.clone());
        let run_id = operation.run_id();

        if let Some(callback) = progress_callback {
            operation = operation.with_progress_callback(move |fraction| callback(fraction));
        }

        let active = Arc::clone(&self.active);
        operation = operation.with_completion_callback(move || {
            lock(&active).remove(&run_id);
        });

        lock(&self.active).insert(run_id, token);
        log_info!(
            "Scheduled import {} from {}",
            run_id,
            operation.source().display()
        );

        operation.schedule()
    }

    /// Schedule an import and wait for its report
    pub async fn import_file(&self, source: impl Into<PathBuf>) -> ImportReport {
        let handle = self.start_import(source, None);
        let run_id = handle.run_id();

        match handle.wait().await {
            Ok(report) => report,
            Err(e) => {
                let mut report = ImportReport::new(run_id);
                report.state = ImportState::Failed;
                report.error = Some(e.to_string());
                report
            }
        }
    }

    /// Request cancellation of a running import; false if it is not active
    pub fn cancel_import(&self, run_id: Uuid) -> bool {
        match lock(&self.active).get(&run_id) {
            Some(token) => {
                log_info!("Cancellation requested for import {}", run_id);
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn active_imports(&self) -> Vec<Uuid> {
        lock(&self.active).keys().copied().collect()
    }

    /// Cancel every active import; imports started afterwards stop before
    /// their first record
    pub fn shutdown(&self) {
        log_info!("Shutting down import service");
        self.shutdown.cancel();
    }
}

fn lock(
    active: &Mutex<HashMap<Uuid, CancellationToken>>,
) -> MutexGuard<'_, HashMap<Uuid, CancellationToken>> {
    active.lock().unwrap_or_else(|e| e.into_inner())
}

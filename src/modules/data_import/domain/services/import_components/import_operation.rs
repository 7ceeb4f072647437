use crate::modules::sightings::{SessionFactory, StoreSession};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::logger::{LogContext, TimedOperation};
use crate::{log_debug, log_error, log_info, log_warn};

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::field_mapper::FieldMapper;
use super::progress_tracker::ProgressTracker;
use super::record_materializer::RecordMaterializer;
use super::types::{
    ImportError, ImportEvent, ImportReport, ImportState, MaterializeOutcome, SkippedSighting,
};
use super::uniqueness_resolver::UniquenessResolver;

/// How the record loop ended
enum RunFlow {
    Finished,
    Cancelled,
}

/// One cancellable import of a JSON sighting file into a store
///
/// Runs at most once: `run` and `schedule` consume the operation, so a
/// terminal state can never go back to `Running`.
pub struct ImportOperation {
    run_id: Uuid,
    session_factory: Arc<dyn SessionFactory>,
    source: PathBuf,
    tracker: ProgressTracker,
    cancel: CancellationToken,
    state: Arc<RwLock<ImportState>>,
}

impl ImportOperation {
    pub fn new(session_factory: Arc<dyn SessionFactory>, source: impl Into<PathBuf>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            session_factory,
            source: source.into(),
            tracker: ProgressTracker::new(),
            cancel: CancellationToken::new(),
            state: Arc::new(RwLock::new(ImportState::Ready)),
        }
    }

    /// Invoke `callback` with every progress fraction
    pub fn with_progress_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.tracker = self.tracker.with_progress_callback(Arc::new(callback));
        self
    }

    /// Invoke `callback` once when the run reaches a terminal state
    pub fn with_completion_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.tracker = self.tracker.with_completion_callback(Arc::new(callback));
        self
    }

    /// Use an externally owned token, e.g. a child of a service-wide token
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn state(&self) -> ImportState {
        read_state(&self.state)
    }

    pub fn progress(&self) -> f64 {
        self.tracker.progress()
    }

    pub fn subscribe(&self) -> UnboundedReceiver<ImportEvent> {
        self.tracker.subscribe()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run on a tokio worker and return a handle to observe or cancel it
    pub fn schedule(self) -> ImportHandle {
        let run_id = self.run_id;
        let cancel = self.cancel.clone();
        let tracker = self.tracker.clone();
        let state = Arc::clone(&self.state);

        ImportHandle {
            run_id,
            cancel,
            tracker,
            state,
            join: Some(tokio::spawn(self.run())),
        }
    }

    /// Run to a terminal state on the current task
    pub async fn run(self) -> ImportReport {
        let timer = TimedOperation::new("sighting_import");
        let mut completion = CompletionGuard::new(&self.tracker, &self.state);
        let mut report = ImportReport::new(self.run_id);

        write_state(&self.state, ImportState::Running);
        log_info!(
            "Import {} started from {}",
            self.run_id,
            self.source.display()
        );

        let state = match self.execute(&mut report).await {
            Ok(state) => state,
            Err(e) => {
                log_error!("Import {} failed: {}", self.run_id, e);
                report.error = Some(e.to_string());
                ImportState::Failed
            }
        };

        report.state = state;
        report.elapsed_ms = timer.finish_with_info(&format!(
            "{} {}: {} created, {} updated, {} skipped of {}",
            self.run_id,
            state,
            report.created,
            report.updated,
            report.skipped.len(),
            report.total
        ));
        completion.finish(state);

        report
    }

    /// Drive the session through the whole batch and settle it
    async fn execute(&self, report: &mut ImportReport) -> Result<ImportState, ImportError> {
        let mut session = self
            .session_factory
            .open_session()
            .await
            .map_err(ImportError::SessionUnavailable)?;

        match self.apply_documents(session.as_mut(), report).await {
            Ok(RunFlow::Finished) => {
                if let Err(e) = session.commit().await {
                    session.rollback().await;
                    return Err(ImportError::CommitFailure(e));
                }
                Ok(ImportState::Completed)
            }
            Ok(RunFlow::Cancelled) => {
                session.rollback().await;
                log_info!(
                    "Import {} cancelled after {} of {} documents, changes discarded",
                    self.run_id,
                    report.processed,
                    report.total
                );
                Ok(ImportState::Cancelled)
            }
            Err(e) => {
                session.rollback().await;
                Err(e)
            }
        }
    }

    async fn apply_documents(
        &self,
        session: &mut dyn StoreSession,
        report: &mut ImportReport,
    ) -> Result<RunFlow, ImportError> {
        let documents = self.load_documents().await?;
        let total = documents.len();
        report.total = total;
        log_info!("Import {}: {} documents in source", self.run_id, total);

        for (index, document) in documents.iter().enumerate() {
            tokio::task::yield_now().await;
            if self.cancel.is_cancelled() {
                return Ok(RunFlow::Cancelled);
            }

            match FieldMapper::map_sighting(document) {
                Ok(sighting) => {
                    LogContext::import_progress(index + 1, total, &sighting.guid);
                    let resolution = UniquenessResolver::resolve(session, &sighting.guid)
                        .await
                        .map_err(ImportError::Store)?;
                    let record = RecordMaterializer::apply(session, &sighting, resolution)
                        .await
                        .map_err(ImportError::Store)?;

                    match record.outcome {
                        MaterializeOutcome::Created => report.created += 1,
                        MaterializeOutcome::Updated => report.updated += 1,
                    }
                }
                Err(reason) => {
                    log_warn!(
                        "Import {}: skipping document {} ({})",
                        self.run_id,
                        index,
                        reason
                    );
                    report.skipped.push(SkippedSighting { index, reason });
                }
            }

            report.processed = index + 1;
            self.tracker.emit_progress(report.processed, total);
        }

        if total == 0 {
            self.tracker.emit_progress(0, 0);
        }

        // Last boundary before the commit
        if self.cancel.is_cancelled() {
            return Ok(RunFlow::Cancelled);
        }

        Ok(RunFlow::Finished)
    }

    /// Read and parse the source; anything but a top-level array is fatal
    async fn load_documents(&self) -> Result<Vec<Value>, ImportError> {
        let bytes =
            tokio::fs::read(&self.source)
                .await
                .map_err(|source| ImportError::SourceUnreadable {
                    path: self.source.clone(),
                    source,
                })?;
        log_debug!(
            "Import {}: read {} bytes from {}",
            self.run_id,
            bytes.len(),
            self.source.display()
        );

        let parsed: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ImportError::SourceMalformed(format!("invalid JSON: {}", e)))?;

        match parsed {
            Value::Array(documents) => Ok(documents),
            other => Err(ImportError::SourceMalformed(format!(
                "top-level value is {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn read_state(state: &RwLock<ImportState>) -> ImportState {
    *state.read().unwrap_or_else(|e| e.into_inner())
}

fn write_state(state: &RwLock<ImportState>, value: ImportState) {
    *state.write().unwrap_or_else(|e| e.into_inner()) = value;
}

/// Emits the completion signal exactly once, even if the run is dropped early
struct CompletionGuard<'a> {
    tracker: &'a ProgressTracker,
    state: &'a RwLock<ImportState>,
    fired: bool,
}

impl<'a> CompletionGuard<'a> {
    fn new(tracker: &'a ProgressTracker, state: &'a RwLock<ImportState>) -> Self {
        Self {
            tracker,
            state,
            fired: false,
        }
    }

    fn finish(&mut self, terminal: ImportState) {
        write_state(self.state, terminal);
        self.fired = true;
        self.tracker.emit_completion();
    }
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        if !self.fired {
            log_warn!("Import ended without reaching a terminal state, marking it failed");
            self.finish(ImportState::Failed);
        }
    }
}

/// Handle to a scheduled import
pub struct ImportHandle {
    run_id: Uuid,
    cancel: CancellationToken,
    tracker: ProgressTracker,
    state: Arc<RwLock<ImportState>>,
    join: Option<JoinHandle<ImportReport>>,
}

impl ImportHandle {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Request cancellation; takes effect at the next record boundary
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn progress(&self) -> f64 {
        self.tracker.progress()
    }

    pub fn state(&self) -> ImportState {
        read_state(&self.state)
    }

    /// Events emitted after this call
    pub fn subscribe(&self) -> UnboundedReceiver<ImportEvent> {
        self.tracker.subscribe()
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map(|j| j.is_finished()).unwrap_or(true)
    }

    /// Wait for the run's report
    pub async fn wait(mut self) -> AppResult<ImportReport> {
        let join = self
            .join
            .take()
            .ok_or_else(|| AppError::InternalError("Import was never scheduled".to_string()))?;
        Ok(join.await?)
    }
}

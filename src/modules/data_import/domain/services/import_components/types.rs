use crate::shared::errors::AppError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Lifecycle of one import run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportState {
    Ready,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl ImportState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ImportState::Completed | ImportState::Cancelled | ImportState::Failed
        )
    }
}

impl std::fmt::Display for ImportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportState::Ready => write!(f, "ready"),
            ImportState::Running => write!(f, "running"),
            ImportState::Completed => write!(f, "completed"),
            ImportState::Cancelled => write!(f, "cancelled"),
            ImportState::Failed => write!(f, "failed"),
        }
    }
}

/// Events delivered to channel subscribers of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ImportEvent {
    /// Fraction of source documents processed, in [0.0, 1.0]
    Progress(f64),
    /// The run reached a terminal state
    Completed,
}

/// Batch-fatal import failures
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Could not open a store session: {0}")]
    SessionUnavailable(AppError),

    #[error("Cannot read source file {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Source is not an array of documents: {0}")]
    SourceMalformed(String),

    #[error("Store error while applying record: {0}")]
    Store(AppError),

    #[error("Commit failed: {0}")]
    CommitFailure(AppError),
}

/// Why a single source document was skipped
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordRejection {
    #[error("document has no id")]
    MissingId,

    #[error("document is not a key-value object")]
    NotAnObject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSighting {
    /// Position of the document in the source array
    pub index: usize,
    pub reason: RecordRejection,
}

/// Whether the materializer inserted or overwrote a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterializeOutcome {
    Created,
    Updated,
}

/// Summary of one import run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub run_id: Uuid,
    pub state: ImportState,
    pub total: usize,
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: Vec<SkippedSighting>,
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl ImportReport {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            state: ImportState::Ready,
            total: 0,
            processed: 0,
            created: 0,
            updated: 0,
            skipped: Vec::new(),
            error: None,
            elapsed_ms: 0,
        }
    }

    /// Records written to the store by this run
    pub fn persisted(&self) -> usize {
        self.created + self.updated
    }
}

use crate::log_debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::types::ImportEvent;

pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;
pub type CompletionCallback = Arc<dyn Fn() + Send + Sync>;

/// Delivers progress fractions and the completion signal to every observer
///
/// Observers are a progress callback, a completion callback and any number of
/// channel subscribers. Channels are unbounded so no update is dropped.
#[derive(Clone, Default)]
pub struct ProgressTracker {
    progress_callback: Option<ProgressCallback>,
    completion_callback: Option<CompletionCallback>,
    subscribers: Arc<Mutex<Vec<UnboundedSender<ImportEvent>>>>,
    latest: Arc<AtomicU64>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_completion_callback(mut self, callback: CompletionCallback) -> Self {
        self.completion_callback = Some(callback);
        self
    }

    /// Receive every event of the run from now on
    pub fn subscribe(&self) -> UnboundedReceiver<ImportEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock_subscribers().push(tx);
        rx
    }

    /// Latest reported fraction
    pub fn progress(&self) -> f64 {
        f64::from_bits(self.latest.load(Ordering::Acquire))
    }

    /// Report `processed` of `total` documents; returns the delivered fraction
    pub fn emit_progress(&self, processed: usize, total: usize) -> f64 {
        let fraction = if total == 0 {
            1.0
        } else {
            (processed as f64 / total as f64).clamp(0.0, 1.0)
        };
        self.latest.store(fraction.to_bits(), Ordering::Release);

        if let Some(ref callback) = self.progress_callback {
            callback(fraction);
        }
        self.broadcast(ImportEvent::Progress(fraction));

        fraction
    }

    pub fn emit_completion(&self) {
        if let Some(ref callback) = self.completion_callback {
            callback();
        }
        self.broadcast(ImportEvent::Completed);
    }

    fn broadcast(&self, event: ImportEvent) {
        let mut subscribers = self.lock_subscribers();
        subscribers.retain(|tx| match tx.send(event.clone()) {
            Ok(()) => true,
            Err(_) => {
                log_debug!("Dropping closed import event subscriber");
                false
            }
        });
    }

    fn lock_subscribers(&self) -> std::sync::MutexGuard<'_, Vec<UnboundedSender<ImportEvent>>> {
        // Recover from a poisoned lock; the list itself stays consistent
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

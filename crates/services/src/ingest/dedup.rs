use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use callboard_protocol::TranscriptEvent;
use parking_lot::Mutex;
use tokio::task::AbortHandle;
use tracing::debug;

/// Admission gate for transcription callbacks.
///
/// Partial events are always dropped. Final events are admitted once per
/// dedup key within the current window; the window is cleared wholesale on
/// a timer, not per entry - a key readmits after the clear even if it was
/// inserted just before it.
pub struct DedupGate {
    window: Duration,
    seen: Mutex<HashSet<String>>,
}

impl DedupGate {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            seen: Mutex::new(HashSet::new()),
        }
    }

    /// Check-then-insert under one lock, so same-call concurrent callbacks
    /// cannot race into duplicate admission.
    pub fn admit(&self, event: &TranscriptEvent) -> bool {
        if event.is_partial {
            return false;
        }
        self.seen.lock().insert(event.dedup_key())
    }

    pub fn clear(&self) {
        self.seen.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.lock().is_empty()
    }

    /// Spawns the periodic window clear. The returned handle aborts the
    /// timer task; dropping it detaches the task for the process lifetime.
    pub fn spawn_window_clear(self: &Arc<Self>) -> AbortHandle {
        let gate = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(gate.window);
            // The first tick completes immediately; skip it.
            interval.tick().await;
            loop {
                interval.tick().await;
                gate.clear();
                debug!("Dedup window cleared");
            }
        })
        .abort_handle()
    }
}

use std::sync::Arc;

use callboard_db::models::TranscriptEntry;
use callboard_protocol::{TranscriptEvent, TranscriptPayload};
use tracing::warn;

use crate::recent::RecentLog;
use crate::store::CallStore;

/// Persists an admitted final transcript into both stores.
///
/// The two writes are independent and non-transactional: the ephemeral
/// recent log is disposable, the call record is the system of record, and
/// neither outage may block the other. Failures surface as warnings only.
pub struct DualStoreWriter {
    recent: Arc<dyn RecentLog>,
    calls: Arc<dyn CallStore>,
}

impl DualStoreWriter {
    pub fn new(recent: Arc<dyn RecentLog>, calls: Arc<dyn CallStore>) -> Self {
        Self { recent, calls }
    }

    pub async fn persist(&self, event: &TranscriptEvent) {
        let payload = TranscriptPayload::from(event);
        if let Err(e) = self.recent.append(&payload).await {
            warn!(call_sid = %event.call_sid, %e, "Recent-log append failed");
        }

        if let Err(e) = self
            .calls
            .append_transcript(&event.call_sid, to_entry(event))
            .await
        {
            warn!(call_sid = %event.call_sid, %e, "Call-record write failed");
        }
    }
}

fn to_entry(event: &TranscriptEvent) -> TranscriptEntry {
    TranscriptEntry {
        text: event.text.clone(),
        track: event.track.as_str().to_string(),
        role: event.role().as_str().to_string(),
        timestamp: bson::DateTime::from_chrono(event.timestamp),
        confidence: event.confidence,
    }
}

pub mod redis;

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use callboard_protocol::TranscriptPayload;
use parking_lot::Mutex;

/// How many entries (across all calls) the connect-time snapshot carries.
pub const RECENT_SNAPSHOT_LIMIT: usize = 50;

/// Upper bound on the per-call context list kept for enrichment.
pub const PER_CALL_LIMIT: usize = 200;

/// Ephemeral ordered transcript log.
///
/// Exists purely to give enrichment cheap access to recent conversation
/// context and to seed new subscribers; disposable, with a lifecycle
/// independent from the durable [`crate::store::CallStore`].
#[async_trait]
pub trait RecentLog: Send + Sync + 'static {
    /// Appends a final transcript to the per-call list and the global
    /// recent list.
    async fn append(&self, entry: &TranscriptPayload) -> anyhow::Result<()>;

    /// Full ordered conversation context for one call.
    async fn call_context(&self, call_sid: &str) -> anyhow::Result<Vec<TranscriptPayload>>;

    /// The last `limit` transcripts across all calls, oldest first.
    async fn recent(&self, limit: usize) -> anyhow::Result<Vec<TranscriptPayload>>;
}

/// In-process recent log, used when Redis is unavailable and by tests.
#[derive(Default)]
pub struct MemoryRecentLog {
    per_call: Mutex<HashMap<String, VecDeque<TranscriptPayload>>>,
    recent: Mutex<VecDeque<TranscriptPayload>>,
}

#[async_trait]
impl RecentLog for MemoryRecentLog {
    async fn append(&self, entry: &TranscriptPayload) -> anyhow::Result<()> {
        {
            let mut per_call = self.per_call.lock();
            let list = per_call.entry(entry.call_sid.clone()).or_default();
            list.push_back(entry.clone());
            while list.len() > PER_CALL_LIMIT {
                list.pop_front();
            }
        }
        let mut recent = self.recent.lock();
        recent.push_back(entry.clone());
        while recent.len() > RECENT_SNAPSHOT_LIMIT {
            recent.pop_front();
        }
        Ok(())
    }

    async fn call_context(&self, call_sid: &str) -> anyhow::Result<Vec<TranscriptPayload>> {
        Ok(self
            .per_call
            .lock()
            .get(call_sid)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn recent(&self, limit: usize) -> anyhow::Result<Vec<TranscriptPayload>> {
        let recent = self.recent.lock();
        let skip = recent.len().saturating_sub(limit);
        Ok(recent.iter().skip(skip).cloned().collect())
    }
}

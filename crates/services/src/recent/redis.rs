use async_trait::async_trait;
use callboard_protocol::TranscriptPayload;
use redis::{AsyncCommands, aio::ConnectionManager};
use tracing::warn;

use super::{PER_CALL_LIMIT, RECENT_SNAPSHOT_LIMIT, RecentLog};

const RECENT_KEY: &str = "callboard:transcripts:recent";

/// Redis-backed recent log. Lists are trimmed on every append so the keys
/// stay bounded without a separate reaper.
pub struct RedisRecentLog {
    conn: ConnectionManager,
}

impl RedisRecentLog {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    fn call_key(call_sid: &str) -> String {
        format!("callboard:transcripts:call:{call_sid}")
    }
}

#[async_trait]
impl RecentLog for RedisRecentLog {
    async fn append(&self, entry: &TranscriptPayload) -> anyhow::Result<()> {
        let payload = serde_json::to_string(entry)?;
        let call_key = Self::call_key(&entry.call_sid);
        let mut conn = self.conn.clone();

        let _: () = conn.rpush(&call_key, &payload).await?;
        let _: () = conn.ltrim(&call_key, -(PER_CALL_LIMIT as isize), -1).await?;
        let _: () = conn.rpush(RECENT_KEY, &payload).await?;
        let _: () = conn
            .ltrim(RECENT_KEY, -(RECENT_SNAPSHOT_LIMIT as isize), -1)
            .await?;
        Ok(())
    }

    async fn call_context(&self, call_sid: &str) -> anyhow::Result<Vec<TranscriptPayload>> {
        let mut conn = self.conn.clone();
        let raw: Vec<String> = conn.lrange(Self::call_key(call_sid), 0, -1).await?;
        Ok(parse_entries(raw))
    }

    async fn recent(&self, limit: usize) -> anyhow::Result<Vec<TranscriptPayload>> {
        let mut conn = self.conn.clone();
        let raw: Vec<String> = conn.lrange(RECENT_KEY, -(limit as isize), -1).await?;
        Ok(parse_entries(raw))
    }
}

fn parse_entries(raw: Vec<String>) -> Vec<TranscriptPayload> {
    raw.iter()
        .filter_map(|item| match serde_json::from_str(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(%e, "Skipping unparsable recent-log entry");
                None
            }
        })
        .collect()
}

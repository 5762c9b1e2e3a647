use std::collections::HashMap;

use async_trait::async_trait;
use bson::DateTime;
use callboard_db::models::{Call, CallStatus, TranscriptEntry};
use mongodb::Database;
use parking_lot::Mutex;

use crate::dao::call::CallDao;

/// The durable system of record for calls, keyed by `call_sid`.
///
/// All writes are upserts - there is no separate "not found" error on the
/// write path. Implementations are best-effort: callers log failures and
/// continue.
#[async_trait]
pub trait CallStore: Send + Sync + 'static {
    async fn append_transcript(
        &self,
        call_sid: &str,
        entry: TranscriptEntry,
    ) -> anyhow::Result<()>;

    async fn update_status(
        &self,
        call_sid: &str,
        status: CallStatus,
        duration: Option<i64>,
    ) -> anyhow::Result<()>;

    async fn set_recording_url(&self, call_sid: &str, url: &str) -> anyhow::Result<()>;

    async fn find(&self, call_sid: &str) -> anyhow::Result<Option<Call>>;
}

pub struct MongoCallStore {
    calls: CallDao,
}

impl MongoCallStore {
    pub fn new(db: &Database) -> Self {
        Self {
            calls: CallDao::new(db),
        }
    }
}

#[async_trait]
impl CallStore for MongoCallStore {
    async fn append_transcript(
        &self,
        call_sid: &str,
        entry: TranscriptEntry,
    ) -> anyhow::Result<()> {
        self.calls.push_transcript(call_sid, &entry).await?;
        Ok(())
    }

    async fn update_status(
        &self,
        call_sid: &str,
        status: CallStatus,
        duration: Option<i64>,
    ) -> anyhow::Result<()> {
        self.calls.update_status(call_sid, status, duration).await?;
        Ok(())
    }

    async fn set_recording_url(&self, call_sid: &str, url: &str) -> anyhow::Result<()> {
        self.calls.set_recording_url(call_sid, url).await?;
        Ok(())
    }

    async fn find(&self, call_sid: &str) -> anyhow::Result<Option<Call>> {
        Ok(self.calls.find_by_sid(call_sid).await?)
    }
}

/// In-process call store, used when MongoDB is unavailable and by tests.
#[derive(Default)]
pub struct MemoryCallStore {
    calls: Mutex<HashMap<String, Call>>,
}

fn new_call(call_sid: &str) -> Call {
    let now = DateTime::now();
    Call {
        id: None,
        call_sid: call_sid.to_string(),
        caller_number: None,
        target_number: None,
        status: CallStatus::Initiated,
        transcripts: Vec::new(),
        start_time: now,
        end_time: None,
        duration: None,
        recording_url: None,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl CallStore for MemoryCallStore {
    async fn append_transcript(
        &self,
        call_sid: &str,
        entry: TranscriptEntry,
    ) -> anyhow::Result<()> {
        let mut calls = self.calls.lock();
        let call = calls
            .entry(call_sid.to_string())
            .or_insert_with(|| new_call(call_sid));
        call.transcripts.push(entry);
        call.updated_at = DateTime::now();
        Ok(())
    }

    async fn update_status(
        &self,
        call_sid: &str,
        status: CallStatus,
        duration: Option<i64>,
    ) -> anyhow::Result<()> {
        let mut calls = self.calls.lock();
        let call = calls
            .entry(call_sid.to_string())
            .or_insert_with(|| new_call(call_sid));
        call.status = status;
        if status.is_terminal() {
            call.end_time = Some(DateTime::now());
        }
        if duration.is_some() {
            call.duration = duration;
        }
        call.updated_at = DateTime::now();
        Ok(())
    }

    async fn set_recording_url(&self, call_sid: &str, url: &str) -> anyhow::Result<()> {
        let mut calls = self.calls.lock();
        let call = calls
            .entry(call_sid.to_string())
            .or_insert_with(|| new_call(call_sid));
        call.recording_url = Some(url.to_string());
        call.updated_at = DateTime::now();
        Ok(())
    }

    async fn find(&self, call_sid: &str) -> anyhow::Result<Option<Call>> {
        Ok(self.calls.lock().get(call_sid).cloned())
    }
}

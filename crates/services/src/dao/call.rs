use bson::{DateTime, doc};
use callboard_db::models::{Call, CallStatus, TranscriptEntry};
use mongodb::Database;

use super::base::{BaseDao, DaoResult};

pub struct CallDao {
    pub base: BaseDao<Call>,
}

impl CallDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Call::COLLECTION),
        }
    }

    /// Appends a final transcript to the call document, creating the
    /// document if this is the first write for the `call_sid`.
    pub async fn push_transcript(&self, call_sid: &str, entry: &TranscriptEntry) -> DaoResult<()> {
        let now = DateTime::now();
        let entry_bson = bson::to_bson(entry)?;
        let update = doc! {
            "$push": { "transcripts": entry_bson },
            "$set": { "updated_at": now },
            "$setOnInsert": {
                "status": CallStatus::Initiated.as_str(),
                "start_time": now,
                "created_at": now,
            },
        };
        self.base.upsert_one(doc! { "call_sid": call_sid }, update).await
    }

    pub async fn update_status(
        &self,
        call_sid: &str,
        status: CallStatus,
        duration: Option<i64>,
    ) -> DaoResult<()> {
        let now = DateTime::now();
        let mut set = doc! { "status": status.as_str(), "updated_at": now };
        if status.is_terminal() {
            set.insert("end_time", now);
        }
        if let Some(duration) = duration {
            set.insert("duration", duration);
        }
        let update = doc! {
            "$set": set,
            "$setOnInsert": { "start_time": now, "created_at": now },
        };
        self.base.upsert_one(doc! { "call_sid": call_sid }, update).await
    }

    pub async fn set_recording_url(&self, call_sid: &str, url: &str) -> DaoResult<()> {
        let now = DateTime::now();
        let update = doc! {
            "$set": { "recording_url": url, "updated_at": now },
            "$setOnInsert": {
                "status": CallStatus::Initiated.as_str(),
                "start_time": now,
                "created_at": now,
            },
        };
        self.base.upsert_one(doc! { "call_sid": call_sid }, update).await
    }

    pub async fn find_by_sid(&self, call_sid: &str) -> DaoResult<Option<Call>> {
        self.base.find_opt(doc! { "call_sid": call_sid }).await
    }
}

use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// Lifecycle status reported by the telephony provider's status callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallStatus {
    Initiated,
    Ringing,
    InProgress,
    Completed,
    Busy,
    Failed,
    NoAnswer,
}

impl CallStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "initiated" => Some(CallStatus::Initiated),
            "ringing" => Some(CallStatus::Ringing),
            "in-progress" => Some(CallStatus::InProgress),
            "completed" => Some(CallStatus::Completed),
            "busy" => Some(CallStatus::Busy),
            "failed" => Some(CallStatus::Failed),
            "no-answer" => Some(CallStatus::NoAnswer),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CallStatus::Initiated => "initiated",
            CallStatus::Ringing => "ringing",
            CallStatus::InProgress => "in-progress",
            CallStatus::Completed => "completed",
            CallStatus::Busy => "busy",
            CallStatus::Failed => "failed",
            CallStatus::NoAnswer => "no-answer",
        }
    }

    /// Terminal statuses close the call record (end time is stamped).
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CallStatus::Completed | CallStatus::Busy | CallStatus::Failed | CallStatus::NoAnswer
        )
    }
}

/// A final transcript fragment embedded in the call document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub text: String,
    pub track: String,
    pub role: String,
    pub timestamp: DateTime,
    pub confidence: f64,
}

/// The durable record of a call - one document per `call_sid`, created on
/// first write (upsert semantics).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Call {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub call_sid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_number: Option<String>,
    pub status: CallStatus,
    #[serde(default)]
    pub transcripts: Vec<TranscriptEntry>,
    pub start_time: DateTime,
    pub end_time: Option<DateTime>,
    /// Call duration in seconds, set when the provider reports completion.
    pub duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_url: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Call {
    pub const COLLECTION: &'static str = "calls";
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the two fixed audio tracks of a two-party call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    InboundTrack,
    OutboundTrack,
}

impl Track {
    /// Semantic role for the track: the inbound leg is the agent, the
    /// outbound leg is the customer being called.
    pub fn role(self) -> Role {
        match self {
            Track::InboundTrack => Role::Agent,
            Track::OutboundTrack => Role::Customer,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Track::InboundTrack => "inbound_track",
            Track::OutboundTrack => "outbound_track",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "inbound_track" => Some(Track::InboundTrack),
            "outbound_track" => Some(Track::OutboundTrack),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Agent,
    Customer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Agent => "agent",
            Role::Customer => "customer",
        }
    }
}

/// A transcription fragment received from the telephony provider.
///
/// A final event is uniquely identified by `(call_sid, track, text,
/// timestamp)` - the dedup key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEvent {
    pub call_sid: String,
    pub track: Track,
    pub text: String,
    pub is_partial: bool,
    /// Provider confidence in [0.0, 1.0].
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEvent {
    pub fn role(&self) -> Role {
        self.track.role()
    }

    pub fn dedup_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.call_sid,
            self.track.as_str(),
            self.text,
            self.timestamp.to_rfc3339()
        )
    }
}

/// The transcript shape that travels to subscribers and through the
/// recent log. Carries the resolved role alongside the raw track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptPayload {
    pub call_sid: String,
    pub text: String,
    pub is_partial: bool,
    pub track: Track,
    pub role: Role,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptPayload {
    pub fn dedup_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.call_sid,
            self.track.as_str(),
            self.text,
            self.timestamp.to_rfc3339()
        )
    }
}

impl From<&TranscriptEvent> for TranscriptPayload {
    fn from(event: &TranscriptEvent) -> Self {
        Self {
            call_sid: event.call_sid.clone(),
            text: event.text.clone(),
            is_partial: event.is_partial,
            track: event.track,
            role: event.role(),
            confidence: event.confidence,
            timestamp: event.timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    AiSuggestion,
    Suggestion,
    Reminder,
    Tip,
    Action,
}

/// Marks which producer emitted a recommendation batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    ContextualAi,
}

/// A ranked recommendation derived from live conversation context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub kind: RecommendationKind,
    pub source: RecommendationSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_sid: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Completed,
    Pending,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatusEntry {
    pub task: String,
    pub status: TaskStatus,
}

/// Authoritative task-list snapshot - replaces subscriber state wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskListUpdate {
    pub call_sid: Option<String>,
    pub tasks_with_status: Vec<TaskStatusEntry>,
    pub completed_count: usize,
    pub total_count: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfirmed {
    pub client_id: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallStatusUpdate {
    pub call_sid: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingAvailable {
    pub call_sid: String,
    pub recording_url: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamLifecycle {
    pub call_sid: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionError {
    pub call_sid: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A single free-text AI recommendation (distinct producer from the
/// contextual batch path).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiRecommendation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_sid: Option<String>,
    pub recommendation: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pong {
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugResponse {
    pub message: String,
    pub client_id: String,
    pub timestamp: DateTime<Utc>,
    pub original: serde_json::Value,
}

/// Server → subscriber event envelope.
///
/// Serializes as `{"type": "...", "data": {...}}` on the wire; clear
/// signals carry no data object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    ConnectionConfirmed(ConnectionConfirmed),
    RecentTranscripts(Vec<TranscriptPayload>),
    TaskListUpdate(TaskListUpdate),
    Transcript(TranscriptPayload),
    AiRecommendation(AiRecommendation),
    BackendRecommendations(Vec<Recommendation>),
    CallStatusUpdate(CallStatusUpdate),
    RecordingAvailable(RecordingAvailable),
    StreamStarted(StreamLifecycle),
    StreamEnded(StreamLifecycle),
    TranscriptionError(TranscriptionError),
    ClearTranscripts,
    ClearRecommendations,
    ClearCallInsights,
    Error(ErrorEvent),
    Pong(Pong),
    DebugResponse(DebugResponse),
}

impl ServerEvent {
    /// Wire name of the event (the `type` field).
    pub fn type_name(&self) -> &'static str {
        match self {
            ServerEvent::ConnectionConfirmed(_) => "connection_confirmed",
            ServerEvent::RecentTranscripts(_) => "recent_transcripts",
            ServerEvent::TaskListUpdate(_) => "task_list_update",
            ServerEvent::Transcript(_) => "transcript",
            ServerEvent::AiRecommendation(_) => "ai_recommendation",
            ServerEvent::BackendRecommendations(_) => "backend_recommendations",
            ServerEvent::CallStatusUpdate(_) => "call_status_update",
            ServerEvent::RecordingAvailable(_) => "recording_available",
            ServerEvent::StreamStarted(_) => "stream_started",
            ServerEvent::StreamEnded(_) => "stream_ended",
            ServerEvent::TranscriptionError(_) => "transcription_error",
            ServerEvent::ClearTranscripts => "clear_transcripts",
            ServerEvent::ClearRecommendations => "clear_recommendations",
            ServerEvent::ClearCallInsights => "clear_call_insights",
            ServerEvent::Error(_) => "error",
            ServerEvent::Pong(_) => "pong",
            ServerEvent::DebugResponse(_) => "debug_response",
        }
    }
}

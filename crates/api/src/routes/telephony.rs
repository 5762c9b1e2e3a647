use axum::{Json, extract::{Form, State}};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info, warn};

use callboard_db::models::CallStatus;
use callboard_protocol::{
    CallStatusUpdate, RecordingAvailable, ServerEvent, StreamLifecycle, Track, TranscriptEvent,
    TranscriptPayload, TranscriptionError, TaskListUpdate,
};

use crate::state::AppState;

/// Transcription status callback from the provider.
///
/// The provider's wire envelope is form-encoded with a nested JSON string
/// in `TranscriptionData`.
#[derive(Debug, Deserialize)]
pub struct TranscriptionCallback {
    #[serde(rename = "CallSid")]
    pub call_sid: String,
    #[serde(rename = "TranscriptionEvent")]
    pub transcription_event: Option<String>,
    #[serde(rename = "TranscriptionData")]
    pub transcription_data: Option<String>,
    #[serde(rename = "Final")]
    pub is_final: Option<String>,
    #[serde(rename = "Track")]
    pub track: Option<String>,
    #[serde(rename = "Timestamp")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionData {
    transcript: String,
    confidence: Option<f64>,
}

pub async fn transcription_status(
    State(state): State<AppState>,
    Form(body): Form<TranscriptionCallback>,
) -> &'static str {
    match body.transcription_event.as_deref() {
        Some("transcription-content") => {
            ingest_content(&state, &body).await;
        }
        Some("transcription-started") => {
            info!(call_sid = %body.call_sid, "Transcription stream started");
            state.bus.publish(ServerEvent::StreamStarted(StreamLifecycle {
                call_sid: body.call_sid.clone(),
                timestamp: Utc::now(),
            }));
        }
        Some("transcription-stopped") => {
            info!(call_sid = %body.call_sid, "Transcription stream ended");
            state.bus.publish(ServerEvent::StreamEnded(StreamLifecycle {
                call_sid: body.call_sid.clone(),
                timestamp: Utc::now(),
            }));
        }
        Some("transcription-error") => {
            warn!(call_sid = %body.call_sid, "Provider reported a transcription error");
            state
                .bus
                .publish(ServerEvent::TranscriptionError(TranscriptionError {
                    call_sid: body.call_sid.clone(),
                    error: "Provider reported a transcription error".to_string(),
                    details: None,
                    timestamp: Utc::now(),
                }));
        }
        other => {
            debug!(call_sid = %body.call_sid, event = ?other, "Unhandled transcription event");
        }
    }

    "OK"
}

/// The ingestion path: dedup gate → dual-store writer → broadcast →
/// enrichment trigger (fire-and-forget). The provider response never waits
/// on enrichment.
async fn ingest_content(state: &AppState, body: &TranscriptionCallback) {
    let Some(raw) = body.transcription_data.as_deref() else {
        return;
    };

    let data: TranscriptionData = match serde_json::from_str(raw) {
        Ok(data) => data,
        Err(e) => {
            warn!(call_sid = %body.call_sid, %e, "Failed to parse TranscriptionData");
            return;
        }
    };

    let Some(track) = body.track.as_deref().and_then(Track::parse) else {
        warn!(call_sid = %body.call_sid, track = ?body.track, "Unknown track, dropping");
        return;
    };

    // The provider timestamp is part of the dedup identity tuple; fall
    // back to arrival time when the callback omits it.
    let timestamp = body
        .timestamp
        .as_deref()
        .and_then(|t| chrono::DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    let event = TranscriptEvent {
        call_sid: body.call_sid.clone(),
        track,
        text: data.transcript,
        is_partial: body.is_final.as_deref() != Some("true"),
        confidence: data.confidence.unwrap_or(1.0).clamp(0.0, 1.0),
        timestamp,
    };

    if !state.dedup.admit(&event) {
        debug!(
            call_sid = %event.call_sid,
            is_partial = event.is_partial,
            "Transcript dropped by dedup gate"
        );
        return;
    }

    state.writer.persist(&event).await;
    state
        .bus
        .publish(ServerEvent::Transcript(TranscriptPayload::from(&event)));
    state.trigger.on_final_transcript(&event);

    info!(
        call_sid = %event.call_sid,
        track = event.track.as_str(),
        "Final transcript ingested"
    );
}

#[derive(Debug, Deserialize)]
pub struct CallStatusCallback {
    #[serde(rename = "CallSid")]
    pub call_sid: String,
    #[serde(rename = "CallStatus")]
    pub call_status: String,
    #[serde(rename = "CallDuration")]
    pub call_duration: Option<String>,
}

pub async fn call_status(
    State(state): State<AppState>,
    Form(body): Form<CallStatusCallback>,
) -> &'static str {
    let Some(status) = CallStatus::parse(&body.call_status) else {
        warn!(call_sid = %body.call_sid, status = %body.call_status, "Unknown call status");
        return "OK";
    };
    let duration = body
        .call_duration
        .as_deref()
        .and_then(|d| d.parse::<i64>().ok());

    info!(call_sid = %body.call_sid, status = status.as_str(), "Call status update");

    if status == CallStatus::Initiated {
        begin_call(&state, &body.call_sid).await;
    }

    if let Err(e) = state.calls.update_status(&body.call_sid, status, duration).await {
        warn!(call_sid = %body.call_sid, %e, "Call status write failed");
    }

    state.bus.publish(ServerEvent::CallStatusUpdate(CallStatusUpdate {
        call_sid: body.call_sid.clone(),
        status: status.as_str().to_string(),
        duration,
        timestamp: Utc::now(),
    }));

    "OK"
}

/// A new call starts: per-call state resets and subscribers are told to
/// drop the previous call's transcripts and insights.
async fn begin_call(state: &AppState, call_sid: &str) {
    info!(%call_sid, "New call starting, resetting per-call state");
    state.tasks.reset();
    state.bus.publish(ServerEvent::ClearTranscripts);
    state.bus.publish(ServerEvent::ClearRecommendations);
    state.bus.publish(ServerEvent::ClearCallInsights);
    state
        .bus
        .publish(ServerEvent::TaskListUpdate(state.tasks.snapshot(Some(call_sid))));
}

#[derive(Debug, Deserialize)]
pub struct RecordingCallback {
    #[serde(rename = "CallSid")]
    pub call_sid: String,
    #[serde(rename = "RecordingUrl")]
    pub recording_url: String,
}

pub async fn recording_status(
    State(state): State<AppState>,
    Form(body): Form<RecordingCallback>,
) -> &'static str {
    info!(call_sid = %body.call_sid, url = %body.recording_url, "Recording available");

    if let Err(e) = state
        .calls
        .set_recording_url(&body.call_sid, &body.recording_url)
        .await
    {
        warn!(call_sid = %body.call_sid, %e, "Recording URL write failed");
    }

    state
        .bus
        .publish(ServerEvent::RecordingAvailable(RecordingAvailable {
            call_sid: body.call_sid.clone(),
            recording_url: body.recording_url.clone(),
            timestamp: Utc::now(),
        }));

    "OK"
}

pub async fn task_list(State(state): State<AppState>) -> Json<TaskListUpdate> {
    Json(state.tasks.snapshot(None))
}

use callboard_protocol::{
    AiRecommendation, CallStatusUpdate, Recommendation, ServerEvent, TaskListUpdate,
    TranscriptPayload,
};

pub const MAX_TRANSCRIPTS: usize = 50;
pub const MAX_AI_RECOMMENDATIONS: usize = 5;
pub const MAX_BACKEND_RECOMMENDATIONS: usize = 10;

/// Bounded, deduplicated dashboard state.
///
/// `apply` is a pure fold over the event stream. Events of unknown type
/// never reach it - they fail envelope parsing upstream and are ignored
/// there. Cross-type arrival order is not guaranteed by the server, so
/// every rule here is order-insensitive except intra-type append order.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub transcripts: Vec<TranscriptPayload>,
    pub ai_recommendations: Vec<AiRecommendation>,
    pub backend_recommendations: Vec<Recommendation>,
    pub task_list: Option<TaskListUpdate>,
    pub call_status: Option<CallStatusUpdate>,
    pub last_error: Option<String>,
}

impl DashboardState {
    pub fn apply(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Transcript(payload) => self.merge_transcript(payload),
            ServerEvent::RecentTranscripts(batch) => {
                for payload in batch {
                    self.merge_transcript(payload);
                }
            }
            ServerEvent::AiRecommendation(rec) => {
                let duplicate = self
                    .ai_recommendations
                    .iter()
                    .any(|existing| existing.recommendation == rec.recommendation);
                if !duplicate {
                    self.ai_recommendations.push(rec);
                    truncate_front(&mut self.ai_recommendations, MAX_AI_RECOMMENDATIONS);
                }
            }
            ServerEvent::BackendRecommendations(batch) => {
                for rec in batch {
                    let duplicate = self.backend_recommendations.iter().any(|existing| {
                        existing.title == rec.title && existing.description == rec.description
                    });
                    if !duplicate {
                        self.backend_recommendations.push(rec);
                    }
                }
                truncate_front(
                    &mut self.backend_recommendations,
                    MAX_BACKEND_RECOMMENDATIONS,
                );
            }
            // Authoritative snapshots replace wholesale.
            ServerEvent::TaskListUpdate(update) => self.task_list = Some(update),
            ServerEvent::CallStatusUpdate(update) => self.call_status = Some(update),
            ServerEvent::ClearTranscripts => self.transcripts.clear(),
            ServerEvent::ClearRecommendations => self.ai_recommendations.clear(),
            ServerEvent::ClearCallInsights => self.backend_recommendations.clear(),
            ServerEvent::Error(e) => self.last_error = Some(e.message),
            ServerEvent::TranscriptionError(e) => {
                self.last_error = Some(format!("Transcription error: {}", e.error));
            }
            ServerEvent::ConnectionConfirmed(_)
            | ServerEvent::RecordingAvailable(_)
            | ServerEvent::StreamStarted(_)
            | ServerEvent::StreamEnded(_)
            | ServerEvent::Pong(_)
            | ServerEvent::DebugResponse(_) => {}
        }
    }

    fn merge_transcript(&mut self, payload: TranscriptPayload) {
        if payload.is_partial {
            return;
        }
        let key = payload.dedup_key();
        if self
            .transcripts
            .iter()
            .any(|existing| existing.dedup_key() == key)
        {
            return;
        }
        self.transcripts.push(payload);
        truncate_front(&mut self.transcripts, MAX_TRANSCRIPTS);
    }
}

/// Keeps the last `cap` entries - oldest are evicted first.
fn truncate_front<T>(list: &mut Vec<T>, cap: usize) {
    if list.len() > cap {
        let excess = list.len() - cap;
        list.drain(..excess);
    }
}

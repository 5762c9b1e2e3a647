use std::sync::Arc;

use callboard_protocol::{
    Recommendation, RecommendationSource, Role, ServerEvent, TranscriptEvent,
};
use chrono::Utc;
use nanoid::nanoid;
use tracing::{debug, info, warn};

use super::{ContextTurn, EnrichmentBackend, TaskBoard};
use crate::bus::EventBus;
use crate::recent::RecentLog;

/// Decides which enrichment work a finished turn triggers and dispatches
/// it off the ingestion path.
///
/// Customer turns drive recommendation generation; agent turns drive the
/// task-completion check. Every invocation is spawned with its own error
/// boundary - a collaborator failure is logged and never reaches the
/// callback response.
pub struct EnrichmentTrigger {
    backend: Arc<dyn EnrichmentBackend>,
    recent: Arc<dyn RecentLog>,
    tasks: Arc<TaskBoard>,
    bus: EventBus,
}

impl EnrichmentTrigger {
    pub fn new(
        backend: Arc<dyn EnrichmentBackend>,
        recent: Arc<dyn RecentLog>,
        tasks: Arc<TaskBoard>,
        bus: EventBus,
    ) -> Self {
        Self {
            backend,
            recent,
            tasks,
            bus,
        }
    }

    /// Fire-and-forget dispatch for an admitted final transcript.
    pub fn on_final_transcript(self: &Arc<Self>, event: &TranscriptEvent) {
        let trigger = Arc::clone(self);
        let call_sid = event.call_sid.clone();
        match event.role() {
            Role::Customer => {
                tokio::spawn(async move {
                    if let Err(e) = trigger.generate_recommendations(&call_sid).await {
                        warn!(%call_sid, %e, "Recommendation generation failed");
                    }
                });
            }
            Role::Agent => {
                tokio::spawn(async move {
                    if let Err(e) = trigger.check_task_completion(&call_sid).await {
                        warn!(%call_sid, %e, "Task-completion check failed");
                    }
                });
            }
        }
    }

    async fn generate_recommendations(&self, call_sid: &str) -> anyhow::Result<()> {
        let context = self.conversation_context(call_sid).await?;
        if context.is_empty() {
            info!(%call_sid, "No conversation context yet, skipping recommendations");
            return Ok(());
        }

        let drafts = self.backend.recommend(&context).await?;
        if drafts.is_empty() {
            debug!(%call_sid, backend = self.backend.name(), "Collaborator returned no recommendations");
            return Ok(());
        }

        let now = Utc::now();
        let recommendations: Vec<Recommendation> = drafts
            .into_iter()
            .map(|draft| Recommendation {
                id: format!("ctx-{}", nanoid!(10)),
                title: draft.title,
                description: draft.description,
                priority: draft.priority,
                kind: draft.kind,
                source: RecommendationSource::ContextualAi,
                call_sid: Some(call_sid.to_string()),
                timestamp: now,
            })
            .collect();

        info!(%call_sid, count = recommendations.len(), "Broadcasting contextual recommendations");
        self.bus
            .publish(ServerEvent::BackendRecommendations(recommendations));
        Ok(())
    }

    async fn check_task_completion(&self, call_sid: &str) -> anyhow::Result<()> {
        let pending = self.tasks.pending();
        if pending.is_empty() {
            debug!(%call_sid, "All tasks completed, skipping check");
            return Ok(());
        }

        let context = self.conversation_context(call_sid).await?;
        if context.is_empty() {
            info!(%call_sid, "No conversation context yet, skipping task check");
            return Ok(());
        }

        let indices = self.backend.completed_tasks(&pending, &context).await?;
        let mut newly_completed = Vec::new();
        for idx in indices {
            if (1..=pending.len()).contains(&idx) {
                newly_completed.push(pending[idx - 1].clone());
            } else {
                warn!(%call_sid, idx, "Completed-task index out of range, ignoring");
            }
        }
        if newly_completed.is_empty() {
            return Ok(());
        }

        if self.tasks.complete(&newly_completed) {
            let snapshot = self.tasks.snapshot(Some(call_sid));
            info!(
                %call_sid,
                completed = snapshot.completed_count,
                total = snapshot.total_count,
                "Task list updated"
            );
            self.bus.publish(ServerEvent::TaskListUpdate(snapshot));
        }
        Ok(())
    }

    async fn conversation_context(&self, call_sid: &str) -> anyhow::Result<Vec<ContextTurn>> {
        let entries = self.recent.call_context(call_sid).await?;
        Ok(entries
            .into_iter()
            .map(|entry| ContextTurn {
                role: entry.role,
                text: entry.text,
            })
            .collect())
    }
}

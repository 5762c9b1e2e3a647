use std::time::Duration;

use async_trait::async_trait;
use callboard_config::EnrichmentSettings;
use callboard_protocol::{Priority, RecommendationKind};
use serde::Deserialize;
use tracing::warn;

use super::{ContextTurn, EnrichmentBackend, RecommendationDraft};

/// Longest raw-text excerpt carried by the degraded fallback recommendation.
const MAX_FALLBACK_CHARS: usize = 280;

/// HTTP enrichment collaborator.
///
/// The request timeout is set on the client: an unbounded collaborator hang
/// must never hold an enrichment task open indefinitely.
pub struct HttpEnrichmentBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpEnrichmentBackend {
    pub fn new(settings: &EnrichmentSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
        })
    }

    async fn call(&self, body: &serde_json::Value) -> anyhow::Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl EnrichmentBackend for HttpEnrichmentBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn recommend(&self, context: &[ContextTurn]) -> anyhow::Result<Vec<RecommendationDraft>> {
        let body = serde_json::json!({
            "mode": "recommendations",
            "conversation": context,
        });
        let raw = self.call(&body).await?;
        Ok(parse_recommendations(&raw))
    }

    async fn completed_tasks(
        &self,
        pending: &[String],
        context: &[ContextTurn],
    ) -> anyhow::Result<Vec<usize>> {
        let body = serde_json::json!({
            "mode": "task_check",
            "tasks": pending,
            "conversation": context,
        });
        let raw = self.call(&body).await?;
        Ok(parse_completed_indices(&raw))
    }
}

#[derive(Deserialize)]
struct RecommendationsResponse {
    recommendations: Vec<RecommendationDraft>,
}

/// Parses the collaborator's recommendation payload, accepting either the
/// wrapped object or a bare array. Anything else degrades to a single
/// recommendation carrying the truncated raw text - partial results are
/// preferred over silence.
pub fn parse_recommendations(raw: &str) -> Vec<RecommendationDraft> {
    if let Ok(response) = serde_json::from_str::<RecommendationsResponse>(raw) {
        return response.recommendations;
    }
    if let Ok(list) = serde_json::from_str::<Vec<RecommendationDraft>>(raw) {
        return list;
    }
    warn!("Unparsable recommendation payload, degrading to raw text");
    vec![fallback_recommendation(raw)]
}

pub fn fallback_recommendation(raw: &str) -> RecommendationDraft {
    RecommendationDraft {
        title: "Suggested talking point".to_string(),
        description: raw.trim().chars().take(MAX_FALLBACK_CHARS).collect(),
        priority: Priority::Medium,
        kind: RecommendationKind::Suggestion,
    }
}

#[derive(Deserialize)]
struct TaskCheckResponse {
    completed: Vec<usize>,
}

/// Parses the collaborator's task-check payload (wrapped object or bare
/// array of 1-based indices). Malformed output degrades to "nothing newly
/// completed".
pub fn parse_completed_indices(raw: &str) -> Vec<usize> {
    if let Ok(response) = serde_json::from_str::<TaskCheckResponse>(raw) {
        return response.completed;
    }
    if let Ok(list) = serde_json::from_str::<Vec<usize>>(raw) {
        return list;
    }
    warn!("Unparsable task-check payload, treating as no completions");
    Vec::new()
}

pub mod http;
pub mod tasks;
pub mod trigger;

pub use http::HttpEnrichmentBackend;
pub use tasks::TaskBoard;
pub use trigger::EnrichmentTrigger;

use async_trait::async_trait;
use callboard_protocol::{Priority, RecommendationKind, Role};
use serde::{Deserialize, Serialize};

/// One ordered turn of conversation context sent to the collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextTurn {
    pub role: Role,
    pub text: String,
}

/// A recommendation as returned by the collaborator, before the trigger
/// tags it with an id and source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub kind: RecommendationKind,
}

/// External enrichment collaborator.
///
/// Both operations take the full conversation context; both are invoked
/// fire-and-forget from the ingestion path with failures caught per call.
#[async_trait]
pub trait EnrichmentBackend: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Ranked recommendations for the agent, derived from the conversation.
    async fn recommend(&self, context: &[ContextTurn]) -> anyhow::Result<Vec<RecommendationDraft>>;

    /// 1-based indices into `pending` for tasks the conversation shows as
    /// already handled.
    async fn completed_tasks(
        &self,
        pending: &[String],
        context: &[ContextTurn],
    ) -> anyhow::Result<Vec<usize>>;
}

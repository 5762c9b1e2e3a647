use std::net::SocketAddr;
use std::sync::Arc;

use callboard_api::{build_router, state::AppState, ws};
use callboard_config::Settings;
use callboard_services::enrichment::EnrichmentBackend;
use callboard_services::recent::{MemoryRecentLog, RecentLog};
use callboard_services::store::{CallStore, MemoryCallStore};

use super::enrichment::MockEnrichment;

/// A fully wired app on an ephemeral port, backed by in-memory stores and
/// a scriptable enrichment collaborator - no external services required.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    pub state: AppState,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(Arc::new(MockEnrichment::default())).await
    }

    pub async fn spawn_with(backend: Arc<dyn EnrichmentBackend>) -> Self {
        let settings = Settings::default();
        let recent: Arc<dyn RecentLog> = Arc::new(MemoryRecentLog::default());
        let calls: Arc<dyn CallStore> = Arc::new(MemoryCallStore::default());

        let state = AppState::new(settings, recent, calls, backend);
        ws::dispatcher::spawn_event_pump(state.registry.clone(), state.bus.subscribe());

        let app = build_router(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server run");
        });

        Self {
            addr,
            client: reqwest::Client::new(),
            state,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws/dashboard", self.addr)
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("form post")
    }

    /// Posts a `transcription-content` callback the way the provider does:
    /// form-encoded with a nested JSON `TranscriptionData` string.
    pub async fn post_transcript(
        &self,
        call_sid: &str,
        track: &str,
        text: &str,
        is_final: bool,
        timestamp: &str,
    ) -> reqwest::Response {
        let data = serde_json::json!({ "transcript": text, "confidence": 0.92 }).to_string();
        self.post_form(
            "/api/telephony/transcription-status",
            &[
                ("CallSid", call_sid),
                ("TranscriptionEvent", "transcription-content"),
                ("TranscriptionData", data.as_str()),
                ("Final", if is_final { "true" } else { "false" }),
                ("Track", track),
                ("Timestamp", timestamp),
            ],
        )
        .await
    }
}

pub mod error;
pub mod routes;
pub mod state;
pub mod ws;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Telephony provider callbacks - form-encoded POSTs that always answer
    // 200 so the provider never retries on our internal failures.
    let telephony_routes = Router::new()
        .route(
            "/transcription-status",
            post(routes::telephony::transcription_status),
        )
        .route("/call-status", post(routes::telephony::call_status))
        .route("/recording-status", post(routes::telephony::recording_status))
        .route("/task-list", get(routes::telephony::task_list));

    let call_routes = Router::new().route("/{call_sid}", get(routes::call::get_call));

    let api = Router::new()
        .nest("/telephony", telephony_routes)
        .nest("/call", call_routes);

    Router::new()
        .nest("/api", api)
        .route("/health", get(health_check))
        .route("/ws/dashboard", get(ws::handler::ws_upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "dashboard_clients": state.registry.count(),
    }))
}

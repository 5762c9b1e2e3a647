use std::sync::Arc;

use axum::{
    extract::{State, WebSocketUpgrade, ws::{Message, WebSocket}},
    response::Response,
};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use nanoid::nanoid;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use callboard_protocol::{
    ConnectionConfirmed, DebugResponse, ErrorEvent, Pong, ServerEvent,
};
use callboard_services::recent::RECENT_SNAPSHOT_LIMIT;

use crate::state::AppState;
use crate::ws::storage::{EventSink, WsEventSink};

pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

fn new_client_id() -> String {
    format!("client-{}-{}", Utc::now().timestamp_millis(), nanoid!(9))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let client_id = new_client_id();
    info!(
        %client_id,
        total = state.registry.count() + 1,
        "Dashboard client connected"
    );

    let (sender, mut receiver) = socket.split();
    let sender = Arc::new(Mutex::new(sender));
    let sink: Arc<dyn EventSink> = Arc::new(WsEventSink::new(sender.clone()));

    state.registry.add(client_id.clone(), sink);
    send_welcome(&state, &client_id).await;

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                handle_client_message(&state, &client_id, text.as_str()).await;
            }
            Ok(Message::Ping(data)) => {
                let mut guard = sender.lock().await;
                let _ = guard.send(Message::Pong(data)).await;
            }
            Ok(Message::Close(_)) => {
                break;
            }
            Err(e) => {
                warn!(%client_id, %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    state.registry.remove(&client_id);
    info!(
        %client_id,
        remaining = state.registry.count(),
        "Dashboard client disconnected"
    );
}

/// Connect-time snapshot for the new subscriber only: confirmation, the
/// recent transcripts, then the current task list - in that order.
async fn send_welcome(state: &AppState, client_id: &str) {
    let confirmed = ServerEvent::ConnectionConfirmed(ConnectionConfirmed {
        client_id: client_id.to_string(),
        timestamp: Utc::now(),
        message: "Dashboard connected successfully".to_string(),
    });
    state.registry.send_to(client_id, &confirmed).await;

    match state.recent.recent(RECENT_SNAPSHOT_LIMIT).await {
        Ok(entries) => {
            debug!(%client_id, count = entries.len(), "Sending recent transcripts");
            state
                .registry
                .send_to(client_id, &ServerEvent::RecentTranscripts(entries))
                .await;
        }
        Err(e) => {
            warn!(%client_id, %e, "Failed to fetch recent transcripts");
            state
                .registry
                .send_to(
                    client_id,
                    &ServerEvent::Error(ErrorEvent {
                        message: "Failed to fetch recent transcripts".to_string(),
                        error: Some(e.to_string()),
                    }),
                )
                .await;
        }
    }

    state
        .registry
        .send_to(
            client_id,
            &ServerEvent::TaskListUpdate(state.tasks.snapshot(None)),
        )
        .await;
}

async fn handle_client_message(state: &AppState, client_id: &str, text: &str) {
    let parsed: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) => return,
    };

    let msg_type = parsed.get("type").and_then(|t| t.as_str()).unwrap_or("");
    debug!(%client_id, msg_type, "WS message received");

    match msg_type {
        "ping" => {
            let pong = ServerEvent::Pong(Pong {
                timestamp: Utc::now(),
            });
            state.registry.send_to(client_id, &pong).await;
        }
        "debug_test" => {
            let response = ServerEvent::DebugResponse(DebugResponse {
                message: "Debug response from server".to_string(),
                client_id: client_id.to_string(),
                timestamp: Utc::now(),
                original: parsed
                    .get("data")
                    .cloned()
                    .unwrap_or(serde_json::Value::Null),
            });
            state.registry.send_to(client_id, &response).await;
        }
        _ => {
            debug!(%client_id, msg_type, "Unknown WS message type");
        }
    }
}

use chrono::Utc;
use serde_json::json;

use callboard_protocol::{Role, Track, TranscriptPayload};

use crate::fixtures::test_app::TestApp;
use crate::ws_support::{self, drain_welcome, next_event, send_json};

fn payload(call_sid: &str, text: &str) -> TranscriptPayload {
    TranscriptPayload {
        call_sid: call_sid.to_string(),
        text: text.to_string(),
        is_partial: false,
        track: Track::OutboundTrack,
        role: Role::Customer,
        confidence: 0.9,
        timestamp: Utc::now(),
    }
}

#[tokio::test]
async fn connect_receives_welcome_snapshot_in_order() {
    let app = TestApp::spawn().await;

    // Pre-existing transcripts so the snapshot is non-trivial.
    app.state.recent.append(&payload("CA1", "hello")).await.unwrap();
    app.state.recent.append(&payload("CA1", "world")).await.unwrap();

    let mut ws = ws_support::connect(&app.ws_url()).await;

    let confirmed = next_event(&mut ws, 2000).await;
    assert_eq!(confirmed["type"], "connection_confirmed");
    assert!(
        confirmed["data"]["client_id"]
            .as_str()
            .unwrap()
            .starts_with("client-")
    );

    let recent = next_event(&mut ws, 2000).await;
    assert_eq!(recent["type"], "recent_transcripts");
    assert_eq!(recent["data"].as_array().unwrap().len(), 2);

    let tasks = next_event(&mut ws, 2000).await;
    assert_eq!(tasks["type"], "task_list_update");
    assert_eq!(tasks["data"]["completed_count"], 0);
    assert_eq!(tasks["data"]["total_count"], 3);
}

#[tokio::test]
async fn ping_is_answered_with_pong() {
    let app = TestApp::spawn().await;
    let mut ws = ws_support::connect(&app.ws_url()).await;
    drain_welcome(&mut ws).await;

    send_json(&mut ws, &json!({ "type": "ping" })).await;

    let pong = next_event(&mut ws, 2000).await;
    assert_eq!(pong["type"], "pong");
    assert!(pong["data"]["timestamp"].is_string());
}

#[tokio::test]
async fn debug_test_is_echoed_back() {
    let app = TestApp::spawn().await;
    let mut ws = ws_support::connect(&app.ws_url()).await;
    drain_welcome(&mut ws).await;

    send_json(
        &mut ws,
        &json!({ "type": "debug_test", "data": { "probe": 42 } }),
    )
    .await;

    let response = next_event(&mut ws, 2000).await;
    assert_eq!(response["type"], "debug_response");
    assert_eq!(response["data"]["original"]["probe"], 42);
}

#[tokio::test]
async fn unknown_client_messages_are_ignored_not_rejected() {
    let app = TestApp::spawn().await;
    let mut ws = ws_support::connect(&app.ws_url()).await;
    drain_welcome(&mut ws).await;

    send_json(&mut ws, &json!({ "type": "made_up", "data": {} })).await;
    send_json(&mut ws, &json!({ "type": "ping" })).await;

    // The unknown message produced nothing; the ping still works.
    let next = next_event(&mut ws, 2000).await;
    assert_eq!(next["type"], "pong");
}

#[tokio::test]
async fn health_reports_connected_clients() {
    let app = TestApp::spawn().await;
    let _ws = ws_support::connect(&app.ws_url()).await;

    // Registration happens inside the upgrade handler; give it a beat.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let health: serde_json::Value = app
        .client
        .get(app.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["dashboard_clients"], 1);
}

#[tokio::test]
async fn task_list_endpoint_serves_the_checklist() {
    let app = TestApp::spawn().await;

    let body: serde_json::Value = app
        .client
        .get(app.url("/api/telephony/task-list"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let tasks = body["tasks_with_status"].as_array().unwrap();
    assert_eq!(tasks.len(), 3);
    assert!(tasks.iter().all(|t| t["status"] == "pending"));
}

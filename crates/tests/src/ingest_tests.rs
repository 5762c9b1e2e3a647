use crate::fixtures::test_app::TestApp;
use crate::ws_support::{self, assert_silent_for, drain_welcome, wait_for_type};

const TS: &str = "2026-03-14T09:26:53Z";

#[tokio::test]
async fn final_transcript_is_persisted_and_broadcast() {
    let app = TestApp::spawn().await;
    let mut ws = ws_support::connect(&app.ws_url()).await;
    drain_welcome(&mut ws).await;

    let resp = app
        .post_transcript("CA100", "outbound_track", "I need a quote", true, TS)
        .await;
    assert_eq!(resp.status().as_u16(), 200);

    let event = wait_for_type(&mut ws, "transcript", 2000).await;
    assert_eq!(event["data"]["call_sid"], "CA100");
    assert_eq!(event["data"]["text"], "I need a quote");
    assert_eq!(event["data"]["role"], "customer");
    assert_eq!(event["data"]["is_partial"], false);

    // Durable store got the fragment too.
    let call = app.state.calls.find("CA100").await.unwrap().unwrap();
    assert_eq!(call.transcripts.len(), 1);
    assert_eq!(call.transcripts[0].text, "I need a quote");

    // And the ephemeral log, independently.
    let context = app.state.recent.call_context("CA100").await.unwrap();
    assert_eq!(context.len(), 1);
}

#[tokio::test]
async fn duplicate_callback_is_broadcast_exactly_once() {
    let app = TestApp::spawn().await;
    let mut ws = ws_support::connect(&app.ws_url()).await;
    drain_welcome(&mut ws).await;

    app.post_transcript("CA101", "outbound_track", "hello twice", true, TS)
        .await;
    app.post_transcript("CA101", "outbound_track", "hello twice", true, TS)
        .await;

    wait_for_type(&mut ws, "transcript", 2000).await;
    assert_silent_for(&mut ws, "transcript", 300).await;

    let call = app.state.calls.find("CA101").await.unwrap().unwrap();
    assert_eq!(call.transcripts.len(), 1);
}

#[tokio::test]
async fn cleared_dedup_window_readmits_a_seen_key() {
    let app = TestApp::spawn().await;
    let mut ws = ws_support::connect(&app.ws_url()).await;
    drain_welcome(&mut ws).await;

    app.post_transcript("CA102", "outbound_track", "again", true, TS)
        .await;
    wait_for_type(&mut ws, "transcript", 2000).await;

    // Wholesale window clear, then the same key is new again.
    app.state.dedup.clear();
    app.post_transcript("CA102", "outbound_track", "again", true, TS)
        .await;
    wait_for_type(&mut ws, "transcript", 2000).await;

    let call = app.state.calls.find("CA102").await.unwrap().unwrap();
    assert_eq!(call.transcripts.len(), 2);
}

#[tokio::test]
async fn partial_transcripts_are_dropped_at_the_gate() {
    let app = TestApp::spawn().await;
    let mut ws = ws_support::connect(&app.ws_url()).await;
    drain_welcome(&mut ws).await;

    app.post_transcript("CA103", "inbound_track", "how can I he", false, TS)
        .await;

    assert_silent_for(&mut ws, "transcript", 300).await;
    assert!(app.state.calls.find("CA103").await.unwrap().is_none());
    assert!(app.state.recent.call_context("CA103").await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_transcription_data_is_dropped_with_a_200() {
    let app = TestApp::spawn().await;
    let mut ws = ws_support::connect(&app.ws_url()).await;
    drain_welcome(&mut ws).await;

    let resp = app
        .post_form(
            "/api/telephony/transcription-status",
            &[
                ("CallSid", "CA104"),
                ("TranscriptionEvent", "transcription-content"),
                ("TranscriptionData", "not json at all"),
                ("Final", "true"),
                ("Track", "outbound_track"),
            ],
        )
        .await;

    assert_eq!(resp.status().as_u16(), 200);
    assert_silent_for(&mut ws, "transcript", 300).await;
}

#[tokio::test]
async fn stream_lifecycle_callbacks_are_broadcast() {
    let app = TestApp::spawn().await;
    let mut ws = ws_support::connect(&app.ws_url()).await;
    drain_welcome(&mut ws).await;

    app.post_form(
        "/api/telephony/transcription-status",
        &[
            ("CallSid", "CA105"),
            ("TranscriptionEvent", "transcription-started"),
        ],
    )
    .await;
    let started = wait_for_type(&mut ws, "stream_started", 2000).await;
    assert_eq!(started["data"]["call_sid"], "CA105");

    app.post_form(
        "/api/telephony/transcription-status",
        &[
            ("CallSid", "CA105"),
            ("TranscriptionEvent", "transcription-error"),
        ],
    )
    .await;
    wait_for_type(&mut ws, "transcription_error", 2000).await;

    app.post_form(
        "/api/telephony/transcription-status",
        &[
            ("CallSid", "CA105"),
            ("TranscriptionEvent", "transcription-stopped"),
        ],
    )
    .await;
    wait_for_type(&mut ws, "stream_ended", 2000).await;
}

#[tokio::test]
async fn call_status_updates_store_and_subscribers() {
    let app = TestApp::spawn().await;
    let mut ws = ws_support::connect(&app.ws_url()).await;
    drain_welcome(&mut ws).await;

    app.post_form(
        "/api/telephony/call-status",
        &[
            ("CallSid", "CA106"),
            ("CallStatus", "completed"),
            ("CallDuration", "135"),
        ],
    )
    .await;

    let event = wait_for_type(&mut ws, "call_status_update", 2000).await;
    assert_eq!(event["data"]["status"], "completed");
    assert_eq!(event["data"]["duration"], 135);

    let call = app.state.calls.find("CA106").await.unwrap().unwrap();
    assert_eq!(call.duration, Some(135));
    assert!(call.end_time.is_some());
}

#[tokio::test]
async fn initiated_call_resets_tasks_and_clears_subscriber_state() {
    let app = TestApp::spawn().await;

    // Leftover completion from a previous call.
    let stale = app.state.tasks.pending()[0].clone();
    app.state.tasks.complete(&[stale]);
    assert_eq!(app.state.tasks.snapshot(None).completed_count, 1);

    let mut ws = ws_support::connect(&app.ws_url()).await;
    drain_welcome(&mut ws).await;

    app.post_form(
        "/api/telephony/call-status",
        &[("CallSid", "CA107"), ("CallStatus", "initiated")],
    )
    .await;

    wait_for_type(&mut ws, "clear_transcripts", 2000).await;
    wait_for_type(&mut ws, "clear_recommendations", 2000).await;
    wait_for_type(&mut ws, "clear_call_insights", 2000).await;

    let tasks = wait_for_type(&mut ws, "task_list_update", 2000).await;
    assert_eq!(tasks["data"]["completed_count"], 0);
    assert_eq!(tasks["data"]["call_sid"], "CA107");

    wait_for_type(&mut ws, "call_status_update", 2000).await;
    assert_eq!(app.state.tasks.snapshot(None).completed_count, 0);
}

#[tokio::test]
async fn recording_callback_persists_and_broadcasts() {
    let app = TestApp::spawn().await;
    let mut ws = ws_support::connect(&app.ws_url()).await;
    drain_welcome(&mut ws).await;

    app.post_form(
        "/api/telephony/recording-status",
        &[
            ("CallSid", "CA108"),
            ("RecordingUrl", "https://recordings.example/CA108.wav"),
        ],
    )
    .await;

    let event = wait_for_type(&mut ws, "recording_available", 2000).await;
    assert_eq!(
        event["data"]["recording_url"],
        "https://recordings.example/CA108.wav"
    );

    let call = app.state.calls.find("CA108").await.unwrap().unwrap();
    assert_eq!(
        call.recording_url.as_deref(),
        Some("https://recordings.example/CA108.wav")
    );
}

#[tokio::test]
async fn call_record_endpoint_serves_the_durable_document() {
    let app = TestApp::spawn().await;

    app.post_transcript("CA109", "inbound_track", "thanks for calling", true, TS)
        .await;

    let call: serde_json::Value = app
        .client
        .get(app.url("/api/call/CA109"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(call["call_sid"], "CA109");
    assert_eq!(call["transcripts"].as_array().unwrap().len(), 1);

    let missing = app
        .client
        .get(app.url("/api/call/CA999"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

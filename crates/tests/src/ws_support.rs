use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

pub type WsConn = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub async fn connect(url: &str) -> WsConn {
    let (ws, _) = connect_async(url).await.expect("WS connect failed");
    ws
}

/// Next text frame as parsed JSON, or panics after `timeout_ms`.
pub async fn next_event(ws: &mut WsConn, timeout_ms: u64) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_millis(timeout_ms), ws.next())
            .await
            .expect("Timeout waiting for WS message")
            .expect("WS stream ended")
            .expect("WS read error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("invalid JSON frame");
        }
    }
}

/// Reads frames until one of the wanted `type` arrives, skipping others.
pub async fn wait_for_type(ws: &mut WsConn, wanted: &str, timeout_ms: u64) -> Value {
    loop {
        let event = next_event(ws, timeout_ms).await;
        if event["type"] == wanted {
            return event;
        }
    }
}

/// Asserts no frame of the given `type` arrives within `window_ms`.
pub async fn assert_silent_for(ws: &mut WsConn, unwanted: &str, window_ms: u64) {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(window_ms);
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            return;
        }
        match tokio::time::timeout(remaining, ws.next()).await {
            Err(_) => return,
            Ok(None) => return,
            Ok(Some(msg)) => {
                if let Message::Text(text) = msg.expect("WS read error") {
                    let event: Value =
                        serde_json::from_str(text.as_str()).expect("invalid JSON frame");
                    assert_ne!(
                        event["type"], unwanted,
                        "Unexpected {unwanted} event: {event}"
                    );
                }
            }
        }
    }
}

pub async fn send_json(ws: &mut WsConn, value: &Value) {
    ws.send(Message::text(value.to_string()))
        .await
        .expect("WS send failed");
}

/// Drains the three-message welcome sequence a new subscriber receives.
pub async fn drain_welcome(ws: &mut WsConn) {
    for expected in ["connection_confirmed", "recent_transcripts", "task_list_update"] {
        let event = next_event(ws, 2000).await;
        assert_eq!(event["type"], expected, "unexpected welcome order: {event}");
    }
}

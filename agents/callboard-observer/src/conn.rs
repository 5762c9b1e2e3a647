use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use callboard_protocol::ServerEvent;

pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

const RECONNECT_BASE_MS: u64 = 1000;
const RECONNECT_CAP_MS: u64 = 10_000;

/// Exponential backoff, capped: 1000, 2000, 4000, 8000, 10000 ms for
/// `attempts` 0..=4.
pub fn reconnect_delay(attempts: u32) -> Duration {
    let millis = RECONNECT_BASE_MS.saturating_mul(2u64.saturating_pow(attempts));
    Duration::from_millis(millis.min(RECONNECT_CAP_MS))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
    Reconnecting { attempt: u32 },
    Failed,
}

impl ConnectionState {
    /// User-visible connection status text.
    pub fn status_text(&self) -> String {
        match self {
            ConnectionState::Connecting => "Connecting...".to_string(),
            ConnectionState::Connected => "Connected".to_string(),
            ConnectionState::Disconnected => "Disconnected".to_string(),
            ConnectionState::Reconnecting { attempt } => {
                format!("Reconnecting... ({attempt}/{MAX_RECONNECT_ATTEMPTS})")
            }
            ConnectionState::Failed => "Connection failed".to_string(),
        }
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum SessionEnd {
    /// Server closed with the normal-closure code - terminal.
    NormalClosure,
    /// Caller-initiated teardown - terminal, closes with the normal code.
    Shutdown,
    /// Error or abnormal close - eligible for reconnect.
    Abnormal,
}

/// Owns the dashboard WebSocket connection.
///
/// Parsed events go out through the `events` channel; connection state
/// through the `status` watch. The single driver loop guarantees at most
/// one pending reconnect timer, and a shutdown signal cancels it.
pub struct ObserverClient {
    url: String,
    events: mpsc::Sender<ServerEvent>,
    status: watch::Sender<ConnectionState>,
    shutdown: watch::Receiver<bool>,
}

impl ObserverClient {
    pub fn new(
        url: String,
        events: mpsc::Sender<ServerEvent>,
        status: watch::Sender<ConnectionState>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            url,
            events,
            status,
            shutdown,
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.status.send_replace(state);
    }

    pub async fn run(mut self) {
        let mut attempts: u32 = 0;
        self.set_state(ConnectionState::Connecting);

        loop {
            match connect_async(&self.url).await {
                Ok((ws, _)) => {
                    info!(url = %self.url, "Dashboard WebSocket connected");
                    attempts = 0;
                    self.set_state(ConnectionState::Connected);

                    match self.drive(ws).await {
                        SessionEnd::NormalClosure => {
                            info!("Server closed the connection normally");
                            self.set_state(ConnectionState::Disconnected);
                            return;
                        }
                        SessionEnd::Shutdown => {
                            info!("Client shutdown requested");
                            self.set_state(ConnectionState::Disconnected);
                            return;
                        }
                        SessionEnd::Abnormal => {
                            self.set_state(ConnectionState::Disconnected);
                        }
                    }
                }
                Err(e) => {
                    warn!(%e, "WebSocket connect failed");
                    self.set_state(ConnectionState::Disconnected);
                }
            }

            if *self.shutdown.borrow() {
                return;
            }
            if attempts >= MAX_RECONNECT_ATTEMPTS {
                warn!("Failed to reconnect after {MAX_RECONNECT_ATTEMPTS} attempts");
                self.set_state(ConnectionState::Failed);
                return;
            }

            let delay = reconnect_delay(attempts);
            attempts += 1;
            self.set_state(ConnectionState::Reconnecting { attempt: attempts });
            info!(
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                "Reconnecting after backoff"
            );

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.shutdown.changed() => {
                    if *self.shutdown.borrow() {
                        return;
                    }
                }
            }
        }
    }

    async fn drive(&mut self, ws: WsStream) -> SessionEnd {
        let (mut sink, mut stream) = ws.split();

        loop {
            tokio::select! {
                msg = stream.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ServerEvent>(text.as_str()) {
                            Ok(event) => {
                                if self.events.send(event).await.is_err() {
                                    // Consumer gone - behave like a teardown.
                                    return SessionEnd::Shutdown;
                                }
                            }
                            Err(_) => {
                                debug!("Ignoring unrecognized event");
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let normal = frame
                            .as_ref()
                            .is_some_and(|f| f.code == CloseCode::Normal);
                        return if normal {
                            SessionEnd::NormalClosure
                        } else {
                            SessionEnd::Abnormal
                        };
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(%e, "WebSocket stream error");
                        return SessionEnd::Abnormal;
                    }
                    None => return SessionEnd::Abnormal,
                },
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        let _ = sink
                            .send(Message::Close(Some(CloseFrame {
                                code: CloseCode::Normal,
                                reason: "client shutdown".into(),
                            })))
                            .await;
                        return SessionEnd::Shutdown;
                    }
                }
            }
        }
    }
}

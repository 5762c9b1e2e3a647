use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::SinkExt;
use futures::stream::SplitSink;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use callboard_protocol::ServerEvent;

pub type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// Writable handle to one subscriber connection.
#[async_trait]
pub trait EventSink: Send + Sync + 'static {
    async fn send_text(&self, text: &str) -> anyhow::Result<()>;
}

pub struct WsEventSink {
    sender: WsSender,
}

impl WsEventSink {
    pub fn new(sender: WsSender) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl EventSink for WsEventSink {
    async fn send_text(&self, text: &str) -> anyhow::Result<()> {
        let mut guard = self.sender.lock().await;
        guard.send(Message::text(text.to_string())).await?;
        Ok(())
    }
}

pub struct Subscriber {
    pub sink: Arc<dyn EventSink>,
    pub connected_at: DateTime<Utc>,
}

/// Tracks all connected dashboard subscribers by client ID.
///
/// Dead connections are discovered lazily: a subscriber whose send fails
/// during a broadcast is removed as a side effect of that broadcast.
pub struct SubscriberRegistry {
    subscribers: DashMap<String, Subscriber>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
        }
    }

    pub fn add(&self, client_id: String, sink: Arc<dyn EventSink>) {
        self.subscribers.insert(
            client_id,
            Subscriber {
                sink,
                connected_at: Utc::now(),
            },
        );
    }

    pub fn remove(&self, client_id: &str) {
        self.subscribers.remove(client_id);
    }

    pub fn count(&self) -> usize {
        self.subscribers.len()
    }

    /// Sends an event to one subscriber; a failed send removes it.
    pub async fn send_to(&self, client_id: &str, event: &ServerEvent) {
        let Some(sink) = self
            .subscribers
            .get(client_id)
            .map(|entry| entry.value().sink.clone())
        else {
            return;
        };

        let text = match serde_json::to_string(event) {
            Ok(text) => text,
            Err(e) => {
                warn!(%e, event = event.type_name(), "Failed to serialize event");
                return;
            }
        };

        if let Err(e) = sink.send_text(&text).await {
            warn!(%client_id, %e, "Subscriber send failed, removing");
            self.subscribers.remove(client_id);
        }
    }

    /// Serializes the event once and attempts delivery to every currently
    /// registered subscriber. Returns the number of delivery attempts.
    pub async fn broadcast(&self, event: &ServerEvent) -> usize {
        let text = match serde_json::to_string(event) {
            Ok(text) => text,
            Err(e) => {
                warn!(%e, event = event.type_name(), "Failed to serialize event");
                return 0;
            }
        };

        // Snapshot the targets so iteration tolerates concurrent
        // register/unregister without holding map shards across awaits.
        let targets: Vec<(String, Arc<dyn EventSink>)> = self
            .subscribers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().sink.clone()))
            .collect();
        let attempts = targets.len();

        let mut delivered = 0usize;
        for (client_id, sink) in targets {
            match sink.send_text(&text).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(%client_id, %e, "Subscriber send failed, removing");
                    self.subscribers.remove(&client_id);
                }
            }
        }

        debug!(
            event = event.type_name(),
            delivered,
            failed = attempts - delivered,
            "Broadcast sent"
        );
        attempts
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

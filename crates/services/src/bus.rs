use callboard_protocol::ServerEvent;
use tokio::sync::broadcast;
use tracing::debug;

/// Process-internal fan-in channel between event producers (ingestion,
/// enrichment, call lifecycle) and the WebSocket fan-out.
///
/// Producers never block on delivery; with no subscribers the event is
/// simply dropped.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ServerEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, event: ServerEvent) {
        if let Err(e) = self.tx.send(event) {
            debug!(event = e.0.type_name(), "No bus subscribers, event dropped");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.tx.subscribe()
    }
}

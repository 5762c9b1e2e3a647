use std::sync::Arc;

use callboard_protocol::ServerEvent;
use tokio::sync::broadcast;
use tokio::task::AbortHandle;
use tracing::warn;

use super::storage::SubscriberRegistry;

/// Spawns the pump that drains the event bus into the subscriber set.
///
/// A single draining task means events reach each subscriber in bus order;
/// subscribers must still not rely on cross-type ordering, which concurrent
/// producers do not guarantee at the bus.
pub fn spawn_event_pump(
    registry: Arc<SubscriberRegistry>,
    mut rx: broadcast::Receiver<ServerEvent>,
) -> AbortHandle {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    registry.broadcast(&event).await;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event pump lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
    .abort_handle()
}

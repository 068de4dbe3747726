//! Publish side of the real-time audit event channel.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use crate::models::AuditEvent;

/// Default number of buffered events before slow subscribers lag.
pub const DEFAULT_CAPACITY: usize = 256;

/// Where the orchestrator sends lifecycle events.
#[async_trait]
pub trait AuditEventSink: Send + Sync {
    async fn publish(&self, event: AuditEvent);
}

/// In-process bus backed by a tokio broadcast channel.
///
/// Subscribers receive every organization's events and filter themselves.
#[derive(Clone)]
pub struct BroadcastEventBus {
    sender: broadcast::Sender<AuditEvent>,
}

impl BroadcastEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuditEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl AuditEventSink for BroadcastEventBus {
    async fn publish(&self, event: AuditEvent) {
        let topic = event.topic();
        // No receivers is not an error
        match self.sender.send(event) {
            Ok(n) => debug!("Published {} to {} subscriber(s)", topic, n),
            Err(_) => debug!("Published {} with no subscribers", topic),
        }
    }
}

/// Wait for the next event belonging to `organization_id`.
///
/// Returns `None` once the bus is closed. Lagged receivers skip ahead.
pub async fn next_for_org(
    receiver: &mut broadcast::Receiver<AuditEvent>,
    organization_id: &str,
) -> Option<AuditEvent> {
    loop {
        match receiver.recv().await {
            Ok(event) if event.organization_id == organization_id => return Some(event),
            Ok(_) => continue,
            Err(broadcast::error::RecvError::Lagged(n)) => {
                debug!("Event subscriber lagged by {} message(s)", n);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

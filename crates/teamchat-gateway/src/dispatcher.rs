use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::trace;

use teamchat_types::events::GatewayEvent;

const BROADCAST_CAPACITY: usize = 1024;

/// Fans out row-insert notifications to every connected client.
/// Channel scoping happens per connection.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    broadcast_tx: broadcast::Sender<GatewayEvent>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            inner: Arc::new(DispatcherInner { broadcast_tx }),
        }
    }

    /// Subscribe to gateway events. Returns a broadcast receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Broadcast an event to all connected clients.
    /// Having no listeners is not an error.
    pub fn broadcast(&self, event: GatewayEvent) {
        let delivered = self.inner.broadcast_tx.send(event).unwrap_or(0);
        trace!("Broadcast event to {} receivers", delivered);
    }
}

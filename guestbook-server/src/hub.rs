//! Fan-out of push events to every open stream.

use guestbook_core::PushEvent;
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct EventHub {
    tx: broadcast::Sender<PushEvent>,
}

impl EventHub {
    /// `capacity` events are buffered per subscriber before it lags.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Send `event` to all current subscribers. Returns how many received it.
    pub fn publish(&self, event: PushEvent) -> usize {
        let name = event.name();
        let delivered = self.tx.send(event).unwrap_or(0);
        debug!(event = name, subscribers = delivered, "Push event published");
        delivered
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.tx.subscribe()
    }

    pub fn subscribers(&self) -> usize {
        self.tx.receiver_count()
    }
}

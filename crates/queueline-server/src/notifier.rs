//! Fan-out of committed queue changes to connected observers.
//!
//! Backed by one [`tokio::sync::broadcast`] channel, so every observer sees
//! events in publish order. Publishing never blocks the request that
//! triggered it. An observer that falls more than [`NOTIFIER_CAPACITY`]
//! events behind skips to the newest ones; an observer that connects late
//! sees nothing from before it subscribed. Dropping a receiver deregisters it.

use queueline_types::QueueEvent;
use tokio::sync::broadcast;

/// Capacity of the broadcast channel.
pub const NOTIFIER_CAPACITY: usize = 256;

/// Publish handle for queue events. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<QueueEvent>,
}

impl Notifier {
    /// Create a notifier with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(NOTIFIER_CAPACITY)
    }

    /// Create a notifier that buffers up to `capacity` events per observer.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Register a new observer.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.tx.subscribe()
    }

    /// Send `event` to every connected observer.
    ///
    /// Call only after the change behind the event has been committed.
    /// Returns the number of observers reached; 0 is not an error.
    pub fn publish(&self, event: QueueEvent) -> usize {
        // send returns Err only when there are zero receivers.
        let reached = self.tx.send(event).unwrap_or(0);
        tracing::debug!(?event, observers = reached, "Published queue event");
        reached
    }

    /// Number of currently registered observers.
    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

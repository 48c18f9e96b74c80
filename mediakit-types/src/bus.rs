//! Typed publish/subscribe bus.
//!
//! Each subsystem owns an `EventBus<E>` for its own event enum. Publishing
//! never blocks and never fails when nobody is listening; slow subscribers
//! observe `RecvError::Lagged` from tokio's broadcast channel rather than
//! stalling the publisher.

use tokio::sync::broadcast;
use tracing::trace;

/// Default number of buffered events per subscriber.
pub const DEFAULT_CAPACITY: usize = 256;

/// A cloneable handle to a broadcast channel of `E`.
#[derive(Debug, Clone)]
pub struct EventBus<E: Clone> {
    sender: broadcast::Sender<E>,
}

impl<E: Clone> EventBus<E> {
    /// Creates a bus with [`DEFAULT_CAPACITY`].
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a bus buffering up to `capacity` events per subscriber.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event. Returns the number of subscribers reached.
    pub fn publish(&self, event: E) -> usize {
        match self.sender.send(event) {
            Ok(n) => n,
            Err(_) => {
                trace!("event published with no subscribers");
                0
            }
        }
    }

    /// Subscribes to events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<E: Clone> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

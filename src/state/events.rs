use tokio::sync::broadcast;

use crate::dto::events::SessionNotice;

/// Broadcast hub fanning session notices out to every subscriber.
///
/// Slow subscribers lag and skip notices; nothing is buffered for them.
pub struct EventHub {
    sender: broadcast::Sender<SessionNotice>,
}

impl EventHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent notices.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionNotice> {
        self.sender.subscribe()
    }

    /// Send a notice to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, notice: SessionNotice) {
        let _ = self.sender.send(notice);
    }
}

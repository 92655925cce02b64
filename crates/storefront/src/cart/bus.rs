//! Cart change notifications.
//!
//! Every cart store publishes a [`CartChange`] after each mutation. Other
//! stores sharing the same storage use it to re-hydrate, and anything that
//! only needs the item count (the header badge) subscribes through
//! [`CartBadge`] without touching the store.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use uuid::Uuid;

/// Notifications buffered per subscriber before the oldest are dropped.
const CHANNEL_CAPACITY: usize = 64;

/// A cart was mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartChange {
    /// The store that made the change.
    pub origin: Uuid,
    /// Item count after the change.
    pub item_count: u32,
}

/// Publish-subscribe channel for cart changes.
#[derive(Debug, Clone)]
pub struct CartBus {
    sender: broadcast::Sender<CartChange>,
}

impl Default for CartBus {
    fn default() -> Self {
        Self::new()
    }
}

impl CartBus {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish a change. Having no subscribers is fine.
    pub fn publish(&self, change: CartChange) {
        let receivers = self.sender.send(change).unwrap_or(0);
        tracing::trace!(item_count = change.item_count, receivers, "Cart change published");
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartChange> {
        self.sender.subscribe()
    }
}

/// Tracks the cart's item count for display.
#[derive(Debug)]
pub struct CartBadge {
    receiver: broadcast::Receiver<CartChange>,
    count: u32,
}

impl CartBadge {
    /// Start tracking from `initial`.
    #[must_use]
    pub fn new(bus: &CartBus, initial: u32) -> Self {
        Self {
            receiver: bus.subscribe(),
            count: initial,
        }
    }

    /// Latest known item count.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Apply pending notifications and return the count.
    pub fn refresh(&mut self) -> u32 {
        loop {
            match self.receiver.try_recv() {
                Ok(change) => self.count = change.item_count,
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Cart badge lagged behind");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return self.count,
            }
        }
    }

    /// Wait for the next change. Returns `None` once every publisher is gone.
    pub async fn changed(&mut self) -> Option<u32> {
        loop {
            match self.receiver.recv().await {
                Ok(change) => {
                    self.count = change.item_count;
                    return Some(self.count);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Cart badge lagged behind");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn change(item_count: u32) -> CartChange {
        CartChange {
            origin: Uuid::new_v4(),
            item_count,
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        CartBus::new().publish(change(1));
    }

    #[test]
    fn test_badge_refresh_takes_latest() {
        let bus = CartBus::new();
        let mut badge = CartBadge::new(&bus, 0);

        bus.publish(change(2));
        bus.publish(change(5));

        assert_eq!(badge.refresh(), 5);
        assert_eq!(badge.count(), 5);
        assert_eq!(badge.refresh(), 5);
    }

    #[tokio::test]
    async fn test_badge_changed() {
        let bus = CartBus::new();
        let mut badge = CartBadge::new(&bus, 0);

        bus.publish(change(3));
        assert_eq!(badge.changed().await, Some(3));

        drop(bus);
        assert_eq!(badge.changed().await, None);
    }
}

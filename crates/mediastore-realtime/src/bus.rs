//! Broadcast channel carrying change events.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::trace;

use mediastore_core::config::RealtimeConfig;
use mediastore_core::events::ChangeEvent;

use crate::subscription::ChangeSubscription;

/// Publish/subscribe hub for collection changes.
///
/// Cloning yields another handle to the same channel.
#[derive(Debug, Clone)]
pub struct ChangeBus {
    sender: Arc<broadcast::Sender<ChangeEvent>>,
}

impl ChangeBus {
    /// Create a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Create a bus from configuration.
    pub fn from_config(config: &RealtimeConfig) -> Self {
        Self::new(config.channel_capacity)
    }

    /// Publish an event. Never blocks; dropped when nobody listens.
    pub fn publish(&self, event: ChangeEvent) {
        let collection = event.collection.clone();
        match self.sender.send(event) {
            Ok(receivers) => trace!(collection, receivers, "Published change"),
            Err(_) => trace!(collection, "Published change with no subscribers"),
        }
    }

    /// Observe changes to every collection.
    pub fn subscribe(&self) -> ChangeSubscription {
        ChangeSubscription::new(self.sender.subscribe(), None)
    }

    /// Observe changes to one collection.
    pub fn subscribe_to(&self, collection: impl Into<String>) -> ChangeSubscription {
        ChangeSubscription::new(self.sender.subscribe(), Some(collection.into()))
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::from_config(&RealtimeConfig::default())
    }
}

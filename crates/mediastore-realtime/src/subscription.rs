//! Receiving side of the change bus.

use futures::Stream;
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::warn;

use mediastore_core::events::ChangeEvent;

/// A subscription to the change bus, optionally scoped to one collection.
#[derive(Debug)]
pub struct ChangeSubscription {
    receiver: Receiver<ChangeEvent>,
    collection: Option<String>,
}

impl ChangeSubscription {
    pub(crate) fn new(receiver: Receiver<ChangeEvent>, collection: Option<String>) -> Self {
        Self {
            receiver,
            collection,
        }
    }

    /// The collection this subscription is scoped to, if any.
    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    fn accepts(&self, event: &ChangeEvent) -> bool {
        self.collection
            .as_deref()
            .is_none_or(|c| c == event.collection)
    }

    /// Wait for the next matching event.
    ///
    /// Returns `None` once every bus handle has been dropped. A subscriber
    /// that fell behind skips the overwritten events and continues.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.accepts(&event) => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        skipped,
                        collection = self.collection.as_deref().unwrap_or("*"),
                        "Change subscriber lagged"
                    );
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Return the next matching event if one is already buffered.
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.accepts(&event) => return Some(event),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Change subscriber lagged");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Adapt the subscription into a stream of matching events.
    pub fn into_stream(self) -> impl Stream<Item = ChangeEvent> + Send + 'static {
        futures::stream::unfold(self, |mut subscription| async move {
            let event = subscription.recv().await?;
            Some((event, subscription))
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use mediastore_core::events::ChangeEvent;

    use crate::ChangeBus;

    #[tokio::test]
    async fn test_publish_without_subscribers_is_fine() {
        let bus = ChangeBus::new(4);
        bus.publish(ChangeEvent::saved("media", "m1"));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_scoped_subscription_filters_collections() {
        let bus = ChangeBus::new(8);
        let mut all = bus.subscribe();
        let mut media = bus.subscribe_to("media");

        bus.publish(ChangeEvent::updated("settings", "site"));
        bus.publish(ChangeEvent::deleted("media", "m1"));

        assert_eq!(all.recv().await.unwrap().collection, "settings");
        assert_eq!(all.recv().await.unwrap().collection, "media");
        let event = media.recv().await.unwrap();
        assert_eq!(event.kind.record_id(), "m1");
        assert!(media.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_lagging_subscriber_continues() {
        let bus = ChangeBus::new(2);
        let mut sub = bus.subscribe();
        for i in 0..5 {
            bus.publish(ChangeEvent::saved("media", format!("m{i}")));
        }
        let next = sub.recv().await.unwrap();
        assert_eq!(next.kind.record_id(), "m3");
        assert_eq!(sub.recv().await.unwrap().kind.record_id(), "m4");
    }

    #[tokio::test]
    async fn test_stream_ends_when_bus_dropped() {
        let bus = ChangeBus::new(4);
        let stream = bus.subscribe_to("projects").into_stream();
        bus.publish(ChangeEvent::saved("projects", "p1"));
        bus.publish(ChangeEvent::saved("media", "m1"));
        drop(bus);

        let events: Vec<ChangeEvent> = stream.collect().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind.record_id(), "p1");
    }
}

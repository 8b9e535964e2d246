//! In-process event fan-out.

use async_trait::async_trait;
use market_core::{EventPublisher, MarketEvent, Result};
use tokio::sync::broadcast;
use tracing::trace;

/// Broadcasts computed results to every live subscriber.
///
/// Publishing with no subscribers is not an error; the event is dropped.
/// Slow subscribers lag and lose the oldest events once `capacity` is
/// exceeded.
#[derive(Debug, Clone)]
pub struct BroadcastPublisher {
    sender: broadcast::Sender<MarketEvent>,
}

impl BroadcastPublisher {
    /// Creates a publisher buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<MarketEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastPublisher {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl EventPublisher for BroadcastPublisher {
    async fn publish(&self, event: MarketEvent) -> Result<()> {
        match self.sender.send(event) {
            Ok(receivers) => trace!(receivers, "Published event"),
            Err(broadcast::error::SendError(event)) => {
                trace!(topic = %event.topic, "No subscribers, event dropped");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let publisher = BroadcastPublisher::new(4);
        let mut first = publisher.subscribe();
        let mut second = publisher.subscribe();
        assert_eq!(publisher.subscriber_count(), 2);

        publisher
            .publish(MarketEvent::new("market-breadth", json!([1, 2])))
            .await
            .unwrap();

        assert_eq!(first.recv().await.unwrap().topic, "market-breadth");
        assert_eq!(second.recv().await.unwrap().payload, json!([1, 2]));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let publisher = BroadcastPublisher::default();
        assert!(
            publisher
                .publish(MarketEvent::new("ticker-price", json!({})))
                .await
                .is_ok()
        );
    }
}

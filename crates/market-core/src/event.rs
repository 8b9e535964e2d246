//! Notifications emitted after fresh aggregations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::error::Result;

/// A freshly computed result announced to downstream consumers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketEvent {
    /// Topic the event is published under (the cache key of the result).
    pub topic: String,
    /// The result, as stored in the cache.
    pub payload: serde_json::Value,
}

impl MarketEvent {
    /// Creates an event.
    #[must_use]
    pub fn new(topic: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }
}

/// Sink for [`MarketEvent`]s.
///
/// Publishing is fire-and-forget from the aggregation layer's point of view:
/// a failed publish is logged and never fails the request that produced it.
#[async_trait]
pub trait EventPublisher: Send + Sync + Debug {
    /// Publishes one event.
    async fn publish(&self, event: MarketEvent) -> Result<()>;
}

//! Key-value store abstraction behind the cache-aside layer.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{error::Result, params::Ttl};

/// Trait for string key-value stores with per-entry expiry.
///
/// Values are opaque strings (the aggregation layer stores JSON). An expired
/// entry must behave exactly like an absent one.
#[async_trait]
pub trait CacheStore: Send + Sync + Debug {
    /// Returns the value stored under `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value and its expiry.
    async fn set(&self, key: &str, value: &str, ttl: Ttl) -> Result<()>;

    /// Removes `key`. Returns true if a live entry was removed.
    async fn remove(&self, key: &str) -> Result<bool>;

    /// Drops every expired entry and returns how many were dropped.
    async fn purge_expired(&self) -> Result<usize>;

    /// Removes every entry.
    async fn clear(&self) -> Result<()>;
}

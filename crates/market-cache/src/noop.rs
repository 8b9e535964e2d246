//! No-op store implementation.

use async_trait::async_trait;
use market_core::{CacheStore, Result, Ttl};
use tracing::trace;

/// A store that doesn't keep anything.
///
/// `get` always returns `Ok(None)` and `set` always succeeds, so every
/// aggregation recomputes from the source.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStore;

impl NoopStore {
    /// Create a new no-op store.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CacheStore for NoopStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        trace!(key, "NoopStore: get called, returning None");
        Ok(None)
    }

    async fn set(&self, key: &str, _value: &str, _ttl: Ttl) -> Result<()> {
        trace!(key, "NoopStore: set called, doing nothing");
        Ok(())
    }

    async fn remove(&self, _key: &str) -> Result<bool> {
        Ok(false)
    }

    async fn purge_expired(&self) -> Result<usize> {
        Ok(0)
    }

    async fn clear(&self) -> Result<()> {
        Ok(())
    }
}

//! In-memory store implementation.

use async_trait::async_trait;
use market_core::{CacheStore, Result, Ttl};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, instrument};

/// Stored value with its deadline.
#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: &str, ttl: Ttl) -> Self {
        Self {
            value: value.to_string(),
            expires_at: ttl.duration().map(|d| Instant::now() + d),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// In-process store for tests and single-node deployments.
///
/// Entries live in a `RwLock`-protected `HashMap` and are lost when the store
/// is dropped. Deadlines use the Tokio clock, so paused-time tests can expire
/// entries with `tokio::time::advance`. Expired entries are hidden on read and
/// dropped by [`purge_expired`](CacheStore::purge_expired).
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for InMemoryStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if !entry.is_expired(Instant::now()) => {
                debug!("Cache hit");
                Ok(Some(entry.value.clone()))
            }
            Some(_) => {
                debug!("Cache entry expired");
                Ok(None)
            }
            None => {
                debug!("Cache miss");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn set(&self, key: &str, value: &str, ttl: Ttl) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), Entry::new(value, ttl));
        debug!(?ttl, "Cached value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.write().await;
        Ok(entries
            .remove(key)
            .is_some_and(|entry| !entry.is_expired(Instant::now())))
    }

    async fn purge_expired(&self) -> Result<usize> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let purged = before - entries.len();
        debug!(purged, "Purged expired entries");
        Ok(purged)
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_set_and_get() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("domestic-index").await.unwrap(), None);

        store
            .set("domestic-index", "[{\"ticker\":\"VNINDEX\"}]", Ttl::Forever)
            .await
            .unwrap();
        assert_eq!(
            store.get("domestic-index").await.unwrap().as_deref(),
            Some("[{\"ticker\":\"VNINDEX\"}]")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_minute_entries_expire() {
        let store = InMemoryStore::new();
        store.set("market-breadth", "[]", Ttl::Minute).await.unwrap();
        store.set("top-net-foreign", "[]", Ttl::Forever).await.unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(store.get("market-breadth").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.get("market-breadth").await.unwrap(), None);
        assert!(store.get("top-net-foreign").await.unwrap().is_some());

        assert_eq!(store.len().await, 2);
        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_resets_expiry() {
        let store = InMemoryStore::new();
        store.set("k", "old", Ttl::Minute).await.unwrap();
        tokio::time::advance(Duration::from_secs(45)).await;
        store.set("k", "new", Ttl::Minute).await.unwrap();
        tokio::time::advance(Duration::from_secs(45)).await;

        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let store = InMemoryStore::new();
        store.set("a", "1", Ttl::Forever).await.unwrap();
        store.set("b", "2", Ttl::Forever).await.unwrap();

        assert!(store.remove("a").await.unwrap());
        assert!(!store.remove("a").await.unwrap());

        store.clear().await.unwrap();
        assert!(store.is_empty().await);
    }
}

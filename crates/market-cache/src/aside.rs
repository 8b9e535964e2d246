//! Cache-aside helper.
//!
//! [`CacheAside::get_or_compute`] is the only way results reach a store:
//! look the key up, return the decoded value on a hit, otherwise run the
//! computation, write its JSON encoding with the requested [`Ttl`] and return
//! it. Cache trouble never fails a request; it only costs a recomputation.

use market_core::{CacheKey, CacheStore, Result, Ttl};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, instrument, warn};

type Gate = Arc<tokio::sync::Mutex<()>>;

/// Encoded values that count as "nothing cached".
const EMPTY_VALUES: [&str; 4] = ["", "null", "[]", "{}"];

/// Read-through wrapper around a [`CacheStore`].
///
/// By default concurrent misses on one key each run their computation and the
/// last write wins. [`with_coalescing`](Self::with_coalescing) makes them
/// queue behind the first computation and reuse its result instead.
#[derive(Debug)]
pub struct CacheAside {
    store: Arc<dyn CacheStore>,
    coalesce: bool,
    inflight: Mutex<HashMap<String, Gate>>,
}

impl CacheAside {
    /// Wraps a store.
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            coalesce: false,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Enables or disables miss coalescing.
    #[must_use]
    pub const fn with_coalescing(mut self, coalesce: bool) -> Self {
        self.coalesce = coalesce;
        self
    }

    /// Returns the wrapped store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Returns the cached value under `key`, if any.
    ///
    /// Empty encodings (`""`, `null`, `[]`, `{}`), undecodable values and
    /// store failures all read as a miss.
    #[instrument(skip(self, key), fields(key = %key))]
    pub async fn lookup<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let raw = match self.store.get(key.as_str()).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };
        if EMPTY_VALUES.contains(&raw.trim()) {
            debug!("Cached value is empty, treating as miss");
            return None;
        }
        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!("Cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(error = %e, "Cached value could not be decoded, treating as miss");
                None
            }
        }
    }

    /// Returns the cached value under `key`, computing and caching it on a miss.
    ///
    /// Computation errors propagate and leave the cache untouched. Write
    /// failures are logged and the computed value is still returned.
    pub async fn get_or_compute<T, F, Fut>(&self, key: &CacheKey, ttl: Ttl, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
    {
        if let Some(hit) = self.lookup(key).await {
            return Ok(hit);
        }
        if !self.coalesce {
            return self.fill(key, ttl, compute).await;
        }

        let slot = self.enter(key);
        let _turn = slot.gate.lock().await;
        match self.lookup(key).await {
            Some(hit) => Ok(hit),
            None => self.fill(key, ttl, compute).await,
        }
    }

    /// Removes the entry under `key`.
    pub async fn invalidate(&self, key: &CacheKey) -> Result<bool> {
        self.store.remove(key.as_str()).await
    }

    #[instrument(skip(self, key, compute), fields(key = %key))]
    async fn fill<T, F, Fut>(&self, key: &CacheKey, ttl: Ttl, compute: F) -> Result<T>
    where
        T: Serialize + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
    {
        debug!("Cache miss, computing");
        let value = compute().await?;
        match serde_json::to_string(&value) {
            Ok(encoded) => {
                if let Err(e) = self.store.set(key.as_str(), &encoded, ttl).await {
                    warn!(error = %e, "Failed to cache computed value");
                }
            }
            Err(e) => warn!(error = %e, "Computed value could not be encoded"),
        }
        Ok(value)
    }

    fn enter(&self, key: &CacheKey) -> InflightSlot<'_> {
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        let gate = inflight.entry(key.as_str().to_string()).or_default().clone();
        InflightSlot {
            inflight: &self.inflight,
            key: key.as_str().to_string(),
            gate,
        }
    }
}

/// A caller's claim on the gate of one key. Dropping it, whether the call
/// finished or was cancelled, removes the gate once nobody else holds it.
struct InflightSlot<'a> {
    inflight: &'a Mutex<HashMap<String, Gate>>,
    key: String,
    gate: Gate,
}

impl Drop for InflightSlot<'_> {
    fn drop(&mut self) {
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map plus ours: nobody else is waiting.
        if Arc::strong_count(&self.gate) <= 2 {
            inflight.remove(&self.key);
        }
    }
}

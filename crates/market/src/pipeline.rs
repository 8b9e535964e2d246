//! The aggregation pipeline shared by every metric family.

use crate::config::PipelineConfig;
use market_cache::CacheAside;
use market_calendar::{CalendarResolver, LookbackMode};
use market_core::{
    CacheKey, CacheStore, Clock, EventPublisher, MarketError, MarketEvent, Query, Result,
    SystemClock, TabularSource,
};
use polars::prelude::DataFrame;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Computes market metrics from a [`TabularSource`], caching every result.
///
/// Each metric family is an `async fn` on this type. A call resolves the
/// reference dates it needs, fans its queries out concurrently, aligns the
/// frames by entity and shapes the rows. Results are cached under the
/// family's key so repeated calls within the entry's lifetime never reach
/// the source.
///
/// # Example
///
/// ```rust,ignore
/// use market::{InMemoryStore, MarketPipeline, SqliteSource};
/// use std::sync::Arc;
///
/// let source = Arc::new(SqliteSource::open("market.db")?);
/// let pipeline = MarketPipeline::new(source, Arc::new(InMemoryStore::new()));
///
/// for row in pipeline.market_volatility().await? {
///     println!("{}: {:?}", row.ticker, row.day_change_percent);
/// }
/// ```
pub struct MarketPipeline {
    pub(crate) source: Arc<dyn TabularSource>,
    pub(crate) cache: CacheAside,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) publisher: Option<Arc<dyn EventPublisher>>,
    pub(crate) config: PipelineConfig,
}

impl fmt::Debug for MarketPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarketPipeline")
            .field("source", &self.source.name())
            .field("cache", &self.cache)
            .field("publisher", &self.publisher.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MarketPipeline {
    /// Creates a pipeline with the default configuration and the system clock.
    #[must_use]
    pub fn new(source: Arc<dyn TabularSource>, store: Arc<dyn CacheStore>) -> Self {
        Self {
            source,
            cache: CacheAside::new(store),
            clock: Arc::new(SystemClock::new()),
            publisher: None,
            config: PipelineConfig::default(),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.cache = CacheAside::new(self.cache.store().clone())
            .with_coalescing(config.coalesce_misses);
        self.config = config;
        self
    }

    /// Replaces the clock used to resolve "today".
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Publishes every freshly computed result to `publisher`.
    #[must_use]
    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns the cache wrapper.
    #[must_use]
    pub const fn cache(&self) -> &CacheAside {
        &self.cache
    }

    /// Drops the cached result under `key`.
    pub async fn invalidate(&self, key: &CacheKey) -> Result<bool> {
        self.cache.invalidate(key).await
    }

    /// Resolver with nearest-session look-backs.
    pub(crate) fn calendar(&self) -> CalendarResolver {
        CalendarResolver::new(self.clock.clone()).with_depth(self.config.calendar_depth)
    }

    /// Resolver with positional week and month look-backs.
    pub(crate) fn session_calendar(&self) -> CalendarResolver {
        self.calendar().with_mode(LookbackMode::SessionIndex {
            week: self.config.session_week_index,
        })
    }

    /// Returns the cached value under `key` or computes, caches and
    /// announces it.
    pub(crate) async fn cached<T, F, Fut>(&self, key: CacheKey, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
    {
        let ttl = self.config.ttl.ttl_for(key.name());
        let topic = &key;
        self.cache
            .get_or_compute(&key, ttl, move || async move {
                let value = compute().await?;
                if self.publisher.is_some() {
                    let payload = serde_json::to_value(&value);
                    self.announce(topic, payload).await;
                }
                Ok(value)
            })
            .await
    }

    /// Runs `queries` concurrently within the fetch time budget.
    #[instrument(skip(self, queries), fields(source = self.source.name(), count = queries.len()))]
    pub(crate) async fn fetch_all(&self, queries: Vec<Query>) -> Result<Vec<DataFrame>> {
        let budget = self.config.fetch_timeout();
        let frames = tokio::time::timeout(budget, self.source.query_all(&queries))
            .await
            .map_err(|_| MarketError::Timeout(budget))??;
        debug!(rows = frames.iter().map(DataFrame::height).sum::<usize>(), "Fetched frames");
        Ok(frames)
    }

    /// Runs exactly `N` queries and returns their frames in order.
    pub(crate) async fn fetch<const N: usize>(&self, queries: [Query; N]) -> Result<[DataFrame; N]> {
        let frames = self.fetch_all(queries.into()).await?;
        let got = frames.len();
        frames.try_into().map_err(|_| {
            MarketError::DataSource(format!("expected {N} result frames, got {got}"))
        })
    }

    async fn announce(
        &self,
        key: &CacheKey,
        payload: std::result::Result<serde_json::Value, serde_json::Error>,
    ) {
        let Some(publisher) = &self.publisher else {
            return;
        };
        let payload = match payload {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %key, error = %e, "Result could not be encoded for publishing");
                return;
            }
        };
        if let Err(e) = publisher.publish(MarketEvent::new(key.as_str(), payload)).await {
            warn!(key = %key, error = %e, "Failed to publish result");
        }
    }
}

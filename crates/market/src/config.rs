//! Pipeline configuration.

use market_core::{Exchange, KeyName, MarketError, Result, TableRef, Ttl};
use market_metrics::PriceBand;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Per-family cache lifetimes.
///
/// Families without an override use [`KeyName::default_ttl`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtlPolicy {
    /// Lifetime overrides keyed by family.
    pub overrides: HashMap<KeyName, Ttl>,
}

impl TtlPolicy {
    /// Returns the lifetime for entries of `name`.
    #[must_use]
    pub fn ttl_for(&self, name: KeyName) -> Ttl {
        self.overrides
            .get(&name)
            .copied()
            .unwrap_or_else(|| name.default_ttl())
    }

    /// Overrides the lifetime of one family.
    #[must_use]
    pub fn with_override(mut self, name: KeyName, ttl: Ttl) -> Self {
        self.overrides.insert(name, ttl);
        self
    }
}

/// Names of the tables the pipeline reads, optionally schema-qualified.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketTables {
    /// Daily index closes.
    pub index_prices: String,
    /// Daily ticker quotes.
    pub ticker_prices: String,
    /// Company reference data.
    pub companies: String,
    /// Foreign net trading per ticker.
    pub foreign_net: String,
    /// Foreign investor trades.
    pub foreign_trades: String,
    /// Proprietary desk trades.
    pub proprietary_trades: String,
    /// Traded value per floor.
    pub index_trades: String,
    /// Net trading per investor group.
    pub net_flows: String,
    /// HOSE price history for rate of change.
    pub roc_hose: String,
    /// HNX price history for rate of change.
    pub roc_hnx: String,
    /// UPCOM price history for rate of change.
    pub roc_upcom: String,
}

impl Default for MarketTables {
    fn default() -> Self {
        Self {
            index_prices: "index_prices".into(),
            ticker_prices: "ticker_prices".into(),
            companies: "companies".into(),
            foreign_net: "foreign_net".into(),
            foreign_trades: "foreign_trades".into(),
            proprietary_trades: "proprietary_trades".into(),
            index_trades: "index_trades".into(),
            net_flows: "net_flows".into(),
            roc_hose: "roc_hose".into(),
            roc_hnx: "roc_hnx".into(),
            roc_upcom: "roc_upcom".into(),
        }
    }
}

impl MarketTables {
    /// Daily index closes.
    pub fn index_prices(&self) -> Result<TableRef> {
        TableRef::parse(&self.index_prices)
    }

    /// Daily ticker quotes.
    pub fn ticker_prices(&self) -> Result<TableRef> {
        TableRef::parse(&self.ticker_prices)
    }

    /// Company reference data.
    pub fn companies(&self) -> Result<TableRef> {
        TableRef::parse(&self.companies)
    }

    /// Foreign net trading per ticker.
    pub fn foreign_net(&self) -> Result<TableRef> {
        TableRef::parse(&self.foreign_net)
    }

    /// Foreign investor trades.
    pub fn foreign_trades(&self) -> Result<TableRef> {
        TableRef::parse(&self.foreign_trades)
    }

    /// Proprietary desk trades.
    pub fn proprietary_trades(&self) -> Result<TableRef> {
        TableRef::parse(&self.proprietary_trades)
    }

    /// Traded value per floor.
    pub fn index_trades(&self) -> Result<TableRef> {
        TableRef::parse(&self.index_trades)
    }

    /// Net trading per investor group.
    pub fn net_flows(&self) -> Result<TableRef> {
        TableRef::parse(&self.net_flows)
    }

    /// Price history of `exchange` for rate of change.
    pub fn roc(&self, exchange: Exchange) -> Result<TableRef> {
        TableRef::parse(match exchange {
            Exchange::Hose => &self.roc_hose,
            Exchange::Hnx => &self.roc_hnx,
            Exchange::Upcom => &self.roc_upcom,
        })
    }

    /// Checks every table name.
    pub fn validate(&self) -> Result<()> {
        self.index_prices()?;
        self.ticker_prices()?;
        self.companies()?;
        self.foreign_net()?;
        self.foreign_trades()?;
        self.proprietary_trades()?;
        self.index_trades()?;
        self.net_flows()?;
        for exchange in [Exchange::Hose, Exchange::Hnx, Exchange::Upcom] {
            self.roc(exchange)?;
        }
        Ok(())
    }
}

/// Configuration for [`MarketPipeline`](crate::MarketPipeline).
///
/// # Example
///
/// ```
/// use market::PipelineConfig;
///
/// let config = PipelineConfig::from_json(r#"{ "top_k": 5, "coalesce_misses": true }"#).unwrap();
/// assert_eq!(config.top_k, 5);
/// assert_eq!(config.calendar_depth, 20);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Time budget of one request's fetch fan-out, in milliseconds.
    pub fetch_timeout_ms: u64,
    /// Distinct sessions fetched when resolving reference dates.
    pub calendar_depth: usize,
    /// Rows kept on each side by top/bottom rankings.
    pub top_k: usize,
    /// Rows kept by investor transaction rankings.
    pub investor_top: usize,
    /// Rows returned by the floor traded-value listing.
    pub floor_value_rows: usize,
    /// Index of the week session in session-index look-backs.
    pub session_week_index: usize,
    /// Whether concurrent misses on one key share one computation.
    pub coalesce_misses: bool,
    /// Look-back of net transaction values, in months.
    pub net_transaction_months: u32,
    /// Ceiling/floor band used by market breadth.
    pub price_band: PriceBand,
    /// Cache lifetimes.
    pub ttl: TtlPolicy,
    /// Table names.
    pub tables: MarketTables,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: 30_000,
            calendar_depth: 20,
            top_k: 10,
            investor_top: 50,
            floor_value_rows: 20,
            session_week_index: 4,
            coalesce_misses: false,
            net_transaction_months: 3,
            price_band: PriceBand::default(),
            ttl: TtlPolicy::default(),
            tables: MarketTables::default(),
        }
    }
}

impl PipelineConfig {
    /// Parses a JSON document; absent fields keep their defaults.
    ///
    /// # Errors
    /// Returns [`MarketError::Serialization`] for malformed JSON and
    /// [`MarketError::InvalidParameter`] for invalid table names.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks table names and numeric bounds.
    pub fn validate(&self) -> Result<()> {
        if self.fetch_timeout_ms == 0 {
            return Err(MarketError::InvalidParameter(
                "fetch_timeout_ms must be positive".into(),
            ));
        }
        if self.calendar_depth == 0 {
            return Err(MarketError::InvalidParameter(
                "calendar_depth must be positive".into(),
            ));
        }
        self.tables.validate()
    }

    /// Returns the fetch time budget.
    #[must_use]
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Sets the fetch time budget, at millisecond precision.
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the number of rows kept on each side of top/bottom rankings.
    #[must_use]
    pub const fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Enables or disables miss coalescing.
    #[must_use]
    pub const fn with_coalescing(mut self, coalesce: bool) -> Self {
        self.coalesce_misses = coalesce;
        self
    }

    /// Sets the breadth band.
    #[must_use]
    pub const fn with_price_band(mut self, band: PriceBand) -> Self {
        self.price_band = band;
        self
    }

    /// Sets the cache lifetimes.
    #[must_use]
    pub fn with_ttl_policy(mut self, ttl: TtlPolicy) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the table names.
    #[must_use]
    pub fn with_tables(mut self, tables: MarketTables) -> Self {
        self.tables = tables;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.fetch_timeout(), Duration::from_secs(30));
        assert_eq!(config.top_k, 10);
        assert_eq!(config.investor_top, 50);
        assert_eq!(config.floor_value_rows, 20);
        assert!(!config.coalesce_misses);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_with_overrides() {
        let config = PipelineConfig::from_json(
            r#"{
                "fetch_timeout_ms": 5000,
                "ttl": { "overrides": { "domestic-index": "minute" } },
                "tables": { "ticker_prices": "market.ticker_daily" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.fetch_timeout(), Duration::from_secs(5));
        assert_eq!(config.ttl.ttl_for(KeyName::DomesticIndex), Ttl::Minute);
        assert_eq!(config.ttl.ttl_for(KeyName::TopNetForeign), Ttl::Forever);
        assert_eq!(
            config.tables.ticker_prices().unwrap().to_string(),
            "market.ticker_daily"
        );
        assert_eq!(config.tables.companies, "companies");
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            PipelineConfig::from_json(r#"{ "tables": { "companies": "companies; DROP" } }"#),
            Err(MarketError::InvalidParameter(_))
        ));
        assert!(matches!(
            PipelineConfig::from_json("{ not json"),
            Err(MarketError::Serialization(_))
        ));
        assert!(PipelineConfig::default().with_fetch_timeout(Duration::ZERO).validate().is_err());
    }

    #[test]
    fn test_sub_second_fetch_timeout() {
        let config = PipelineConfig::default().with_fetch_timeout(Duration::from_millis(1500));
        assert_eq!(config.fetch_timeout(), Duration::from_millis(1500));

        let config = PipelineConfig::default().with_fetch_timeout(Duration::from_millis(500));
        assert_eq!(config.fetch_timeout_ms, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_roc_tables_per_exchange() {
        let tables = MarketTables::default();
        assert_eq!(tables.roc(Exchange::Hnx).unwrap().name(), "roc_hnx");
        assert_eq!(tables.roc(Exchange::parse_or_default("??")).unwrap().name(), "roc_hose");
    }
}

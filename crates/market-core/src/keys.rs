//! Cache key names.
//!
//! Every metric family writes under one [`KeyName`]; parameterized families
//! append their canonical parameter codes with [`CacheKey::with`], joined by
//! `:`. Two requests that resolve to the same parameters therefore share one
//! entry.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::params::Ttl;

/// Base name of a cached metric family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyName {
    /// Index price changes.
    MarketVolatility,
    /// Per-ticker liquidity of one exchange.
    MarketLiquidity,
    /// Total traded value per exchange.
    ExchangeVolume,
    /// Advance/decline counts per industry.
    MarketBreadth,
    /// Domestic index quotes.
    DomesticIndex,
    /// Ticker price changes.
    TickerPrice,
    /// Top and bottom foreign net buyers.
    TopNetForeign,
    /// Foreign bought or sold value per ticker of one exchange.
    NetForeign,
    /// Top and bottom five-session rate of change.
    #[serde(rename = "top-roc-5")]
    TopRoc5,
    /// Accumulated money flow per ticker.
    CashFlowValue,
    /// Investor group trades per ticker.
    InvestorTransaction,
    /// Liquidity growth per floor.
    LiquidityChangePerformance,
    /// Net trading per investor group.
    NetTransactionValue,
    /// Recent traded value of the main floors.
    InvestorTransactionValue,
}

impl KeyName {
    /// Returns the key prefix.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MarketVolatility => "market-volatility",
            Self::MarketLiquidity => "market-liquidity",
            Self::ExchangeVolume => "exchange-volume",
            Self::MarketBreadth => "market-breadth",
            Self::DomesticIndex => "domestic-index",
            Self::TickerPrice => "ticker-price",
            Self::TopNetForeign => "top-net-foreign",
            Self::NetForeign => "net-foreign",
            Self::TopRoc5 => "top-roc-5",
            Self::CashFlowValue => "cash-flow-value",
            Self::InvestorTransaction => "investor-transaction",
            Self::LiquidityChangePerformance => "liquidity-change-performance",
            Self::NetTransactionValue => "net-transaction-value",
            Self::InvestorTransactionValue => "investor-transaction-value",
        }
    }

    /// Returns the lifetime entries of this family get unless configured otherwise.
    #[must_use]
    pub const fn default_ttl(&self) -> Ttl {
        match self {
            Self::MarketVolatility
            | Self::MarketLiquidity
            | Self::ExchangeVolume
            | Self::MarketBreadth
            | Self::TickerPrice
            | Self::LiquidityChangePerformance
            | Self::NetTransactionValue
            | Self::InvestorTransactionValue => Ttl::Minute,
            Self::DomesticIndex
            | Self::TopNetForeign
            | Self::NetForeign
            | Self::TopRoc5
            | Self::CashFlowValue
            | Self::InvestorTransaction => Ttl::Forever,
        }
    }
}

impl fmt::Display for KeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully qualified cache key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    name: KeyName,
    key: String,
}

impl CacheKey {
    /// Creates a key with no parameters.
    #[must_use]
    pub fn new(name: KeyName) -> Self {
        Self {
            name,
            key: name.as_str().to_string(),
        }
    }

    /// Appends one parameter code.
    #[must_use]
    pub fn with(mut self, part: impl fmt::Display) -> Self {
        self.key.push(':');
        self.key.push_str(&part.to_string());
        self
    }

    /// Returns the family this key belongs to.
    #[must_use]
    pub const fn name(&self) -> KeyName {
        self.name
    }

    /// Returns the key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/market/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for cached market aggregation.
//!
//! - [`TabularSource`](source::TabularSource) - Parameterized table reads
//! - [`CacheStore`](cache::CacheStore) - Expiring key-value storage
//! - [`Clock`](clock::Clock) - Source of "today"
//! - [`EventPublisher`](event::EventPublisher) - Result notifications
//! - [`Query`](query::Query) - Validated query description
//! - [`FrameReader`](frame::FrameReader) - Typed access to result frames

/// Key-value store trait.
pub mod cache;
/// Clock trait and implementations.
pub mod clock;
/// Calendar helpers.
pub mod dates;
/// Error types for aggregation operations.
pub mod error;
/// Result notifications.
pub mod event;
/// Typed column access over result frames.
pub mod frame;
/// Cache key names.
pub mod keys;
/// Request parameters and cache lifetimes.
pub mod params;
/// Query descriptions.
pub mod query;
/// Result row types.
pub mod rows;
/// Tabular source traits.
pub mod source;
/// Core types (Ticker, ReferenceDateSet, etc.).
pub mod types;

// Re-export commonly used items at crate root
pub use cache::CacheStore;
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{MarketError, Result};
pub use event::{EventPublisher, MarketEvent};
pub use frame::{FrameReader, date_column};
pub use keys::{CacheKey, KeyName};
pub use params::{Exchange, InvestorKind, PeriodKind, RankOrder, TimeWindow, TradeSide, Ttl};
pub use query::{Direction, Filter, OrderBy, Query, Selection, TableRef, Value};
pub use rows::{
    BreadthRow, CashFlowRow, FloorTradeValue, IndexQuote, InvestorFlowRow, LiquidityGrowthPoint,
    LiquidityRow, NetForeignRow, NetTransactionRow, PriceChange, RankedValue,
};
pub use source::{DataSource, TabularSource};
pub use types::{DateSlot, ReferenceDateSet, Ticker};

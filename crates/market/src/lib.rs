#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/market/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Pipeline configuration.
pub mod config;
/// In-process event fan-out.
pub mod publish;
/// Column names of the source tables.
pub mod schema;

mod breadth;
mod flows;
mod index;
mod liquidity;
mod pipeline;
mod ranking;
mod read;
mod volatility;

pub use config::{MarketTables, PipelineConfig, TtlPolicy};
pub use pipeline::MarketPipeline;
pub use publish::BroadcastPublisher;

// Re-export core types
pub use market_core::*;

// Re-export building blocks
pub use market_cache::{CacheAside, InMemoryStore, NoopStore};
pub use market_calendar::{CalendarResolver, LookbackMode, PeriodMarker, PeriodMarkers};
pub use market_metrics::{ChangeTriple, Movement, PriceBand};
pub use market_source::MemorySource;

#[cfg(feature = "cache-sqlite")]
pub use market_cache::SqliteStore;

#[cfg(feature = "source-sqlite")]
pub use market_source::SqliteSource;

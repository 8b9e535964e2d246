#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/market/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Cache stores for market aggregation.
//!
//! This crate provides implementations of the [`CacheStore`] trait from `market-core`:
//!
//! - [`SqliteStore`] - Persistent SQLite-based store (default, requires `sqlite` feature)
//! - [`InMemoryStore`] - In-process store with per-entry deadlines
//! - [`NoopStore`] - Store that doesn't keep anything
//!
//! and [`CacheAside`], the read-through helper every metric family goes through.

/// Cache-aside helper.
pub mod aside;
/// In-memory store implementation.
pub mod memory;
/// No-op store implementation.
pub mod noop;

/// SQLite-based store implementation.
#[cfg(feature = "sqlite")]
pub mod sqlite;

// Re-export the trait for convenience
pub use market_core::CacheStore;

pub use aside::CacheAside;
pub use memory::InMemoryStore;
pub use noop::NoopStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

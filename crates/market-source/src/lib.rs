#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/market/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Tabular data sources.
//!
//! This crate provides implementations of the [`TabularSource`] trait from `market-core`:
//!
//! - [`MemorySource`] - In-process tables of DataFrames
//! - [`SqliteSource`] - SQLite database (default, requires `sqlite` feature)

/// In-memory source implementation.
pub mod memory;

/// SQLite source implementation.
#[cfg(feature = "sqlite")]
pub mod sqlite;

// Re-export the trait for convenience
pub use market_core::TabularSource;

pub use memory::MemorySource;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSource;

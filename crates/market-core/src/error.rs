//! Error types for aggregation operations.
//!
//! This module defines [`MarketError`] which covers every failure that can
//! abort a request: data source fetches, malformed result frames, cache
//! backends, and fan-out timeouts.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while resolving dates, fetching rows, or caching results.
#[derive(Error, Debug)]
pub enum MarketError {
    /// The underlying tabular data source failed.
    #[error("Data source error: {0}")]
    DataSource(String),

    /// A result frame could not be read (wrong dtype, unparseable cell, etc.).
    #[error("Frame error: {0}")]
    Frame(String),

    /// A result frame did not carry a column the caller relies on.
    #[error("Missing column {column} in result")]
    MissingColumn {
        /// Name of the absent column.
        column: String,
    },

    /// The fetch fan-out for one request exceeded its time budget.
    #[error("Fetch fan-out timed out after {0:?}")]
    Timeout(Duration),

    /// Error interacting with the cache backend.
    #[error("Cache error: {0}")]
    Cache(String),

    /// A value could not be encoded to or decoded from its cached form.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An invalid parameter was provided (for example a malformed table name).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl From<serde_json::Error> for MarketError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using [`MarketError`].
pub type Result<T> = std::result::Result<T, MarketError>;

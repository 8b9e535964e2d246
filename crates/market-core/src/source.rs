//! Tabular source traits.
//!
//! - [`DataSource`] - Metadata shared by every source
//! - [`TabularSource`] - Parameterized reads returning a [`DataFrame`]

use async_trait::async_trait;
use polars::prelude::DataFrame;
use std::fmt::Debug;

use crate::{error::Result, query::Query};

/// Base trait for all data sources.
pub trait DataSource: Send + Sync + Debug {
    /// Returns the name of this source (e.g., "sqlite").
    fn name(&self) -> &str;

    /// Returns a description of this source.
    fn description(&self) -> &str;
}

/// A source that answers parameterized table reads.
///
/// Implementations must bind every [`Value`](crate::query::Value) as a
/// parameter and validate identifiers with
/// [`Query::validate`] before touching the backend.
#[async_trait]
pub trait TabularSource: DataSource {
    /// Runs one query.
    ///
    /// Column selections return the requested columns in order. Date
    /// selections return a single date column named after the queried column.
    async fn query(&self, query: &Query) -> Result<DataFrame>;

    /// Runs several queries concurrently and returns their frames in input order.
    ///
    /// Fails with the first error; the remaining queries are dropped.
    async fn query_all(&self, queries: &[Query]) -> Result<Vec<DataFrame>> {
        futures::future::try_join_all(queries.iter().map(|q| self.query(q))).await
    }
}

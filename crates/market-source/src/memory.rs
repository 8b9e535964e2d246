//! In-memory source implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use market_core::dates::nearest_date;
use market_core::{
    DataSource, Direction, Filter, FrameReader, MarketError, OrderBy, Query, Result, Selection,
    TableRef, TabularSource, Value, date_column,
};
use polars::prelude::{DataFrame, DataType, IdxCa, IdxSize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Source backed by named in-process DataFrames.
///
/// Queries are evaluated directly against the stored frames: filters first,
/// then ordering (nulls last, stable), then the row limit, then the column
/// selection. Failures and latency can be injected per source for testing the
/// pipeline's error and timeout paths.
#[derive(Debug, Default)]
pub struct MemorySource {
    tables: RwLock<HashMap<String, DataFrame>>,
    failing: RwLock<HashSet<String>>,
    latency: Option<Duration>,
    queries: AtomicUsize,
}

impl MemorySource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `df` under `table`.
    #[must_use]
    pub fn with_table(mut self, table: &TableRef, df: DataFrame) -> Self {
        self.tables.get_mut().insert(table.to_string(), df);
        self
    }

    /// Makes every query against `table` fail with [`MarketError::DataSource`].
    #[must_use]
    pub fn with_failure(mut self, table: &TableRef) -> Self {
        self.failing.get_mut().insert(table.to_string());
        self
    }

    /// Delays every query by `latency` (Tokio time).
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Replaces the frame stored under `table`.
    pub async fn replace_table(&self, table: &TableRef, df: DataFrame) {
        self.tables.write().await.insert(table.to_string(), df);
    }

    /// Turns failure injection for `table` on or off.
    pub async fn set_failure(&self, table: &TableRef, failing: bool) {
        let mut tables = self.failing.write().await;
        if failing {
            tables.insert(table.to_string());
        } else {
            tables.remove(&table.to_string());
        }
    }

    /// Returns how many queries have been received.
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.queries.load(AtomicOrdering::SeqCst)
    }
}

impl DataSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn description(&self) -> &str {
        "In-process DataFrame tables"
    }
}

#[async_trait]
impl TabularSource for MemorySource {
    #[instrument(skip(self, query), fields(table = %query.table()))]
    async fn query(&self, query: &Query) -> Result<DataFrame> {
        self.queries.fetch_add(1, AtomicOrdering::SeqCst);
        query.validate()?;

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let name = query.table().to_string();
        if self.failing.read().await.contains(&name) {
            return Err(MarketError::DataSource(format!(
                "Injected failure for table {name}"
            )));
        }
        let df = self
            .tables
            .read()
            .await
            .get(&name)
            .cloned()
            .ok_or_else(|| MarketError::DataSource(format!("Unknown table {name}")))?;

        let result = evaluate(&df, query)?;
        debug!(rows = result.height(), "Query served");
        Ok(result)
    }
}

fn frame_error(e: impl std::fmt::Display) -> MarketError {
    MarketError::Frame(e.to_string())
}

fn evaluate(df: &DataFrame, query: &Query) -> Result<DataFrame> {
    let reader = FrameReader::new(df);

    let mut mask = vec![true; df.height()];
    for filter in query.filters() {
        for (keep, hit) in mask.iter_mut().zip(filter_mask(&reader, filter)?) {
            *keep &= hit;
        }
    }
    let mut rows: Vec<usize> = mask
        .iter()
        .enumerate()
        .filter_map(|(i, keep)| keep.then_some(i))
        .collect();

    match query.selection() {
        Selection::Columns(columns) => {
            if let Some(missing) = columns.iter().find(|c| !reader.has_column(c)) {
                return Err(MarketError::MissingColumn {
                    column: (*missing).to_string(),
                });
            }
            if let Some(order) = query.ordering() {
                sort_rows(df, &mut rows, order)?;
            }
            if let Some(limit) = query.row_limit() {
                rows.truncate(limit);
            }
            let idx = IdxCa::from_vec(
                "idx".into(),
                rows.into_iter().map(|i| i as IdxSize).collect(),
            );
            df.select(columns.iter().copied())
                .and_then(|selected| selected.take(&idx))
                .map_err(frame_error)
        }
        Selection::DistinctDates { column, limit } => {
            let dates = reader.date(column)?;
            let distinct: BTreeSet<NaiveDate> = rows.iter().filter_map(|&i| dates[i]).collect();
            let newest: Vec<NaiveDate> = distinct.into_iter().rev().take(*limit).collect();
            DataFrame::new(vec![date_column(column, &newest)?]).map_err(frame_error)
        }
        Selection::NearestDate { column, target } => {
            let dates = reader.date(column)?;
            let nearest = nearest_date(rows.iter().filter_map(|&i| dates[i]), *target);
            DataFrame::new(vec![date_column(column, nearest.as_slice())?]).map_err(frame_error)
        }
    }
}

fn filter_mask(reader: &FrameReader<'_>, filter: &Filter) -> Result<Vec<bool>> {
    match filter {
        Filter::Eq { column, value } => value_mask(reader, column, value),
        Filter::In { column, values } => {
            let mut mask = vec![false; reader.height()];
            for value in values {
                for (keep, hit) in mask.iter_mut().zip(value_mask(reader, column, value)?) {
                    *keep |= hit;
                }
            }
            Ok(mask)
        }
        Filter::Between { column, start, end } => Ok(reader
            .date(column)?
            .into_iter()
            .map(|cell| cell.is_some_and(|d| *start <= d && d <= *end))
            .collect()),
    }
}

fn value_mask(reader: &FrameReader<'_>, column: &str, value: &Value) -> Result<Vec<bool>> {
    Ok(match value {
        Value::Text(v) => reader
            .text(column)?
            .into_iter()
            .map(|cell| cell.as_deref() == Some(v.as_str()))
            .collect(),
        Value::Number(v) => reader
            .number(column)?
            .into_iter()
            .map(|cell| cell == Some(*v))
            .collect(),
        Value::Date(v) => reader
            .date(column)?
            .into_iter()
            .map(|cell| cell == Some(*v))
            .collect(),
    })
}

fn sort_rows(df: &DataFrame, rows: &mut [usize], order: OrderBy) -> Result<()> {
    let reader = FrameReader::new(df);
    let dtype = df
        .column(order.column)
        .map_err(|_| MarketError::MissingColumn {
            column: order.column.to_string(),
        })?
        .dtype()
        .clone();

    match dtype {
        DataType::String => {
            let keys = reader.text(order.column)?;
            sort_by_keys(rows, &keys, order.direction, Ord::cmp);
        }
        DataType::Date | DataType::Datetime(_, _) => {
            let keys = reader.date(order.column)?;
            sort_by_keys(rows, &keys, order.direction, Ord::cmp);
        }
        _ => {
            let keys = reader.number(order.column)?;
            sort_by_keys(rows, &keys, order.direction, f64::total_cmp);
        }
    }
    Ok(())
}

fn sort_by_keys<T>(
    rows: &mut [usize],
    keys: &[Option<T>],
    direction: Direction,
    cmp: impl Fn(&T, &T) -> Ordering,
) {
    rows.sort_by(|&a, &b| match (&keys[a], &keys[b]) {
        (Some(x), Some(y)) => match direction {
            Direction::Asc => cmp(x, y),
            Direction::Desc => cmp(y, x),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

//! Parameterized query descriptions for tabular sources.
//!
//! A [`Query`] names a validated table, an enumerated [`Selection`], a list of
//! [`Filter`]s, an optional ordering and a row limit. Sources translate it into
//! their own dialect; values are always bound as parameters and identifiers are
//! checked by [`validate_identifier`] before use.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{MarketError, Result};

/// Checks that `name` is a plain identifier (`[A-Za-z_][A-Za-z0-9_]*`).
pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_head = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_head && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(MarketError::InvalidParameter(format!(
            "Invalid identifier: {name:?}"
        )))
    }
}

/// A validated, optionally schema-qualified table name such as `market.ticker_daily`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableRef {
    parts: Vec<String>,
}

impl TableRef {
    /// Parses a dot-separated table name, validating every part.
    pub fn parse(name: &str) -> Result<Self> {
        let parts: Vec<String> = name.split('.').map(str::to_string).collect();
        for part in &parts {
            validate_identifier(part)?;
        }
        Ok(Self { parts })
    }

    /// Returns the individual name parts, schema first.
    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Returns the unqualified table name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or_default()
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.parts.join("."))
    }
}

impl TryFrom<String> for TableRef {
    type Error = MarketError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<TableRef> for String {
    fn from(table: TableRef) -> Self {
        table.to_string()
    }
}

/// A bound parameter value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Text value.
    Text(String),
    /// Numeric value.
    Number(f64),
    /// Calendar date.
    Date(NaiveDate),
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

/// Row filter. All filters of a query are combined with AND.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    /// `column = value`.
    Eq {
        /// Column to compare.
        column: &'static str,
        /// Value the column must equal.
        value: Value,
    },
    /// `column IN (values...)`. An empty list matches nothing.
    In {
        /// Column to compare.
        column: &'static str,
        /// Accepted values.
        values: Vec<Value>,
    },
    /// `start <= column <= end` on a date column.
    Between {
        /// Date column.
        column: &'static str,
        /// First accepted date.
        start: NaiveDate,
        /// Last accepted date.
        end: NaiveDate,
    },
}

impl Filter {
    /// Returns the column the filter applies to.
    #[must_use]
    pub const fn column(&self) -> &'static str {
        match self {
            Self::Eq { column, .. } | Self::In { column, .. } | Self::Between { column, .. } => {
                column
            }
        }
    }
}

/// What a query returns.
#[derive(Clone, Debug, PartialEq)]
pub enum Selection {
    /// The listed columns of every matching row.
    Columns(Vec<&'static str>),
    /// Distinct non-null values of a date column, newest first, at most `limit`.
    DistinctDates {
        /// Date column.
        column: &'static str,
        /// Maximum number of dates.
        limit: usize,
    },
    /// The single non-null date closest to `target` by absolute day distance.
    NearestDate {
        /// Date column.
        column: &'static str,
        /// Date to search around.
        target: NaiveDate,
    },
}

/// Sort direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Smallest first.
    Asc,
    /// Largest first.
    Desc,
}

/// Ordering applied to a [`Selection::Columns`] query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderBy {
    /// Column to sort by.
    pub column: &'static str,
    /// Direction.
    pub direction: Direction,
}

/// A parameterized read against one table.
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    table: TableRef,
    selection: Selection,
    filters: Vec<Filter>,
    order_by: Option<OrderBy>,
    limit: Option<usize>,
}

impl Query {
    /// Selects `columns` from `table`.
    #[must_use]
    pub fn select(table: &TableRef, columns: &[&'static str]) -> Self {
        Self::new(table, Selection::Columns(columns.to_vec()))
    }

    /// Selects the distinct dates of `column`, newest first.
    #[must_use]
    pub fn distinct_dates(table: &TableRef, column: &'static str, limit: usize) -> Self {
        Self::new(table, Selection::DistinctDates { column, limit })
    }

    /// Selects the date of `column` nearest to `target`.
    #[must_use]
    pub fn nearest_date(table: &TableRef, column: &'static str, target: NaiveDate) -> Self {
        Self::new(table, Selection::NearestDate { column, target })
    }

    fn new(table: &TableRef, selection: Selection) -> Self {
        Self {
            table: table.clone(),
            selection,
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    /// Adds a filter.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Keeps rows where `column` equals `value`.
    #[must_use]
    pub fn eq(self, column: &'static str, value: impl Into<Value>) -> Self {
        self.filter(Filter::Eq {
            column,
            value: value.into(),
        })
    }

    /// Keeps rows of the session `date`.
    #[must_use]
    pub fn on(self, column: &'static str, date: NaiveDate) -> Self {
        self.eq(column, date)
    }

    /// Keeps rows whose `column` is one of `values`.
    #[must_use]
    pub fn any_of<V: Into<Value>>(
        self,
        column: &'static str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.filter(Filter::In {
            column,
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    /// Keeps rows dated between `start` and `end`, both inclusive.
    #[must_use]
    pub fn between(self, column: &'static str, start: NaiveDate, end: NaiveDate) -> Self {
        self.filter(Filter::Between { column, start, end })
    }

    /// Orders the result by `column`.
    #[must_use]
    pub const fn order_by(mut self, column: &'static str, direction: Direction) -> Self {
        self.order_by = Some(OrderBy { column, direction });
        self
    }

    /// Caps the number of returned rows.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns the target table.
    #[must_use]
    pub const fn table(&self) -> &TableRef {
        &self.table
    }

    /// Returns the selection.
    #[must_use]
    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Returns the filters.
    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Returns the ordering, if any.
    #[must_use]
    pub const fn ordering(&self) -> Option<OrderBy> {
        self.order_by
    }

    /// Returns the row limit, if any.
    #[must_use]
    pub const fn row_limit(&self) -> Option<usize> {
        self.limit
    }

    /// Validates every identifier the query references.
    pub fn validate(&self) -> Result<()> {
        let selected: Vec<&str> = match &self.selection {
            Selection::Columns(columns) => columns.clone(),
            Selection::DistinctDates { column, .. } | Selection::NearestDate { column, .. } => {
                vec![*column]
            }
        };
        if selected.is_empty() {
            return Err(MarketError::InvalidParameter(format!(
                "Query on {} selects no columns",
                self.table
            )));
        }
        selected
            .into_iter()
            .chain(self.filters.iter().map(Filter::column))
            .chain(self.order_by.map(|o| o.column))
            .try_for_each(validate_identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_validation() {
        assert!(validate_identifier("close_price").is_ok());
        assert!(validate_identifier("_tmp1").is_ok());
        assert!(validate_identifier("1abc").is_err());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("a; DROP TABLE x").is_err());
        assert!(validate_identifier("[dbo]").is_err());
    }

    #[test]
    fn test_table_ref_parse() {
        let table = TableRef::parse("market.ticker_daily").unwrap();
        assert_eq!(table.parts(), ["market", "ticker_daily"]);
        assert_eq!(table.name(), "ticker_daily");
        assert_eq!(table.to_string(), "market.ticker_daily");
        assert!(TableRef::parse("market..ticker").is_err());
        assert!(TableRef::parse("market.ticker daily").is_err());
    }

    #[test]
    fn test_table_ref_serde() {
        let table: TableRef = serde_json::from_str("\"prices\"").unwrap();
        assert_eq!(table.name(), "prices");
        assert!(serde_json::from_str::<TableRef>("\"bad name\"").is_err());
    }

    #[test]
    fn test_query_builder() {
        let table = TableRef::parse("prices").unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let query = Query::select(&table, &["ticker", "close_price"])
            .on("date_time", date)
            .any_of("type", ["STOCK", "ETF"])
            .order_by("close_price", Direction::Desc)
            .limit(10);

        assert_eq!(query.filters().len(), 2);
        assert_eq!(query.filters()[0].column(), "date_time");
        assert_eq!(query.row_limit(), Some(10));
        assert_eq!(
            query.ordering(),
            Some(OrderBy {
                column: "close_price",
                direction: Direction::Desc
            })
        );
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_query_validation_rejects_bad_columns() {
        let table = TableRef::parse("prices").unwrap();
        assert!(Query::select(&table, &["ticker", "close price"]).validate().is_err());
        assert!(Query::select(&table, &[]).validate().is_err());
        assert!(
            Query::select(&table, &["ticker"])
                .eq("ticker;--", "A")
                .validate()
                .is_err()
        );
    }
}

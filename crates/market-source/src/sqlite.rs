//! SQLite source implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use market_core::dates::parse_date;
use market_core::{
    DataSource, Direction, Filter, MarketError, Query, Result, Selection, TabularSource, Value,
    date_column,
};
use polars::prelude::{Column, DataFrame};
use rusqlite::Connection;
use rusqlite::types::Value as SqlValue;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, instrument};

/// Source that reads from a SQLite database.
///
/// Every [`Query`] is rendered to a single parameterized statement: identifiers
/// are validated and double-quoted, values are bound. Date columns are
/// compared through SQLite's `date()` so both `YYYY-MM-DD` and full timestamp
/// strings work. Result columns whose non-null cells are all numeric become
/// `f64` columns; everything else comes back as text.
#[derive(Debug)]
pub struct SqliteSource {
    conn: Mutex<Connection>,
}

impl SqliteSource {
    /// Open a database file.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| MarketError::DataSource(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an empty in-memory database.
    ///
    /// # Errors
    /// Returns an error if SQLite cannot allocate the database.
    pub fn in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| MarketError::DataSource(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Runs raw SQL statements, typically schema and seed data.
    ///
    /// # Errors
    /// Returns an error if any statement fails.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| MarketError::DataSource(e.to_string()))?;
        conn.execute_batch(sql)
            .map_err(|e| MarketError::DataSource(e.to_string()))
    }
}

impl DataSource for SqliteSource {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn description(&self) -> &str {
        "SQLite database"
    }
}

#[async_trait]
impl TabularSource for SqliteSource {
    #[instrument(skip(self, query), fields(table = %query.table()))]
    async fn query(&self, query: &Query) -> Result<DataFrame> {
        query.validate()?;
        let (sql, params) = render(query);
        debug!(sql = %sql, "Executing query");

        let conn = self
            .conn
            .lock()
            .map_err(|e| MarketError::DataSource(e.to_string()))?;
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| MarketError::DataSource(e.to_string()))?;
        let names: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();

        let mut cells: Vec<Vec<SqlValue>> = vec![Vec::new(); names.len()];
        let mut rows = stmt
            .query(rusqlite::params_from_iter(params.iter()))
            .map_err(|e| MarketError::DataSource(e.to_string()))?;
        while let Some(row) = rows
            .next()
            .map_err(|e| MarketError::DataSource(e.to_string()))?
        {
            for (i, column) in cells.iter_mut().enumerate() {
                let value: SqlValue = row
                    .get(i)
                    .map_err(|e| MarketError::DataSource(e.to_string()))?;
                column.push(value);
            }
        }

        let df = match query.selection() {
            Selection::Columns(_) => DataFrame::new(
                names
                    .iter()
                    .zip(cells)
                    .map(|(name, values)| to_column(name, values))
                    .collect(),
            )
            .map_err(|e| MarketError::Frame(e.to_string()))?,
            Selection::DistinctDates { column, .. } | Selection::NearestDate { column, .. } => {
                let dates: Vec<NaiveDate> = cells
                    .into_iter()
                    .next()
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|value| match value {
                        SqlValue::Text(text) => parse_date(&text),
                        _ => None,
                    })
                    .collect();
                DataFrame::new(vec![date_column(column, &dates)?])
                    .map_err(|e| MarketError::Frame(e.to_string()))?
            }
        };
        debug!(rows = df.height(), "Query served");
        Ok(df)
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{identifier}\"")
}

fn date_expr(column: &str) -> String {
    format!("date({})", quote(column))
}

fn bind(value: &Value) -> SqlValue {
    match value {
        Value::Text(v) => SqlValue::Text(v.clone()),
        Value::Number(v) => SqlValue::Real(*v),
        Value::Date(v) => SqlValue::Text(v.format("%Y-%m-%d").to_string()),
    }
}

fn render(query: &Query) -> (String, Vec<SqlValue>) {
    let table = query
        .table()
        .parts()
        .iter()
        .map(|part| quote(part))
        .collect::<Vec<_>>()
        .join(".");
    let mut params = Vec::new();
    let mut conditions: Vec<String> = Vec::new();

    for filter in query.filters() {
        conditions.push(match filter {
            Filter::Eq { column, value } => {
                params.push(bind(value));
                let target = if matches!(value, Value::Date(_)) {
                    date_expr(column)
                } else {
                    quote(column)
                };
                format!("{target} = ?{}", params.len())
            }
            Filter::In { values, .. } if values.is_empty() => "0 = 1".to_string(),
            Filter::In { column, values } => {
                let target = if values.iter().any(|v| matches!(v, Value::Date(_))) {
                    date_expr(column)
                } else {
                    quote(column)
                };
                let placeholders: Vec<String> = values
                    .iter()
                    .map(|value| {
                        params.push(bind(value));
                        format!("?{}", params.len())
                    })
                    .collect();
                format!("{target} IN ({})", placeholders.join(", "))
            }
            Filter::Between { column, start, end } => {
                params.push(bind(&Value::Date(*start)));
                params.push(bind(&Value::Date(*end)));
                format!(
                    "{} BETWEEN ?{} AND ?{}",
                    date_expr(column),
                    params.len() - 1,
                    params.len()
                )
            }
        });
    }

    let sql = match query.selection() {
        Selection::Columns(columns) => {
            let selected = columns
                .iter()
                .map(|c| quote(c))
                .collect::<Vec<_>>()
                .join(", ");
            let mut sql = format!("SELECT {selected} FROM {table}{}", where_clause(&conditions));
            if let Some(order) = query.ordering() {
                let direction = match order.direction {
                    Direction::Asc => "ASC",
                    Direction::Desc => "DESC",
                };
                let key = quote(order.column);
                sql.push_str(&format!(" ORDER BY {key} IS NULL, {key} {direction}"));
            }
            if let Some(limit) = query.row_limit() {
                params.push(SqlValue::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
                sql.push_str(&format!(" LIMIT ?{}", params.len()));
            }
            sql
        }
        Selection::DistinctDates { column, limit } => {
            conditions.push(format!("{} IS NOT NULL", date_expr(column)));
            params.push(SqlValue::Integer(i64::try_from(*limit).unwrap_or(i64::MAX)));
            format!(
                "SELECT DISTINCT {} AS {} FROM {table}{} ORDER BY 1 DESC LIMIT ?{}",
                date_expr(column),
                quote(column),
                where_clause(&conditions),
                params.len()
            )
        }
        Selection::NearestDate { column, target } => {
            conditions.push(format!("{} IS NOT NULL", date_expr(column)));
            params.push(bind(&Value::Date(*target)));
            format!(
                "SELECT {expr} AS {alias} FROM {table}{clause} \
                 ORDER BY ABS(julianday({expr}) - julianday(?{n})), {expr} DESC LIMIT 1",
                expr = date_expr(column),
                alias = quote(column),
                clause = where_clause(&conditions),
                n = params.len()
            )
        }
    };
    (sql, params)
}

fn where_clause(conditions: &[String]) -> String {
    if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    }
}

fn to_column(name: &str, values: Vec<SqlValue>) -> Column {
    let numeric = values
        .iter()
        .all(|v| matches!(v, SqlValue::Null | SqlValue::Integer(_) | SqlValue::Real(_)));
    if numeric {
        let numbers: Vec<Option<f64>> = values
            .into_iter()
            .map(|v| match v {
                SqlValue::Integer(i) => Some(i as f64),
                SqlValue::Real(f) => Some(f),
                _ => None,
            })
            .collect();
        Column::new(name.into(), numbers)
    } else {
        let texts: Vec<Option<String>> = values
            .into_iter()
            .map(|v| match v {
                SqlValue::Text(s) => Some(s),
                SqlValue::Integer(i) => Some(i.to_string()),
                SqlValue::Real(f) => Some(f.to_string()),
                SqlValue::Null | SqlValue::Blob(_) => None,
            })
            .collect();
        Column::new(name.into(), texts)
    }
}

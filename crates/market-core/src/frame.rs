//! Typed column access over result frames.
//!
//! Sources return plain [`DataFrame`]s whose column dtypes depend on the
//! backend: a date may arrive as a Polars `Date`, a `Datetime`, or an ISO
//! string, and numbers may be integers or floats. [`FrameReader`] hides those
//! differences and reports absent columns as [`MarketError::MissingColumn`].

use chrono::NaiveDate;
use polars::prelude::*;

use crate::dates::{epoch_days, parse_date};
use crate::error::{MarketError, Result};

/// Read-only typed view over a [`DataFrame`].
#[derive(Debug, Clone, Copy)]
pub struct FrameReader<'a> {
    df: &'a DataFrame,
}

impl<'a> FrameReader<'a> {
    /// Wraps a frame.
    #[must_use]
    pub const fn new(df: &'a DataFrame) -> Self {
        Self { df }
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Returns true if the frame has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Returns true if the frame carries `name`.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.df.column(name).is_ok()
    }

    fn column(&self, name: &str) -> Result<&'a Column> {
        self.df
            .column(name)
            .map_err(|_| MarketError::MissingColumn {
                column: name.to_string(),
            })
    }

    /// Reads a text column. Non-string columns are cast to their string form.
    pub fn text(&self, name: &str) -> Result<Vec<Option<String>>> {
        let column = self
            .column(name)?
            .cast(&DataType::String)
            .map_err(|e| MarketError::Frame(e.to_string()))?;
        let values = column
            .str()
            .map_err(|e| MarketError::Frame(e.to_string()))?;
        Ok(values.into_iter().map(|v| v.map(str::to_string)).collect())
    }

    /// Reads a numeric column as `f64`.
    pub fn number(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let column = self
            .column(name)?
            .cast(&DataType::Float64)
            .map_err(|e| MarketError::Frame(format!("{name}: {e}")))?;
        let values = column
            .f64()
            .map_err(|e| MarketError::Frame(e.to_string()))?;
        Ok(values.into_iter().collect())
    }

    /// Reads a date column.
    ///
    /// `Date` and `Datetime` columns go through their string form; string
    /// cells must start with `YYYY-MM-DD` or `YYYY/MM/DD`. A non-null cell that
    /// cannot be parsed is an error.
    pub fn date(&self, name: &str) -> Result<Vec<Option<NaiveDate>>> {
        self.text(name)?
            .into_iter()
            .map(|cell| match cell {
                None => Ok(None),
                Some(text) => parse_date(&text).map(Some).ok_or_else(|| {
                    MarketError::Frame(format!("Unparseable date {text:?} in column {name}"))
                }),
            })
            .collect()
    }
}

/// Builds a Polars `Date` column from calendar dates.
pub fn date_column(name: &str, dates: &[NaiveDate]) -> Result<Column> {
    let days: Vec<i32> = dates.iter().copied().map(epoch_days).collect();
    Column::new(name.into(), days)
        .cast(&DataType::Date)
        .map_err(|e| MarketError::Frame(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample() -> DataFrame {
        DataFrame::new(vec![
            date_column("date", &[d(2024, 1, 9), d(2024, 1, 10)]).unwrap(),
            Column::new("iso".into(), vec![Some("2024-01-09T00:00:00"), None]),
            Column::new("ticker".into(), vec!["AAA", "BBB"]),
            Column::new("volume".into(), vec![Some(100i64), None]),
            Column::new("price".into(), vec![10.5, 11.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_read_typed_columns() {
        let df = sample();
        let reader = FrameReader::new(&df);

        assert_eq!(reader.height(), 2);
        assert_eq!(
            reader.text("ticker").unwrap(),
            vec![Some("AAA".to_string()), Some("BBB".to_string())]
        );
        assert_eq!(reader.number("volume").unwrap(), vec![Some(100.0), None]);
        assert_eq!(reader.number("price").unwrap(), vec![Some(10.5), Some(11.0)]);
        assert_eq!(
            reader.date("date").unwrap(),
            vec![Some(d(2024, 1, 9)), Some(d(2024, 1, 10))]
        );
        assert_eq!(reader.date("iso").unwrap(), vec![Some(d(2024, 1, 9)), None]);
    }

    #[test]
    fn test_missing_column() {
        let df = sample();
        let reader = FrameReader::new(&df);

        assert!(!reader.has_column("industry"));
        assert!(matches!(
            reader.text("industry"),
            Err(MarketError::MissingColumn { column }) if column == "industry"
        ));
    }

    #[test]
    fn test_unparseable_date_is_an_error() {
        let df = DataFrame::new(vec![Column::new("date".into(), vec!["soon"])]).unwrap();
        assert!(matches!(
            FrameReader::new(&df).date("date"),
            Err(MarketError::Frame(_))
        ));
    }
}

//! Typed row extraction from fetched frames.

use crate::schema::companies;
use market_core::{FrameReader, Result, Ticker};
use polars::prelude::DataFrame;

/// Company reference row.
#[derive(Debug, Clone)]
pub(crate) struct Company {
    pub(crate) ticker: Ticker,
    pub(crate) industry: String,
    pub(crate) exchange: String,
}

/// Reads `(key, value)` pairs. Rows without a key are skipped.
pub(crate) fn keyed(df: &DataFrame, key: &str, value: &str) -> Result<Vec<(Ticker, Option<f64>)>> {
    let reader = FrameReader::new(df);
    let keys = reader.text(key)?;
    let values = reader.number(value)?;
    Ok(keys
        .into_iter()
        .zip(values)
        .filter_map(|(k, v)| Some((Ticker::new(k?), v)))
        .collect())
}

/// Reads `(key, values...)` rows for several numeric columns at once.
pub(crate) fn keyed_many<const N: usize>(
    df: &DataFrame,
    key: &str,
    columns: [&str; N],
) -> Result<Vec<(Ticker, [Option<f64>; N])>> {
    let reader = FrameReader::new(df);
    let keys = reader.text(key)?;
    let mut values = Vec::with_capacity(N);
    for column in columns {
        values.push(reader.number(column)?);
    }
    Ok(keys
        .into_iter()
        .enumerate()
        .filter_map(|(i, k)| {
            let row = std::array::from_fn(|c| values[c].get(i).copied().flatten());
            Some((Ticker::new(k?), row))
        })
        .collect())
}

/// Reads company reference rows.
pub(crate) fn company_rows(df: &DataFrame) -> Result<Vec<Company>> {
    let reader = FrameReader::new(df);
    let tickers = reader.text(companies::TICKER)?;
    let industries = reader.text(companies::INDUSTRY)?;
    let exchanges = reader.text(companies::EXCHANGE)?;
    Ok(tickers
        .into_iter()
        .zip(industries)
        .zip(exchanges)
        .filter_map(|((ticker, industry), exchange)| {
            Some(Company {
                ticker: Ticker::new(ticker?),
                industry: industry.unwrap_or_default(),
                exchange: exchange.map(|e| e.trim().to_uppercase()).unwrap_or_default(),
            })
        })
        .collect())
}

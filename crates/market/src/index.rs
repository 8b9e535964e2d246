//! Domestic index quotes and latest ticker prices.

use crate::pipeline::MarketPipeline;
use crate::read::keyed;
use crate::schema::{index_prices, ticker_prices};
use market_core::{CacheKey, IndexQuote, KeyName, Query, Result};
use market_metrics::{index_by, percent_change_opt};
use std::collections::BTreeMap;
use tracing::instrument;

impl MarketPipeline {
    /// Latest close of every index with its change versus the previous session.
    #[instrument(skip(self))]
    pub async fn domestic_index(&self) -> Result<Vec<IndexQuote>> {
        use index_prices::{CLOSE, DATE, TICKER};

        self.cached(CacheKey::new(KeyName::DomesticIndex), || async {
            let table = self.config.tables.index_prices()?;
            let dates = self
                .calendar()
                .resolve(self.source.as_ref(), &table, DATE)
                .await?;
            let on = |date| Query::select(&table, &[TICKER, CLOSE]).on(DATE, date);
            let [latest, previous] = self.fetch([on(dates.latest), on(dates.previous)]).await?;

            let previous = index_by(keyed(&previous, TICKER, CLOSE)?, |r| r.0.clone());
            Ok(keyed(&latest, TICKER, CLOSE)?
                .into_iter()
                .filter_map(|(ticker, close)| {
                    let close = close?;
                    let (_, previous_close) = previous.get(&ticker)?;
                    let previous_close = (*previous_close)?;
                    Some(IndexQuote {
                        ticker,
                        date: dates.latest,
                        close_price: close,
                        change_price: close - previous_close,
                        percent_d: percent_change_opt(Some(close), Some(previous_close)),
                    })
                })
                .collect())
        })
        .await
    }

    /// Latest close of every ticker, keyed by ticker code.
    ///
    /// Used to attach prices to flow rankings; a ticker quoted twice keeps
    /// its first quote.
    #[instrument(skip(self))]
    pub async fn ticker_price(&self) -> Result<BTreeMap<String, f64>> {
        use ticker_prices::{CLOSE, DATE, TICKER};

        self.cached(CacheKey::new(KeyName::TickerPrice), || async {
            let table = self.config.tables.ticker_prices()?;
            let dates = self
                .calendar()
                .resolve(self.source.as_ref(), &table, DATE)
                .await?;
            let [latest] = self
                .fetch([Query::select(&table, &[TICKER, CLOSE]).on(DATE, dates.latest)])
                .await?;

            let mut prices = BTreeMap::new();
            for (ticker, close) in keyed(&latest, TICKER, CLOSE)? {
                if let Some(close) = close {
                    prices.entry(ticker.as_str().to_string()).or_insert(close);
                }
            }
            Ok(prices)
        })
        .await
    }

    /// Looks up `ticker` in a [`ticker_price`](Self::ticker_price) map, `0.0`
    /// when unknown.
    pub(crate) fn price_of(prices: &BTreeMap<String, f64>, ticker: &str) -> f64 {
        prices.get(ticker).copied().unwrap_or(0.0)
    }
}

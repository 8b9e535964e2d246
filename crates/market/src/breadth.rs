//! Advance/decline counts per industry.

use crate::pipeline::MarketPipeline;
use crate::read::{Company, company_rows, keyed};
use crate::schema::companies;
use crate::schema::ticker_prices::{CLOSE, DATE, MKT_CAP, REF, TICKER};
use market_core::{BreadthRow, CacheKey, KeyName, Query, Result, Ticker};
use market_metrics::{ChangeTriple, group_breadth, index_by, percent_change_opt, sum_by_key};
use polars::prelude::DataFrame;
use std::collections::HashMap;
use tracing::instrument;

/// Sums market capitalization per industry.
fn industry_caps(
    rows: &[(Ticker, Option<f64>)],
    listing: &HashMap<Ticker, Company>,
) -> HashMap<String, f64> {
    let listed = rows.iter().filter_map(|(ticker, cap)| {
        listing
            .get(ticker)
            .map(|company| (company.industry.as_str(), cap.unwrap_or(0.0)))
    });
    sum_by_key(listed, |(industry, _)| (*industry).to_string(), |(_, cap)| *cap)
        .into_iter()
        .collect()
}

fn caps(df: &DataFrame) -> Result<Vec<(Ticker, Option<f64>)>> {
    keyed(df, TICKER, MKT_CAP)
}

impl MarketPipeline {
    /// Advance/decline counts per industry with industry market-cap changes.
    ///
    /// Each ticker's latest close is classified against its reference price
    /// of the previous session using the configured band. Tickers without a
    /// previous session are left out.
    #[instrument(skip(self))]
    pub async fn market_breadth(&self) -> Result<Vec<BreadthRow>> {
        self.cached(CacheKey::new(KeyName::MarketBreadth), || async {
            let table = self.config.tables.ticker_prices()?;
            let company_table = self.config.tables.companies()?;
            let dates = self
                .calendar()
                .resolve(self.source.as_ref(), &table, DATE)
                .await?;
            let [latest, previous, week, month, listing] = self
                .fetch([
                    Query::select(&table, &[TICKER, CLOSE, MKT_CAP]).on(DATE, dates.latest),
                    Query::select(&table, &[TICKER, REF, MKT_CAP]).on(DATE, dates.previous),
                    Query::select(&table, &[TICKER, MKT_CAP]).on(DATE, dates.week),
                    Query::select(&table, &[TICKER, MKT_CAP]).on(DATE, dates.month),
                    Query::select(
                        &company_table,
                        &[companies::TICKER, companies::INDUSTRY, companies::EXCHANGE],
                    ),
                ])
                .await?;

            let listing = index_by(company_rows(&listing)?, |c| c.ticker.clone());
            let references = index_by(keyed(&previous, TICKER, REF)?, |r| r.0.clone());
            let band = self.config.price_band;

            let classified: Vec<(String, _)> = keyed(&latest, TICKER, CLOSE)?
                .into_iter()
                .filter_map(|(ticker, close)| {
                    let (_, reference) = references.get(&ticker)?;
                    let company = listing.get(&ticker)?;
                    let movement = match (*reference, close) {
                        (Some(reference), Some(close)) => band.classify(reference, close),
                        _ => None,
                    };
                    Some((company.industry.clone(), movement))
                })
                .collect();

            let latest_caps = industry_caps(&caps(&latest)?, &listing);
            let previous_caps = industry_caps(&caps(&previous)?, &listing);
            let week_caps = industry_caps(&caps(&week)?, &listing);
            let month_caps = industry_caps(&caps(&month)?, &listing);
            let changes: HashMap<String, ChangeTriple> = latest_caps
                .iter()
                .map(|(industry, cap)| {
                    let change = |other: &HashMap<String, f64>| {
                        percent_change_opt(Some(*cap), other.get(industry).copied())
                    };
                    let triple = ChangeTriple {
                        day: change(&previous_caps),
                        week: change(&week_caps),
                        month: change(&month_caps),
                    };
                    (industry.clone(), triple)
                })
                .collect();

            Ok(group_breadth(classified, &changes))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_industry_caps_skip_unlisted_tickers() {
        let listing = index_by(
            vec![
                Company {
                    ticker: Ticker::new("AAA"),
                    industry: "Banks".into(),
                    exchange: "HOSE".into(),
                },
                Company {
                    ticker: Ticker::new("BBB"),
                    industry: "Banks".into(),
                    exchange: "HNX".into(),
                },
            ],
            |c| c.ticker.clone(),
        );
        let rows = vec![
            (Ticker::new("AAA"), Some(10.0)),
            (Ticker::new("BBB"), Some(5.0)),
            (Ticker::new("ZZZ"), Some(100.0)),
        ];
        let sums = industry_caps(&rows, &listing);
        assert_eq!(sums.len(), 1);
        assert_eq!(sums["Banks"], 15.0);
    }
}

//! Per-ticker liquidity and exchange traded value.

use crate::pipeline::MarketPipeline;
use crate::read::{company_rows, keyed};
use crate::schema::companies;
use crate::schema::ticker_prices::{DATE, TICKER, TOTAL_VALUE};
use market_core::{CacheKey, KeyName, LiquidityRow, Query, RankOrder, Result};
use market_metrics::{contribution_or_zero, index_by, percent_change_opt, rank, sum_by_key};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

impl MarketPipeline {
    /// Total traded value per exchange on the latest session.
    #[instrument(skip(self))]
    pub async fn exchange_volume(&self) -> Result<BTreeMap<String, f64>> {
        self.cached(CacheKey::new(KeyName::ExchangeVolume), || async {
            let table = self.config.tables.ticker_prices()?;
            let company_table = self.config.tables.companies()?;
            let dates = self
                .calendar()
                .resolve(self.source.as_ref(), &table, DATE)
                .await?;
            let [latest, listing] = self
                .fetch([
                    Query::select(&table, &[TICKER, TOTAL_VALUE]).on(DATE, dates.latest),
                    Query::select(
                        &company_table,
                        &[companies::TICKER, companies::INDUSTRY, companies::EXCHANGE],
                    ),
                ])
                .await?;

            let listing = index_by(company_rows(&listing)?, |c| c.ticker.clone());
            let traded = keyed(&latest, TICKER, TOTAL_VALUE)?
                .into_iter()
                .filter_map(|(ticker, value)| {
                    let company = listing.get(&ticker)?;
                    Some((company.exchange.clone(), value.unwrap_or(0.0)))
                });
            let totals: BTreeMap<String, f64> =
                sum_by_key(traded, |(exchange, _)| exchange.clone(), |(_, value)| *value)
                    .into_iter()
                    .collect();
            debug!(exchanges = totals.len(), "Summed exchange volume");
            Ok(totals)
        })
        .await
    }

    /// Traded value of every ticker with its change versus the previous
    /// session and its share of its exchange's total, ranked by `order`.
    ///
    /// Only tickers traded on both sessions and listed in the company table
    /// are returned.
    #[instrument(skip(self))]
    pub async fn market_liquidity(&self, order: RankOrder) -> Result<Vec<LiquidityRow>> {
        let key = CacheKey::new(KeyName::MarketLiquidity).with(order);
        self.cached(key, || async {
            let table = self.config.tables.ticker_prices()?;
            let company_table = self.config.tables.companies()?;
            let dates = self
                .calendar()
                .resolve(self.source.as_ref(), &table, DATE)
                .await?;
            let totals = self.exchange_volume().await?;

            let on = |date| Query::select(&table, &[TICKER, TOTAL_VALUE]).on(DATE, date);
            let [latest, previous, listing] = self
                .fetch([
                    on(dates.latest),
                    on(dates.previous),
                    Query::select(
                        &company_table,
                        &[companies::TICKER, companies::INDUSTRY, companies::EXCHANGE],
                    ),
                ])
                .await?;

            let previous = index_by(keyed(&previous, TICKER, TOTAL_VALUE)?, |r| r.0.clone());
            let listing = index_by(company_rows(&listing)?, |c| c.ticker.clone());

            let mut rows: Vec<LiquidityRow> = keyed(&latest, TICKER, TOTAL_VALUE)?
                .into_iter()
                .filter_map(|(ticker, value)| {
                    let (_, previous_value) = previous.get(&ticker)?;
                    let company = listing.get(&ticker)?;
                    let value = value.unwrap_or(0.0);
                    let exchange_total = totals.get(&company.exchange).copied().unwrap_or(0.0);
                    Some(LiquidityRow {
                        industry: company.industry.clone(),
                        value,
                        value_change_percent: percent_change_opt(Some(value), *previous_value),
                        contribute: contribution_or_zero(value, exchange_total),
                        ticker,
                    })
                })
                .collect();
            rank(&mut rows, order);
            Ok(rows)
        })
        .await
    }
}

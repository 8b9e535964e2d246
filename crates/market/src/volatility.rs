//! Index price changes across the reference dates.

use crate::pipeline::MarketPipeline;
use crate::read::keyed;
use crate::schema::index_prices::{CLOSE, DATE, TICKER};
use market_core::{CacheKey, KeyName, PriceChange, Query, Result};
use market_metrics::{index_by, percent_change_opt};
use tracing::instrument;

impl MarketPipeline {
    /// Day, week, month and year price changes of every index.
    ///
    /// Indexes quoted on the latest session but not on the previous one are
    /// left out. A missing week, month or year quote only blanks that change.
    #[instrument(skip(self))]
    pub async fn market_volatility(&self) -> Result<Vec<PriceChange>> {
        self.cached(CacheKey::new(KeyName::MarketVolatility), || async {
            let table = self.config.tables.index_prices()?;
            let dates = self
                .calendar()
                .resolve(self.source.as_ref(), &table, DATE)
                .await?;
            let on = |date| Query::select(&table, &[TICKER, CLOSE]).on(DATE, date);

            let [latest, previous, week, month, year] = self
                .fetch([
                    on(dates.latest),
                    on(dates.previous),
                    on(dates.week),
                    on(dates.month),
                    on(dates.year),
                ])
                .await?;

            let previous = index_by(keyed(&previous, TICKER, CLOSE)?, |r| r.0.clone());
            let week = index_by(keyed(&week, TICKER, CLOSE)?, |r| r.0.clone());
            let month = index_by(keyed(&month, TICKER, CLOSE)?, |r| r.0.clone());
            let year = index_by(keyed(&year, TICKER, CLOSE)?, |r| r.0.clone());

            Ok(keyed(&latest, TICKER, CLOSE)?
                .into_iter()
                .filter_map(|(ticker, close)| {
                    let (_, previous_close) = previous.get(&ticker)?;
                    let change = |base: Option<&(_, Option<f64>)>| {
                        percent_change_opt(close, base.and_then(|(_, price)| *price))
                    };
                    Some(PriceChange {
                        day_change_percent: percent_change_opt(close, *previous_close),
                        week_change_percent: change(week.get(&ticker)),
                        month_change_percent: change(month.get(&ticker)),
                        year_change_percent: change(year.get(&ticker)),
                        ticker,
                    })
                })
                .collect())
        })
        .await
    }
}

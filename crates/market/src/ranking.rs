//! Top/bottom rankings: foreign net buying, rate of change and money flow.

use crate::pipeline::MarketPipeline;
use crate::read::{company_rows, keyed, keyed_many};
use crate::schema::{companies, foreign_net, roc, ticker_prices};
use market_core::{
    CacheKey, CashFlowRow, Exchange, KeyName, NetForeignRow, Query, RankedValue, Result,
    TimeWindow, TradeSide,
};
use market_metrics::{
    index_by, money_flow, percent_change_opt, sum_by_key, top_and_bottom, top_and_bottom_desc,
};
use tracing::{debug, instrument};

impl MarketPipeline {
    /// Strongest foreign net buyers followed by the strongest net sellers on
    /// the latest session.
    #[instrument(skip(self))]
    pub async fn top_net_foreign(&self) -> Result<Vec<RankedValue>> {
        use foreign_net::{DATE, NET_VALUE, TICKER};

        self.cached(CacheKey::new(KeyName::TopNetForeign), || async {
            let table = self.config.tables.foreign_net()?;
            let dates = self
                .calendar()
                .resolve(self.source.as_ref(), &table, DATE)
                .await?;
            let [latest] = self
                .fetch([Query::select(&table, &[TICKER, NET_VALUE]).on(DATE, dates.latest)])
                .await?;

            let rows: Vec<RankedValue> = keyed(&latest, TICKER, NET_VALUE)?
                .into_iter()
                .filter_map(|(ticker, value)| Some(RankedValue { ticker, value: value? }))
                .collect();
            Ok(top_and_bottom_desc(rows, self.config.top_k, |r| r.value))
        })
        .await
    }

    /// Foreign bought or sold value of every `exchange`-listed ticker on the
    /// latest session, with its industry. Rows keep source order.
    #[instrument(skip(self))]
    pub async fn net_foreign(
        &self,
        exchange: Exchange,
        side: TradeSide,
    ) -> Result<Vec<NetForeignRow>> {
        use foreign_net::{BUY_VALUE, DATE, SELL_VALUE, TICKER};

        let key = CacheKey::new(KeyName::NetForeign).with(exchange).with(side);
        self.cached(key, || async {
            let table = self.config.tables.foreign_net()?;
            let company_table = self.config.tables.companies()?;
            let value = match side {
                TradeSide::Buy => BUY_VALUE,
                TradeSide::Sell => SELL_VALUE,
            };
            let dates = self
                .calendar()
                .resolve(self.source.as_ref(), &table, DATE)
                .await?;
            let [latest, listing] = self
                .fetch([
                    Query::select(&table, &[TICKER, value]).on(DATE, dates.latest),
                    Query::select(
                        &company_table,
                        &[companies::TICKER, companies::INDUSTRY, companies::EXCHANGE],
                    ),
                ])
                .await?;

            let listing = index_by(
                company_rows(&listing)?
                    .into_iter()
                    .filter(|c| Exchange::parse(&c.exchange) == Some(exchange)),
                |c| c.ticker.clone(),
            );
            let rows: Vec<NetForeignRow> = keyed(&latest, TICKER, value)?
                .into_iter()
                .filter_map(|(ticker, total)| {
                    let company = listing.get(&ticker)?;
                    Some(NetForeignRow {
                        exchange: company.exchange.clone(),
                        industry: company.industry.clone(),
                        total_value: total.unwrap_or(0.0),
                        ticker,
                    })
                })
                .collect();
            debug!(%exchange, %side, rows = rows.len(), "Joined foreign trades to listing");
            Ok(rows)
        })
        .await
    }

    /// Highest and lowest rate of change between the week session and the
    /// latest session of `exchange`.
    #[instrument(skip(self))]
    pub async fn top_roc(&self, exchange: Exchange) -> Result<Vec<RankedValue>> {
        use roc::{DATE, PRICE, TICKER};

        let key = CacheKey::new(KeyName::TopRoc5).with(exchange);
        self.cached(key, || async {
            let table = self.config.tables.roc(exchange)?;
            let dates = self
                .calendar()
                .resolve(self.source.as_ref(), &table, DATE)
                .await?;
            let on = |date| Query::select(&table, &[TICKER, PRICE]).on(DATE, date);
            let [latest, week] = self.fetch([on(dates.latest), on(dates.week)]).await?;

            let week = index_by(keyed(&week, TICKER, PRICE)?, |r| r.0.clone());
            let rows: Vec<RankedValue> = keyed(&latest, TICKER, PRICE)?
                .into_iter()
                .filter_map(|(ticker, price)| {
                    let (_, base) = week.get(&ticker)?;
                    let value = percent_change_opt(price, *base)?;
                    Some(RankedValue { ticker, value })
                })
                .collect();
            Ok(top_and_bottom_desc(rows, self.config.top_k, |r| r.value))
        })
        .await
    }

    /// Money flow summed per ticker over `window`, highest and lowest first.
    ///
    /// Each session contributes `volume * (close + high + low) / 3`; missing
    /// inputs count as zero.
    #[instrument(skip(self))]
    pub async fn cash_flow_value(&self, window: TimeWindow) -> Result<Vec<CashFlowRow>> {
        use ticker_prices::{CLOSE, DATE, HIGH, LOW, OM_VALUE, TICKER};

        let key = CacheKey::new(KeyName::CashFlowValue).with(window);
        self.cached(key, || async {
            let table = self.config.tables.ticker_prices()?;
            let dates = self
                .calendar()
                .resolve(self.source.as_ref(), &table, DATE)
                .await?;
            let prices = self.ticker_price().await?;
            let start = dates.window_start(window);
            let [sessions] = self
                .fetch([Query::select(&table, &[TICKER, OM_VALUE, CLOSE, HIGH, LOW])
                    .between(DATE, start, dates.latest)])
                .await?;

            let flows = keyed_many(&sessions, TICKER, [OM_VALUE, CLOSE, HIGH, LOW])?;
            debug!(%start, latest = %dates.latest, rows = flows.len(), "Summing money flow");
            let rows: Vec<CashFlowRow> = sum_by_key(
                flows,
                |(ticker, _)| ticker.clone(),
                |(_, [volume, close, high, low])| {
                    money_flow(
                        volume.unwrap_or(0.0),
                        close.unwrap_or(0.0),
                        high.unwrap_or(0.0),
                        low.unwrap_or(0.0),
                    )
                },
            )
            .into_iter()
            .map(|(code, cash_flow_value)| CashFlowRow {
                price: Self::price_of(&prices, code.as_str()),
                code,
                cash_flow_value,
            })
            .collect();
            Ok(top_and_bottom(rows, self.config.top_k, |r| r.cash_flow_value))
        })
        .await
    }
}

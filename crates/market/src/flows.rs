//! Investor group trading, floor liquidity growth and net flows.

use crate::pipeline::MarketPipeline;
use crate::read::keyed_many;
use crate::schema::{index_prices, index_trades, net_flows, trades};
use chrono::Months;
use market_core::{
    CacheKey, Direction, Exchange, FloorTradeValue, FrameReader, InvestorFlowRow, InvestorKind,
    KeyName, LiquidityGrowthPoint, NetTransactionRow, Query, Result, TimeWindow,
};
use market_metrics::{percent_change_opt, top_n};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument};

impl MarketPipeline {
    /// Volumes and values bought and sold by `investor` per ticker over
    /// `window`, top buyers by volume first.
    ///
    /// Only stocks and ETFs count. Windows are measured in sessions of the
    /// foreign trades table: one week is the fifth most recent session and
    /// one month the oldest session within the calendar depth.
    #[instrument(skip(self))]
    pub async fn investor_transactions(
        &self,
        investor: InvestorKind,
        window: TimeWindow,
    ) -> Result<Vec<InvestorFlowRow>> {
        use trades::{BUY_VAL, BUY_VOL, CODE, DATE, SELL_VAL, SELL_VOL, TRADED_TYPES, TYPE};

        let key = CacheKey::new(KeyName::InvestorTransaction)
            .with(window)
            .with(investor);
        self.cached(key, || async {
            let calendar_table = self.config.tables.foreign_trades()?;
            let table = match investor {
                InvestorKind::Foreign => calendar_table.clone(),
                InvestorKind::Proprietary => self.config.tables.proprietary_trades()?,
            };
            let dates = self
                .session_calendar()
                .resolve(self.source.as_ref(), &calendar_table, DATE)
                .await?;
            let prices = self.ticker_price().await?;
            let [sessions] = self
                .fetch([Query::select(&table, &[CODE, BUY_VOL, SELL_VOL, BUY_VAL, SELL_VAL])
                    .between(DATE, dates.window_start(window), dates.latest)
                    .any_of(TYPE, TRADED_TYPES)])
                .await?;

            let mut rows: Vec<InvestorFlowRow> = Vec::new();
            let mut positions = HashMap::new();
            for (code, [buy_vol, sell_vol, buy_val, sell_val]) in
                keyed_many(&sessions, CODE, [BUY_VOL, SELL_VOL, BUY_VAL, SELL_VAL])?
            {
                let slot = *positions.entry(code.clone()).or_insert_with(|| {
                    rows.push(InvestorFlowRow {
                        price: Self::price_of(&prices, code.as_str()),
                        code,
                        ..InvestorFlowRow::default()
                    });
                    rows.len() - 1
                });
                let row = &mut rows[slot];
                row.buy_vol += buy_vol.unwrap_or(0.0);
                row.sell_vol += sell_vol.unwrap_or(0.0);
                row.buy_val += buy_val.unwrap_or(0.0);
                row.sell_val += sell_val.unwrap_or(0.0);
            }
            Ok(top_n(rows, self.config.investor_top, |r| r.buy_vol))
        })
        .await
    }

    /// The most recent traded-value rows of the three main floors, newest
    /// first, capped at the configured row count.
    #[instrument(skip(self))]
    pub async fn investor_transaction_values(&self) -> Result<Vec<FloorTradeValue>> {
        use index_trades::{CODE, DATE, TOTAL_VAL};

        self.cached(CacheKey::new(KeyName::InvestorTransactionValue), || async {
            let table = self.config.tables.index_trades()?;
            let floors = [Exchange::Hose, Exchange::Hnx, Exchange::Upcom].map(|e| e.index_code());
            let [recent] = self
                .fetch([Query::select(&table, &[CODE, DATE, TOTAL_VAL])
                    .any_of(CODE, floors)
                    .order_by(DATE, Direction::Desc)
                    .limit(self.config.floor_value_rows)])
                .await?;

            let reader = FrameReader::new(&recent);
            Ok(reader
                .text(CODE)?
                .into_iter()
                .zip(reader.date(DATE)?)
                .zip(reader.number(TOTAL_VAL)?)
                .filter_map(|((floor, date), total)| {
                    Some(FloorTradeValue {
                        floor: floor?,
                        date: date?,
                        total_val: total.unwrap_or(0.0),
                    })
                })
                .collect())
        })
        .await
    }

    /// Total traded value of every floor on each session of `window`,
    /// as a percent change versus the window's first session.
    ///
    /// [`TimeWindow::Latest`] compares the latest session with the previous
    /// one. Points are ordered by date, oldest first.
    #[instrument(skip(self))]
    pub async fn liquidity_growth(&self, window: TimeWindow) -> Result<Vec<LiquidityGrowthPoint>> {
        use index_trades::{CODE, DATE, TOTAL_VAL};

        let key = CacheKey::new(KeyName::LiquidityChangePerformance).with(window);
        self.cached(key, || async {
            let table = self.config.tables.index_trades()?;
            let dates = self
                .session_calendar()
                .resolve(self.source.as_ref(), &table, DATE)
                .await?;
            let start = match window {
                TimeWindow::Latest => dates.previous,
                other => dates.window_start(other),
            };
            let [sessions] = self
                .fetch([Query::select(&table, &[DATE, CODE, TOTAL_VAL])
                    .between(DATE, start, dates.latest)])
                .await?;

            let reader = FrameReader::new(&sessions);
            let points: Vec<_> = reader
                .date(DATE)?
                .into_iter()
                .zip(reader.text(CODE)?)
                .zip(reader.number(TOTAL_VAL)?)
                .filter_map(|((date, code), total)| Some((date?, code?, total)))
                .collect();

            let mut baselines: HashMap<&str, Option<f64>> = HashMap::new();
            for (date, code, total) in &points {
                if *date == start {
                    baselines.entry(code.as_str()).or_insert(*total);
                }
            }
            debug!(%start, floors = baselines.len(), "Collected liquidity baselines");

            let mut growth: Vec<LiquidityGrowthPoint> = points
                .iter()
                .filter(|(date, _, _)| *date > start)
                .filter_map(|(date, code, total)| {
                    let baseline = baselines.get(code.as_str())?;
                    Some(LiquidityGrowthPoint {
                        date: *date,
                        floor: code.clone(),
                        per_change: percent_change_opt(*total, *baseline),
                    })
                })
                .collect();
            growth.sort_by_key(|p| p.date);
            Ok(growth)
        })
        .await
    }

    /// Net trading of each investor group per session over the configured
    /// look-back, joined with the close of `exchange`'s index. Newest first.
    #[instrument(skip(self))]
    pub async fn net_transaction_value(&self, exchange: Exchange) -> Result<Vec<NetTransactionRow>> {
        let key = CacheKey::new(KeyName::NetTransactionValue).with(exchange);
        self.cached(key, || async {
            let prices_table = self.config.tables.index_prices()?;
            let flows_table = self.config.tables.net_flows()?;
            let today = self.clock.today();
            let from = today
                .checked_sub_months(Months::new(self.config.net_transaction_months))
                .unwrap_or(today);
            let index_code = exchange.index_code();

            let [closes, flows] = self
                .fetch([
                    Query::select(&prices_table, &[index_prices::DATE, index_prices::CLOSE])
                        .eq(index_prices::TICKER, index_code)
                        .between(index_prices::DATE, from, today),
                    Query::select(
                        &flows_table,
                        &[
                            net_flows::DATE,
                            net_flows::NET_PROPRIETARY,
                            net_flows::NET_RETAIL,
                            net_flows::NET_FOREIGN,
                        ],
                    )
                    .between(net_flows::DATE, from, today),
                ])
                .await?;

            let mut daily: BTreeMap<_, [f64; 3]> = BTreeMap::new();
            let reader = FrameReader::new(&flows);
            let proprietary = reader.number(net_flows::NET_PROPRIETARY)?;
            let retail = reader.number(net_flows::NET_RETAIL)?;
            let foreign = reader.number(net_flows::NET_FOREIGN)?;
            for (i, date) in reader.date(net_flows::DATE)?.into_iter().enumerate() {
                let Some(date) = date else { continue };
                let sums = daily.entry(date).or_default();
                for (sum, column) in sums.iter_mut().zip([&proprietary, &retail, &foreign]) {
                    *sum += column.get(i).copied().flatten().unwrap_or(0.0);
                }
            }

            let reader = FrameReader::new(&closes);
            let mut rows: Vec<NetTransactionRow> = reader
                .date(index_prices::DATE)?
                .into_iter()
                .zip(reader.number(index_prices::CLOSE)?)
                .filter_map(|(date, close)| {
                    let date = date?;
                    let [net_proprietary, net_retail, net_foreign] = *daily.get(&date)?;
                    Some(NetTransactionRow {
                        date,
                        exchange_price: close.unwrap_or(0.0),
                        exchange: index_code.to_string(),
                        net_proprietary,
                        net_retail,
                        net_foreign,
                    })
                })
                .collect();
            rows.sort_by(|a, b| b.date.cmp(&a.date));
            rows.dedup_by_key(|r| r.date);
            Ok(rows)
        })
        .await
    }
}

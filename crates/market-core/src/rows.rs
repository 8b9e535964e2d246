//! Result rows produced by the metric families.
//!
//! Every row is serde-serializable: the cache stores collections of them as
//! JSON and callers forward them unchanged.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::Ticker;

/// Price change of one index or ticker across the reference dates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceChange {
    /// Index or ticker code.
    pub ticker: Ticker,
    /// Change versus the previous session, in percent.
    pub day_change_percent: Option<f64>,
    /// Change versus the one-week reference session, in percent.
    pub week_change_percent: Option<f64>,
    /// Change versus the one-month reference session, in percent.
    pub month_change_percent: Option<f64>,
    /// Change versus the one-year reference session, in percent.
    pub year_change_percent: Option<f64>,
}

/// Traded value of one ticker and its share of its exchange.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LiquidityRow {
    /// Ticker code.
    pub ticker: Ticker,
    /// Industry the ticker belongs to.
    pub industry: String,
    /// Traded value on the latest session.
    pub value: f64,
    /// Change of traded value versus the previous session, in percent.
    pub value_change_percent: Option<f64>,
    /// Share of the exchange's total traded value, in percent.
    pub contribute: f64,
}

/// Advance/decline counts of one industry with its market-cap change.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BreadthRow {
    /// Industry name.
    pub industry: String,
    /// Tickers that closed at the reference price.
    pub equal: u32,
    /// Tickers that closed above the reference price, below the ceiling.
    pub increase: u32,
    /// Tickers that closed below the reference price, above the floor.
    pub decrease: u32,
    /// Tickers that closed at or above the ceiling.
    pub high: u32,
    /// Tickers that closed at or below the floor.
    pub low: u32,
    /// Industry market-cap change versus the previous session, in percent.
    pub day_change_percent: Option<f64>,
    /// Industry market-cap change versus the one-week session, in percent.
    pub week_change_percent: Option<f64>,
    /// Industry market-cap change versus the one-month session, in percent.
    pub month_change_percent: Option<f64>,
}

/// Latest quote of a domestic index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexQuote {
    /// Index code.
    pub ticker: Ticker,
    /// Session of the quote.
    pub date: NaiveDate,
    /// Closing level.
    pub close_price: f64,
    /// Absolute change versus the previous session.
    pub change_price: f64,
    /// Change versus the previous session, in percent.
    pub percent_d: Option<f64>,
}

/// A ticker with one ranked value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedValue {
    /// Ticker code.
    pub ticker: Ticker,
    /// The value the ranking is based on.
    pub value: f64,
}

/// Foreign bought or sold value of one listed ticker on the latest session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetForeignRow {
    /// Listing exchange code.
    pub exchange: String,
    /// Industry the ticker belongs to.
    pub industry: String,
    /// Ticker code.
    pub ticker: Ticker,
    /// Bought or sold value, per the requested side.
    pub total_value: f64,
}

/// Accumulated money flow of one ticker over a window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CashFlowRow {
    /// Ticker code.
    pub code: Ticker,
    /// Sum of per-session money flow.
    pub cash_flow_value: f64,
    /// Latest close, `0.0` when unknown.
    pub price: f64,
}

/// Summed trades of one investor group in one ticker over a window.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InvestorFlowRow {
    /// Ticker code.
    pub code: Ticker,
    /// Bought volume.
    pub buy_vol: f64,
    /// Sold volume.
    pub sell_vol: f64,
    /// Bought value.
    pub buy_val: f64,
    /// Sold value.
    pub sell_val: f64,
    /// Latest close, `0.0` when unknown.
    pub price: f64,
}

/// Liquidity change of one floor on one session versus the window start.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LiquidityGrowthPoint {
    /// Session date.
    pub date: NaiveDate,
    /// Floor (index) code.
    pub floor: String,
    /// Change of total traded value versus the window start, in percent.
    pub per_change: Option<f64>,
}

/// Net trading of each investor group on one session of one exchange.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetTransactionRow {
    /// Session date.
    pub date: NaiveDate,
    /// Exchange index close on that session.
    pub exchange_price: f64,
    /// Exchange index code.
    pub exchange: String,
    /// Net value traded by proprietary desks.
    pub net_proprietary: f64,
    /// Net value traded by retail investors.
    pub net_retail: f64,
    /// Net value traded by foreign investors.
    pub net_foreign: f64,
}

/// Total traded value of one floor on one session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FloorTradeValue {
    /// Floor (index) code.
    pub floor: String,
    /// Session date.
    pub date: NaiveDate,
    /// Total traded value.
    pub total_val: f64,
}

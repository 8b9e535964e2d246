//! Column names of the tables the pipeline reads.
//!
//! Table names are configurable through [`MarketTables`](crate::MarketTables);
//! column names are fixed.

/// Daily index closes.
pub mod index_prices {
    /// Session date.
    pub const DATE: &str = "date_time";
    /// Index code (`VNINDEX`, `HNXINDEX`, ...).
    pub const TICKER: &str = "ticker";
    /// Closing level.
    pub const CLOSE: &str = "close_price";
}

/// Daily ticker quotes and traded values.
pub mod ticker_prices {
    /// Session date.
    pub const DATE: &str = "date_time";
    /// Ticker code.
    pub const TICKER: &str = "ticker";
    /// Closing price.
    pub const CLOSE: &str = "close_price";
    /// Reference price of the session.
    pub const REF: &str = "ref_price";
    /// Session high.
    pub const HIGH: &str = "high";
    /// Session low.
    pub const LOW: &str = "low";
    /// Traded value.
    pub const TOTAL_VALUE: &str = "total_value";
    /// Order-matched volume.
    pub const OM_VALUE: &str = "om_value";
    /// Market capitalization.
    pub const MKT_CAP: &str = "mkt_cap";
}

/// Company reference data.
pub mod companies {
    /// Ticker code.
    pub const TICKER: &str = "ticker";
    /// Industry name.
    pub const INDUSTRY: &str = "industry";
    /// Listing exchange code.
    pub const EXCHANGE: &str = "exchange";
}

/// Daily foreign net trading per ticker.
pub mod foreign_net {
    /// Session date.
    pub const DATE: &str = "date_time";
    /// Ticker code.
    pub const TICKER: &str = "ticker";
    /// Foreign net value.
    pub const NET_VALUE: &str = "net_value_foreign";
    /// Foreign bought value.
    pub const BUY_VALUE: &str = "total_value_buy";
    /// Foreign sold value.
    pub const SELL_VALUE: &str = "total_value_sell";
}

/// Per-exchange price history used for rate of change.
pub mod roc {
    /// Session date.
    pub const DATE: &str = "date";
    /// Ticker code.
    pub const TICKER: &str = "ticker";
    /// Price.
    pub const PRICE: &str = "price";
}

/// Investor group trades (foreign and proprietary tables share this layout).
pub mod trades {
    /// Session date.
    pub const DATE: &str = "date";
    /// Ticker code.
    pub const CODE: &str = "code";
    /// Bought volume.
    pub const BUY_VOL: &str = "buy_vol";
    /// Sold volume.
    pub const SELL_VOL: &str = "sell_vol";
    /// Bought value.
    pub const BUY_VAL: &str = "buy_val";
    /// Sold value.
    pub const SELL_VAL: &str = "sell_val";
    /// Security type (`STOCK`, `ETF`, ...).
    pub const TYPE: &str = "type";
    /// Security types included in investor flows.
    pub const TRADED_TYPES: [&str; 2] = ["STOCK", "ETF"];
}

/// Daily traded value per floor.
pub mod index_trades {
    /// Session date.
    pub const DATE: &str = "date";
    /// Floor (index) code.
    pub const CODE: &str = "code";
    /// Total traded value.
    pub const TOTAL_VAL: &str = "total_val";
}

/// Daily net trading per investor group.
pub mod net_flows {
    /// Session date.
    pub const DATE: &str = "date_time";
    /// Net value of proprietary desks.
    pub const NET_PROPRIETARY: &str = "net_proprietary";
    /// Net value of retail investors.
    pub const NET_RETAIL: &str = "net_retail";
    /// Net value of foreign investors.
    pub const NET_FOREIGN: &str = "net_foreign";
}

//! End-to-end tests of the metric families against in-memory tables.

use chrono::NaiveDate;
use market::{
    BroadcastPublisher, CacheKey, CacheStore, Exchange, FixedClock, InMemoryStore, InvestorKind,
    KeyName, MarketError, MarketPipeline, MemorySource, PipelineConfig, RankOrder, TableRef,
    TabularSource, TimeWindow, TradeSide, date_column,
};
use polars::prelude::{Column, DataFrame};
use std::sync::Arc;
use std::time::Duration;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn today() -> NaiveDate {
    d(2024, 3, 15)
}

fn table(name: &str) -> TableRef {
    TableRef::parse(name).unwrap()
}

fn dates(name: &str, values: &[NaiveDate]) -> Column {
    date_column(name, values).unwrap()
}

fn text(name: &str, values: &[&str]) -> Column {
    Column::new(name.into(), values.to_vec())
}

fn num(name: &str, values: &[f64]) -> Column {
    Column::new(name.into(), values.to_vec())
}

fn frame(columns: Vec<Column>) -> DataFrame {
    DataFrame::new(columns).unwrap()
}

fn approx(actual: Option<f64>, expected: f64) -> bool {
    actual.is_some_and(|v| (v - expected).abs() < 1e-9)
}

/// Two sessions of index closes: A and B on the latest, only A before it.
fn index_prices() -> DataFrame {
    frame(vec![
        dates("date_time", &[d(2024, 3, 15), d(2024, 3, 15), d(2024, 3, 14)]),
        text("ticker", &["A", "B", "A"]),
        num("close_price", &[100.0, 50.0, 90.0]),
    ])
}

fn ticker_prices() -> DataFrame {
    let latest = d(2024, 3, 15);
    let previous = d(2024, 3, 14);
    frame(vec![
        dates(
            "date_time",
            &[latest, latest, latest, latest, previous, previous, previous],
        ),
        text("ticker", &["AAA", "BBB", "CCC", "DDD", "AAA", "BBB", "DDD"]),
        num("close_price", &[107.0, 100.0, 50.0, 95.0, 100.0, 100.0, 100.0]),
        num("ref_price", &[100.0, 100.0, 50.0, 100.0, 100.0, 100.0, 98.0]),
        num("high", &[108.0, 101.0, 51.0, 100.0, 101.0, 100.0, 101.0]),
        num("low", &[100.0, 99.0, 49.0, 94.0, 99.0, 100.0, 99.0]),
        num("total_value", &[300.0, 100.0, 50.0, 40.0, 150.0, 200.0, 80.0]),
        num("om_value", &[10.0, 20.0, 5.0, 4.0, 10.0, 20.0, 8.0]),
        num("mkt_cap", &[1200.0, 1000.0, 500.0, 400.0, 1000.0, 1000.0, 500.0]),
    ])
}

fn companies() -> DataFrame {
    frame(vec![
        text("ticker", &["AAA", "BBB", "CCC", "DDD"]),
        text("industry", &["Banks", "Banks", "Steel", "Steel"]),
        text("exchange", &["HOSE", "HOSE", "HNX", "hnx"]),
    ])
}

/// Six sessions, newest first.
fn sessions() -> Vec<NaiveDate> {
    vec![
        d(2024, 3, 15),
        d(2024, 3, 14),
        d(2024, 3, 13),
        d(2024, 3, 12),
        d(2024, 3, 11),
        d(2024, 3, 8),
    ]
}

fn market_source() -> MemorySource {
    MemorySource::new()
        .with_table(&table("index_prices"), index_prices())
        .with_table(&table("ticker_prices"), ticker_prices())
        .with_table(&table("companies"), companies())
}

fn pipeline_with(source: Arc<dyn TabularSource>, store: Arc<dyn CacheStore>) -> MarketPipeline {
    MarketPipeline::new(source, store).with_clock(Arc::new(FixedClock(today())))
}

fn pipeline(source: MemorySource) -> MarketPipeline {
    pipeline_with(Arc::new(source), Arc::new(InMemoryStore::new()))
}

#[tokio::test]
async fn test_volatility_drops_indexes_without_previous_session() {
    let rows = pipeline(market_source()).market_volatility().await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].ticker.as_str(), "A");
    assert!(approx(rows[0].day_change_percent, 100.0 / 9.0));
    // Only two sessions exist, so every look-back lands on the previous one.
    assert!(approx(rows[0].week_change_percent, 100.0 / 9.0));
}

#[tokio::test]
async fn test_cache_hit_skips_the_source() {
    let source = Arc::new(market_source());
    let pipeline = pipeline_with(source.clone(), Arc::new(InMemoryStore::new()));

    let first = pipeline.market_volatility().await.unwrap();
    let queries = source.query_count();
    assert!(queries > 0);

    let second = pipeline.market_volatility().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(source.query_count(), queries);
}

#[tokio::test(start_paused = true)]
async fn test_minute_entries_expire() {
    let source = Arc::new(market_source());
    let pipeline = pipeline_with(source.clone(), Arc::new(InMemoryStore::new()));

    pipeline.market_volatility().await.unwrap();
    let queries = source.query_count();

    tokio::time::advance(Duration::from_secs(61)).await;
    pipeline.market_volatility().await.unwrap();
    assert_eq!(source.query_count(), queries * 2);
}

#[tokio::test]
async fn test_failures_are_not_cached() {
    let source = Arc::new(market_source().with_failure(&table("index_prices")));
    let store = Arc::new(InMemoryStore::new());
    let pipeline = pipeline_with(source.clone(), store.clone());

    let result = pipeline.market_volatility().await;
    assert!(matches!(result, Err(MarketError::DataSource(_))));
    assert!(store.is_empty().await);

    source.set_failure(&table("index_prices"), false).await;
    assert_eq!(pipeline.market_volatility().await.unwrap().len(), 1);
    assert!(!store.is_empty().await);
}

#[tokio::test]
async fn test_empty_table_yields_empty_result() {
    let empty = frame(vec![
        dates("date_time", &[]),
        text("ticker", &[]),
        num("close_price", &[]),
    ]);
    let source = MemorySource::new().with_table(&table("index_prices"), empty);
    let pipeline = pipeline(source);

    assert!(pipeline.market_volatility().await.unwrap().is_empty());
    assert!(pipeline.domestic_index().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_domestic_index() {
    let quotes = pipeline(market_source()).domestic_index().await.unwrap();

    assert_eq!(quotes.len(), 1);
    assert_eq!(quotes[0].ticker.as_str(), "A");
    assert_eq!(quotes[0].date, today());
    assert_eq!(quotes[0].close_price, 100.0);
    assert_eq!(quotes[0].change_price, 10.0);
    assert!(approx(quotes[0].percent_d, 100.0 / 9.0));
}

#[tokio::test]
async fn test_exchange_volume_and_liquidity() {
    let pipeline = pipeline(market_source());

    let volumes = pipeline.exchange_volume().await.unwrap();
    assert_eq!(volumes.get("HOSE"), Some(&400.0));
    assert_eq!(volumes.get("HNX"), Some(&90.0));

    let rows = pipeline.market_liquidity(RankOrder::Unsorted).await.unwrap();
    let tickers: Vec<&str> = rows.iter().map(|r| r.ticker.as_str()).collect();
    assert_eq!(tickers, ["AAA", "BBB", "DDD"]);
    assert_eq!(rows[0].industry, "Banks");
    assert_eq!(rows[0].value, 300.0);
    assert!(approx(rows[0].value_change_percent, 100.0));
    assert_eq!(rows[0].contribute, 75.0);
    assert!(approx(rows[1].value_change_percent, -50.0));
    assert!(approx(Some(rows[2].contribute), 40.0 / 90.0 * 100.0));
}

#[tokio::test]
async fn test_liquidity_orders_are_cached_separately() {
    let pipeline = pipeline(market_source());

    let by_contribution = pipeline
        .market_liquidity(RankOrder::ContributionDesc)
        .await
        .unwrap();
    let tickers: Vec<&str> = by_contribution.iter().map(|r| r.ticker.as_str()).collect();
    assert_eq!(tickers, ["AAA", "DDD", "BBB"]);

    let by_change = pipeline.market_liquidity(RankOrder::ChangeAsc).await.unwrap();
    let tickers: Vec<&str> = by_change.iter().map(|r| r.ticker.as_str()).collect();
    assert_eq!(tickers, ["BBB", "DDD", "AAA"]);

    let key = CacheKey::new(KeyName::MarketLiquidity).with(RankOrder::ContributionDesc);
    assert!(pipeline.cache().store().get(key.as_str()).await.unwrap().is_some());
}

#[tokio::test]
async fn test_market_breadth() {
    let rows = pipeline(market_source()).market_breadth().await.unwrap();

    assert_eq!(rows.len(), 2);
    let banks = &rows[0];
    assert_eq!(banks.industry, "Banks");
    assert_eq!((banks.equal, banks.high, banks.increase), (1, 1, 0));
    assert!(approx(banks.day_change_percent, 10.0));

    let steel = &rows[1];
    assert_eq!(steel.industry, "Steel");
    // CCC has no previous session and is not classified.
    assert_eq!(steel.decrease + steel.equal + steel.increase + steel.high + steel.low, 1);
    assert_eq!(steel.decrease, 1);
    assert!(approx(steel.day_change_percent, 80.0));
}

#[tokio::test]
async fn test_ticker_price_and_cash_flow() {
    let pipeline = pipeline(market_source())
        .with_config(PipelineConfig::default().with_top_k(2));

    let prices = pipeline.ticker_price().await.unwrap();
    assert_eq!(prices.len(), 4);
    assert_eq!(prices["AAA"], 107.0);

    let rows = pipeline.cash_flow_value(TimeWindow::Latest).await.unwrap();
    let codes: Vec<&str> = rows.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, ["BBB", "AAA", "CCC", "DDD"]);
    assert_eq!(rows[0].cash_flow_value, 2000.0);
    assert_eq!(rows[0].price, 100.0);
    assert_eq!(rows[1].cash_flow_value, 1050.0);
}

#[tokio::test]
async fn test_top_net_foreign() {
    let latest = today();
    let foreign = frame(vec![
        dates("date_time", &[latest, latest, latest, latest, latest, d(2024, 3, 14)]),
        text("ticker", &["A", "B", "C", "D", "E", "F"]),
        num("net_value_foreign", &[5.0, -3.0, 10.0, 0.0, -8.0, 99.0]),
    ]);
    let source = MemorySource::new().with_table(&table("foreign_net"), foreign);
    let pipeline = pipeline(source).with_config(PipelineConfig::default().with_top_k(2));

    let rows = pipeline.top_net_foreign().await.unwrap();
    let tickers: Vec<&str> = rows.iter().map(|r| r.ticker.as_str()).collect();
    assert_eq!(tickers, ["C", "A", "B", "E"]);
}

#[tokio::test]
async fn test_net_foreign_sides_and_exchanges_cache_separately() {
    let (latest, previous) = (today(), d(2024, 3, 14));
    let foreign = frame(vec![
        dates("date_time", &[latest, latest, latest, latest, latest, previous]),
        text("ticker", &["BBB", "AAA", "CCC", "ZZZ", "DDD", "AAA"]),
        num("total_value_buy", &[20.0, 10.0, 30.0, 99.0, 4.0, 1.0]),
        num("total_value_sell", &[2.0, 1.0, 3.0, 9.0, 0.4, 1.0]),
    ]);
    let store = Arc::new(InMemoryStore::new());
    let source = market_source().with_table(&table("foreign_net"), foreign);
    let pipeline = pipeline_with(Arc::new(source), store.clone());

    let bought = pipeline.net_foreign(Exchange::Hose, TradeSide::Buy).await.unwrap();
    let tickers: Vec<&str> = bought.iter().map(|r| r.ticker.as_str()).collect();
    assert_eq!(tickers, ["BBB", "AAA"]);
    assert_eq!(bought[0].total_value, 20.0);
    assert_eq!(bought[0].industry, "Banks");
    assert_eq!(bought[0].exchange, "HOSE");

    let sold = pipeline.net_foreign(Exchange::Hose, TradeSide::Sell).await.unwrap();
    assert_eq!(sold[0].total_value, 2.0);
    assert_ne!(bought, sold);

    // Lower-case listings still belong to their exchange.
    let hnx = pipeline.net_foreign(Exchange::Hnx, TradeSide::Buy).await.unwrap();
    let tickers: Vec<&str> = hnx.iter().map(|r| r.ticker.as_str()).collect();
    assert_eq!(tickers, ["CCC", "DDD"]);
    assert_eq!(hnx[1].exchange, "HNX");

    for key in ["net-foreign:HOSE:0", "net-foreign:HOSE:1", "net-foreign:HNX:0"] {
        assert!(store.get(key).await.unwrap().is_some(), "missing {key}");
    }
}

#[tokio::test]
async fn test_investor_transaction_values_newest_first() {
    let s = sessions();
    let index_trades = frame(vec![
        dates("date", &[s[2], s[0], s[1], s[0], s[0], s[1]]),
        text("code", &["VNINDEX", "VNINDEX", "HNXINDEX", "HNXINDEX", "VN30", "UPINDEX"]),
        num("total_val", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
    ]);
    let source = MemorySource::new().with_table(&table("index_trades"), index_trades);
    let mut config = PipelineConfig::default();
    config.floor_value_rows = 4;
    let pipeline = pipeline(source).with_config(config);

    let rows = pipeline.investor_transaction_values().await.unwrap();
    let floors: Vec<(&str, NaiveDate)> = rows.iter().map(|r| (r.floor.as_str(), r.date)).collect();
    assert_eq!(
        floors,
        [("VNINDEX", s[0]), ("HNXINDEX", s[0]), ("HNXINDEX", s[1]), ("UPINDEX", s[1])]
    );
    assert_eq!(rows[1].total_val, 4.0);
}

#[tokio::test]
async fn test_top_roc_per_exchange() {
    let (latest, week) = (today(), d(2024, 3, 8));
    let roc = frame(vec![
        dates("date", &[latest, latest, latest, week, week]),
        text("ticker", &["X", "Y", "Z", "X", "Y"]),
        num("price", &[110.0, 90.0, 100.0, 100.0, 100.0]),
    ]);
    let source = MemorySource::new().with_table(&table("roc_hnx"), roc);
    let pipeline = pipeline(source).with_config(PipelineConfig::default().with_top_k(1));

    let rows = pipeline.top_roc(Exchange::Hnx).await.unwrap();
    let tickers: Vec<&str> = rows.iter().map(|r| r.ticker.as_str()).collect();
    assert_eq!(tickers, ["X", "Y"]);
    assert!(approx(Some(rows[0].value), 10.0));

    // HOSE reads its own table, which this source does not have.
    assert!(pipeline.top_roc(Exchange::Hose).await.is_err());
}

fn trades(rows: &[(NaiveDate, &str, f64, &str)]) -> DataFrame {
    let days: Vec<NaiveDate> = rows.iter().map(|r| r.0).collect();
    let codes: Vec<&str> = rows.iter().map(|r| r.1).collect();
    let buys: Vec<f64> = rows.iter().map(|r| r.2).collect();
    let sells: Vec<f64> = rows.iter().map(|r| r.2 / 2.0).collect();
    let kinds: Vec<&str> = rows.iter().map(|r| r.3).collect();
    frame(vec![
        dates("date", &days),
        text("code", &codes),
        num("buy_vol", &buys),
        num("sell_vol", &sells),
        num("buy_val", &buys),
        num("sell_val", &sells),
        text("type", &kinds),
    ])
}

#[tokio::test]
async fn test_investor_transactions() {
    let s = sessions();
    let foreign = trades(&[
        (s[0], "AAA", 10.0, "STOCK"),
        (s[1], "BBB", 20.0, "ETF"),
        (s[2], "CCC", 50.0, "BOND"),
        (s[3], "DDD", 1.0, "STOCK"),
        (s[4], "AAA", 5.0, "STOCK"),
        (s[5], "AAA", 100.0, "STOCK"),
    ]);
    let proprietary = trades(&[(s[0], "BBB", 7.0, "STOCK")]);
    let source = market_source()
        .with_table(&table("foreign_trades"), foreign)
        .with_table(&table("proprietary_trades"), proprietary);
    let pipeline = pipeline(source);

    let latest = pipeline
        .investor_transactions(InvestorKind::Foreign, TimeWindow::Latest)
        .await
        .unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].code.as_str(), "AAA");
    assert_eq!(latest[0].buy_vol, 10.0);

    // The week session is the fifth most recent one, 2024-03-11.
    let week = pipeline
        .investor_transactions(InvestorKind::Foreign, TimeWindow::OneWeek)
        .await
        .unwrap();
    let codes: Vec<&str> = week.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, ["BBB", "AAA", "DDD"]);
    assert_eq!(week[1].buy_vol, 15.0);
    assert_eq!(week[1].sell_vol, 7.5);
    assert_eq!(week[1].price, 107.0);

    let desks = pipeline
        .investor_transactions(InvestorKind::Proprietary, TimeWindow::Latest)
        .await
        .unwrap();
    assert_eq!(desks.len(), 1);
    assert_eq!(desks[0].code.as_str(), "BBB");
    assert_eq!(desks[0].price, 100.0);
}

#[tokio::test]
async fn test_liquidity_growth() {
    let s = sessions();
    let index_trades = frame(vec![
        dates(
            "date",
            &[s[4], s[4], s[3], s[3], s[2], s[1], s[0], s[0], s[5]],
        ),
        text(
            "code",
            &[
                "VNINDEX", "HNXINDEX", "VNINDEX", "UPINDEX", "OTHER", "OTHER", "VNINDEX",
                "HNXINDEX", "VNINDEX",
            ],
        ),
        num(
            "total_val",
            &[100.0, 50.0, 110.0, 10.0, 6.0, 5.0, 150.0, 25.0, 1.0],
        ),
    ]);
    let source = MemorySource::new().with_table(&table("index_trades"), index_trades);
    let pipeline = pipeline(source);

    let points = pipeline.liquidity_growth(TimeWindow::OneWeek).await.unwrap();
    let summary: Vec<(NaiveDate, &str)> =
        points.iter().map(|p| (p.date, p.floor.as_str())).collect();
    assert_eq!(
        summary,
        [(s[3], "VNINDEX"), (s[0], "VNINDEX"), (s[0], "HNXINDEX")]
    );
    assert!(approx(points[0].per_change, 10.0));
    assert!(approx(points[1].per_change, 50.0));
    assert!(approx(points[2].per_change, -50.0));

    // Only OTHER traded on the previous session and it did not trade since.
    assert!(pipeline.liquidity_growth(TimeWindow::Latest).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_net_transaction_value() {
    let closes = frame(vec![
        dates(
            "date_time",
            &[d(2024, 3, 15), d(2024, 3, 14), d(2023, 11, 1), d(2024, 3, 15)],
        ),
        text("ticker", &["VNINDEX", "VNINDEX", "VNINDEX", "HNXINDEX"]),
        num("close_price", &[1250.0, 1240.0, 1100.0, 240.0]),
    ]);
    let flows = frame(vec![
        dates(
            "date_time",
            &[d(2024, 3, 15), d(2024, 3, 15), d(2024, 3, 14), d(2023, 11, 1)],
        ),
        num("net_proprietary", &[1.0, 2.0, 4.0, 8.0]),
        num("net_retail", &[-1.0, -1.0, 0.0, 0.0]),
        num("net_foreign", &[3.0, 0.0, -5.0, 0.0]),
    ]);
    let source = MemorySource::new()
        .with_table(&table("index_prices"), closes)
        .with_table(&table("net_flows"), flows);

    let rows = pipeline(source)
        .net_transaction_value(Exchange::Hose)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date, d(2024, 3, 15));
    assert_eq!(rows[0].exchange, "VNINDEX");
    assert_eq!(rows[0].exchange_price, 1250.0);
    assert_eq!(
        (rows[0].net_proprietary, rows[0].net_retail, rows[0].net_foreign),
        (3.0, -2.0, 3.0)
    );
    assert_eq!(rows[1].date, d(2024, 3, 14));
    assert_eq!(rows[1].net_foreign, -5.0);
}

#[tokio::test]
async fn test_fresh_results_are_published_once() {
    let publisher = Arc::new(BroadcastPublisher::new(8));
    let mut events = publisher.subscribe();
    let pipeline = pipeline(market_source()).with_publisher(publisher);

    pipeline.ticker_price().await.unwrap();
    let event = events.recv().await.unwrap();
    assert_eq!(event.topic, "ticker-price");
    assert_eq!(event.payload["AAA"], 107.0);

    pipeline.ticker_price().await.unwrap();
    assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_coalesced_misses_share_one_computation() {
    let source = Arc::new(market_source().with_latency(Duration::from_millis(5)));
    let pipeline = pipeline_with(source.clone(), Arc::new(InMemoryStore::new()))
        .with_config(PipelineConfig::default().with_coalescing(true));

    pipeline.ticker_price().await.unwrap();
    let single = source.query_count();
    pipeline
        .invalidate(&CacheKey::new(KeyName::TickerPrice))
        .await
        .unwrap();

    let (a, b) = tokio::join!(pipeline.ticker_price(), pipeline.ticker_price());
    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(source.query_count(), single * 2);
}

#[tokio::test(start_paused = true)]
async fn test_slow_source_times_out() {
    let source = market_source().with_latency(Duration::from_secs(10));
    let pipeline = pipeline(source)
        .with_config(PipelineConfig::default().with_fetch_timeout(Duration::from_secs(5)));

    let result = pipeline.domestic_index().await;
    assert!(matches!(result, Err(MarketError::Timeout(_))));
}

#[tokio::test(start_paused = true)]
async fn test_sub_second_fetch_budget() {
    let budget = Duration::from_millis(500);
    let config = PipelineConfig::default().with_fetch_timeout(budget);

    let fast = pipeline(market_source().with_latency(Duration::from_millis(300)))
        .with_config(config.clone());
    assert_eq!(fast.domestic_index().await.unwrap().len(), 1);

    let slow = pipeline(market_source().with_latency(Duration::from_millis(800)))
        .with_config(config);
    let result = slow.domestic_index().await;
    assert!(matches!(result, Err(MarketError::Timeout(b)) if b == budget));
}

#[cfg(feature = "source-sqlite")]
#[tokio::test]
async fn test_sqlite_source_end_to_end() {
    use market::SqliteSource;

    let source = SqliteSource::in_memory().unwrap();
    source
        .execute_batch(
            "CREATE TABLE index_prices (date_time TEXT, ticker TEXT, close_price REAL);
             INSERT INTO index_prices VALUES
                 ('2024-03-15', 'A', 100.0),
                 ('2024-03-15', 'B', 50.0),
                 ('2024-03-14', 'A', 90.0);",
        )
        .unwrap();
    let pipeline = pipeline_with(Arc::new(source), Arc::new(InMemoryStore::new()));

    let rows = pipeline.market_volatility().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].ticker.as_str(), "A");
    assert!(approx(rows[0].day_change_percent, 100.0 / 9.0));
}

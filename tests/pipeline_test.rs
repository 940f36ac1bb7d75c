/**
 * Pipeline Tests
 *
 * Runs every job against an in-memory store and a mock market data
 * provider, the same way the CLI does for `all`.
 */

mod common;

use async_trait::async_trait;
use common::{date, rising_with_spike};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use stockpulse::config::{BatchConfig, Config};
use stockpulse::services::sqlite_store::EntityType;
use stockpulse::services::SqliteStore;
use stockpulse::sources::{BarProvider, MoverProvider};
use stockpulse::types::{BarsMap, RawMover, RawMovers, Timeframe};
use stockpulse::{AppError, Job, Pipeline, Result};

/// Daily requests get 260 sessions; monthly ones one bar per 30 days.
/// Every series ends on a volume spike.
struct MockMarket {
    fail_bars: AtomicBool,
    fail_movers: AtomicBool,
    bar_calls: AtomicUsize,
}

impl MockMarket {
    fn new() -> Self {
        Self {
            fail_bars: AtomicBool::new(false),
            fail_movers: AtomicBool::new(false),
            bar_calls: AtomicUsize::new(0),
        }
    }

    fn outage(&self) {
        self.fail_bars.store(true, Ordering::SeqCst);
        self.fail_movers.store(true, Ordering::SeqCst);
    }
}

fn base_price(symbol: &str) -> f64 {
    20.0 + (symbol.bytes().map(u32::from).sum::<u32>() % 10) as f64
}

#[async_trait]
impl BarProvider for MockMarket {
    async fn fetch_bars(
        &self,
        symbols: &[String],
        timeframe: Timeframe,
        days: u32,
    ) -> Result<BarsMap> {
        self.bar_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_bars.load(Ordering::SeqCst) {
            return Err(AppError::ExternalApi("HTTP 503".to_string()));
        }
        let count = match timeframe {
            Timeframe::Day => 260,
            Timeframe::Month => (days / 30) as usize,
        };
        Ok(symbols
            .iter()
            .map(|s| (s.clone(), rising_with_spike(s, count, base_price(s))))
            .collect())
    }
}

#[async_trait]
impl MoverProvider for MockMarket {
    async fn fetch_movers(&self, _top: u32) -> Result<RawMovers> {
        if self.fail_movers.load(Ordering::SeqCst) {
            return Err(AppError::ExternalApi("HTTP 503".to_string()));
        }
        let price = base_price("AAPL") + 25.9;
        Ok(RawMovers {
            gainers: vec![RawMover {
                symbol: "AAPL".to_string(),
                percent_change: 6.1,
                change: 1.5,
                price,
            }],
            losers: Vec::new(),
        })
    }
}

fn config(symbols: &[&str]) -> Config {
    Config {
        alpaca: None,
        database_path: ":memory:".to_string(),
        batch: BatchConfig {
            pattern_batch_size: 2,
            momentum_batch_size: 2,
            delay: Duration::ZERO,
        },
        bar_cache_ttl: Duration::from_secs(60),
        movers_top: 10,
        retention_days: 90,
        scan_symbols: symbols.iter().map(|s| s.to_string()).collect(),
    }
}

fn pipeline(cfg: Config) -> Pipeline<MockMarket> {
    Pipeline::new(MockMarket::new(), SqliteStore::new_in_memory().unwrap(), cfg)
}

#[tokio::test]
async fn test_run_all_stores_every_entity() {
    let day = date(2024, 5, 6);
    let pipeline = pipeline(config(&["AAPL", "MSFT", "NVDA"]));

    let errors = pipeline.run_all(day).await;
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);

    let store = pipeline.store();
    // Per symbol: the daily breakout (found by 1D-1Y, repeated by 1D-2Y) and
    // one breakout on each monthly series.
    assert_eq!(store.row_count(EntityType::PatternAlert, day).unwrap(), 9);
    assert_eq!(store.row_count(EntityType::MomentumScan, day).unwrap(), 3);
    assert_eq!(store.row_count(EntityType::SmartMover, day).unwrap(), 1);
    assert_eq!(store.row_count(EntityType::SectorMomentum, day).unwrap(), 11);

    // The mover has a breakout, so it qualifies whatever its score.
    let picks = pipeline.run_picks(day).unwrap();
    assert!(!picks.picks.is_empty() && picks.picks.len() <= 3);
    assert!(picks.picks.iter().any(|p| p.symbol == "AAPL"));
    for (i, pick) in picks.picks.iter().enumerate() {
        assert_eq!(pick.rank, i + 1);
    }

    let insights = pipeline.run_insights(day).unwrap();
    assert!(!insights.insights.is_empty());
    assert!(insights.insights.len() <= 15);
    for (i, insight) in insights.insights.iter().enumerate() {
        assert_eq!(insight.priority, i + 1);
    }
}

#[tokio::test]
async fn test_pattern_alerts_carry_scan_label() {
    let day = date(2024, 5, 6);
    let pipeline = pipeline(config(&["AAPL"]));

    let result = pipeline.run_patterns(day).await.unwrap();
    assert!(result.errors.is_empty());

    let labels: Vec<&str> = result.alerts.iter().map(|a| a.timeframe.as_str()).collect();
    assert_eq!(labels, vec!["1D-1Y", "1M-3Y", "1M-5Y"]);

    let dates: BTreeSet<_> = result.alerts.iter().map(|a| a.pattern_date).collect();
    assert_eq!(dates.len(), 3);
}

#[tokio::test]
async fn test_cached_bars_are_not_refetched() {
    let day = date(2024, 5, 6);
    let pipeline = pipeline(config(&["AAPL", "MSFT", "NVDA"]));

    pipeline.run(Job::Patterns, day).await.unwrap();
    // Four scans, each 3 symbols in batches of 2.
    let first = pipeline_calls(&pipeline);
    assert_eq!(first, 8);
    pipeline.run(Job::Patterns, day).await.unwrap();
    assert_eq!(pipeline_calls(&pipeline), first);

    // Stored alerts were replaced, not duplicated.
    assert_eq!(
        pipeline.store().row_count(EntityType::PatternAlert, day).unwrap(),
        9
    );
}

fn pipeline_calls(pipeline: &Pipeline<MockMarket>) -> usize {
    pipeline.provider().bar_calls.load(Ordering::SeqCst)
}

#[tokio::test]
async fn test_failed_batches_reported_not_fatal() {
    let day = date(2024, 5, 6);
    let pipeline = pipeline(config(&["AAPL", "MSFT", "NVDA"]));
    pipeline.provider().fail_bars.store(true, Ordering::SeqCst);

    let result = pipeline.run_momentum(day).await.unwrap();
    assert!(result.scans.is_empty());
    assert_eq!(result.errors.len(), 2);
    assert!(result.errors[0].contains("batch 1/2"));

    // Movers still come through, with zeroed bar fields.
    let movers = pipeline.run_movers(day).await.unwrap();
    assert_eq!(movers.movers.len(), 1);
    assert_eq!(movers.movers[0].avg_volume_20d, 0.0);
    assert!(!movers.errors.is_empty());
}

#[tokio::test]
async fn test_outage_rerun_keeps_stored_rows() {
    let day = date(2024, 5, 6);
    let mut cfg = config(&["AAPL", "MSFT"]);
    // Every run goes upstream.
    cfg.bar_cache_ttl = Duration::ZERO;
    let pipeline = pipeline(cfg);

    pipeline.run_momentum(day).await.unwrap();
    pipeline.run_movers(day).await.unwrap();
    let store = pipeline.store();
    assert_eq!(store.row_count(EntityType::MomentumScan, day).unwrap(), 2);
    assert_eq!(store.row_count(EntityType::SmartMover, day).unwrap(), 1);

    pipeline.provider().outage();

    let momentum = pipeline.run_momentum(day).await.unwrap();
    assert!(momentum.scans.is_empty());
    assert!(!momentum.errors.is_empty());
    let movers = pipeline.run_movers(day).await.unwrap();
    assert!(movers.movers.is_empty());
    assert!(movers.errors[0].starts_with("movers feed:"));

    assert_eq!(store.row_count(EntityType::MomentumScan, day).unwrap(), 2);
    assert_eq!(store.row_count(EntityType::SmartMover, day).unwrap(), 1);

    // Picks and insights still see the earlier rows.
    let snapshot = store.load_snapshot(day).unwrap();
    assert_eq!(snapshot.movers.len(), 1);
    assert_eq!(snapshot.momentum.len(), 2);
}

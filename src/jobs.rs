//! Daily jobs: fetch bars, run one scoring stage, log a summary and store
//! the result under the run date.
//!
//! Jobs run in dependency order: patterns, momentum and movers first, then
//! sectors, then picks and insights (which only read what earlier jobs
//! stored for the same date).

use crate::config::Config;
use crate::error::Result;
use crate::services::cache::BarCache;
use crate::services::insights::synthesize_insights;
use crate::services::movers::enrich_movers;
use crate::services::picks::select_picks;
use crate::services::sectors::{all_sector_symbols, sector_momentum};
use crate::services::signals::{run_momentum_scan, scan_patterns};
use crate::services::sqlite_store::{SqliteStore, StoredRow};
use crate::sources::{fetch_in_batches, BarProvider, MoverProvider};
use crate::types::{
    BarSeries, BarsMap, MarketInsightsResult, MomentumScanResult, PatternAlertsResult,
    PatternType, SectorMomentumResult, SmartMoversResult, StockPicksResult, Timeframe,
};
use chrono::{Duration, NaiveDate, Utc};
use std::collections::{BTreeMap, HashSet};
use tracing::{info, warn};

/// History requested per job, in calendar days.
pub const MOMENTUM_HISTORY_DAYS: u32 = 30;
pub const MOVER_HISTORY_DAYS: u32 = 365;
pub const SECTOR_HISTORY_DAYS: u32 = 35;

const TOP_MOMENTUM_LOGGED: usize = 5;

/// One pattern scan: bar size, history and the label stamped on its alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternScan {
    pub timeframe: Timeframe,
    pub days: u32,
    pub label: &'static str,
}

/// Scans run by the pattern job, shortest history first.
pub const PATTERN_SCANS: [PatternScan; 4] = [
    PatternScan {
        timeframe: Timeframe::Day,
        days: 365,
        label: "1D-1Y",
    },
    PatternScan {
        timeframe: Timeframe::Day,
        days: 730,
        label: "1D-2Y",
    },
    PatternScan {
        timeframe: Timeframe::Month,
        days: 365 * 3,
        label: "1M-3Y",
    },
    PatternScan {
        timeframe: Timeframe::Month,
        days: 365 * 5,
        label: "1M-5Y",
    },
];

/// One pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    Patterns,
    Momentum,
    Movers,
    Sectors,
    Picks,
    Insights,
}

impl Job {
    /// Every job, in the order `all` runs them.
    pub const ALL: [Job; 6] = [
        Job::Patterns,
        Job::Momentum,
        Job::Movers,
        Job::Sectors,
        Job::Picks,
        Job::Insights,
    ];

    /// Whether the job fetches market data (and so needs credentials).
    pub fn needs_market_data(&self) -> bool {
        !matches!(self, Job::Picks | Job::Insights)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Job::Patterns => "patterns",
            Job::Momentum => "momentum",
            Job::Movers => "movers",
            Job::Sectors => "sectors",
            Job::Picks => "picks",
            Job::Insights => "insights",
        }
    }
}

/// Runs jobs against one market data provider and one store.
pub struct Pipeline<P> {
    provider: P,
    store: SqliteStore,
    cache: BarCache,
    config: Config,
}

impl<P: BarProvider + MoverProvider> Pipeline<P> {
    pub fn new(provider: P, store: SqliteStore, config: Config) -> Self {
        let cache = BarCache::new(config.bar_cache_ttl);
        Self {
            provider,
            store,
            cache,
            config,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    /// Bars for `symbols`, served from the cache where possible and fetched
    /// in batches otherwise.
    async fn load_bars(
        &self,
        symbols: &[String],
        batch_size: usize,
        timeframe: Timeframe,
        days: u32,
    ) -> (BarsMap, Vec<String>) {
        let (hits, misses) = self.cache.partition(symbols, timeframe, days);
        let mut bars: BarsMap = hits
            .iter()
            .map(|s| (s.symbol().to_string(), BarSeries::clone(s)))
            .collect();

        if !misses.is_empty() {
            info!(
                "Fetching {} symbols ({} cached) in batches of {}",
                misses.len(),
                bars.len(),
                batch_size
            );
        }

        let (fetched, errors) = fetch_in_batches(
            &self.provider,
            &misses,
            batch_size,
            self.config.batch.delay,
            timeframe,
            days,
        )
        .await;
        for series in fetched.into_values() {
            let series = self.cache.insert(series, timeframe, days);
            bars.insert(series.symbol().to_string(), BarSeries::clone(&series));
        }

        (bars, errors)
    }

    /// Detect chart patterns across the scan universe, once per entry of
    /// [`PATTERN_SCANS`].
    ///
    /// An alert a longer scan repeats (same symbol, type and bar date) keeps
    /// the label of the first scan that found it.
    pub async fn run_patterns(&self, date: NaiveDate) -> Result<PatternAlertsResult> {
        info!("Scanning {} symbols for patterns", self.config.scan_symbols.len());
        let mut result = PatternAlertsResult {
            scan_date: date,
            generated_at: Utc::now(),
            alerts: Vec::new(),
            errors: Vec::new(),
        };
        let mut seen: HashSet<(String, PatternType, NaiveDate)> = HashSet::new();

        for scan in PATTERN_SCANS {
            info!("Pattern scan {} ({} days)", scan.label, scan.days);
            let (bars, fetch_errors) = self
                .load_bars(
                    &self.config.scan_symbols,
                    self.config.batch.pattern_batch_size,
                    scan.timeframe,
                    scan.days,
                )
                .await;

            let scanned = scan_patterns(&bars, scan.label, date);
            result.alerts.extend(scanned.alerts.into_iter().filter(|a| {
                seen.insert((a.symbol.clone(), a.pattern_type, a.pattern_date))
            }));
            result
                .errors
                .extend(fetch_errors.into_iter().map(|e| format!("{}: {}", scan.label, e)));
            result.errors.extend(scanned.errors);
        }

        info!("Found {} pattern alerts", result.alerts.len());
        if !result.alerts.is_empty() {
            let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
            for alert in &result.alerts {
                *by_type.entry(alert.pattern_type.as_str()).or_default() += 1;
            }
            info!("By type: {:?}", by_type);
        }

        save(&self.store, date, &result.alerts)?;
        Ok(result)
    }

    /// Score the scan universe on composite momentum.
    pub async fn run_momentum(&self, date: NaiveDate) -> Result<MomentumScanResult> {
        info!("Scoring {} symbols for momentum", self.config.scan_symbols.len());
        let (bars, fetch_errors) = self
            .load_bars(
                &self.config.scan_symbols,
                self.config.batch.momentum_batch_size,
                Timeframe::Day,
                MOMENTUM_HISTORY_DAYS,
            )
            .await;

        let mut result = run_momentum_scan(&bars, date);
        result.errors.extend(fetch_errors);

        info!("Scored {} stocks", result.scans.len());
        for s in result.scans.iter().take(TOP_MOMENTUM_LOGGED) {
            info!(
                "  {}: {}/100 (${}, {}% 5d, {}x vol, RSI {:?})",
                s.symbol, s.score, s.price, s.price_change_5d, s.volume_ratio, s.rsi_14
            );
        }

        save(&self.store, date, &result.scans)?;
        Ok(result)
    }

    /// Enrich the movers feed with volume and 52-week-high context.
    pub async fn run_movers(&self, date: NaiveDate) -> Result<SmartMoversResult> {
        let raw = match self.provider.fetch_movers(self.config.movers_top).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Movers feed unavailable: {}", e);
                let mut result = enrich_movers(&Default::default(), &BarsMap::new(), date);
                result.errors.push(format!("movers feed: {}", e));
                return Ok(result);
            }
        };

        let (bars, fetch_errors) = self
            .load_bars(
                &raw.symbols(),
                self.config.batch.pattern_batch_size,
                Timeframe::Day,
                MOVER_HISTORY_DAYS,
            )
            .await;

        let mut result = enrich_movers(&raw, &bars, date);
        result.errors.extend(fetch_errors);

        info!("Found {} movers", result.movers.len());
        let unusual: Vec<&str> = result
            .movers
            .iter()
            .filter(|m| m.unusual_volume)
            .map(|m| m.symbol.as_str())
            .collect();
        if !unusual.is_empty() {
            info!("{} with unusual volume: {}", unusual.len(), unusual.join(", "));
        }
        let near_high: Vec<&str> = result
            .movers
            .iter()
            .filter(|m| m.near_52w_high)
            .map(|m| m.symbol.as_str())
            .collect();
        if !near_high.is_empty() {
            info!("{} near 52-week high: {}", near_high.len(), near_high.join(", "));
        }

        save(&self.store, date, &result.movers)?;
        Ok(result)
    }

    /// Rank the sectors by average 1-week change.
    pub async fn run_sectors(&self, date: NaiveDate) -> Result<SectorMomentumResult> {
        let (bars, fetch_errors) = self
            .load_bars(
                &all_sector_symbols(),
                self.config.batch.momentum_batch_size,
                Timeframe::Day,
                SECTOR_HISTORY_DAYS,
            )
            .await;

        let mut result = sector_momentum(&bars, date);
        result.errors.extend(fetch_errors);

        info!("Ranked {} sectors", result.sectors.len());
        for s in &result.sectors {
            info!("  #{} {}: {}% 1w, {}% 1m", s.rank, s.sector, s.avg_change_1w, s.avg_change_1m);
        }

        save(&self.store, date, &result.sectors)?;
        Ok(result)
    }

    pub fn run_picks(&self, date: NaiveDate) -> Result<StockPicksResult> {
        run_picks(&self.store, date)
    }

    pub fn run_insights(&self, date: NaiveDate) -> Result<MarketInsightsResult> {
        run_insights(&self.store, date)
    }

    /// Run one job; returns its non-fatal error list.
    pub async fn run(&self, job: Job, date: NaiveDate) -> Result<Vec<String>> {
        info!("Running {} job for {}", job.as_str(), date);
        let errors = match job {
            Job::Patterns => self.run_patterns(date).await?.errors,
            Job::Momentum => self.run_momentum(date).await?.errors,
            Job::Movers => self.run_movers(date).await?.errors,
            Job::Sectors => self.run_sectors(date).await?.errors,
            Job::Picks => {
                self.run_picks(date)?;
                Vec::new()
            }
            Job::Insights => {
                self.run_insights(date)?;
                Vec::new()
            }
        };
        for e in &errors {
            warn!("{} job: {}", job.as_str(), e);
        }
        Ok(errors)
    }

    /// Run every job in order. A failing job is logged and the rest still
    /// run; its error is returned alongside the others.
    pub async fn run_all(&self, date: NaiveDate) -> Vec<String> {
        let mut errors = Vec::new();
        for job in Job::ALL {
            match self.run(job, date).await {
                Ok(job_errors) => errors.extend(job_errors),
                Err(e) => {
                    warn!("{} job failed: {}", job.as_str(), e);
                    errors.push(format!("{}: {}", job.as_str(), e));
                }
            }
        }
        errors
    }

    /// Drop stored rows older than the configured retention.
    pub fn cleanup(&self, today: NaiveDate) -> Result<usize> {
        self.cache.cleanup();
        cleanup(&self.store, today, self.config.retention_days)
    }
}

/// Select the day's picks from what the earlier jobs stored.
pub fn run_picks(store: &SqliteStore, date: NaiveDate) -> Result<StockPicksResult> {
    let snapshot = store.load_snapshot(date)?;
    let result = select_picks(&snapshot);

    if result.picks.is_empty() {
        info!("No picks for {}: not enough signals across services", date);
    } else {
        info!("Selected {} picks", result.picks.len());
        for p in &result.picks {
            let patterns: Vec<&str> = p.patterns_detected.iter().map(|t| t.as_str()).collect();
            info!(
                "  #{} {} score {}, patterns: [{}]",
                p.rank,
                p.symbol,
                p.momentum_score,
                patterns.join(", ")
            );
            info!("    {}", p.rationale);
        }
    }

    save(store, date, &result.picks)?;
    Ok(result)
}

/// Turn the day's stored rows into plain-English insights.
pub fn run_insights(store: &SqliteStore, date: NaiveDate) -> Result<MarketInsightsResult> {
    let snapshot = store.load_snapshot(date)?;
    let result = synthesize_insights(&snapshot);

    info!("Generated {} insights", result.insights.len());
    for i in &result.insights {
        info!("  [{}] {}", i.priority, i.title);
    }

    save(store, date, &result.insights)?;
    Ok(result)
}

/// Store a job's batch unless it is empty, so a run that produced nothing
/// leaves the rows of an earlier run for the same date in place.
fn save<T: StoredRow>(store: &SqliteStore, date: NaiveDate, rows: &[T]) -> Result<()> {
    if rows.is_empty() {
        info!("No {} rows for {}, keeping stored rows", T::ENTITY, date);
        return Ok(());
    }
    store.store_rows(date, rows)?;
    Ok(())
}

/// Delete rows dated more than `retention_days` before `today`.
pub fn cleanup(store: &SqliteStore, today: NaiveDate, retention_days: u32) -> Result<usize> {
    let cutoff = today - Duration::days(i64::from(retention_days));
    store.cleanup_before(cutoff)
}

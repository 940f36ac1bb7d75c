//! Chart pattern detection over a trailing lookback window.
//!
//! Three independent detectors run on one symbol's series:
//! - 50/200 SMA crossovers (golden / death cross)
//! - Breakouts above the 20-bar high on elevated volume
//! - Bullish engulfing candles
//!
//! Each detector only looks at the last few eligible bars, so re-running a
//! daily scan produces a bounded number of alerts.

use super::indicators::sma;
use super::round2;
use crate::types::{Bar, BarSeries, BarsMap, DataMap, PatternAlert, PatternAlertsResult, PatternType};
use chrono::{NaiveDate, Utc};
use serde_json::json;
use tracing::debug;

/// Bars inspected for SMA crossovers.
pub const MA_CROSS_LOOKBACK: usize = 5;
/// Bars inspected for breakouts.
pub const BREAKOUT_LOOKBACK: usize = 3;
/// Bars inspected for engulfing candles.
pub const ENGULFING_LOOKBACK: usize = 5;

const FAST_MA: usize = 50;
const SLOW_MA: usize = 200;
const BREAKOUT_WINDOW: usize = 20;
const BREAKOUT_VOLUME_RATIO: f64 = 1.5;

/// Series shorter than this are skipped by a batch scan.
pub const MIN_SCAN_BARS: usize = 20;

/// Detect 50/200 SMA crossovers within the last [`MA_CROSS_LOOKBACK`] bars.
///
/// Needs at least 201 bars. A move of SMA50 from `<=` SMA200 to `>` is a
/// golden cross; the reverse is a death cross.
pub fn detect_ma_crossovers(series: &BarSeries, timeframe: &str) -> Vec<PatternAlert> {
    let bars = series.bars();
    if bars.len() < SLOW_MA + 1 {
        return Vec::new();
    }

    let fast = sma(bars, FAST_MA);
    let slow = sma(bars, SLOW_MA);
    let start = SLOW_MA.max(bars.len() - MA_CROSS_LOOKBACK);
    let mut alerts = Vec::new();

    for i in start..bars.len() {
        let (Some(prev_fast), Some(prev_slow), Some(curr_fast), Some(curr_slow)) =
            (fast[i - 1], slow[i - 1], fast[i], slow[i])
        else {
            continue;
        };

        let prev_above = prev_fast > prev_slow;
        let curr_above = curr_fast > curr_slow;
        let pattern_type = match (prev_above, curr_above) {
            (false, true) => PatternType::GoldenCross,
            (true, false) => PatternType::DeathCross,
            _ => continue,
        };

        let mut details = DataMap::new();
        details.insert("sma50".to_string(), json!(round2(curr_fast)));
        details.insert("sma200".to_string(), json!(round2(curr_slow)));
        if let Some(alert) = make_alert(series, &bars[i], pattern_type, timeframe, details) {
            alerts.push(alert);
        }
    }

    alerts
}

/// Detect closes above the prior 20-bar high on at least 1.5x the prior
/// 20-bar average volume, within the last [`BREAKOUT_LOOKBACK`] bars.
///
/// The current bar is excluded from both the high and the volume average.
pub fn detect_breakouts(series: &BarSeries, timeframe: &str) -> Vec<PatternAlert> {
    let bars = series.bars();
    if bars.len() < BREAKOUT_WINDOW + 1 {
        return Vec::new();
    }

    let start = BREAKOUT_WINDOW.max(bars.len() - BREAKOUT_LOOKBACK);
    let mut alerts = Vec::new();

    for i in start..bars.len() {
        let prior = &bars[i - BREAKOUT_WINDOW..i];
        let high20 = prior.iter().map(|b| b.high).fold(0.0, f64::max);
        let avg_vol = prior.iter().map(|b| b.volume).sum::<f64>() / BREAKOUT_WINDOW as f64;
        let vol_ratio = if avg_vol > 0.0 { bars[i].volume / avg_vol } else { 0.0 };

        if bars[i].close > high20 && vol_ratio >= BREAKOUT_VOLUME_RATIO {
            let mut details = DataMap::new();
            details.insert("breakout_level".to_string(), json!(round2(high20)));
            details.insert("close".to_string(), json!(bars[i].close));
            details.insert("volume_ratio".to_string(), json!(round2(vol_ratio)));
            if let Some(alert) = make_alert(series, &bars[i], PatternType::Breakout, timeframe, details) {
                alerts.push(alert);
            }
        }
    }

    alerts
}

/// Detect bullish engulfing candles within the last [`ENGULFING_LOOKBACK`] bars.
///
/// The prior bar must close below its open, the current bar above its
/// open, and the current body must cover the prior body.
pub fn detect_bullish_engulfing(series: &BarSeries, timeframe: &str) -> Vec<PatternAlert> {
    let bars = series.bars();
    if bars.len() < 3 {
        return Vec::new();
    }

    let start = 1.max(bars.len() - ENGULFING_LOOKBACK.min(bars.len()));
    let mut alerts = Vec::new();

    for i in start..bars.len() {
        let prev = &bars[i - 1];
        let curr = &bars[i];
        let engulfs = curr.open <= prev.close && curr.close >= prev.open;

        if prev.is_bearish() && curr.is_bullish() && engulfs {
            let mut details = DataMap::new();
            details.insert("prev_open".to_string(), json!(prev.open));
            details.insert("prev_close".to_string(), json!(prev.close));
            details.insert("curr_open".to_string(), json!(curr.open));
            details.insert("curr_close".to_string(), json!(curr.close));
            if let Some(alert) =
                make_alert(series, curr, PatternType::BullishEngulfing, timeframe, details)
            {
                alerts.push(alert);
            }
        }
    }

    alerts
}

/// Run every detector on one series and concatenate the results.
pub fn detect_patterns(series: &BarSeries, timeframe: &str) -> Vec<PatternAlert> {
    let mut alerts = detect_ma_crossovers(series, timeframe);
    alerts.extend(detect_breakouts(series, timeframe));
    alerts.extend(detect_bullish_engulfing(series, timeframe));
    alerts
}

/// Scan a batch of series. Symbols with fewer than [`MIN_SCAN_BARS`] bars
/// are skipped.
pub fn scan_patterns(bars: &BarsMap, timeframe: &str, scan_date: NaiveDate) -> PatternAlertsResult {
    let mut alerts = Vec::new();

    for (symbol, series) in bars {
        if series.len() < MIN_SCAN_BARS {
            debug!("Skipping pattern scan for {}: only {} bars", symbol, series.len());
            continue;
        }
        alerts.extend(detect_patterns(series, timeframe));
    }

    PatternAlertsResult {
        scan_date,
        generated_at: Utc::now(),
        alerts,
        errors: Vec::new(),
    }
}

fn make_alert(
    series: &BarSeries,
    bar: &Bar,
    pattern_type: PatternType,
    timeframe: &str,
    details: DataMap,
) -> Option<PatternAlert> {
    Some(PatternAlert {
        symbol: series.symbol().to_string(),
        pattern_type,
        timeframe: timeframe.to_string(),
        pattern_date: bar.date()?,
        details,
    })
}

//! Composite momentum score (0-100) per symbol.
//!
//! Scoring:
//! - price (0-30): absolute 5-day % change, one point per percent
//! - volume (0-30): today's volume over the 20-bar average, full marks at 5x
//! - rsi (5-20): RSI(14) in the 40-60 band scores highest, extremes lowest
//! - trend (0-20): close at or above SMA(20)

use super::indicators::{avg_volume, latest_rsi, latest_sma, AVG_VOLUME_PERIOD, RSI_PERIOD};
use super::round2;
use crate::error::{AppError, Result};
use crate::types::{BarSeries, BarsMap, MomentumScanResult, MomentumScanRow, PriceTier};
use chrono::{NaiveDate, Utc};
use tracing::debug;

/// Sessions used for the price change.
pub const PRICE_LOOKBACK: usize = 5;
/// A symbol needs this many bars to be scored.
pub const MIN_MOMENTUM_BARS: usize = PRICE_LOOKBACK + 1;

const PRICE_SCORE_CAP: u8 = 30;
const VOLUME_SCORE_CAP: u8 = 30;
const VOLUME_RATIO_FOR_FULL_SCORE: f64 = 5.0;
const TREND_SMA_PERIOD: usize = 20;

pub fn score_price_change(pct: f64) -> u8 {
    let points = pct.abs().round().min(f64::from(PRICE_SCORE_CAP));
    points as u8
}

pub fn score_volume(ratio: f64) -> u8 {
    let points = (ratio / VOLUME_RATIO_FOR_FULL_SCORE * f64::from(VOLUME_SCORE_CAP))
        .round()
        .clamp(0.0, f64::from(VOLUME_SCORE_CAP));
    points as u8
}

/// 20 in the 40-60 band, 15 within 30-70, 10 within 20-80 or when RSI is
/// undefined, otherwise 5.
pub fn score_rsi(rsi: Option<f64>) -> u8 {
    match rsi {
        None => 10,
        Some(r) if (40.0..=60.0).contains(&r) => 20,
        Some(r) if (30.0..=70.0).contains(&r) => 15,
        Some(r) if (20.0..=80.0).contains(&r) => 10,
        Some(_) => 5,
    }
}

/// 20 when close is at or above SMA(20), 10 when SMA(20) is undefined.
pub fn score_trend(close: f64, sma20: Option<f64>) -> u8 {
    match sma20 {
        None => 10,
        Some(avg) if close >= avg => 20,
        Some(_) => 0,
    }
}

/// Sum the capped sub-scores, capped again at 100.
pub fn composite_score(price: u8, volume: u8, rsi: u8, trend: u8) -> u8 {
    let total = u16::from(price) + u16::from(volume) + u16::from(rsi) + u16::from(trend);
    total.min(100) as u8
}

/// Score one series.
///
/// Fails with [`AppError::InsufficientData`] below [`MIN_MOMENTUM_BARS`]
/// bars; callers leave such symbols out rather than scoring them zero.
pub fn score_series(series: &BarSeries) -> Result<MomentumScanRow> {
    let bars = series.bars();
    let last = match bars.last() {
        Some(last) if bars.len() >= MIN_MOMENTUM_BARS => last,
        _ => {
            return Err(AppError::InsufficientData {
                symbol: series.symbol().to_string(),
                required: MIN_MOMENTUM_BARS,
                available: bars.len(),
            })
        }
    };

    let close = last.close;
    let price_change_5d = round2(series.pct_change(PRICE_LOOKBACK));

    let avg_vol = avg_volume(bars, AVG_VOLUME_PERIOD);
    let volume_ratio = if avg_vol > 0.0 {
        round2(last.volume / avg_vol)
    } else {
        0.0
    };

    let rsi_14 = latest_rsi(bars, RSI_PERIOD).map(round2);
    let sma20 = latest_sma(bars, TREND_SMA_PERIOD);

    let price_score = score_price_change(price_change_5d);
    let volume_score = score_volume(volume_ratio);
    let rsi_score = score_rsi(rsi_14);
    let trend_score = score_trend(close, sma20);

    Ok(MomentumScanRow {
        symbol: series.symbol().to_string(),
        score: composite_score(price_score, volume_score, rsi_score, trend_score),
        price_score,
        volume_score,
        rsi_score,
        trend_score,
        price: close,
        price_change_5d,
        volume_ratio,
        rsi_14,
        above_sma_20: sma20.is_some_and(|avg| close >= avg),
        price_tier: PriceTier::from_price(close),
    })
}

/// Score every series in the map and sort by score, highest first.
///
/// The sort is stable so equal scores keep symbol order.
pub fn run_momentum_scan(bars: &BarsMap, scan_date: NaiveDate) -> MomentumScanResult {
    let mut scans = Vec::with_capacity(bars.len());
    let mut errors = Vec::new();

    for series in bars.values() {
        match score_series(series) {
            Ok(row) => scans.push(row),
            Err(e) if e.is_insufficient_data() => {
                debug!("{}", e);
            }
            Err(e) => errors.push(format!("{}: {}", series.symbol(), e)),
        }
    }

    sort_by_score(&mut scans);

    MomentumScanResult {
        scan_date,
        generated_at: Utc::now(),
        scans,
        errors,
    }
}

/// Stable sort, highest score first.
pub fn sort_by_score(rows: &mut [MomentumScanRow]) {
    rows.sort_by(|a, b| b.score.cmp(&a.score));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Bar;

    fn series(symbol: &str, closes: &[f64], volumes: &[f64]) -> BarSeries {
        let bars = closes
            .iter()
            .zip(volumes)
            .enumerate()
            .map(|(i, (&c, &v))| Bar {
                time: i as i64 * 86_400_000,
                open: c,
                high: c,
                low: c,
                close: c,
                volume: v,
            })
            .collect();
        BarSeries::new(symbol, bars).unwrap()
    }

    #[test]
    fn test_sub_scores() {
        assert_eq!(score_price_change(-12.4), 12);
        assert_eq!(score_price_change(45.0), 30);
        assert_eq!(score_volume(2.5), 15);
        assert_eq!(score_volume(9.0), 30);
        assert_eq!(score_volume(0.0), 0);
        assert_eq!(score_rsi(Some(50.0)), 20);
        assert_eq!(score_rsi(Some(65.0)), 15);
        assert_eq!(score_rsi(Some(75.0)), 10);
        assert_eq!(score_rsi(Some(90.0)), 5);
        assert_eq!(score_rsi(None), 10);
        assert_eq!(score_trend(10.0, None), 10);
        assert_eq!(score_trend(10.0, Some(9.0)), 20);
        assert_eq!(score_trend(10.0, Some(11.0)), 0);
    }

    #[test]
    fn test_composite_is_capped() {
        for price in [0, 15, 30] {
            for volume in [0, 15, 30] {
                for rsi in [5, 10, 15, 20] {
                    for trend in [0, 10, 20] {
                        assert!(composite_score(price, volume, rsi, trend) <= 100);
                    }
                }
            }
        }
        assert_eq!(composite_score(30, 30, 20, 20), 100);
    }

    #[test]
    fn test_short_series_is_insufficient() {
        let s = series("AAA", &[1.0; 5], &[100.0; 5]);
        let err = score_series(&s).unwrap_err();
        assert!(err.is_insufficient_data());
    }

    #[test]
    fn test_six_bar_series_scores() {
        let s = series(
            "AAA",
            &[10.0, 10.0, 10.0, 10.0, 10.0, 11.0],
            &[100.0, 100.0, 100.0, 100.0, 100.0, 400.0],
        );
        let row = score_series(&s).unwrap();
        assert_eq!(row.price_change_5d, 10.0);
        assert_eq!(row.price_score, 10);
        // 400 / 150 = 2.67 -> 16 points
        assert_eq!(row.volume_ratio, 2.67);
        assert_eq!(row.volume_score, 16);
        assert_eq!(row.rsi_14, None);
        assert_eq!(row.rsi_score, 10);
        assert_eq!(row.trend_score, 10);
        assert!(!row.above_sma_20);
        assert_eq!(row.score, 46);
        assert_eq!(row.price_tier, PriceTier::Small);
    }

    #[test]
    fn test_scan_excludes_and_sorts() {
        let mut map = BarsMap::new();
        map.insert("AAA".into(), series("AAA", &[10.0; 3], &[100.0; 3]));
        map.insert(
            "BBB".into(),
            series("BBB", &[10.0, 10.0, 10.0, 10.0, 10.0, 10.0], &[100.0; 6]),
        );
        map.insert(
            "CCC".into(),
            series("CCC", &[10.0, 10.0, 10.0, 10.0, 10.0, 13.0], &[100.0, 100.0, 100.0, 100.0, 100.0, 500.0]),
        );
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let result = run_momentum_scan(&map, date);
        let symbols: Vec<&str> = result.scans.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["CCC", "BBB"]);
        assert!(result.errors.is_empty());
    }
}

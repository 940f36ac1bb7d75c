#![allow(dead_code)]

use chrono::NaiveDate;
use stockpulse::types::{
    Bar, BarSeries, DataMap, MomentumScanRow, MoverDirection, PatternAlert, PatternType, PriceTier,
    SmartMover,
};

/// 2023-01-02 00:00 UTC.
pub const START_MS: i64 = 1_672_617_600_000;
pub const DAY_MS: i64 = 86_400_000;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Flat candles (open = high = low = close) with constant volume.
pub fn series_from_closes(symbol: &str, closes: &[f64], volume: f64) -> BarSeries {
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar {
            time: START_MS + i as i64 * DAY_MS,
            open: c,
            high: c,
            low: c,
            close: c,
            volume,
        })
        .collect();
    BarSeries::new(symbol, bars).unwrap()
}

/// Steady uptrend ending in a volume spike on the last bar.
pub fn rising_with_spike(symbol: &str, count: usize, base: f64) -> BarSeries {
    let bars = (0..count)
        .map(|i| {
            let c = base + 0.1 * i as f64;
            Bar {
                time: START_MS + i as i64 * DAY_MS,
                open: c - 0.05,
                high: c,
                low: c - 0.1,
                close: c,
                volume: if i + 1 == count { 4_000.0 } else { 1_000.0 },
            }
        })
        .collect();
    BarSeries::new(symbol, bars).unwrap()
}

pub fn scan_row(symbol: &str, score: u8, price: f64, volume_ratio: f64) -> MomentumScanRow {
    MomentumScanRow {
        symbol: symbol.to_string(),
        score,
        price_score: 0,
        volume_score: 0,
        rsi_score: 0,
        trend_score: 0,
        price,
        price_change_5d: 4.2,
        volume_ratio,
        rsi_14: Some(55.0),
        above_sma_20: true,
        price_tier: PriceTier::from_price(price),
    }
}

pub fn mover(symbol: &str, price: f64, volume_ratio: f64) -> SmartMover {
    SmartMover {
        symbol: symbol.to_string(),
        direction: MoverDirection::Gainer,
        percent_change: 7.5,
        price,
        change: price * 0.07,
        volume: 1_000_000.0,
        avg_volume_20d: 1_000_000.0 / volume_ratio.max(0.01),
        volume_ratio,
        high_52w: price * 1.02,
        pct_from_52w_high: 0.0196,
        unusual_volume: volume_ratio >= 2.0,
        near_52w_high: true,
        price_tier: PriceTier::from_price(price),
    }
}

pub fn alert(symbol: &str, pattern_type: PatternType) -> PatternAlert {
    let mut details = DataMap::new();
    if pattern_type == PatternType::Breakout {
        details.insert("breakout_level".to_string(), serde_json::json!(101.5));
    }
    PatternAlert {
        symbol: symbol.to_string(),
        pattern_type,
        timeframe: "1D".to_string(),
        pattern_date: date(2024, 5, 6),
        details,
    }
}

//! Relative Strength Index (RSI) indicator.

use crate::types::Bar;

/// Default RSI lookback.
pub const RSI_PERIOD: usize = 14;

/// RSI (Relative Strength Index) with Wilder's smoothing, at every index.
///
/// Measures momentum by comparing the magnitude of recent gains to recent losses.
/// Values range from 0-100:
/// - Below 30: Oversold
/// - Above 70: Overbought
///
/// The first value sits at index `period`, seeded from the simple mean of
/// the first `period` close-to-close differences. Later values use
/// `avg = (avg * (period - 1) + current) / period`. Needs at least
/// `period + 1` bars, otherwise every index is `None`.
pub fn rsi(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; bars.len()];
    if period == 0 || bars.len() < period + 1 {
        return out;
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let diff = bars[i].close - bars[i - 1].close;
        if diff > 0.0 {
            avg_gain += diff;
        } else {
            avg_loss += -diff;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    out[period] = Some(rsi_value(avg_gain, avg_loss));

    let smoothing = (period - 1) as f64;
    for i in (period + 1)..bars.len() {
        let diff = bars[i].close - bars[i - 1].close;
        let gain = diff.max(0.0);
        let loss = (-diff).max(0.0);
        avg_gain = (avg_gain * smoothing + gain) / period as f64;
        avg_loss = (avg_loss * smoothing + loss) / period as f64;
        out[i] = Some(rsi_value(avg_gain, avg_loss));
    }

    out
}

/// RSI at the most recent bar.
pub fn latest_rsi(bars: &[Bar], period: usize) -> Option<f64> {
    rsi(bars, period).last().copied().flatten()
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

//! Simple Moving Average (SMA) indicator.

use crate::types::Bar;

/// SMA of closing prices at every index of `bars`.
///
/// Index `i` holds the arithmetic mean of closes `i+1-period..=i`; indices
/// before `period - 1` are `None`. A zero period or a series shorter than
/// the period yields all `None`.
pub fn sma(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; bars.len()];
    if period == 0 || bars.len() < period {
        return out;
    }

    for (offset, window) in bars.windows(period).enumerate() {
        let sum: f64 = window.iter().map(|b| b.close).sum();
        out[offset + period - 1] = Some(sum / period as f64);
    }

    out
}

/// SMA at the most recent bar only.
pub fn latest_sma(bars: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period {
        return None;
    }
    let sum: f64 = bars[bars.len() - period..].iter().map(|b| b.close).sum();
    Some(sum / period as f64)
}

//! Volume and range helpers.

use crate::types::Bar;

/// Default window for average volume.
pub const AVG_VOLUME_PERIOD: usize = 20;

/// Mean volume of the trailing `period` bars.
///
/// Uses however many bars exist when there are fewer than `period`; an
/// empty series averages to 0.
pub fn avg_volume(bars: &[Bar], period: usize) -> f64 {
    let start = bars.len().saturating_sub(period);
    let recent = &bars[start..];
    if recent.is_empty() {
        return 0.0;
    }
    recent.iter().map(|b| b.volume).sum::<f64>() / recent.len() as f64
}

/// Highest high across the whole series (0 when empty).
///
/// The caller decides the window, normally about a year of daily bars.
pub fn high_52w(bars: &[Bar]) -> f64 {
    bars.iter().map(|b| b.high).fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(high: f64, volume: f64) -> Bar {
        Bar {
            time: 0,
            open: high,
            high,
            low: high,
            close: high,
            volume,
        }
    }

    #[test]
    fn test_avg_volume_short_series() {
        let bars = vec![bar(1.0, 100.0), bar(1.0, 300.0)];
        assert_eq!(avg_volume(&bars, AVG_VOLUME_PERIOD), 200.0);
    }

    #[test]
    fn test_avg_volume_trailing_window() {
        let bars: Vec<Bar> = (0..30).map(|i| bar(1.0, i as f64)).collect();
        // last 20 volumes are 10..=29
        assert_eq!(avg_volume(&bars, 20), 19.5);
    }

    #[test]
    fn test_avg_volume_empty() {
        assert_eq!(avg_volume(&[], AVG_VOLUME_PERIOD), 0.0);
    }

    #[test]
    fn test_high_52w() {
        let bars = vec![bar(5.0, 1.0), bar(9.0, 1.0), bar(7.0, 1.0)];
        assert_eq!(high_52w(&bars), 9.0);
        assert_eq!(high_52w(&[]), 0.0);
    }
}

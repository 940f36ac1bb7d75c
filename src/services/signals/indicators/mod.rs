//! Technical indicator implementations.
//!
//! Everything here is a pure function of a bar slice: no caching, no
//! state carried between calls.

pub mod rsi;
pub mod sma;
pub mod volume;

pub use rsi::{latest_rsi, rsi, RSI_PERIOD};
pub use sma::{latest_sma, sma};
pub use volume::{avg_volume, high_52w, AVG_VOLUME_PERIOD};

use crate::types::{BarSeries, IndicatorSnapshot};

/// Compute the latest indicator values for a series.
pub fn snapshot(series: &BarSeries) -> IndicatorSnapshot {
    let bars = series.bars();
    IndicatorSnapshot {
        sma_20: latest_sma(bars, 20),
        sma_50: latest_sma(bars, 50),
        sma_200: latest_sma(bars, 200),
        rsi_14: latest_rsi(bars, RSI_PERIOD),
        avg_volume_20: avg_volume(bars, AVG_VOLUME_PERIOD),
        high_52w: high_52w(bars),
    }
}

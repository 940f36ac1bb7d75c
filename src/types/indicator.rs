use serde::{Deserialize, Serialize};

/// Latest indicator values for one symbol.
///
/// Every field is `None` when the series is too short for it; nothing is
/// carried over between calls.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    pub rsi_14: Option<f64>,
    /// Mean volume of the trailing 20 bars (fewer if that is all there is).
    pub avg_volume_20: f64,
    /// Highest high over the supplied window.
    pub high_52w: f64,
}

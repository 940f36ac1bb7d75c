use super::PriceTier;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Composite momentum score for one symbol on one scan date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumScanRow {
    pub symbol: String,
    /// Composite score, 0-100.
    pub score: u8,
    pub price_score: u8,
    pub volume_score: u8,
    pub rsi_score: u8,
    pub trend_score: u8,
    pub price: f64,
    pub price_change_5d: f64,
    pub volume_ratio: f64,
    pub rsi_14: Option<f64>,
    pub above_sma_20: bool,
    pub price_tier: PriceTier,
}

/// Output of one momentum scan, sorted by score descending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomentumScanResult {
    pub scan_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub scans: Vec<MomentumScanRow>,
    pub errors: Vec<String>,
}

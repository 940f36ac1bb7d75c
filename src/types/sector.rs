use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Per-constituent returns inside a sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorStock {
    pub symbol: String,
    pub change_1w: f64,
    pub change_1m: f64,
}

/// Ranked sector performance for one scan date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorMomentumRow {
    pub sector: String,
    /// 1-based rank by average 1-week change.
    pub rank: usize,
    pub avg_change_1w: f64,
    pub avg_change_1m: f64,
    pub top_stocks: Vec<SectorStock>,
    /// Weakest first.
    pub bottom_stocks: Vec<SectorStock>,
    pub commentary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorMomentumResult {
    pub scan_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub sectors: Vec<SectorMomentumRow>,
    pub errors: Vec<String>,
}

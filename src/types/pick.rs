use super::{DataMap, PatternType};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickType {
    Daily,
}

/// A shortlisted symbol with the reasons it was chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPick {
    pub symbol: String,
    pub pick_type: PickType,
    /// 1..=3
    pub rank: usize,
    pub momentum_score: u8,
    pub patterns_detected: Vec<PatternType>,
    pub price: f64,
    pub volume_ratio: f64,
    pub percent_change: f64,
    pub rationale: String,
    pub signals: DataMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockPicksResult {
    pub pick_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub picks: Vec<StockPick>,
}

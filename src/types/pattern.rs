use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Free-form numeric details attached to an alert or insight.
pub type DataMap = BTreeMap<String, serde_json::Value>;

/// Chart pattern kinds produced by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    GoldenCross,
    DeathCross,
    Breakout,
    BullishEngulfing,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::GoldenCross => "golden_cross",
            PatternType::DeathCross => "death_cross",
            PatternType::Breakout => "breakout",
            PatternType::BullishEngulfing => "bullish_engulfing",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pattern detected on one bar of one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternAlert {
    pub symbol: String,
    pub pattern_type: PatternType,
    /// Scan label naming bar size and history, e.g. "1D-1Y".
    pub timeframe: String,
    pub pattern_date: NaiveDate,
    pub details: DataMap,
}

/// Output of one pattern scan run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternAlertsResult {
    pub scan_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub alerts: Vec<PatternAlert>,
    /// Symbols or batches that could not be scanned.
    pub errors: Vec<String>,
}

use super::DataMap;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    VolumeSpike,
    Breakout,
    SectorRotation,
    PatternMatch,
    MomentumLeader,
}

/// Human-readable observation derived from the day's stored rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketInsight {
    pub insight_type: InsightType,
    pub symbol: Option<String>,
    pub title: String,
    pub body: String,
    pub data: DataMap,
    /// Assignment order, 1 = highest.
    pub priority: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketInsightsResult {
    pub insight_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub insights: Vec<MarketInsight>,
}

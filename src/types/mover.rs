use super::PriceTier;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Which side of the movers feed a symbol came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoverDirection {
    Gainer,
    Loser,
}

impl MoverDirection {
    /// "up" for gainers, "down" for losers.
    pub fn verb(&self) -> &'static str {
        match self {
            MoverDirection::Gainer => "up",
            MoverDirection::Loser => "down",
        }
    }
}

/// One entry of the raw movers feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMover {
    pub symbol: String,
    pub percent_change: f64,
    #[serde(default)]
    pub change: f64,
    pub price: f64,
}

/// Raw gainers and losers as delivered by the movers feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMovers {
    #[serde(default)]
    pub gainers: Vec<RawMover>,
    #[serde(default)]
    pub losers: Vec<RawMover>,
}

impl RawMovers {
    /// All symbols, gainers first.
    pub fn symbols(&self) -> Vec<String> {
        self.gainers
            .iter()
            .chain(self.losers.iter())
            .map(|m| m.symbol.clone())
            .collect()
    }
}

/// A mover enriched with volume and 52-week-high context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartMover {
    pub symbol: String,
    pub direction: MoverDirection,
    pub percent_change: f64,
    pub price: f64,
    pub change: f64,
    pub volume: f64,
    pub avg_volume_20d: f64,
    pub volume_ratio: f64,
    pub high_52w: f64,
    /// Fractional distance below the 52-week high (1.0 when unknown).
    pub pct_from_52w_high: f64,
    pub unusual_volume: bool,
    pub near_52w_high: bool,
    pub price_tier: PriceTier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartMoversResult {
    pub scan_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub movers: Vec<SmartMover>,
    pub errors: Vec<String>,
}

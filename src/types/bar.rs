use crate::error::{AppError, Result};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One OHLCV observation for a symbol over a single session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Session open time, unix milliseconds.
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Calendar date (UTC) of this bar.
    pub fn date(&self) -> Option<NaiveDate> {
        DateTime::from_timestamp_millis(self.time).map(|dt| dt.date_naive())
    }

    /// Closed below its open.
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Closed above its open.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }
}

/// Chronological bars for one symbol.
///
/// Timestamps are strictly increasing; construction rejects anything else.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Build a series from bars that are already in order.
    ///
    /// Out-of-order or duplicate timestamps mean the upstream contract was
    /// broken, so this fails instead of repairing the data.
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return Err(AppError::MalformedReferenceData(
                "bar series has an empty symbol".to_string(),
            ));
        }

        if let Some(pos) = bars.windows(2).position(|w| w[1].time <= w[0].time) {
            return Err(AppError::MalformedReferenceData(format!(
                "{}: timestamps not strictly increasing at index {} ({} -> {})",
                symbol,
                pos + 1,
                bars[pos].time,
                bars[pos + 1].time
            )));
        }

        Ok(Self { symbol, bars })
    }

    /// Build a series from raw provider output: sorted by time, duplicate
    /// timestamps collapsed (the later bar wins).
    pub fn from_unsorted(symbol: impl Into<String>, mut bars: Vec<Bar>) -> Result<Self> {
        bars.sort_by_key(|b| b.time);
        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.time == bar.time => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Self::new(symbol, deduped)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Most recent bar.
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Percent change of the latest close versus the close `days_back`
    /// sessions earlier (start index clamped to the first bar).
    ///
    /// Returns 0 with fewer than two bars or a non-positive start price.
    pub fn pct_change(&self, days_back: usize) -> f64 {
        if self.bars.len() < 2 {
            return 0.0;
        }
        let end = self.bars.len() - 1;
        let start = end.saturating_sub(days_back);
        let start_price = self.bars[start].close;
        if start_price <= 0.0 {
            return 0.0;
        }
        (self.bars[end].close - start_price) / start_price * 100.0
    }
}

/// Bar series per symbol, ordered by symbol.
pub type BarsMap = BTreeMap<String, BarSeries>;

/// Bar size requested from the data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Day,
    Month,
}

impl Timeframe {
    /// Alpaca `timeframe` query value.
    pub fn as_alpaca(&self) -> &'static str {
        match self {
            Timeframe::Day => "1Day",
            Timeframe::Month => "1Month",
        }
    }
}

/// Coarse price bucket used for display and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTier {
    Penny,
    Small,
    Mid,
    Large,
}

impl PriceTier {
    /// Classify a price: under $5 penny, up to $20 small, up to $100 mid.
    pub fn from_price(price: f64) -> Self {
        if price < 5.0 {
            PriceTier::Penny
        } else if price <= 20.0 {
            PriceTier::Small
        } else if price <= 100.0 {
            PriceTier::Mid
        } else {
            PriceTier::Large
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceTier::Penny => "penny",
            PriceTier::Small => "small",
            PriceTier::Mid => "mid",
            PriceTier::Large => "large",
        }
    }
}

//! Market insights: rules-based plain-English observations built from the
//! day's movers, pattern alerts, sector ranks and momentum scans.
//!
//! Categories are emitted in a fixed order and priorities are handed out
//! as they go, so 1 is always the first volume spike (if any). The total is
//! truncated to [`MAX_INSIGHTS`] only after every category has run.

use crate::types::{
    DailySnapshot, DataMap, InsightType, MarketInsight, MarketInsightsResult, MomentumScanRow,
    PatternType, SectorMomentumRow,
};
use chrono::Utc;
use serde_json::json;

pub const MAX_INSIGHTS: usize = 15;

const MAX_VOLUME_SPIKES: usize = 3;
const MAX_BREAKOUTS: usize = 3;
const MAX_PATTERN_MATCHES: usize = 3;
const MAX_LEADING_SECTORS: usize = 2;
const MAX_LAGGING_SECTORS: usize = 1;
const MAX_MOMENTUM_LEADERS: usize = 3;

const PATTERN_NAMES: &[(&str, &str)] = &[
    ("golden_cross", "Golden Cross (50/200 SMA)"),
    ("death_cross", "Death Cross (50/200 SMA)"),
    ("bullish_engulfing", "Bullish Engulfing"),
    ("head_shoulder", "Head & Shoulders"),
    ("inverse_head_shoulder", "Inverse Head & Shoulders"),
    ("breakout", "Breakout"),
];

const PATTERN_EXPLAINERS: &[(&str, &str)] = &[
    (
        "golden_cross",
        "A golden cross occurs when the 50-day SMA crosses above the 200-day SMA, historically a bullish signal.",
    ),
    (
        "death_cross",
        "A death cross occurs when the 50-day SMA crosses below the 200-day SMA, often interpreted as bearish.",
    ),
    (
        "bullish_engulfing",
        "A bullish engulfing pattern shows buying pressure overtaking the prior day's selling, a potential reversal signal.",
    ),
    (
        "head_shoulder",
        "Head & shoulders is a reversal pattern suggesting a potential trend change.",
    ),
    (
        "inverse_head_shoulder",
        "An inverse head & shoulders suggests a potential bullish reversal from a downtrend.",
    ),
];

const GENERIC_EXPLAINER: &str = "Learn more about this pattern at learnstockmarket.online/patterns.";

/// Display name for a stored pattern type; unknown names have their
/// underscores replaced with spaces.
pub fn friendly_pattern_name(pattern_type: &str) -> String {
    PATTERN_NAMES
        .iter()
        .find(|(key, _)| *key == pattern_type)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| pattern_type.replace('_', " "))
}

/// One-sentence explainer, or a generic pointer for unknown types.
pub fn pattern_explainer(pattern_type: &str) -> &'static str {
    PATTERN_EXPLAINERS
        .iter()
        .find(|(key, _)| *key == pattern_type)
        .map(|(_, text)| *text)
        .unwrap_or(GENERIC_EXPLAINER)
}

/// Assigns priorities in push order.
struct InsightList {
    insights: Vec<MarketInsight>,
}

impl InsightList {
    fn new() -> Self {
        Self { insights: Vec::new() }
    }

    fn push(
        &mut self,
        insight_type: InsightType,
        symbol: Option<&str>,
        title: String,
        body: String,
        data: DataMap,
    ) {
        let priority = self.insights.len() + 1;
        self.insights.push(MarketInsight {
            insight_type,
            symbol: symbol.map(str::to_string),
            title,
            body,
            data,
            priority,
        });
    }
}

fn data(value: serde_json::Value) -> DataMap {
    match value {
        serde_json::Value::Object(map) => map.into_iter().collect(),
        _ => DataMap::new(),
    }
}

fn sector_data(row: &SectorMomentumRow) -> DataMap {
    data(json!({
        "sector": row.sector,
        "avg_change_1w": row.avg_change_1w,
        "rank": row.rank,
    }))
}

/// Build the day's insight list from a snapshot.
pub fn synthesize_insights(snapshot: &DailySnapshot) -> MarketInsightsResult {
    let mut list = InsightList::new();

    for m in snapshot
        .movers
        .iter()
        .filter(|m| m.unusual_volume)
        .take(MAX_VOLUME_SPIKES)
    {
        let near_high = if m.near_52w_high {
            " Trading near 52-week highs."
        } else {
            ""
        };
        list.push(
            InsightType::VolumeSpike,
            Some(&m.symbol),
            format!("{} surging on {}× volume", m.symbol, m.volume_ratio),
            format!(
                "{} is {} {:.1}% at ${} with {}× average volume.{}",
                m.symbol,
                m.direction.verb(),
                m.percent_change.abs(),
                m.price,
                m.volume_ratio,
                near_high
            ),
            data(json!({
                "percent_change": m.percent_change,
                "volume_ratio": m.volume_ratio,
                "price": m.price,
            })),
        );
    }

    for alert in snapshot
        .patterns
        .iter()
        .filter(|p| p.pattern_type == PatternType::Breakout)
        .take(MAX_BREAKOUTS)
    {
        let level = alert
            .details
            .get("breakout_level")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        list.push(
            InsightType::Breakout,
            Some(&alert.symbol),
            format!("{} broke above ${:.2} resistance", alert.symbol, level),
            format!(
                "{} closed above its 20-day high of ${:.2} with elevated volume, a potential breakout setup.",
                alert.symbol, level
            ),
            alert.details.clone(),
        );
    }

    for alert in snapshot
        .patterns
        .iter()
        .filter(|p| p.pattern_type != PatternType::Breakout)
        .take(MAX_PATTERN_MATCHES)
    {
        let key = alert.pattern_type.as_str();
        let friendly = friendly_pattern_name(key);
        list.push(
            InsightType::PatternMatch,
            Some(&alert.symbol),
            format!("{}: {} detected", alert.symbol, friendly),
            format!(
                "{} is showing a {} on the chart. {}",
                alert.symbol,
                friendly,
                pattern_explainer(key)
            ),
            alert.details.clone(),
        );
    }

    let total_sectors = snapshot.sectors.len();

    for row in snapshot
        .sectors
        .iter()
        .filter(|s| s.rank <= 3)
        .take(MAX_LEADING_SECTORS)
    {
        let body = if row.commentary.is_empty() {
            let names: Vec<&str> = row.top_stocks.iter().map(|s| s.symbol.as_str()).collect();
            format!(
                "{} averaged {}% this week. Top names: {}.",
                row.sector,
                row.avg_change_1w,
                names.join(", ")
            )
        } else {
            row.commentary.clone()
        };
        list.push(
            InsightType::SectorRotation,
            None,
            format!("{} leading the market this week", row.sector),
            body,
            sector_data(row),
        );
    }

    for row in snapshot
        .sectors
        .iter()
        .filter(|s| s.rank + 2 >= total_sectors)
        .take(MAX_LAGGING_SECTORS)
    {
        let body = if row.commentary.is_empty() {
            format!("{} averaged {}% this week.", row.sector, row.avg_change_1w)
        } else {
            row.commentary.clone()
        };
        list.push(
            InsightType::SectorRotation,
            None,
            format!("{} underperforming this week", row.sector),
            body,
            sector_data(row),
        );
    }

    // Highest scores first; ties keep snapshot order.
    let mut leaders: Vec<&MomentumScanRow> = snapshot.momentum.iter().collect();
    leaders.sort_by(|a, b| b.score.cmp(&a.score));
    for scan in leaders.into_iter().take(MAX_MOMENTUM_LEADERS) {
        let sign = if scan.price_change_5d >= 0.0 { "+" } else { "" };
        list.push(
            InsightType::MomentumLeader,
            Some(&scan.symbol),
            format!("{} momentum score: {}/100", scan.symbol, scan.score),
            format!(
                "{} at ${}: {}{}% over 5 days, {}× avg volume. One of the strongest momentum profiles today.",
                scan.symbol, scan.price, sign, scan.price_change_5d, scan.volume_ratio
            ),
            data(json!({
                "score": scan.score,
                "price_change_5d": scan.price_change_5d,
                "volume_ratio": scan.volume_ratio,
            })),
        );
    }

    let mut insights = list.insights;
    insights.truncate(MAX_INSIGHTS);

    MarketInsightsResult {
        insight_date: snapshot.date,
        generated_at: Utc::now(),
        insights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_friendly_names() {
        assert_eq!(friendly_pattern_name("golden_cross"), "Golden Cross (50/200 SMA)");
        assert_eq!(friendly_pattern_name("cup_and_handle"), "cup and handle");
        assert_eq!(pattern_explainer("breakout"), GENERIC_EXPLAINER);
        assert!(pattern_explainer("death_cross").starts_with("A death cross"));
    }

    #[test]
    fn test_empty_snapshot_yields_nothing() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let result = synthesize_insights(&DailySnapshot::empty(date));
        assert!(result.insights.is_empty());
        assert_eq!(result.insight_date, date);
    }
}

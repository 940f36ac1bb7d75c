//! Stock picks: selects up to three daily picks by cross-referencing the
//! stored movers, pattern alerts and momentum scans for one date.
//!
//! Selection criteria, applied in order:
//! 1. price >= $5
//! 2. volume ratio >= 1.5 unless the symbol is a mover
//! 3. momentum score >= 50 unless the symbol is a mover
//! 4. at least one detected pattern unless momentum score >= 70
//!
//! Survivors are ranked by momentum score plus a 10 point bonus for having
//! a pattern.

use crate::types::{
    DailySnapshot, DataMap, MomentumScanRow, PatternType, PickType, StockPick, StockPicksResult,
};
use chrono::Utc;
use serde_json::json;
use std::collections::{HashMap, HashSet};

pub const MAX_DAILY_PICKS: usize = 3;
pub const MIN_PRICE: f64 = 5.0;
pub const MIN_VOLUME_RATIO: f64 = 1.5;
pub const MIN_MOMENTUM_SCORE: u8 = 50;
/// Score that stands in for a detected pattern.
pub const STRONG_MOMENTUM_SCORE: u8 = 70;
const PATTERN_BONUS: u16 = 10;

/// Everything known about one symbol before filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct PickCandidate {
    pub symbol: String,
    pub is_mover: bool,
    /// Deduplicated, first-seen order.
    pub patterns: Vec<PatternType>,
    pub momentum_score: u8,
    pub price: f64,
    pub volume_ratio: f64,
    pub price_change_5d: f64,
    pub rsi_14: Option<f64>,
    pub has_momentum_row: bool,
}

impl PickCandidate {
    /// All four selection filters.
    pub fn passes_filters(&self) -> bool {
        if self.price < MIN_PRICE {
            return false;
        }
        if self.volume_ratio < MIN_VOLUME_RATIO && !self.is_mover {
            return false;
        }
        if self.momentum_score < MIN_MOMENTUM_SCORE && !self.is_mover {
            return false;
        }
        if self.patterns.is_empty() && self.momentum_score < STRONG_MOMENTUM_SCORE {
            return false;
        }
        true
    }

    fn rank_key(&self) -> u16 {
        let bonus = if self.patterns.is_empty() { 0 } else { PATTERN_BONUS };
        u16::from(self.momentum_score) + bonus
    }
}

/// Collect candidates: movers first, then momentum-only symbols, each in
/// the order they appear in the snapshot.
///
/// Momentum fields come from the momentum row. A mover without one falls
/// back to the mover's own price and volume ratio and has a score of 0.
pub fn gather_candidates(snapshot: &DailySnapshot) -> Vec<PickCandidate> {
    let mut patterns: HashMap<&str, Vec<PatternType>> = HashMap::new();
    for alert in &snapshot.patterns {
        let list = patterns.entry(alert.symbol.as_str()).or_default();
        if !list.contains(&alert.pattern_type) {
            list.push(alert.pattern_type);
        }
    }

    let mut scans: HashMap<&str, &MomentumScanRow> = HashMap::new();
    for row in &snapshot.momentum {
        scans.entry(row.symbol.as_str()).or_insert(row);
    }

    let mover_symbols: HashSet<&str> = snapshot.movers.iter().map(|m| m.symbol.as_str()).collect();

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for mover in &snapshot.movers {
        if !seen.insert(mover.symbol.as_str()) {
            continue;
        }
        let scan = scans.get(mover.symbol.as_str()).copied();
        candidates.push(PickCandidate {
            symbol: mover.symbol.clone(),
            is_mover: true,
            patterns: patterns.get(mover.symbol.as_str()).cloned().unwrap_or_default(),
            momentum_score: scan.map(|s| s.score).unwrap_or(0),
            price: scan.map(|s| s.price).unwrap_or(mover.price),
            volume_ratio: scan.map(|s| s.volume_ratio).unwrap_or(mover.volume_ratio),
            price_change_5d: scan.map(|s| s.price_change_5d).unwrap_or(0.0),
            rsi_14: scan.and_then(|s| s.rsi_14),
            has_momentum_row: scan.is_some(),
        });
    }

    for row in &snapshot.momentum {
        if !seen.insert(row.symbol.as_str()) {
            continue;
        }
        candidates.push(PickCandidate {
            symbol: row.symbol.clone(),
            is_mover: mover_symbols.contains(row.symbol.as_str()),
            patterns: patterns.get(row.symbol.as_str()).cloned().unwrap_or_default(),
            momentum_score: row.score,
            price: row.price,
            volume_ratio: row.volume_ratio,
            price_change_5d: row.price_change_5d,
            rsi_14: row.rsi_14,
            has_momentum_row: true,
        });
    }

    candidates
}

/// Build the rationale sentence: mover, patterns, score, % change, volume.
pub fn build_rationale(candidate: &PickCandidate) -> String {
    let mut parts = Vec::new();

    if candidate.is_mover {
        parts.push(format!("{} appeared as a top mover today", candidate.symbol));
    }

    if !candidate.patterns.is_empty() {
        let names: Vec<&str> = candidate.patterns.iter().map(|p| p.as_str()).collect();
        parts.push(format!("detected pattern(s): {}", names.join(", ")));
    }

    if candidate.momentum_score > 0 {
        parts.push(format!("momentum score {}/100", candidate.momentum_score));
    }

    if candidate.price_change_5d.abs() > 0.0 {
        let sign = if candidate.price_change_5d >= 0.0 { "+" } else { "" };
        parts.push(format!("{}{}% over 5 days", sign, candidate.price_change_5d));
    }

    if candidate.volume_ratio > MIN_VOLUME_RATIO {
        parts.push(format!("volume {}× average", candidate.volume_ratio));
    }

    if parts.is_empty() {
        format!("{} met multiple selection criteria.", candidate.symbol)
    } else {
        format!("{}.", parts.join("; "))
    }
}

fn build_signals(candidate: &PickCandidate) -> DataMap {
    let mut signals = DataMap::new();
    if candidate.is_mover {
        signals.insert("mover".to_string(), json!(true));
    }
    if !candidate.patterns.is_empty() {
        signals.insert("patterns".to_string(), json!(candidate.patterns));
    }
    if candidate.has_momentum_row {
        signals.insert(
            "momentum".to_string(),
            json!({ "score": candidate.momentum_score, "rsi": candidate.rsi_14 }),
        );
    }
    signals
}

/// Filter, rank and keep the top [`MAX_DAILY_PICKS`] candidates.
pub fn select_picks(snapshot: &DailySnapshot) -> StockPicksResult {
    let mut survivors: Vec<PickCandidate> = gather_candidates(snapshot)
        .into_iter()
        .filter(PickCandidate::passes_filters)
        .collect();

    survivors.sort_by(|a, b| b.rank_key().cmp(&a.rank_key()));

    let picks = survivors
        .into_iter()
        .take(MAX_DAILY_PICKS)
        .enumerate()
        .map(|(i, c)| StockPick {
            rationale: build_rationale(&c),
            signals: build_signals(&c),
            symbol: c.symbol,
            pick_type: PickType::Daily,
            rank: i + 1,
            momentum_score: c.momentum_score,
            patterns_detected: c.patterns,
            price: c.price,
            volume_ratio: c.volume_ratio,
            percent_change: c.price_change_5d,
        })
        .collect();

    StockPicksResult {
        pick_date: snapshot.date,
        generated_at: Utc::now(),
        picks,
    }
}

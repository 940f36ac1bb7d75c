//! Sector momentum: tracks the 11 GICS sectors through ten representative
//! stocks each, ranks them by average 1-week change and narrates the
//! leaders and laggards.

use crate::services::signals::round2;
use crate::types::{BarsMap, SectorMomentumResult, SectorMomentumRow, SectorStock};
use chrono::{NaiveDate, Utc};
use std::collections::HashSet;
use tracing::debug;

/// Static sector -> constituent table.
pub const SECTOR_MAP: &[(&str, &[&str])] = &[
    ("Technology", &["AAPL", "MSFT", "NVDA", "AVGO", "ADBE", "CRM", "INTC", "AMD", "CSCO", "ORCL"]),
    ("Healthcare", &["UNH", "JNJ", "LLY", "PFE", "ABBV", "MRK", "TMO", "ABT", "DHR", "AMGN"]),
    ("Financials", &["JPM", "BAC", "WFC", "GS", "MS", "BLK", "SCHW", "AXP", "C", "USB"]),
    ("Consumer Discretionary", &["AMZN", "TSLA", "HD", "MCD", "NKE", "LOW", "SBUX", "TJX", "BKNG", "CMG"]),
    ("Consumer Staples", &["PG", "KO", "PEP", "COST", "WMT", "PM", "MO", "CL", "MDLZ", "KHC"]),
    ("Energy", &["XOM", "CVX", "COP", "EOG", "SLB", "MPC", "PSX", "VLO", "OXY", "HES"]),
    ("Industrials", &["CAT", "DE", "UNP", "HON", "UPS", "BA", "RTX", "GE", "LMT", "MMM"]),
    ("Materials", &["LIN", "APD", "SHW", "ECL", "FCX", "NEM", "NUE", "DOW", "DD", "VMC"]),
    ("Real Estate", &["AMT", "PLD", "CCI", "EQIX", "PSA", "SPG", "DLR", "O", "WELL", "AVB"]),
    ("Utilities", &["NEE", "DUK", "SO", "D", "AEP", "EXC", "SRE", "XEL", "ED", "WEC"]),
    ("Communication Services", &["GOOG", "META", "NFLX", "DIS", "CMCSA", "VZ", "T", "TMUS", "CHTR", "EA"]),
];

/// Constituents need this many bars to count.
pub const MIN_SECTOR_BARS: usize = 5;
const WEEK_BARS: usize = 5;
const MONTH_BARS: usize = 21;
const DRIVER_COUNT: usize = 3;

/// Sector a symbol belongs to, if it is in the table.
pub fn sector_for(symbol: &str) -> Option<&'static str> {
    SECTOR_MAP
        .iter()
        .find(|(_, symbols)| symbols.contains(&symbol))
        .map(|(sector, _)| *sector)
}

/// Every constituent symbol, deduplicated, in table order.
pub fn all_sector_symbols() -> Vec<String> {
    let mut seen = HashSet::new();
    SECTOR_MAP
        .iter()
        .flat_map(|(_, symbols)| symbols.iter())
        .filter(|s| seen.insert(**s))
        .map(|s| s.to_string())
        .collect()
}

/// Rank sectors from a static table and the available bars.
///
/// Constituents with fewer than [`MIN_SECTOR_BARS`] bars are skipped and a
/// sector with no usable constituents is left out entirely, so ranks always
/// run 1..=K over the sectors that remain.
pub fn rank_sectors(
    table: &[(&str, &[&str])],
    bars: &BarsMap,
    scan_date: NaiveDate,
) -> SectorMomentumResult {
    let mut sectors = Vec::with_capacity(table.len());

    for (sector, symbols) in table {
        let mut stocks: Vec<SectorStock> = symbols
            .iter()
            .filter_map(|sym| bars.get(*sym))
            .filter(|series| series.len() >= MIN_SECTOR_BARS)
            .map(|series| SectorStock {
                symbol: series.symbol().to_string(),
                change_1w: round2(series.pct_change(WEEK_BARS)),
                change_1m: round2(series.pct_change(MONTH_BARS)),
            })
            .collect();

        if stocks.is_empty() {
            debug!("Sector {} has no usable constituents, dropping", sector);
            continue;
        }

        let count = stocks.len() as f64;
        let avg_change_1w = round2(stocks.iter().map(|s| s.change_1w).sum::<f64>() / count);
        let avg_change_1m = round2(stocks.iter().map(|s| s.change_1m).sum::<f64>() / count);

        stocks.sort_by(|a, b| b.change_1w.total_cmp(&a.change_1w));
        let top_stocks = stocks.iter().take(DRIVER_COUNT).cloned().collect();
        let bottom_stocks = stocks.iter().rev().take(DRIVER_COUNT).cloned().collect();

        sectors.push(SectorMomentumRow {
            sector: sector.to_string(),
            rank: 0,
            avg_change_1w,
            avg_change_1m,
            top_stocks,
            bottom_stocks,
            commentary: String::new(),
        });
    }

    sectors.sort_by(|a, b| b.avg_change_1w.total_cmp(&a.avg_change_1w));
    let total = sectors.len();
    for (i, row) in sectors.iter_mut().enumerate() {
        row.rank = i + 1;
        row.commentary = commentary(row, total);
    }

    SectorMomentumResult {
        scan_date,
        generated_at: Utc::now(),
        sectors,
        errors: Vec::new(),
    }
}

/// [`rank_sectors`] over the built-in [`SECTOR_MAP`].
pub fn sector_momentum(bars: &BarsMap, scan_date: NaiveDate) -> SectorMomentumResult {
    rank_sectors(SECTOR_MAP, bars, scan_date)
}

/// Templated sentence keyed by where the rank falls.
pub fn commentary(row: &SectorMomentumRow, total: usize) -> String {
    if row.rank <= 3 {
        let direction = if row.avg_change_1w >= 0.0 { "up" } else { "down" };
        return format!(
            "{} is a top performer this week ({} {}%). Leading names: {}.",
            row.sector,
            direction,
            row.avg_change_1w.abs(),
            join_symbols(&row.top_stocks)
        );
    }
    if row.rank + 2 >= total {
        return format!(
            "{} is underperforming this week ({}%). Weakest: {}.",
            row.sector,
            row.avg_change_1w,
            join_symbols(&row.bottom_stocks)
        );
    }
    format!("{} is mid-pack this week ({}%).", row.sector, row.avg_change_1w)
}

fn join_symbols(stocks: &[SectorStock]) -> String {
    stocks
        .iter()
        .map(|s| s.symbol.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

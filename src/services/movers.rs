//! Smart movers: enriches the raw gainers/losers feed with volume analysis,
//! 52-week high proximity and price tier.
//!
//! The movers list is fixed by the feed, so every input row comes back out,
//! even when no bars are available for it.

use crate::services::signals::indicators::{avg_volume, high_52w, AVG_VOLUME_PERIOD};
use crate::services::signals::{round2, round4};
use crate::types::{
    BarSeries, BarsMap, MoverDirection, PriceTier, RawMover, RawMovers, SmartMover,
    SmartMoversResult,
};
use chrono::{NaiveDate, Utc};
use tracing::debug;

/// Volume at or above this multiple of the 20-bar average is unusual.
pub const VOLUME_UNUSUAL_THRESHOLD: f64 = 2.0;
/// Within this fraction of the 52-week high counts as "near".
pub const NEAR_52W_HIGH_PCT: f64 = 0.05;

/// Enrich one mover against its (possibly missing) bar series.
pub fn enrich_mover(mover: &RawMover, direction: MoverDirection, series: Option<&BarSeries>) -> SmartMover {
    let bars = series.map(|s| s.bars()).unwrap_or(&[]);
    if bars.is_empty() {
        debug!("No bars for mover {}, emitting zeroed fields", mover.symbol);
    }

    let avg_vol = avg_volume(bars, AVG_VOLUME_PERIOD).round();
    let high = high_52w(bars);
    let current_vol = bars.last().map(|b| b.volume).unwrap_or(0.0);
    let volume_ratio = if avg_vol > 0.0 {
        round2(current_vol / avg_vol)
    } else {
        0.0
    };
    let pct_from_52w_high = if high > 0.0 {
        round4((high - mover.price) / high)
    } else {
        1.0
    };

    SmartMover {
        symbol: mover.symbol.clone(),
        direction,
        percent_change: mover.percent_change,
        price: mover.price,
        change: mover.change,
        volume: current_vol,
        avg_volume_20d: avg_vol,
        volume_ratio,
        high_52w: high,
        pct_from_52w_high,
        unusual_volume: volume_ratio >= VOLUME_UNUSUAL_THRESHOLD,
        near_52w_high: pct_from_52w_high <= NEAR_52W_HIGH_PCT,
        price_tier: PriceTier::from_price(mover.price),
    }
}

/// Enrich the whole feed: gainers first, then losers, each in feed order.
pub fn enrich_movers(raw: &RawMovers, bars: &BarsMap, scan_date: NaiveDate) -> SmartMoversResult {
    let gainers = raw
        .gainers
        .iter()
        .map(|m| enrich_mover(m, MoverDirection::Gainer, bars.get(&m.symbol)));
    let losers = raw
        .losers
        .iter()
        .map(|m| enrich_mover(m, MoverDirection::Loser, bars.get(&m.symbol)));

    SmartMoversResult {
        scan_date,
        generated_at: Utc::now(),
        movers: gainers.chain(losers).collect(),
        errors: Vec::new(),
    }
}

use crate::types::{BarSeries, Timeframe};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Thread-safe TTL cache of fetched bar series, keyed by symbol, bar size
/// and history length.
///
/// Entries are shared as `Arc<BarSeries>` so a pipeline run can hand the
/// same series to several jobs without copying.
pub struct BarCache {
    data: DashMap<CacheKey, CacheEntry>,
    ttl: Duration,
}

type CacheKey = (String, Timeframe, u32);

struct CacheEntry {
    series: Arc<BarSeries>,
    expires_at: Instant,
}

impl BarCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            data: DashMap::new(),
            ttl,
        }
    }

    /// Cached `timeframe` series for `symbol` fetched with `days` of history.
    pub fn get(&self, symbol: &str, timeframe: Timeframe, days: u32) -> Option<Arc<BarSeries>> {
        let key = (symbol.to_string(), timeframe, days);
        let entry = self.data.get(&key)?;
        if entry.expires_at > Instant::now() {
            Some(Arc::clone(&entry.series))
        } else {
            drop(entry);
            self.data.remove(&key);
            None
        }
    }

    pub fn insert(&self, series: BarSeries, timeframe: Timeframe, days: u32) -> Arc<BarSeries> {
        let series = Arc::new(series);
        self.data.insert(
            (series.symbol().to_string(), timeframe, days),
            CacheEntry {
                series: Arc::clone(&series),
                expires_at: Instant::now() + self.ttl,
            },
        );
        series
    }

    /// Split `symbols` into cached series and symbols that still need a fetch.
    pub fn partition(
        &self,
        symbols: &[String],
        timeframe: Timeframe,
        days: u32,
    ) -> (Vec<Arc<BarSeries>>, Vec<String>) {
        let mut hits = Vec::new();
        let mut misses = Vec::new();
        for symbol in symbols {
            match self.get(symbol, timeframe, days) {
                Some(series) => hits.push(series),
                None => misses.push(symbol.clone()),
            }
        }
        (hits, misses)
    }

    /// Remove all expired entries.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.data.retain(|_, entry| entry.expires_at > now);
    }

    /// Number of entries (including expired).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

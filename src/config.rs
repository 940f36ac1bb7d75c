use crate::services::sectors::all_sector_symbols;
use std::env;
use std::time::Duration;

/// Alpaca credentials and endpoint.
#[derive(Debug, Clone)]
pub struct AlpacaConfig {
    pub api_key: String,
    pub api_secret: String,
    /// Overrides the public data endpoint (e.g. a sandbox).
    pub data_url: Option<String>,
}

/// Batch sizes and pacing for bar fetches.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Symbols per request in the pattern job.
    pub pattern_batch_size: usize,
    /// Symbols per request in the momentum job.
    pub momentum_batch_size: usize,
    /// Pause between batches.
    pub delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            pattern_batch_size: 50,
            momentum_batch_size: 100,
            delay: Duration::from_millis(3000),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Unset when either key is missing; jobs that fetch data refuse to run.
    pub alpaca: Option<AlpacaConfig>,
    pub database_path: String,
    pub batch: BatchConfig,
    /// TTL of cached bar series.
    pub bar_cache_ttl: Duration,
    /// Gainers and losers requested from the movers feed (1-50).
    pub movers_top: u32,
    /// Rows older than this many days are removed by `cleanup`.
    pub retention_days: u32,
    /// Universe for the pattern and momentum jobs.
    pub scan_symbols: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let alpaca = match (env::var("ALPACA_API_KEY"), env::var("ALPACA_API_SECRET")) {
            (Ok(api_key), Ok(api_secret)) if !api_key.is_empty() && !api_secret.is_empty() => {
                Some(AlpacaConfig {
                    api_key,
                    api_secret,
                    data_url: env::var("ALPACA_DATA_URL").ok().filter(|u| !u.is_empty()),
                })
            }
            _ => None,
        };

        let defaults = BatchConfig::default();
        let batch = BatchConfig {
            pattern_batch_size: env::var("PATTERN_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.pattern_batch_size),
            momentum_batch_size: env::var("MOMENTUM_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.momentum_batch_size),
            delay: env::var("BATCH_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.delay),
        };

        let scan_symbols = env::var("SCAN_SYMBOLS")
            .ok()
            .map(|s| parse_symbol_list(&s))
            .filter(|list| !list.is_empty())
            .unwrap_or_else(all_sector_symbols);

        Self {
            alpaca,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "data/stockpulse.db".to_string()),
            batch,
            bar_cache_ttl: Duration::from_secs(
                env::var("BAR_CACHE_TTL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(3600),
            ),
            movers_top: env::var("MOVERS_TOP")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            retention_days: env::var("RETENTION_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(90),
            scan_symbols,
        }
    }
}

/// Split a comma-separated ticker list, trimming and upper-casing, keeping
/// first occurrences only.
pub fn parse_symbol_list(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for symbol in raw.split(',').map(|s| s.trim().to_uppercase()) {
        if !symbol.is_empty() && !out.contains(&symbol) {
            out.push(symbol);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbol_list() {
        assert_eq!(
            parse_symbol_list(" aapl, MSFT,,nvda ,AAPL"),
            vec!["AAPL".to_string(), "MSFT".to_string(), "NVDA".to_string()]
        );
        assert!(parse_symbol_list(" , ").is_empty());
    }

    #[test]
    fn test_batch_defaults() {
        let batch = BatchConfig::default();
        assert_eq!(batch.pattern_batch_size, 50);
        assert_eq!(batch.momentum_batch_size, 100);
        assert_eq!(batch.delay, Duration::from_millis(3000));
    }
}

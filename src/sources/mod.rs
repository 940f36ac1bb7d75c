//! Market data collaborators.
//!
//! Scoring code never talks to the network; it receives a [`BarsMap`] built
//! here. Fetching happens in capped batches with a pause in between so
//! upstream rate limits hold, and a failed batch only costs its own symbols.

pub mod alpaca;

pub use alpaca::AlpacaClient;

use crate::error::{AppError, Result};
use crate::types::{BarsMap, RawMovers, Timeframe};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

/// Source of daily or monthly bar series.
#[async_trait]
pub trait BarProvider: Send + Sync {
    /// Bars of size `timeframe` for each symbol covering roughly the last
    /// `days` calendar days.
    ///
    /// Symbols the provider has no data for are simply absent from the map.
    async fn fetch_bars(
        &self,
        symbols: &[String],
        timeframe: Timeframe,
        days: u32,
    ) -> Result<BarsMap>;
}

/// Source of the day's top gainers and losers.
#[async_trait]
pub trait MoverProvider: Send + Sync {
    async fn fetch_movers(&self, top: u32) -> Result<RawMovers>;
}

/// Fetch bars for `symbols` in batches of `batch_size`, sleeping `delay`
/// between batches (never after the last one).
///
/// Each failed batch adds one entry to the returned error list and the
/// remaining batches still run.
pub async fn fetch_in_batches<P: BarProvider + ?Sized>(
    provider: &P,
    symbols: &[String],
    batch_size: usize,
    delay: Duration,
    timeframe: Timeframe,
    days: u32,
) -> (BarsMap, Vec<String>) {
    let mut bars = BarsMap::new();
    let mut errors = Vec::new();

    if symbols.is_empty() {
        return (bars, errors);
    }

    let batch_size = batch_size.max(1);
    let total = symbols.len().div_ceil(batch_size);

    for (i, batch) in symbols.chunks(batch_size).enumerate() {
        info!("Batch {}/{} ({} symbols)", i + 1, total, batch.len());

        match provider.fetch_bars(batch, timeframe, days).await {
            Ok(fetched) => bars.extend(fetched),
            Err(e) => {
                let failure =
                    AppError::UpstreamBatchFailure(format!("batch {}/{}: {}", i + 1, total, e));
                warn!("{}", failure);
                errors.push(failure.to_string());
            }
        }

        if i + 1 < total && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    (bars, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Bar, BarSeries};
    use std::sync::Mutex;

    struct MockProvider {
        fail_batch: Option<usize>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl MockProvider {
        fn new(fail_batch: Option<usize>) -> Self {
            Self {
                fail_batch,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl BarProvider for MockProvider {
        async fn fetch_bars(
            &self,
            symbols: &[String],
            _timeframe: Timeframe,
            _days: u32,
        ) -> Result<BarsMap> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(symbols.to_vec());
            if Some(calls.len()) == self.fail_batch {
                return Err(AppError::ExternalApi("HTTP 429".to_string()));
            }
            let mut map = BarsMap::new();
            for symbol in symbols {
                let bar = Bar {
                    time: 0,
                    open: 1.0,
                    high: 1.0,
                    low: 1.0,
                    close: 1.0,
                    volume: 1.0,
                };
                map.insert(symbol.clone(), BarSeries::new(symbol.as_str(), vec![bar])?);
            }
            Ok(map)
        }
    }

    fn symbols(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("S{:02}", i)).collect()
    }

    #[tokio::test]
    async fn test_batches_are_capped() {
        let provider = MockProvider::new(None);
        let (bars, errors) =
            fetch_in_batches(&provider, &symbols(7), 3, Duration::ZERO, Timeframe::Day, 30)
                .await;
        assert_eq!(bars.len(), 7);
        assert!(errors.is_empty());
        let sizes: Vec<usize> = provider.calls.lock().unwrap().iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
    }

    #[tokio::test]
    async fn test_failed_batch_does_not_abort() {
        let provider = MockProvider::new(Some(2));
        let (bars, errors) =
            fetch_in_batches(&provider, &symbols(7), 3, Duration::ZERO, Timeframe::Day, 30)
                .await;
        assert_eq!(bars.len(), 4);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("batch 2/3"));
        assert!(errors[0].contains("HTTP 429"));
    }

    #[tokio::test]
    async fn test_empty_symbol_list() {
        let provider = MockProvider::new(None);
        let (bars, errors) =
            fetch_in_batches(&provider, &[], 50, Duration::ZERO, Timeframe::Day, 30)
                .await;
        assert!(bars.is_empty());
        assert!(errors.is_empty());
        assert!(provider.calls.lock().unwrap().is_empty());
    }
}

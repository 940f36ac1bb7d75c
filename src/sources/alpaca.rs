//! Alpaca Market Data API client for daily and monthly bars and the movers
//! screener.
//!
//! Bars come from `/v2/stocks/bars` (multi-symbol, paginated with
//! `page_token`); movers from `/v1beta1/screener/stocks/movers`.

use super::{BarProvider, MoverProvider};
use crate::error::{AppError, Result};
use crate::types::{Bar, BarSeries, BarsMap, RawMovers, Timeframe};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};

pub const ALPACA_DATA_URL: &str = "https://data.alpaca.markets";

const MAX_LIMIT: usize = 10_000;
const BARS_PER_SYMBOL: usize = 500;
const MAX_MOVERS_TOP: u32 = 50;

/// One bar as returned by Alpaca.
#[derive(Debug, Clone, Deserialize)]
pub struct AlpacaBar {
    #[serde(rename = "t")]
    pub timestamp: String,
    #[serde(rename = "o", default)]
    pub open: f64,
    #[serde(rename = "h", default)]
    pub high: f64,
    #[serde(rename = "l", default)]
    pub low: f64,
    #[serde(rename = "c", default)]
    pub close: f64,
    #[serde(rename = "v", default)]
    pub volume: f64,
}

impl AlpacaBar {
    fn to_bar(&self) -> Option<Bar> {
        let time = DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()?
            .timestamp_millis();
        Some(Bar {
            time,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        })
    }
}

#[derive(Debug, Deserialize)]
struct BarsResponse {
    #[serde(default)]
    bars: Option<HashMap<String, Vec<AlpacaBar>>>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Alpaca REST client.
pub struct AlpacaClient {
    client: Client,
    api_key: String,
    api_secret: String,
    base_url: String,
}

impl AlpacaClient {
    pub fn new(api_key: String, api_secret: String, base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| ALPACA_DATA_URL.to_string());
        Self {
            client: Client::new(),
            api_key,
            api_secret,
            base_url,
        }
    }

    /// Request window ending yesterday; free plans reject same-day SIP data.
    pub fn date_window(today: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
        let end = today - Duration::days(1);
        let start = end - Duration::days(i64::from(days));
        (start, end)
    }

    /// Page size for a multi-symbol request.
    pub fn page_limit(symbol_count: usize) -> usize {
        (symbol_count * BARS_PER_SYMBOL).min(MAX_LIMIT)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .header("APCA-API-KEY-ID", &self.api_key)
            .header("APCA-API-SECRET-KEY", &self.api_secret)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Alpaca {} returned {}: {}",
                path, status, body
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Parse error: {}", e)))
    }
}

/// Turn accumulated raw bars into validated series.
///
/// Bars with an unparseable timestamp are dropped; so is a symbol whose
/// series still fails validation.
pub fn build_series(raw: HashMap<String, Vec<AlpacaBar>>) -> BarsMap {
    let mut out = BarsMap::new();
    for (symbol, list) in raw {
        let bars: Vec<Bar> = list.iter().filter_map(AlpacaBar::to_bar).collect();
        if bars.len() < list.len() {
            debug!("{}: dropped {} bars with bad timestamps", symbol, list.len() - bars.len());
        }
        match BarSeries::from_unsorted(symbol.as_str(), bars) {
            Ok(series) => {
                out.insert(symbol, series);
            }
            Err(e) => warn!("Discarding bars for {}: {}", symbol, e),
        }
    }
    out
}

#[async_trait]
impl BarProvider for AlpacaClient {
    async fn fetch_bars(
        &self,
        symbols: &[String],
        timeframe: Timeframe,
        days: u32,
    ) -> Result<BarsMap> {
        if symbols.is_empty() {
            return Ok(BarsMap::new());
        }

        let (start, end) = Self::date_window(Utc::now().date_naive(), days);
        let base_query = vec![
            ("symbols", symbols.join(",")),
            ("timeframe", timeframe.as_alpaca().to_string()),
            ("start", start.format("%Y-%m-%d").to_string()),
            ("end", end.format("%Y-%m-%d").to_string()),
            ("limit", Self::page_limit(symbols.len()).to_string()),
            ("adjustment", "split".to_string()),
        ];

        let mut raw: HashMap<String, Vec<AlpacaBar>> = HashMap::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut query = base_query.clone();
            if let Some(token) = &page_token {
                query.push(("page_token", token.clone()));
            }

            let page: BarsResponse = self.get_json("/v2/stocks/bars", &query).await?;
            pages += 1;

            for (symbol, bars) in page.bars.unwrap_or_default() {
                raw.entry(symbol).or_default().extend(bars);
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(
            "Fetched {} bars for {}/{} symbols in {} page(s)",
            timeframe.as_alpaca(),
            raw.len(),
            symbols.len(),
            pages
        );
        Ok(build_series(raw))
    }
}

#[async_trait]
impl MoverProvider for AlpacaClient {
    async fn fetch_movers(&self, top: u32) -> Result<RawMovers> {
        let top = top.clamp(1, MAX_MOVERS_TOP);
        self.get_json("/v1beta1/screener/stocks/movers", &[("top", top.to_string())])
            .await
    }
}

//! Daily OHLCV retrieval
//!
//! `YahooChartClient` talks to the public chart endpoint. Dates are requested
//! as `[start 00:00 UTC, end 00:00 UTC)`, so `end` is exclusive.

use crate::error::{AppError, Result};
use crate::models::{Ohlcv, OhlcvSeries};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Source of daily bars
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch daily bars for `[start, end)`; an empty series means no data
    async fn fetch_daily(&self, ticker: &str, start: NaiveDate, end: NaiveDate)
        -> Result<OhlcvSeries>;

    /// Provider name for logs
    fn provider(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Option<ChartIndicators>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

/// Client for the Yahoo Finance v8 chart endpoint
pub struct YahooChartClient {
    base_url: Url,
    client: reqwest::Client,
}

impl YahooChartClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - Chart endpoint (e.g., "https://query1.finance.yahoo.com/v8/finance/chart")
    pub fn new(base_url: &str) -> Result<Self> {
        let raw = base_url.trim().trim_end_matches('/');

        if !raw.starts_with("http://") && !raw.starts_with("https://") {
            return Err(AppError::Config(format!(
                "Invalid market data URL: must start with http:// or https://, got: '{}'",
                raw
            )));
        }
        let base_url = Url::parse(raw)
            .map_err(|e| AppError::Config(format!("Invalid market data URL '{}': {}", raw, e)))?;

        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Network(format!("Failed to create HTTP client: {}", e)))?;

        debug!("Created YahooChartClient: base_url='{}'", base_url);

        Ok(Self { base_url, client })
    }

    /// Ticker goes in as one percent-encoded path segment
    fn history_url(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Config(format!("Market data URL cannot take a path: {}", self.base_url)))?
            .pop_if_empty()
            .push(ticker);
        url.query_pairs_mut()
            .clear()
            .append_pair("period1", &midnight_utc(start).to_string())
            .append_pair("period2", &midnight_utc(end).to_string())
            .append_pair("interval", "1d")
            .append_pair("events", "history");
        Ok(url)
    }
}

fn midnight_utc(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

#[async_trait]
impl MarketDataProvider for YahooChartClient {
    #[instrument(skip(self))]
    async fn fetch_daily(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<OhlcvSeries> {
        let url = self.history_url(ticker, start, end)?;
        debug!("Fetching daily bars: url={}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            AppError::Network(format!("Market data request failed for {}: {}", ticker, e))
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Network(format!("Failed to read response body: {}", e)))?;

        if status == reqwest::StatusCode::NOT_FOUND {
            warn!("Provider has no chart for {} (404)", ticker);
            return Ok(OhlcvSeries::new(ticker, Vec::new()));
        }
        if !status.is_success() {
            return Err(AppError::Network(format!(
                "Market data API returned error status {} for {}: {}",
                status, ticker, body
            )));
        }

        let bars = parse_chart_response(&body)?;
        let series = OhlcvSeries::new(ticker, bars);
        info!(
            "Fetched {} daily bars for {} ({} → {})",
            series.len(),
            ticker,
            start,
            end
        );
        Ok(series)
    }

    fn provider(&self) -> &str {
        "yahoo"
    }
}

/// Parse a chart payload into bars
///
/// A provider-reported error or a result without rows yields no bars. Rows
/// with any missing OHLC field are dropped; a missing volume counts as zero.
pub fn parse_chart_response(body: &str) -> Result<Vec<Ohlcv>> {
    let response: ChartResponse = serde_json::from_str(body)
        .map_err(|e| AppError::Parse(format!("Failed to parse chart response: {}", e)))?;

    if let Some(error) = response.chart.error {
        warn!("Provider error {}: {}", error.code, error.description);
        return Ok(Vec::new());
    }

    let Some(data) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let timestamps = data.timestamp.unwrap_or_default();
    let quote = data
        .indicators
        .and_then(|i| i.quote.into_iter().next())
        .unwrap_or_default();

    let length = timestamps.len();
    if [quote.open.len(), quote.high.len(), quote.low.len(), quote.close.len()]
        .iter()
        .any(|&len| len != length)
    {
        return Err(AppError::Parse("Inconsistent array lengths in chart response".to_string()));
    }

    let mut bars = Vec::with_capacity(length);
    for (i, &timestamp) in timestamps.iter().enumerate() {
        let (Some(open), Some(high), Some(low), Some(close)) =
            (quote.open[i], quote.high[i], quote.low[i], quote.close[i])
        else {
            debug!("Skipping incomplete bar at index {}", i);
            continue;
        };

        let local = DateTime::<Utc>::from_timestamp(timestamp + data.meta.gmtoffset, 0)
            .ok_or_else(|| AppError::Parse(format!("Invalid timestamp {} at index {}", timestamp, i)))?;
        let volume = quote
            .volume
            .get(i)
            .copied()
            .flatten()
            .map(|v| v.max(0.0) as u64)
            .unwrap_or(0);

        bars.push(Ohlcv::new(local.date_naive(), open, high, low, close, volume));
    }

    Ok(bars)
}

//! Session cache of fetched series
//!
//! Replaces process-global state: one explicit object, created by a fetch,
//! replaced wholesale by the next fetch, read by the analysis pass.

use crate::error::Result;
use crate::models::{AnalysisRequest, OhlcvSeries};
use crate::services::market_data::MarketDataProvider;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Ordered ticker → series map; only non-empty series are held
#[derive(Debug, Clone, Default)]
pub struct SessionCache {
    series: Vec<OhlcvSeries>,
}

pub type SharedSession = Arc<RwLock<SessionCache>>;

/// Outcome of one fetch action
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchReport {
    /// Tickers stored, in input order
    pub fetched: Vec<String>,
    /// Tickers the provider returned no rows for
    pub skipped: Vec<String>,
}

impl FetchReport {
    /// "Stock data fetched successfully for: A, B"
    pub fn success_message(&self) -> String {
        format!("Stock data fetched successfully for: {}", self.fetched.join(", "))
    }

    /// One "No data found for X" line per skipped ticker
    pub fn warnings(&self) -> Vec<String> {
        self.skipped
            .iter()
            .map(|ticker| format!("No data found for {}", ticker))
            .collect()
    }
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch every requested ticker into a fresh cache
    ///
    /// Empty results are skipped with a warning. A provider error aborts the
    /// batch and leaves `self` untouched.
    pub async fn refresh(
        &mut self,
        provider: &dyn MarketDataProvider,
        request: &AnalysisRequest,
    ) -> Result<FetchReport> {
        request.validate()?;

        let mut fresh = SessionCache::new();
        let mut report = FetchReport::default();

        for ticker in &request.tickers {
            let series = provider
                .fetch_daily(ticker, request.start, request.end)
                .await?;

            if series.is_empty() {
                warn!("No data found for {} via {}", ticker, provider.provider());
                report.skipped.push(ticker.clone());
            } else {
                report.fetched.push(ticker.clone());
                fresh.insert(series);
            }
        }

        info!(
            "Session refreshed: {} fetched, {} skipped",
            report.fetched.len(),
            report.skipped.len()
        );
        *self = fresh;
        Ok(report)
    }

    /// Insert or replace a series; empty series are ignored
    pub fn insert(&mut self, series: OhlcvSeries) {
        if series.is_empty() {
            return;
        }
        match self.series.iter_mut().find(|s| s.ticker() == series.ticker()) {
            Some(existing) => *existing = series,
            None => self.series.push(series),
        }
    }

    pub fn get(&self, ticker: &str) -> Option<&OhlcvSeries> {
        self.series.iter().find(|s| s.ticker() == ticker)
    }

    /// Tickers in tab order
    pub fn tickers(&self) -> Vec<String> {
        self.series.iter().map(|s| s.ticker().to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OhlcvSeries> {
        self.series.iter()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn clear(&mut self) {
        self.series.clear();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::Ohlcv;
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-process provider: tickers map to bar counts, unknown tickers fail
    pub(crate) struct FakeProvider {
        pub bars: HashMap<String, usize>,
        pub calls: AtomicUsize,
    }

    impl FakeProvider {
        pub(crate) fn new(entries: &[(&str, usize)]) -> Self {
            Self {
                bars: entries.iter().map(|(t, n)| (t.to_string(), *n)).collect(),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    pub(crate) fn make_series(ticker: &str, count: usize) -> OhlcvSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = (0..count)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.3).sin() * 4.0 + i as f64 * 0.05;
                let open = close - (i as f64 * 0.9).cos();
                Ohlcv::new(
                    start + Duration::days(i as i64),
                    open,
                    close.max(open) + 1.0,
                    close.min(open) - 1.0,
                    close,
                    1_000_000 + i as u64 * 10,
                )
            })
            .collect();
        OhlcvSeries::new(ticker, bars)
    }

    #[async_trait]
    impl MarketDataProvider for FakeProvider {
        async fn fetch_daily(&self, ticker: &str, _start: NaiveDate, _end: NaiveDate) -> Result<OhlcvSeries> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.bars.get(ticker) {
                Some(&count) => Ok(make_series(ticker, count)),
                None => Err(AppError::Network(format!("connection reset for {}", ticker))),
            }
        }

        fn provider(&self) -> &str {
            "fake"
        }
    }

    fn request(tickers: &str) -> AnalysisRequest {
        AnalysisRequest::new(
            tickers,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            vec![],
        )
    }

    #[tokio::test]
    async fn test_refresh_skips_empty_tickers() {
        let provider = FakeProvider::new(&[("AAPL", 30), ("ZZZZ", 0), ("MSFT", 25)]);
        let mut session = SessionCache::new();

        let report = session.refresh(&provider, &request("aapl, zzzz, msft")).await.unwrap();

        assert_eq!(report.fetched, vec!["AAPL", "MSFT"]);
        assert_eq!(report.skipped, vec!["ZZZZ"]);
        assert_eq!(session.tickers(), vec!["AAPL", "MSFT"]);
        assert!(session.get("ZZZZ").is_none());
        assert!(session.iter().all(|s| !s.is_empty()));
        assert_eq!(report.warnings(), vec!["No data found for ZZZZ"]);
        assert_eq!(
            report.success_message(),
            "Stock data fetched successfully for: AAPL, MSFT"
        );
    }

    #[tokio::test]
    async fn test_refresh_replaces_previous_session() {
        let provider = FakeProvider::new(&[("AAPL", 30), ("MSFT", 25)]);
        let mut session = SessionCache::new();

        session.refresh(&provider, &request("AAPL")).await.unwrap();
        session.refresh(&provider, &request("MSFT")).await.unwrap();

        assert_eq!(session.tickers(), vec!["MSFT"]);
    }

    #[tokio::test]
    async fn test_provider_error_keeps_previous_session() {
        let provider = FakeProvider::new(&[("AAPL", 30)]);
        let mut session = SessionCache::new();
        session.refresh(&provider, &request("AAPL")).await.unwrap();

        let result = session.refresh(&provider, &request("AAPL, BROKEN")).await;

        assert!(matches!(result, Err(AppError::Network(_))));
        assert_eq!(session.tickers(), vec!["AAPL"]);
    }

    #[tokio::test]
    async fn test_refresh_rejects_invalid_request() {
        let provider = FakeProvider::new(&[]);
        let mut session = SessionCache::new();
        assert!(matches!(
            session.refresh(&provider, &request(" , ")).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_insert_ignores_empty_and_replaces_existing() {
        let mut session = SessionCache::new();
        session.insert(make_series("AAPL", 0));
        assert!(session.is_empty());

        session.insert(make_series("AAPL", 10));
        session.insert(make_series("AAPL", 12));
        assert_eq!(session.len(), 1);
        assert_eq!(session.get("AAPL").unwrap().len(), 12);

        session.clear();
        assert!(session.is_empty());
    }
}

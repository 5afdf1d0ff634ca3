use super::Indicator;
use crate::constants::{DEFAULT_LOOKBACK_DAYS, DEFAULT_TICKERS};
use crate::error::{AppError, Result};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Split a comma-separated ticker input into normalized symbols
///
/// Trims, uppercases, drops empties and repeated symbols (first wins).
pub fn parse_tickers(input: &str) -> Vec<String> {
    let mut tickers: Vec<String> = Vec::new();
    for ticker in input.split(',').map(|t| t.trim().to_uppercase()) {
        if !ticker.is_empty() && !tickers.contains(&ticker) {
            tickers.push(ticker);
        }
    }
    tickers
}

/// User selection driving one fetch + analysis pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Normalized ticker symbols, in input order
    pub tickers: Vec<String>,

    /// First date requested
    pub start: NaiveDate,

    /// End date (exclusive, provider convention)
    pub end: NaiveDate,

    /// Indicators to draw, in selection order
    pub indicators: Vec<Indicator>,
}

impl Default for AnalysisRequest {
    fn default() -> Self {
        let end = Utc::now().date_naive();
        Self {
            tickers: parse_tickers(DEFAULT_TICKERS),
            start: end - Duration::days(DEFAULT_LOOKBACK_DAYS),
            end,
            indicators: vec![Indicator::Sma20],
        }
    }
}

impl AnalysisRequest {
    /// Create a request from raw ticker input
    pub fn new(
        tickers_input: &str,
        start: NaiveDate,
        end: NaiveDate,
        indicators: Vec<Indicator>,
    ) -> Self {
        Self {
            tickers: parse_tickers(tickers_input),
            start,
            end,
            indicators,
        }
    }

    /// Reject selections that cannot produce data
    pub fn validate(&self) -> Result<()> {
        if self.tickers.is_empty() {
            return Err(AppError::InvalidInput(
                "Enter at least one stock ticker".to_string(),
            ));
        }
        if self.start >= self.end {
            return Err(AppError::InvalidInput(format!(
                "Start date {} must be before end date {}",
                self.start, self.end
            )));
        }
        Ok(())
    }

    /// Tickers joined for display in the input box
    pub fn tickers_input(&self) -> String {
        self.tickers.join(", ")
    }
}

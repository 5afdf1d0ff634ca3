use super::Ohlcv;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily bar history for one ticker, indexed by strictly increasing date
///
/// Immutable once built: indicator values are computed alongside as
/// overlays and never written back into the bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvSeries {
    ticker: String,
    bars: Vec<Ohlcv>,
}

impl OhlcvSeries {
    /// Build a series, sorting by date and keeping the last bar for a repeated date
    pub fn new(ticker: impl Into<String>, mut bars: Vec<Ohlcv>) -> Self {
        bars.sort_by_key(|b| b.date);
        let mut deduped: Vec<Ohlcv> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Self {
            ticker: ticker.into(),
            bars: deduped,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[Ohlcv] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Closing prices in date order
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Volumes in date order
    pub fn volumes(&self) -> Vec<u64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV (Open, High, Low, Close, Volume) bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ohlcv {
    /// Trading date (exchange local)
    pub date: NaiveDate,

    /// Opening price
    pub open: f64,

    /// Highest price
    pub high: f64,

    /// Lowest price
    pub low: f64,

    /// Closing price
    pub close: f64,

    /// Trading volume
    pub volume: u64,
}

impl Ohlcv {
    /// Create a new OHLCV bar
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Close at or above open
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }
}

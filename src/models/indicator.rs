//! Selectable technical indicators
//!
//! Every advertised option is computed and drawn.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    /// 20-day simple moving average of close
    #[serde(alias = "sma")]
    Sma20,

    /// 20-span exponential moving average of close
    #[serde(alias = "ema")]
    Ema20,

    /// 14-period relative strength index (oscillator pane)
    Rsi,

    /// 12/26/9 MACD (oscillator pane)
    Macd,

    /// 20-day Bollinger bands, two standard deviations
    #[serde(alias = "bb", alias = "bollinger")]
    Bb20,

    /// Running volume-weighted average price
    Vwap,
}

/// Where an indicator is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    /// Shares the price axis with the candles
    Price,
    /// Own axis beneath the price pane
    Oscillator,
}

impl Indicator {
    /// All indicators in dashboard order
    pub fn all() -> Vec<Indicator> {
        vec![
            Indicator::Sma20,
            Indicator::Ema20,
            Indicator::Rsi,
            Indicator::Macd,
            Indicator::Bb20,
            Indicator::Vwap,
        ]
    }

    /// Dashboard label
    pub fn label(&self) -> &'static str {
        match self {
            Indicator::Sma20 => "20-Day SMA",
            Indicator::Ema20 => "20-Day EMA",
            Indicator::Rsi => "RSI",
            Indicator::Macd => "MACD",
            Indicator::Bb20 => "20-Day Bollinger Bands",
            Indicator::Vwap => "VWAP",
        }
    }

    /// Short code used in query strings and CLI flags
    pub fn as_str(&self) -> &'static str {
        match self {
            Indicator::Sma20 => "sma20",
            Indicator::Ema20 => "ema20",
            Indicator::Rsi => "rsi",
            Indicator::Macd => "macd",
            Indicator::Bb20 => "bb20",
            Indicator::Vwap => "vwap",
        }
    }

    pub fn pane(&self) -> Pane {
        match self {
            Indicator::Rsi | Indicator::Macd => Pane::Oscillator,
            _ => Pane::Price,
        }
    }

    /// Parse from short code or dashboard label (case-insensitive)
    pub fn from_str(s: &str) -> Result<Self, String> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match normalized.as_str() {
            "sma20" | "sma" | "20daysma" => Ok(Indicator::Sma20),
            "ema20" | "ema" | "20dayema" => Ok(Indicator::Ema20),
            "rsi" => Ok(Indicator::Rsi),
            "macd" => Ok(Indicator::Macd),
            "bb20" | "bb" | "bollinger" | "bollingerbands" | "20daybollingerbands" => {
                Ok(Indicator::Bb20)
            }
            "vwap" => Ok(Indicator::Vwap),
            _ => Err(format!(
                "Invalid indicator: '{}'. Valid values: sma20, ema20, rsi, macd, bb20, vwap",
                s
            )),
        }
    }

    /// Parse a comma-separated list, keeping first-seen order
    pub fn parse_list(s: &str) -> Result<Vec<Self>, String> {
        let mut indicators = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let indicator = Indicator::from_str(part)?;
            if !indicators.contains(&indicator) {
                indicators.push(indicator);
            }
        }
        Ok(indicators)
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_from_str() {
        assert_eq!(Indicator::from_str("sma20").unwrap(), Indicator::Sma20);
        assert_eq!(Indicator::from_str("20-Day SMA").unwrap(), Indicator::Sma20);
        assert_eq!(Indicator::from_str("20-Day EMA").unwrap(), Indicator::Ema20);
        assert_eq!(Indicator::from_str("RSI").unwrap(), Indicator::Rsi);
        assert_eq!(Indicator::from_str("macd").unwrap(), Indicator::Macd);
        assert_eq!(
            Indicator::from_str("20-Day Bollinger Bands").unwrap(),
            Indicator::Bb20
        );
        assert_eq!(Indicator::from_str("VWAP").unwrap(), Indicator::Vwap);
        assert!(Indicator::from_str("stochastic").is_err());
    }

    #[test]
    fn test_labels_round_trip() {
        for indicator in Indicator::all() {
            assert_eq!(Indicator::from_str(indicator.label()).unwrap(), indicator);
            assert_eq!(Indicator::from_str(indicator.as_str()).unwrap(), indicator);
        }
    }

    #[test]
    fn test_parse_list_dedupes() {
        let list = Indicator::parse_list("sma20, rsi,SMA20,, vwap").unwrap();
        assert_eq!(list, vec![Indicator::Sma20, Indicator::Rsi, Indicator::Vwap]);
    }

    #[test]
    fn test_panes() {
        assert_eq!(Indicator::Rsi.pane(), Pane::Oscillator);
        assert_eq!(Indicator::Macd.pane(), Pane::Oscillator);
        assert_eq!(Indicator::Bb20.pane(), Pane::Price);
    }

    #[test]
    fn test_indicator_deserialize() {
        let bb: Indicator = serde_json::from_str(r#""bollinger""#).unwrap();
        assert_eq!(bb, Indicator::Bb20);
        let sma: Indicator = serde_json::from_str(r#""sma20""#).unwrap();
        assert_eq!(sma, Indicator::Sma20);
    }
}

use crate::constants::{
    API_KEY_ENV, DEFAULT_MARKET_DATA_URL, DEFAULT_MODEL_BASE_URL, DEFAULT_MODEL_NAME, DEFAULT_PORT,
};
use chrono::NaiveDate;
use std::path::PathBuf;

/// Initialise the tracing subscriber (RUST_LOG overrides the `info` default)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .try_init();
}

/// Get model-provider API key from environment (not validated here)
pub fn get_api_key() -> Option<String> {
    std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty())
}

/// Get model name from environment variable or use default
pub fn get_model_name() -> String {
    std::env::var("TRADERAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL_NAME.to_string())
}

/// Get model REST base from environment variable or use default
pub fn get_model_base_url() -> String {
    std::env::var("TRADERAI_MODEL_BASE_URL").unwrap_or_else(|_| DEFAULT_MODEL_BASE_URL.to_string())
}

/// Get market data endpoint from environment variable or use default
pub fn get_market_data_url() -> String {
    std::env::var("TRADERAI_MARKET_DATA_URL")
        .unwrap_or_else(|_| DEFAULT_MARKET_DATA_URL.to_string())
}

/// Get dashboard port from environment variable or use default
pub fn get_port() -> u16 {
    std::env::var("TRADERAI_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Get chart export directory from environment variable or use the OS temp dir
pub fn get_temp_dir() -> PathBuf {
    std::env::var("TRADERAI_TEMP_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir())
}

/// Parse a YYYY-MM-DD date
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{}': {} (expected YYYY-MM-DD)", value, e))
}

/// Format a date as YYYY-MM-DD
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format a price with two decimals
pub fn format_price(price: f64) -> String {
    format!("{:.2}", price)
}

/// Format an integer with thousands separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-03-15").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
        assert!(parse_date("15/03/2024").is_err());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(12345678), "12,345,678");
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(189.456), "189.46");
    }
}

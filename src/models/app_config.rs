use crate::services::chart::ChartConfig;
use crate::utils;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for fetch, chart export and model calls
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Model name (e.g., "gemini-2.5-flash")
    pub model_name: String,

    /// Model REST base URL
    pub model_base_url: String,

    /// Model API key; absence surfaces as a provider auth failure
    pub api_key: Option<String>,

    /// Daily chart endpoint of the market data provider
    pub market_data_url: String,

    /// Dashboard port
    pub port: u16,

    /// Directory holding the scoped chart export file
    pub temp_dir: PathBuf,

    /// Model request timeout (none by default)
    pub model_timeout: Option<Duration>,

    /// Chart geometry and colours
    pub chart: ChartConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_name: crate::constants::DEFAULT_MODEL_NAME.to_string(),
            model_base_url: crate::constants::DEFAULT_MODEL_BASE_URL.to_string(),
            api_key: None,
            market_data_url: crate::constants::DEFAULT_MARKET_DATA_URL.to_string(),
            port: crate::constants::DEFAULT_PORT,
            temp_dir: std::env::temp_dir(),
            model_timeout: None,
            chart: ChartConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            model_name: utils::get_model_name(),
            model_base_url: utils::get_model_base_url(),
            api_key: utils::get_api_key(),
            market_data_url: utils::get_market_data_url(),
            port: utils::get_port(),
            temp_dir: utils::get_temp_dir(),
            model_timeout: std::env::var("TRADERAI_MODEL_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs),
            chart: ChartConfig::default(),
        }
    }

    /// Override the dashboard port
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.model_name, "gemini-2.5-flash");
        assert_eq!(config.port, 8501);
        assert!(config.api_key.is_none());
        assert!(config.model_timeout.is_none());
    }

    #[test]
    fn test_with_port() {
        let config = AppConfig::default().with_port(Some(9000));
        assert_eq!(config.port, 9000);
        let config = config.with_port(None);
        assert_eq!(config.port, 9000);
    }
}

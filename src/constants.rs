//! Analysis Constants
//!
//! Lookback windows, model defaults and dashboard labels shared across the
//! fetch, chart and recommendation stages.

/// Lookback window for the 20-day SMA, EMA span and Bollinger band window
pub const TREND_WINDOW: usize = 20;

/// Bollinger band width in standard deviations
pub const BOLLINGER_K: f64 = 2.0;

/// RSI lookback (Wilder)
pub const RSI_PERIOD: usize = 14;

/// MACD fast / slow / signal spans
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// RSI overbought / oversold guide levels drawn in the oscillator pane
pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const RSI_OVERSOLD: f64 = 30.0;

/// Default generative model
pub const DEFAULT_MODEL_NAME: &str = "gemini-2.5-flash";

/// Default generative model REST base
pub const DEFAULT_MODEL_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default market data endpoint (daily chart API)
pub const DEFAULT_MARKET_DATA_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Environment variable holding the model-provider API key
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Default ticker input shown in the dashboard
pub const DEFAULT_TICKERS: &str = "AAPL, MSFT, GOOGL";

/// Default date range length (days back from today)
pub const DEFAULT_LOOKBACK_DAYS: i64 = 365;

/// Default dashboard port
pub const DEFAULT_PORT: u16 = 8501;

/// Leading tab of the dashboard
pub const SUMMARY_TAB: &str = "Overall Summary";

/// Shown in the summary table when the model omits `action`
pub const MISSING_ACTION: &str = "N/A";

/// Shown in a ticker tab when the model omits `justification`
pub const MISSING_JUSTIFICATION: &str = "No justification provided.";

/// Shown when the session holds no data yet
pub const EMPTY_SESSION_HINT: &str = "Enter stock tickers and click 'Fetch Data' to begin analysis.";

/// MIME type of the chart raster sent to the model
pub const CHART_MIME_TYPE: &str = "image/png";

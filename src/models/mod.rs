mod app_config;
mod indicator;
mod ohlcv;
mod recommendation;
mod selection;
mod series;
pub mod indicators;

pub use app_config::AppConfig;
pub use indicator::{Indicator, Pane};
pub use indicators::Overlay;
pub use ohlcv::Ohlcv;
pub use recommendation::{Action, Recommendation, SummaryRow};
pub use selection::{parse_tickers, AnalysisRequest};
pub use series::OhlcvSeries;

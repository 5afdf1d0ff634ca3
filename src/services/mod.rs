pub mod analysis;
pub mod chart;
pub mod market_data;
pub mod model_client;
pub mod recommendation;
pub mod session;

pub use analysis::{analyze_session, analyze_ticker, DashboardReport, TickerReport};
pub use chart::{ChartArtifact, ChartConfig, ChartRenderer};
pub use market_data::{MarketDataProvider, YahooChartClient};
pub use model_client::{ContentPart, GeminiClient, GenerativeModel};
pub use recommendation::{EngineError, RecommendationEngine};
pub use session::{FetchReport, SessionCache, SharedSession};

pub mod api;
pub mod dashboard;

use crate::error::{AppError, Result};
use crate::models::{AnalysisRequest, Indicator};
use crate::services::{ChartRenderer, MarketDataProvider, RecommendationEngine, SharedSession};
use crate::utils::parse_date;
use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub session: SharedSession,
    pub provider: Arc<dyn MarketDataProvider>,
    pub renderer: Arc<ChartRenderer>,
    pub engine: RecommendationEngine,
}

impl FromRef<AppState> for SharedSession {
    fn from_ref(app_state: &AppState) -> SharedSession {
        app_state.session.clone()
    }
}

/// Sidebar selection as submitted by the form or carried in the query string
///
/// `indicators` may repeat (`indicators=sma20&indicators=vwap`).
#[derive(Debug, Default, Deserialize)]
pub struct SelectionParams {
    pub tickers: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    #[serde(default)]
    pub indicators: Vec<String>,
}

impl SelectionParams {
    /// Merge with defaults; a selection without tickers is a fresh page load
    pub fn into_request(self) -> Result<AnalysisRequest> {
        let mut request = AnalysisRequest::default();

        let fresh = self.tickers.is_none();
        if let Some(tickers) = self.tickers {
            request = AnalysisRequest::new(&tickers, request.start, request.end, Vec::new());
        }
        if let Some(start) = self.start.filter(|s| !s.trim().is_empty()) {
            request.start = parse_date(&start).map_err(AppError::InvalidInput)?;
        }
        if let Some(end) = self.end.filter(|s| !s.trim().is_empty()) {
            request.end = parse_date(&end).map_err(AppError::InvalidInput)?;
        }
        if !fresh {
            request.indicators = self
                .indicators
                .iter()
                .map(|s| Indicator::from_str(s))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(AppError::InvalidInput)?;
        }

        Ok(request)
    }
}

/// Build the router with all routes and request tracing
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard::index_handler))
        .route("/fetch", post(dashboard::fetch_handler))
        .route("/api/summary", get(api::summary_handler))
        .route("/health", get(api::health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the axum server
pub async fn serve(state: AppState, port: u16) -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Starting traderai dashboard");
    tracing::info!("Registering routes:");
    tracing::info!("  GET  /?tickers=AAPL,MSFT&start=2024-01-01&end=2025-01-01&indicators=sma20");
    tracing::info!("  POST /fetch");
    tracing::info!("  GET  /api/summary");
    tracing::info!("  GET  /health");

    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::services::chart::ChartConfig;
    use crate::services::recommendation::tests::MockModel;
    use crate::services::session::tests::FakeProvider;
    use crate::services::SessionCache;
    use chrono::{NaiveDate, Utc};
    use tokio::sync::RwLock;

    pub(crate) fn test_state(dir: &std::path::Path, reply: &str) -> AppState {
        let provider = Arc::new(FakeProvider::new(&[("AAPL", 40), ("MSFT", 40), ("ZZZZ", 0)]));
        test_state_with_provider(dir, reply, provider)
    }

    pub(crate) fn test_state_with_provider(
        dir: &std::path::Path,
        reply: &str,
        provider: Arc<FakeProvider>,
    ) -> AppState {
        let config = ChartConfig {
            width: 320,
            height: 200,
            ..ChartConfig::default()
        };
        AppState {
            session: Arc::new(RwLock::new(SessionCache::new())),
            provider,
            renderer: Arc::new(ChartRenderer::new(config, dir)),
            engine: RecommendationEngine::new(Arc::new(MockModel::replying(reply))),
        }
    }

    #[test]
    fn test_fresh_selection_uses_defaults() {
        let request = SelectionParams::default().into_request().unwrap();
        assert_eq!(request.tickers, vec!["AAPL", "MSFT", "GOOGL"]);
        assert_eq!(request.indicators, vec![Indicator::Sma20]);
        assert_eq!(request.end, Utc::now().date_naive());
        assert_eq!((request.end - request.start).num_days(), 365);
    }

    #[test]
    fn test_submitted_selection() {
        let params = SelectionParams {
            tickers: Some("nvda, tsla".to_string()),
            start: Some("2024-01-01".to_string()),
            end: Some("2024-06-30".to_string()),
            indicators: vec!["ema20".to_string(), "Bollinger Bands".to_string()],
        };
        let request = params.into_request().unwrap();
        assert_eq!(request.tickers, vec!["NVDA", "TSLA"]);
        assert_eq!(request.start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(request.end, NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
        assert_eq!(request.indicators, vec![Indicator::Ema20, Indicator::Bb20]);
    }

    #[test]
    fn test_submitted_selection_without_indicators() {
        let params = SelectionParams {
            tickers: Some("AAPL".to_string()),
            ..SelectionParams::default()
        };
        assert!(params.into_request().unwrap().indicators.is_empty());
    }

    #[test]
    fn test_bad_date_rejected() {
        let params = SelectionParams {
            tickers: Some("AAPL".to_string()),
            start: Some("01/02/2024".to_string()),
            ..SelectionParams::default()
        };
        assert!(matches!(params.into_request(), Err(AppError::InvalidInput(_))));
    }
}

pub mod analyze;
pub mod fetch;
pub mod serve;

use crate::error::{AppError, Result};
use crate::models::{AnalysisRequest, AppConfig, Indicator};
use crate::services::{ChartRenderer, GeminiClient, RecommendationEngine, YahooChartClient};
use crate::utils::parse_date;
use std::sync::Arc;

/// Build a selection from CLI flags, falling back to the dashboard defaults
pub fn build_request(
    tickers: Option<&str>,
    start: Option<&str>,
    end: Option<&str>,
    indicators: Option<&str>,
) -> Result<AnalysisRequest> {
    let mut request = AnalysisRequest::default();
    if let Some(tickers) = tickers {
        request = AnalysisRequest::new(tickers, request.start, request.end, request.indicators);
    }
    if let Some(start) = start {
        request.start = parse_date(start).map_err(AppError::InvalidInput)?;
    }
    if let Some(end) = end {
        request.end = parse_date(end).map_err(AppError::InvalidInput)?;
    }
    if let Some(indicators) = indicators {
        request.indicators = Indicator::parse_list(indicators).map_err(AppError::InvalidInput)?;
    }
    request.validate()?;
    Ok(request)
}

pub fn build_provider(config: &AppConfig) -> Result<Arc<YahooChartClient>> {
    Ok(Arc::new(YahooChartClient::new(&config.market_data_url)?))
}

pub fn build_renderer(config: &AppConfig) -> ChartRenderer {
    ChartRenderer::new(config.chart.clone(), config.temp_dir.clone())
}

pub fn build_engine(config: &AppConfig) -> Result<RecommendationEngine> {
    let client = GeminiClient::new(
        config.api_key.clone(),
        &config.model_base_url,
        &config.model_name,
        config.model_timeout,
    )?;
    Ok(RecommendationEngine::new(Arc::new(client)))
}

//! Per-ticker analysis pass: chart, then model verdict

use crate::models::{Indicator, OhlcvSeries, Recommendation, SummaryRow};
use crate::services::chart::{ChartArtifact, ChartRenderer};
use crate::services::recommendation::{EngineError, RecommendationEngine};
use crate::services::session::SessionCache;
use serde::Serialize;
use tracing::{info, warn};

/// Everything the dashboard shows for one ticker
#[derive(Debug, Clone)]
pub struct TickerReport {
    pub ticker: String,
    /// `None` when rendering failed
    pub chart: Option<ChartArtifact>,
    pub recommendation: Recommendation,
}

impl TickerReport {
    pub fn summary_row(&self) -> SummaryRow {
        SummaryRow {
            stock: self.ticker.clone(),
            recommendation: self.recommendation.action_label().to_string(),
        }
    }
}

/// Reports for every ticker in the session, in session order
#[derive(Debug, Clone, Default)]
pub struct DashboardReport {
    pub reports: Vec<TickerReport>,
}

#[derive(Serialize)]
struct SummaryPayload<'a> {
    rows: &'a [SummaryRow],
}

impl DashboardReport {
    pub fn summary(&self) -> Vec<SummaryRow> {
        self.reports.iter().map(TickerReport::summary_row).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// `{"rows": [{"Stock": .., "Recommendation": ..}]}`
    pub fn summary_json(&self) -> serde_json::Value {
        let rows = self.summary();
        serde_json::to_value(SummaryPayload { rows: &rows }).unwrap_or_default()
    }
}

/// Render one series and hand the PNG to the engine
pub async fn analyze_ticker(
    series: &OhlcvSeries,
    indicators: &[Indicator],
    renderer: &ChartRenderer,
    engine: &RecommendationEngine,
) -> TickerReport {
    let ticker = series.ticker().to_string();

    match renderer.render(series, indicators) {
        Ok(chart) => {
            let recommendation = engine.recommend(&ticker, &chart).await;
            TickerReport {
                ticker,
                chart: Some(chart),
                recommendation,
            }
        }
        Err(e) => {
            warn!("Chart rendering failed for {}: {}", ticker, e);
            TickerReport {
                ticker,
                chart: None,
                recommendation: EngineError::Unexpected(e.to_string()).into(),
            }
        }
    }
}

/// Analyze every cached series, one at a time
pub async fn analyze_session(
    session: &SessionCache,
    indicators: &[Indicator],
    renderer: &ChartRenderer,
    engine: &RecommendationEngine,
) -> DashboardReport {
    let mut reports = Vec::with_capacity(session.len());
    for series in session.iter() {
        reports.push(analyze_ticker(series, indicators, renderer, engine).await);
    }

    info!(
        "Analysis pass complete: {} tickers, {} errors",
        reports.len(),
        reports.iter().filter(|r| r.recommendation.is_error()).count()
    );
    DashboardReport { reports }
}

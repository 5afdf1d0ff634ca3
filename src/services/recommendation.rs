//! Chart-to-verdict recommendation engine

use crate::constants::CHART_MIME_TYPE;
use crate::models::{Action, Recommendation};
use crate::services::chart::ChartArtifact;
use crate::services::model_client::{ContentPart, GenerativeModel};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Why a model call produced no usable verdict
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// No `{` in the response text
    Format,
    /// The brace span is not valid JSON
    Decode(String),
    /// Transport, provider or any other failure
    Unexpected(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Format => write!(f, "Value Error: Invalid JSON response"),
            EngineError::Decode(detail) => write!(f, "JSON Parsing Error: {}", detail),
            EngineError::Unexpected(detail) => write!(f, "Unexpected Error: {}", detail),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<EngineError> for Recommendation {
    fn from(err: EngineError) -> Self {
        Recommendation::error(err.to_string())
    }
}

/// Fixed trading instruction for one ticker
pub fn build_prompt(ticker: &str) -> String {
    format!(
        "You are a Stock Trader specialist in Technical Analysis at a top financial institution.\
         Analyze the stock data for {ticker} based on its candlestick chart and the displayed technical indicators.\
         Provide a detailed justification for your analysis, explain what patterns, signals, and trends you observe.\
         Then, based solely on the chart, provide a recommendation from the following options:\
         1. Strong Buy\
         2. Buy\
         3. Weak Buy\
         4. Hold\
         5. Sell\
         6. Strong Sell\
         Return your output as a JSON object with two keys: 'action' and 'justification'."
    )
}

/// Span from the first `{` to the last `}`, inclusive
///
/// With no `}` after the opening brace the span runs to the end of the text,
/// so an unterminated object surfaces as a decode failure.
pub fn extract_json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    match text.rfind('}') {
        Some(end) if end > start => Some(&text[start..=end]),
        _ => Some(&text[start..]),
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Parse raw model text into a verdict
///
/// Surrounding prose and code fences are ignored. Missing keys stay `None`.
pub fn parse_response(text: &str) -> Result<Recommendation, EngineError> {
    let span = extract_json_span(text).ok_or(EngineError::Format)?;

    let object: Map<String, Value> =
        serde_json::from_str(span).map_err(|e| EngineError::Decode(e.to_string()))?;

    let action = object
        .get("action")
        .and_then(value_text)
        .map(|text| Action::parse(&text));
    let justification = object.get("justification").and_then(value_text);

    Ok(Recommendation {
        action,
        justification,
    })
}

/// Sends the chart with the fixed prompt and interprets the reply
#[derive(Clone)]
pub struct RecommendationEngine {
    model: Arc<dyn GenerativeModel>,
}

impl RecommendationEngine {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    /// Verdict for one ticker; failures come back as an `error` verdict
    #[instrument(skip(self, chart), fields(model = %self.model.model_name()))]
    pub async fn recommend(&self, ticker: &str, chart: &ChartArtifact) -> Recommendation {
        match self.try_recommend(ticker, chart).await {
            Ok(recommendation) => {
                info!("{}: {}", ticker, recommendation.action_label());
                recommendation
            }
            Err(err) => {
                warn!("Recommendation failed for {}: {}", ticker, err);
                err.into()
            }
        }
    }

    async fn try_recommend(
        &self,
        ticker: &str,
        chart: &ChartArtifact,
    ) -> Result<Recommendation, EngineError> {
        let parts = [
            ContentPart::Text(build_prompt(ticker)),
            ContentPart::InlineImage {
                mime_type: CHART_MIME_TYPE.to_string(),
                data: chart.png.clone(),
            },
        ];

        let text = self
            .model
            .generate(&parts)
            .await
            .map_err(|e| EngineError::Unexpected(e.to_string()))?;

        parse_response(&text)
    }
}

use crate::server::{AppState, SelectionParams};
use crate::services::{analyze_session, SharedSession};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use axum_extra::extract::Query;
use serde_json::json;
use tracing::{debug, instrument};

/// GET /api/summary : `{"rows": [{"Stock": .., "Recommendation": ..}]}`
///
/// Runs a fresh analysis pass over the cached session.
#[instrument(skip(state))]
pub async fn summary_handler(
    State(state): State<AppState>,
    Query(params): Query<SelectionParams>,
) -> impl IntoResponse {
    let request = match params.into_request() {
        Ok(request) => request,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() })))
                .into_response();
        }
    };

    let snapshot = state.session.read().await.clone();
    let report = analyze_session(&snapshot, &request.indicators, &state.renderer, &state.engine).await;
    Json(report.summary_json()).into_response()
}

/// GET /health
pub async fn health_handler(State(session): State<SharedSession>) -> impl IntoResponse {
    debug!("Received request for health");
    let session = session.read().await;
    Json(json!({
        "status": "ok",
        "tickers": session.tickers(),
    }))
}

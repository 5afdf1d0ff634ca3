//! HTML dashboard: sidebar form, summary tab, one tab per ticker

use crate::constants::{EMPTY_SESSION_HINT, SUMMARY_TAB};
use crate::models::{AnalysisRequest, Indicator};
use crate::server::{AppState, SelectionParams};
use crate::services::{analyze_session, DashboardReport, SessionCache};
use axum::{extract::State, response::Html};
use axum_extra::extract::{Form, Query};
use std::fmt::Write as _;
use tracing::{info, instrument, warn};

/// Status line shown above the results
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Success(String),
    Warning(String),
    Error(String),
}

impl Notice {
    fn class(&self) -> &'static str {
        match self {
            Notice::Success(_) => "success",
            Notice::Warning(_) => "warning",
            Notice::Error(_) => "error",
        }
    }

    fn text(&self) -> &str {
        match self {
            Notice::Success(t) | Notice::Warning(t) | Notice::Error(t) => t,
        }
    }
}

/// GET / : re-run the analysis pass over the cached session
#[instrument(skip(state))]
pub async fn index_handler(
    State(state): State<AppState>,
    Query(params): Query<SelectionParams>,
) -> Html<String> {
    let (request, notices) = match params.into_request() {
        Ok(request) => (request, Vec::new()),
        Err(e) => (AnalysisRequest::default(), vec![Notice::Error(e.to_string())]),
    };

    let snapshot = state.session.read().await.clone();
    Html(render_with_analysis(&state, &snapshot, &request, notices).await)
}

/// POST /fetch : refresh the session, then render as GET / would
#[instrument(skip(state))]
pub async fn fetch_handler(
    State(state): State<AppState>,
    Form(params): Form<SelectionParams>,
) -> Html<String> {
    let request = match params.into_request() {
        Ok(request) => request,
        Err(e) => {
            let snapshot = state.session.read().await.clone();
            let notices = vec![Notice::Error(e.to_string())];
            return Html(
                render_with_analysis(&state, &snapshot, &AnalysisRequest::default(), notices).await,
            );
        }
    };

    let mut notices = Vec::new();
    let mut fresh = SessionCache::new();
    match fresh.refresh(state.provider.as_ref(), &request).await {
        Ok(report) => {
            info!("Fetch action stored {} tickers", report.fetched.len());
            notices.extend(report.warnings().into_iter().map(Notice::Warning));
            notices.push(Notice::Success(report.success_message()));
            *state.session.write().await = fresh.clone();
        }
        Err(e) => {
            warn!("Fetch action failed: {}", e);
            notices.push(Notice::Error(e.to_string()));
            fresh = state.session.read().await.clone();
        }
    }

    Html(render_with_analysis(&state, &fresh, &request, notices).await)
}

async fn render_with_analysis(
    state: &AppState,
    session: &SessionCache,
    request: &AnalysisRequest,
    notices: Vec<Notice>,
) -> String {
    if session.is_empty() {
        return render_page(request, &notices, None);
    }
    let report = analyze_session(session, &request.indicators, &state.renderer, &state.engine).await;
    render_page(request, &notices, Some(&report))
}

/// Escape text for HTML element and attribute content
pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 0; display: flex; }
aside { width: 280px; padding: 16px; background: #f0f2f6; min-height: 100vh; box-sizing: border-box; }
aside label { display: block; margin-top: 12px; font-size: 14px; }
aside input, aside select { width: 100%; box-sizing: border-box; margin-top: 4px; }
aside button { margin-top: 16px; width: 100%; padding: 8px; }
main { flex: 1; padding: 16px 32px; }
.notice { padding: 8px 12px; margin: 8px 0; border-radius: 4px; }
.notice.success { background: #dff5e3; }
.notice.warning { background: #fff4d6; }
.notice.error { background: #fde2e2; }
.notice.info { background: #e1efff; }
.tabs > input { display: none; }
.tabs > label { display: inline-block; padding: 8px 14px; cursor: pointer; border-bottom: 2px solid transparent; }
.tabs > input:checked + label { border-bottom-color: #ff4b4b; color: #ff4b4b; }
.tabs > .panel { display: none; padding-top: 12px; }
table { border-collapse: collapse; }
th, td { border: 1px solid #ddd; padding: 6px 12px; text-align: left; }
.justification { white-space: pre-wrap; }
img.chart { max-width: 100%; }
"#;

/// Render the full page
///
/// `report` is `None` when the session holds no series.
pub fn render_page(
    request: &AnalysisRequest,
    notices: &[Notice],
    report: Option<&DashboardReport>,
) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Trader AI</title><style>{}",
        STYLE
    );
    if let Some(report) = report {
        // One visibility rule per tab; panels follow all radio/label pairs
        for i in 0..=report.reports.len() {
            let _ = writeln!(html, "#tab-{i}:checked ~ #panel-{i} {{ display: block; }}");
        }
    }
    html.push_str("</style></head><body>");

    render_sidebar(&mut html, request);

    html.push_str("<main><h1>AI-Powered Technical Stock Analysis Dashboard</h1>");
    for notice in notices {
        let _ = write!(
            html,
            "<div class=\"notice {}\">{}</div>",
            notice.class(),
            html_escape(notice.text())
        );
    }

    match report {
        Some(report) => render_tabs(&mut html, report),
        None => {
            let _ = write!(
                html,
                "<div class=\"notice info\">{}</div>",
                html_escape(EMPTY_SESSION_HINT)
            );
        }
    }

    html.push_str("</main></body></html>");
    html
}

fn render_sidebar(html: &mut String, request: &AnalysisRequest) {
    html.push_str("<aside><h2>Configurations</h2><form method=\"post\" action=\"/fetch\">");
    let _ = write!(
        html,
        "<label>Enter stock tickers (comma-separated)<input type=\"text\" name=\"tickers\" value=\"{}\"></label>",
        html_escape(&request.tickers_input())
    );
    let _ = write!(
        html,
        "<label>Start Date<input type=\"date\" name=\"start\" value=\"{}\"></label>",
        request.start
    );
    let _ = write!(
        html,
        "<label>End Date<input type=\"date\" name=\"end\" value=\"{}\"></label>",
        request.end
    );

    html.push_str("<h3>Technical Indicators</h3><select name=\"indicators\" multiple size=\"6\">");
    for indicator in Indicator::all() {
        let selected = if request.indicators.contains(&indicator) {
            " selected"
        } else {
            ""
        };
        let _ = write!(
            html,
            "<option value=\"{}\"{}>{}</option>",
            indicator.as_str(),
            selected,
            indicator.label()
        );
    }
    html.push_str("</select><button type=\"submit\">Fetch Data</button>");
    // Re-analyze the cached session with the current selection, no fetch
    html.push_str("<button type=\"submit\" formmethod=\"get\" formaction=\"/\">Analyze</button>");
    html.push_str("</form></aside>");
}

fn render_tabs(html: &mut String, report: &DashboardReport) {
    html.push_str("<div class=\"tabs\">");

    let mut names = vec![SUMMARY_TAB.to_string()];
    names.extend(report.reports.iter().map(|r| r.ticker.clone()));
    for (i, name) in names.iter().enumerate() {
        let checked = if i == 0 { " checked" } else { "" };
        let _ = write!(
            html,
            "<input type=\"radio\" name=\"tab\" id=\"tab-{i}\"{checked}><label for=\"tab-{i}\">{}</label>",
            html_escape(name)
        );
    }

    html.push_str("<div class=\"panel\" id=\"panel-0\"><h2>Overall Structured Recommendation</h2>");
    html.push_str("<table><thead><tr><th>Stock</th><th>Recommendation</th></tr></thead><tbody>");
    for row in report.summary() {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td></tr>",
            html_escape(&row.stock),
            html_escape(&row.recommendation)
        );
    }
    html.push_str("</tbody></table></div>");

    for (i, ticker_report) in report.reports.iter().enumerate() {
        let ticker = html_escape(&ticker_report.ticker);
        let _ = write!(
            html,
            "<div class=\"panel\" id=\"panel-{}\"><h2>Technical Analysis for {}</h2>",
            i + 1,
            ticker
        );
        match &ticker_report.chart {
            Some(chart) => {
                let _ = write!(
                    html,
                    "<img class=\"chart\" src=\"{}\" width=\"{}\" height=\"{}\" alt=\"{} chart\">",
                    chart.data_uri(),
                    chart.width,
                    chart.height,
                    ticker
                );
            }
            None => html.push_str("<p>Chart unavailable.</p>"),
        }
        let _ = write!(
            html,
            "<h3>Detailed Justification</h3><p class=\"justification\">{}</p></div>",
            html_escape(ticker_report.recommendation.justification_text())
        );
    }

    html.push_str("</div>");
}

use crate::commands::{build_engine, build_provider, build_renderer, build_request};
use crate::constants::{API_KEY_ENV, SUMMARY_TAB};
use crate::models::AppConfig;
use crate::services::{analyze_session, DashboardReport, SessionCache};
use std::path::{Path, PathBuf};

pub async fn run(
    tickers: Option<String>,
    start: Option<String>,
    end: Option<String>,
    indicators: Option<String>,
    save_charts: Option<PathBuf>,
) {
    let request = match build_request(
        tickers.as_deref(),
        start.as_deref(),
        end.as_deref(),
        indicators.as_deref(),
    ) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let config = AppConfig::from_env();
    if config.api_key.is_none() {
        eprintln!("⚠️  {} is not set; model calls will be rejected by the provider", API_KEY_ENV);
    }

    let (provider, engine) = match (build_provider(&config), build_engine(&config)) {
        (Ok(provider), Ok(engine)) => (provider, engine),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };
    let renderer = build_renderer(&config);

    println!(
        "📥 Fetching {} ({} → {})",
        request.tickers_input(),
        request.start,
        request.end
    );
    let mut session = SessionCache::new();
    let fetch = match session.refresh(provider.as_ref(), &request).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("❌ Fetch failed: {}", e);
            std::process::exit(1);
        }
    };
    for warning in fetch.warnings() {
        eprintln!("⚠️  {}", warning);
    }
    println!("✅ {}", fetch.success_message());

    if session.is_empty() {
        println!("ℹ️  Nothing to analyze.");
        return;
    }

    let indicator_labels: Vec<&str> = request.indicators.iter().map(|i| i.label()).collect();
    println!(
        "🤖 Analyzing {} tickers with {} [{}]...",
        session.len(),
        config.model_name,
        indicator_labels.join(", ")
    );
    let report = analyze_session(&session, &request.indicators, &renderer, &engine).await;

    print_report(&report);

    if let Some(dir) = save_charts {
        if let Err(e) = save_chart_files(&report, &dir) {
            eprintln!("❌ Failed to save charts: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_report(report: &DashboardReport) {
    let rows = report.summary();
    let width = rows.iter().map(|r| r.stock.len()).max().unwrap_or(0).max("Stock".len());

    println!("\n═══════════════════════════════════════════════════════════");
    println!("📊 {}\n", SUMMARY_TAB);
    println!("   {:<width$}  Recommendation", "Stock", width = width);
    for row in &rows {
        println!("   {:<width$}  {}", row.stock, row.recommendation, width = width);
    }

    for ticker_report in &report.reports {
        println!("\n═══════════════════════════════════════════════════════════");
        println!("🔹 Technical Analysis for {}", ticker_report.ticker);
        if ticker_report.chart.is_none() {
            println!("   (chart unavailable)");
        }
        println!("\n   Detailed Justification:");
        for line in ticker_report.recommendation.justification_text().lines() {
            println!("   {}", line);
        }
    }
    println!();
}

/// Write `<TICKER>.png` for every rendered chart
fn save_chart_files(report: &DashboardReport, dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    for ticker_report in &report.reports {
        if let Some(chart) = &ticker_report.chart {
            let path = dir.join(format!("{}.png", ticker_report.ticker));
            std::fs::write(&path, &chart.png)?;
            println!("💾 Saved {}", path.display());
        }
    }
    Ok(())
}

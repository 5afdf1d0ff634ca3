use crate::commands::{build_provider, build_request};
use crate::models::AppConfig;
use crate::services::SessionCache;
use crate::utils::{format_date, format_number, format_price};

pub async fn run(tickers: Option<String>, start: Option<String>, end: Option<String>) {
    let request = match build_request(tickers.as_deref(), start.as_deref(), end.as_deref(), None) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let config = AppConfig::from_env();
    let provider = match build_provider(&config) {
        Ok(provider) => provider,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    println!(
        "📥 Fetching daily bars for {} ({} → {})",
        request.tickers_input(),
        request.start,
        request.end
    );

    let mut session = SessionCache::new();
    let report = match session.refresh(provider.as_ref(), &request).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("❌ Fetch failed: {}", e);
            std::process::exit(1);
        }
    };

    for warning in report.warnings() {
        eprintln!("⚠️  {}", warning);
    }

    for series in session.iter() {
        println!("\n🔹 {}", series.ticker());
        println!("   Records:    {:>8}", format_number(series.len() as u64));
        if let (Some(first), Some(last)) = (series.first_date(), series.last_date()) {
            println!("   Date range: {} → {}", format_date(first), format_date(last));
        }
        if let Some(close) = series.last_close() {
            println!("   Last close: {}", format_price(close));
        }
    }

    println!("\n✅ {}", report.success_message());
}

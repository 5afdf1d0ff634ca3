use crate::commands::{build_engine, build_provider, build_renderer};
use crate::constants::API_KEY_ENV;
use crate::models::AppConfig;
use crate::server::{self, AppState};
use crate::services::SessionCache;
use std::sync::Arc;
use tokio::sync::RwLock;

pub async fn run(port: Option<u16>) {
    let config = AppConfig::from_env().with_port(port);
    println!("🚀 Starting traderai dashboard on port {}", config.port);

    println!("🤖 Model:       {} ({})", config.model_name, config.model_base_url);
    println!("📈 Market data: {}", config.market_data_url);
    println!("📁 Chart temp:  {}", config.temp_dir.display());
    if config.api_key.is_none() {
        eprintln!("⚠️  Warning: {} is not set; recommendations will show errors", API_KEY_ENV);
    }

    let (provider, engine) = match (build_provider(&config), build_engine(&config)) {
        (Ok(provider), Ok(engine)) => (provider, engine),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let state = AppState {
        session: Arc::new(RwLock::new(SessionCache::new())),
        provider,
        renderer: Arc::new(build_renderer(&config)),
        engine,
    };

    println!("🌐 Open http://localhost:{}/", config.port);
    if let Err(e) = server::serve(state, config.port).await {
        eprintln!("❌ Server error: {}", e);
        std::process::exit(1);
    }
}

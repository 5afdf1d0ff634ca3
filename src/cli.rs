use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;

#[derive(Parser)]
#[command(name = "traderai")]
#[command(about = "AI-powered technical stock analysis", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web dashboard
    Serve {
        /// Port to listen on (default: TRADERAI_PORT or 8501)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Fetch, chart and ask the model for a recommendation per ticker
    Analyze {
        /// Comma-separated tickers (default: "AAPL, MSFT, GOOGL")
        #[arg(short, long)]
        tickers: Option<String>,

        /// Start date YYYY-MM-DD (default: one year ago)
        #[arg(short, long)]
        start: Option<String>,

        /// End date YYYY-MM-DD, exclusive (default: today)
        #[arg(short, long)]
        end: Option<String>,

        /// Comma-separated indicators: sma20, ema20, rsi, macd, bb20, vwap (default: sma20)
        #[arg(short, long)]
        indicators: Option<String>,

        /// Also write each chart to <DIR>/<TICKER>.png
        #[arg(long, value_name = "DIR")]
        save_charts: Option<PathBuf>,
    },
    /// Fetch daily bars and print a per-ticker overview
    Fetch {
        /// Comma-separated tickers (default: "AAPL, MSFT, GOOGL")
        #[arg(short, long)]
        tickers: Option<String>,

        /// Start date YYYY-MM-DD (default: one year ago)
        #[arg(short, long)]
        start: Option<String>,

        /// End date YYYY-MM-DD, exclusive (default: today)
        #[arg(short, long)]
        end: Option<String>,
    },
}

pub async fn run() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            commands::serve::run(port).await;
        }
        Commands::Analyze {
            tickers,
            start,
            end,
            indicators,
            save_charts,
        } => {
            commands::analyze::run(tickers, start, end, indicators, save_charts).await;
        }
        Commands::Fetch { tickers, start, end } => {
            commands::fetch::run(tickers, start, end).await;
        }
    }
}

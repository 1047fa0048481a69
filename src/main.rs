use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use trend_radar::{Config, ExploreParams, TrendService};

/// Rank recently published short-form videos by trend score.
#[derive(Debug, Parser)]
#[command(name = "trend-radar", version, about)]
struct Cli {
    /// Topic to search for (DEFAULT_QUERY when omitted)
    query: Option<String>,

    /// Two-letter region code
    #[arg(long)]
    region: Option<String>,

    /// Search results to fetch (1-50)
    #[arg(long)]
    max_results: Option<u32>,

    #[arg(long)]
    min_subs: Option<u64>,

    #[arg(long)]
    min_views: Option<u64>,

    /// 1-indexed page
    #[arg(long)]
    page: Option<u32>,

    #[arg(long)]
    page_size: Option<u32>,

    /// Only videos published within this many hours
    #[arg(long)]
    within_hours: Option<u32>,

    /// Print cache status after the query
    #[arg(long)]
    cache_status: bool,

    /// Print health status and exit
    #[arg(long)]
    health_check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("trend_radar=debug".parse()?),
        )
        .init();

    let cli = Cli::parse();

    info!("📈 Starting Trend Radar v{}", env!("CARGO_PKG_VERSION"));

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ {}", e);
            return Err(e.into());
        }
    };
    info!("{}", config.summary());

    let service = TrendService::from_config(&config)?;

    if cli.health_check {
        println!("{}", serde_json::to_string_pretty(&service.health())?);
        return Ok(());
    }

    let params = ExploreParams {
        query: cli.query,
        region: cli.region,
        max_results: cli.max_results,
        min_subscribers: cli.min_subs,
        min_views: cli.min_views,
        page: cli.page,
        page_size: cli.page_size,
        published_within_hours: cli.within_hours,
    };

    let outcome = service.explore(params).await;

    if cli.cache_status {
        eprintln!("{}", serde_json::to_string_pretty(&service.cache_status())?);
    }

    match outcome {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Err(failure) => {
            println!("{}", serde_json::to_string_pretty(&failure)?);
            anyhow::bail!("{}: {}", failure.error, failure.message)
        }
    }
}

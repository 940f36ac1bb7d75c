use anyhow::{bail, Context};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::Path;
use stockpulse::jobs::{self, Job, Pipeline};
use stockpulse::services::SqliteStore;
use stockpulse::sources::AlpacaClient;
use stockpulse::Config;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "stockpulse",
    about = "Daily equity signal scoring and cross-referencing",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Run date (defaults to today, UTC)
    #[arg(short, long, global = true)]
    date: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect golden/death crosses, breakouts and bullish engulfing candles
    Patterns,
    /// Score the scan universe on composite momentum
    Momentum,
    /// Enrich the day's top gainers and losers
    Movers,
    /// Rank sectors by average 1-week change
    Sectors,
    /// Select up to three daily picks from stored signals
    Picks,
    /// Generate plain-English market insights from stored signals
    Insights,
    /// Run every job in order
    All,
    /// Delete stored rows older than the retention window
    Cleanup,
}

impl Commands {
    fn job(&self) -> Option<Job> {
        match self {
            Commands::Patterns => Some(Job::Patterns),
            Commands::Momentum => Some(Job::Momentum),
            Commands::Movers => Some(Job::Movers),
            Commands::Sectors => Some(Job::Sectors),
            Commands::Picks => Some(Job::Picks),
            Commands::Insights => Some(Job::Insights),
            Commands::All | Commands::Cleanup => None,
        }
    }
}

fn open_store(path: &str) -> anyhow::Result<SqliteStore> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating database directory {}", parent.display()))?;
        }
    }
    SqliteStore::new(path).with_context(|| format!("opening database {}", path))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockpulse=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    let date = cli.date.unwrap_or_else(|| Utc::now().date_naive());

    info!("Using database at {}", config.database_path);
    let store = open_store(&config.database_path)?;

    // Jobs that only read stored rows run without market data credentials.
    if let Some(job) = cli.command.job().filter(|j| !j.needs_market_data()) {
        match job {
            Job::Picks => {
                jobs::run_picks(&store, date)?;
            }
            _ => {
                jobs::run_insights(&store, date)?;
            }
        }
        return Ok(());
    }
    if matches!(cli.command, Commands::Cleanup) {
        let deleted = jobs::cleanup(&store, date, config.retention_days)?;
        info!("Removed {} rows older than {} days", deleted, config.retention_days);
        return Ok(());
    }

    let Some(alpaca) = config.alpaca.clone() else {
        bail!("ALPACA_API_KEY and ALPACA_API_SECRET must be set to fetch market data");
    };
    let client = AlpacaClient::new(alpaca.api_key, alpaca.api_secret, alpaca.data_url);
    let pipeline = Pipeline::new(client, store, config);

    let errors = match cli.command.job() {
        Some(job) => pipeline.run(job, date).await?,
        None => pipeline.run_all(date).await,
    };

    if errors.is_empty() {
        info!("Done.");
    } else {
        warn!("Done with {} error(s)", errors.len());
    }
    Ok(())
}

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockdex_core::analysis::risk::DEFAULT_CONFIDENCE_LEVEL;
use stockdex_core::cache::LruSnapshotCache;
use stockdex_core::config::Settings;
use stockdex_core::ingest::memory::InMemoryProvider;
use stockdex_core::ingest::search::{TickerSearch, YahooSearch};
use stockdex_core::Analyzer;

#[derive(Debug, Parser)]
#[command(name = "stockdex", about = "Score, compare and risk-check equities")]
struct Args {
    /// Serve tickers from a JSON fixture instead of the live market-data provider.
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scorecard, raw stats and one-year history for one ticker.
    Analyze { ticker: String },
    /// Aggregate scorecard, sector mix and return correlations.
    Team {
        #[arg(required = true)]
        tickers: Vec<String>,
    },
    /// Parametric VaR / CVaR from daily returns.
    Risk {
        ticker: String,
        #[arg(long, default_value_t = DEFAULT_CONFIDENCE_LEVEL)]
        confidence: f64,
    },
    /// Ticker autocomplete.
    Search { query: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let result = run(&settings, args).await;
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
    }
    result
}

async fn run(settings: &Settings, args: Args) -> anyhow::Result<()> {
    match args.command {
        Command::Analyze { ticker } => {
            let analyzer = build_analyzer(settings, args.fixture.as_deref())?;
            let snapshot = analyzer
                .analyze(&ticker)
                .await
                .with_context(|| format!("analyze {ticker} failed"))?;
            print_json(&snapshot)
        }
        Command::Team { tickers } => {
            let analyzer = build_analyzer(settings, args.fixture.as_deref())?;
            let team = analyzer.analyze_team(tickers.as_slice()).await?;
            print_json(&team)
        }
        Command::Risk { ticker, confidence } => {
            let analyzer = build_analyzer(settings, args.fixture.as_deref())?;
            let report = analyzer
                .risk_report(&ticker, confidence)
                .await
                .with_context(|| format!("risk metrics for {ticker} failed"))?;
            print_json(&report)
        }
        Command::Search { query } => {
            let search = YahooSearch::from_settings(settings)?;
            let hits = search.search(query.trim()).await?;
            print_json(&hits)
        }
    }
}

fn build_analyzer(settings: &Settings, fixture: Option<&Path>) -> anyhow::Result<Analyzer> {
    let analyzer = match fixture {
        Some(path) => {
            let provider = InMemoryProvider::from_json_file(path)?;
            let cache = LruSnapshotCache::new(settings.lookup_cache_capacity);
            Analyzer::new(Arc::new(provider), Arc::new(cache))
        }
        None => Analyzer::from_settings(settings)?,
    };
    tracing::debug!(provider = analyzer.provider_name(), "analyzer ready");
    Ok(analyzer)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to render JSON")?;
    println!("{text}");
    Ok(())
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

//! PaperScout
//!
//! Scores stored preprints:
//! 1. Ingests feed papers
//! 2. Applies author and affiliation enrichment
//! 3. Computes heuristic scores
//! 4. Requests model judgments for promising papers
//! 5. Writes combined scores for ranking

mod cli;
mod enrichment;
mod errors;
mod heuristic;
mod orchestrator;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use paperscout_common::config::{AppConfig, ObservabilityConfig};
use paperscout_common::db::{DbPool, Repository};
use paperscout_common::{metrics, VERSION};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr; stdout carries command output
    if config.json_logging {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config =
        AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(ref url) = cli.database {
        config.database.url = url.clone();
    }

    init_tracing(&config.observability);
    metrics::register_metrics();

    info!("Starting PaperScout v{}", VERSION);

    let pool = DbPool::new(&config.database)
        .await
        .context("Failed to open database")?;
    let repo = Repository::new(pool);
    repo.ping().await.context("Database is not reachable")?;

    cli::execute(cli.command, &config, repo).await?;
    Ok(())
}

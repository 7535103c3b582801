//! Taiko Voter - repeatedly calls `vote()` on a contract, one mined transaction at a time
//!
//! Each attempt queries a fresh nonce, estimates gas, signs a fee-market
//! transaction at a fixed fee rate, broadcasts it and polls for the receipt
//! before moving on to the next attempt.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

mod account;
mod campaign;
mod chain;
mod config;
mod error;
mod metrics;
mod tx;

use account::Account;
use campaign::{CampaignDriver, CampaignReport, TransactionOutcome};
use chain::{ChainClient, ChainProvider};
use config::Settings;
use metrics::MetricsServer;

#[derive(Debug, Parser)]
#[command(version, about = "Submit a fixed number of vote transactions")]
struct Cli {
    /// Configuration file (defaults to $VOTER_CONFIG or config/default.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured number of attempts
    #[arg(short, long)]
    attempts: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Secrets may live in .env for local runs
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.unwrap_or_else(Settings::default_path);
    let mut settings = Settings::load(&config_path)?;
    if let Some(attempts) = cli.attempts {
        anyhow::ensure!(attempts > 0, "--attempts must be at least 1");
        settings.campaign.attempts = attempts;
    }

    // Initialize logging
    init_logging(settings.logging.json);

    info!("Starting Taiko Voter v{}", env!("CARGO_PKG_VERSION"));

    let account = Account::from_config(&settings.account, settings.vote.chain_id)
        .context("Failed to load voting account")?;
    info!("Voting from {:?}", account.address());

    // Unreachable endpoint aborts before any attempt
    let provider = ChainProvider::connect(&settings.rpc, settings.vote.chain_id)
        .await
        .context("Failed to connect to RPC endpoint")?;
    let client: Arc<dyn ChainClient> = Arc::new(provider);

    let driver = CampaignDriver::from_settings(&settings, account, client)?;

    let metrics_handle = if settings.metrics.enabled {
        let server = MetricsServer::new(settings.metrics.port);
        info!("Metrics: http://0.0.0.0:{}/metrics", settings.metrics.port);
        Some(tokio::spawn(async move {
            if let Err(e) = server.run().await {
                error!("Metrics server error: {}", e);
            }
        }))
    } else {
        None
    };

    let report = driver.run().await;

    if let Some(h) = metrics_handle {
        h.abort();
    }

    log_report(&report);

    info!(
        "Campaign finished: {} of {} votes succeeded, {} failed",
        report.confirmed(),
        report.len(),
        report.failed()
    );
    Ok(())
}

fn log_report(report: &CampaignReport) {
    if report.is_empty() {
        return;
    }
    for record in report.records() {
        debug!(
            "Attempt {} (nonce {:?}): {}",
            record.attempt, record.nonce, record.outcome
        );
    }

    let stuck: Vec<_> = report
        .records()
        .iter()
        .filter(|r| matches!(r.outcome, TransactionOutcome::TimedOut { .. }))
        .filter_map(|r| r.outcome.tx_hash())
        .collect();
    if !stuck.is_empty() {
        warn!("{} transactions may still be pending: {:?}", stuck.len(), stuck);
    }
}

fn init_logging(json: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,taiko_voter=debug,hyper=warn,reqwest=warn"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}

//! hakken entry point.
//!
//! Loads configuration, runs one discovery pass and writes the validated
//! records as a JSON array. Logging goes to stderr so that stdout can carry
//! the record feed.

use anyhow::{Context, Result};
use hakken_client::{CredentialRotator, FetchClient, FetchConfig, GitHubClient, GitHubConfig};
use hakken_core::{AppConfig, DedupCache};
use hakken_engine::{DiscoveryEngine, EngineSettings};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod output;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

    if std::env::var("HAKKEN_LOG_JSON").is_ok_and(|v| v == "1") {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config = AppConfig::load().context("loading configuration")?;
    let rotator = CredentialRotator::new(config.credentials()?)?;
    tracing::info!(credentials = rotator.pool_size(), db = %config.db_path.display(), "starting discovery");

    let cache = DedupCache::open(&config.db_path)
        .await
        .with_context(|| format!("opening dedup cache at {}", config.db_path.display()))?;
    let host = GitHubClient::new(GitHubConfig::from(&config), Arc::new(rotator))?;
    let fetcher = FetchClient::new(FetchConfig::from(&config))?;
    let settings = EngineSettings::from_config(&config)?;

    let engine = DiscoveryEngine::new(Arc::new(host), Arc::new(fetcher), cache.clone(), settings);
    let report = engine.run().await;

    match cache.stats().await {
        Ok(stats) => tracing::info!(
            cached = stats.total,
            valid = stats.valid,
            invalid = stats.invalid,
            "dedup cache totals"
        ),
        Err(e) => tracing::warn!(error = %e, "could not read cache totals"),
    }

    output::write_records(&report.records, config.output_path.as_deref())?;
    tracing::info!(
        records = report.records.len(),
        dense_leaves = report.partition.dense_leaves,
        failed_ranges = report.failed_ranges.len(),
        "run complete"
    );

    Ok(())
}

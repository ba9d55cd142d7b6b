//! pricesync CLI — one synchronization pass over the configured assets.
//!
//! With no arguments it updates the default assets (btc, eth, gold, sp500) in
//! `./data` from Yahoo Finance and prints one status line per asset:
//!
//! ```text
//! btc: wrote 1 new rows (total 3942)
//! eth: up-to-date (2895 rows)
//! ```
//!
//! The first failing asset ends the run with a non-zero exit status; assets
//! already written stay written, so the pass can simply be re-run.

use anyhow::{Context, Result};
use clap::Parser;
use pricesync_core::{AssetSynchronizer, StdoutReporter, SyncConfig, YahooProvider};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "pricesync",
    version,
    about = "Append new daily OHLCV bars to per-asset CSV histories"
)]
struct Cli {
    /// TOML config with the asset list, data directory and trailing window.
    #[arg(long, env = "PRICESYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the `{name}.csv` histories. Overrides the config file.
    #[arg(long, env = "PRICESYNC_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Days fetched for assets that already have history (at least 2).
    #[arg(long)]
    trailing_days: Option<u32>,

    /// Log filter (trace, debug, info, warn, error). Logs go to stderr.
    #[arg(long, env = "RUST_LOG", default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = resolve_config(&cli)?;
    let provider = YahooProvider::new().context("failed to set up the Yahoo Finance client")?;
    let synchronizer = AssetSynchronizer::from_config(&provider, &config);

    info!(
        assets = config.assets.len(),
        data_dir = %config.data_dir.display(),
        "starting synchronization pass"
    );

    let reports = synchronizer.sync_all(&config.assets, &StdoutReporter)?;

    info!(
        assets = reports.len(),
        written = reports.iter().filter(|r| r.outcome.wrote()).count(),
        "synchronization pass complete"
    );
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Flag > config file > built-in default.
fn resolve_config(cli: &Cli) -> Result<SyncConfig> {
    let mut config = match &cli.config {
        Some(path) => SyncConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SyncConfig::default(),
    };

    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(days) = cli.trailing_days {
        config.trailing_days = days;
    }

    config.validate()?;
    Ok(config)
}

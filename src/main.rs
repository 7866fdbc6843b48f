mod bridge;
mod config;
mod consumption;
mod domoticz;
mod units;
mod upstream;

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "viessmann-bridge")]
#[command(about = "Bridges Viessmann gas-consumption telemetry into Domoticz counters")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config from {:?}: {}", cli.config, e);
        eprintln!("Using default configuration");
        config::Config::default()
    });

    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!("viessmann-bridge v{}", env!("CARGO_PKG_VERSION"));
    info!("Viessmann cloud ↔ Domoticz gas-counter bridge");

    let publisher = domoticz::Domoticz::new(config.domoticz.clone());

    // One-time idempotent provisioning so historical log entries are editable
    publisher
        .configure_counters()
        .await
        .context("failed to provision Domoticz counters")?;

    let snapshots = upstream::SnapshotClient::new(config.upstream.snapshot_url.clone());
    let bridge = bridge::Bridge::new(publisher);
    let interval = Duration::from_secs(config.upstream.poll_interval_secs);

    tokio::spawn(async move {
        if let Err(e) = run_poll_loop(snapshots, bridge, interval).await {
            error!("Polling task failed: {}", e);
        }
    });

    info!("Bridge running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    Ok(())
}

/// Background task: fetch a snapshot every `interval` and run one
/// reconciliation cycle against it.
async fn run_poll_loop(
    snapshots: upstream::SnapshotClient,
    mut bridge: bridge::Bridge,
    interval: Duration,
) -> anyhow::Result<()> {
    loop {
        match snapshots.fetch().await {
            Ok(snapshot) => {
                if let Err(e) = bridge.run_cycle(&snapshot).await {
                    error!("Reconciliation pass aborted: {}", e);
                }
            }
            Err(e) => {
                warn!("Failed to fetch consumption snapshot: {}", e);
            }
        }

        tokio::time::sleep(interval).await;
    }
}

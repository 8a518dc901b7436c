//! Humidity Monitor - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, AppConfig};
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Config path: first argument, then HUMIDITY_CONFIG, else ./humidity-monitor.toml if present
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("HUMIDITY_CONFIG").ok())
        .map(PathBuf::from);

    let config = AppConfig::load(path.as_deref()).context("loading configuration")?;
    init_logging(&config.logging)?;

    info!("=== Humidity Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    run_server(config).await?;

    Ok(())
}

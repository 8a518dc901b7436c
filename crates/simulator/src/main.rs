//! Humidity Simulator - Main Entry Point

use simulator::{Simulator, SimulatorConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let config = SimulatorConfig::from_env()?;
    let stats = Simulator::new(config).run().await;

    info!("Done: {} sent, {} failed", stats.sent, stats.failed);
    Ok(())
}

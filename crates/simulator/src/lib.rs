//! Humidity Load Generator
//!
//! Posts synthetic readings to the ingest endpoint on a fixed interval. Talks
//! to the server only over HTTP, like a real sensor would.

use config::{Config, ConfigError, Environment};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Simulator errors
#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Server rejected reading with {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Simulator configuration, read from `SIMULATOR_*` variables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Ingest endpoint URL
    pub target_url: String,
    /// Delay between posts (milliseconds)
    pub interval_ms: u64,
    /// Number of distinct location labels
    pub locations: u8,
    /// Stop after this many posts; run until Ctrl-C when unset
    pub count: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            target_url: "http://localhost:8080/api/sensors".to_string(),
            interval_ms: 10_000,
            locations: 5,
            count: None,
        }
    }
}

impl SimulatorConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_sources(std::env::vars().collect())
    }

    /// Load from an explicit environment snapshot
    pub fn from_sources(env: HashMap<String, String>) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(
                Environment::with_prefix("SIMULATOR")
                    .prefix_separator("_")
                    .separator("__")
                    .source(Some(env)),
            )
            .build()?
            .try_deserialize()
    }
}

/// One synthetic reading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulatedReading {
    pub humidity_value: u8,
    pub location: String,
}

/// Random humidity in 0..=100 at one of `locations` labels
pub fn generate_reading<R: Rng>(rng: &mut R, locations: u8) -> SimulatedReading {
    let location = rng.gen_range(1..=locations.max(1));
    SimulatedReading {
        humidity_value: rng.gen_range(0..=100),
        location: format!("Ubicacion {}", location),
    }
}

/// Outcome counters for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub sent: u64,
    pub failed: u64,
}

/// HTTP load generator
pub struct Simulator {
    config: SimulatorConfig,
    client: reqwest::Client,
}

impl Simulator {
    /// Create a new simulator
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Post a single reading, returning the stored row
    pub async fn send_once(&self, reading: &SimulatedReading) -> Result<Value, SimulatorError> {
        let response = self
            .client
            .post(&self.config.target_url)
            .json(reading)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SimulatorError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    /// Post readings until `count` is reached or Ctrl-C
    ///
    /// Failures are logged and the loop carries on.
    pub async fn run(&self) -> RunStats {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Post readings until `count` is reached or `shutdown` completes
    ///
    /// Shutdown also abandons a request that is still in flight; it is
    /// counted neither as sent nor as failed.
    pub async fn run_until<F>(&self, shutdown: F) -> RunStats
    where
        F: Future<Output = ()>,
    {
        let mut stats = RunStats::default();
        let mut ticker = tokio::time::interval(Duration::from_millis(self.config.interval_ms.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(
            "Sending readings to {} every {}ms",
            self.config.target_url, self.config.interval_ms
        );

        loop {
            if self.config.count.is_some_and(|count| stats.sent + stats.failed >= count) {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                _ = &mut shutdown => {
                    info!("Interrupted");
                    break;
                }
            }

            let reading = generate_reading(&mut rand::thread_rng(), self.config.locations);
            info!("Sending reading: {:?}", reading);
            let result = tokio::select! {
                result = self.send_once(&reading) => result,
                _ = &mut shutdown => {
                    info!("Interrupted with a request in flight");
                    break;
                }
            };

            match result {
                Ok(stored) => {
                    stats.sent += 1;
                    info!("Reading stored: {}", stored);
                }
                Err(e) => {
                    stats.failed += 1;
                    error!("Failed to send reading: {}", e);
                }
            }
        }

        stats
    }
}

//! Humidity Monitor API Server
//!
//! Ingest and query endpoints for humidity readings, plus the live dashboard.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use reading_validator::Validator;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod dashboard;
pub mod error;
pub mod routes;

pub use crate::config::{AppConfig, LoggingConfig, ServerConfig};
pub use crate::dashboard::DashboardConfig;
pub use crate::error::ApiError;

use routes::sensors::SENSORS_PATH;
use storage::{Repository, StorageError};

/// Application state shared across handlers
pub struct AppState {
    /// Pooled storage repository
    pub repository: Repository,
    /// Ingest payload validator
    pub validator: Validator,
    /// Dashboard settings
    pub dashboard: DashboardConfig,
    /// Prometheus handle, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(repository: Repository, dashboard: DashboardConfig) -> Self {
        Self {
            repository,
            validator: Validator::default(),
            dashboard,
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }

    /// Attach a Prometheus handle for `/metrics`
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Server startup errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Logging setup failed: {0}")]
    Logging(String),
    #[error("Metrics setup failed: {0}")]
    Metrics(String),
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub database: ComponentHealth,
}

/// Individual component health
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: String,
    pub latency_ms: Option<u64>,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::temporary("/sensors") }))
        .route("/api/health", get(health_handler))
        .route(
            SENSORS_PATH,
            get(routes::sensors::list_readings).post(routes::sensors::create_reading),
        )
        .route("/sensors", get(dashboard::dashboard_page))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let (status, database) = match state.repository.ping().await {
        Ok(latency) => (
            "healthy",
            ComponentHealth {
                status: "ok".to_string(),
                latency_ms: Some(latency.as_millis() as u64),
            },
        ),
        Err(e) => {
            warn!("Health check could not reach database: {}", e);
            (
                "degraded",
                ComponentHealth {
                    status: "unavailable".to_string(),
                    latency_ms: None,
                },
            )
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        database,
    })
}

/// Prometheus exposition
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

/// Initialize logging
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ServerError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| ServerError::Logging(e.to_string()))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| ServerError::Logging(e.to_string()))
}

/// Install the global Prometheus recorder
pub fn install_metrics() -> Result<PrometheusHandle, ServerError> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServerError::Metrics(e.to_string()))
}

/// Run the server until Ctrl-C
pub async fn run_server(config: AppConfig) -> Result<(), ServerError> {
    let handle = install_metrics()?;
    let repository = Repository::connect(&config.database).await?;

    let state = Arc::new(AppState::new(repository, config.dashboard.clone()).with_metrics(handle));
    let app = create_router(state.clone());

    info!("Starting API server on {}", config.server.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down, closing database pool");
    state.repository.close().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

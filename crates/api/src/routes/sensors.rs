//! Sensor Routes

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use reading_validator::RawReading;
use std::sync::Arc;
use storage::{NewReading, Reading};
use tracing::{info, warn};

use crate::{error::ApiError, AppState};

/// Path shared by the ingest and query endpoints
pub const SENSORS_PATH: &str = "/api/sensors";

/// Rows returned by the query endpoint
pub const RECENT_LIMIT: usize = 10;

/// Ingest one reading
pub async fn create_reading(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RawReading>, JsonRejection>,
) -> Result<Json<Reading>, ApiError> {
    let Json(raw) = payload.map_err(|rejection| {
        warn!("Rejected reading body: {}", rejection.body_text());
        metrics::counter!("humidity_readings_rejected_total", "reason" => "malformed_body").increment(1);
        ApiError::from(rejection)
    })?;

    let validated = state.validator.validate(&raw).map_err(|e| {
        warn!("Invalid reading {:?}: {}", raw, e);
        metrics::counter!("humidity_readings_rejected_total", "reason" => e.reason()).increment(1);
        e
    })?;
    for warning in &validated.warnings {
        warn!("Accepted reading with warning: {}", warning);
    }

    let reading = state
        .repository
        .insert_reading(NewReading {
            humidity_value: validated.humidity_value,
            location: validated.location,
        })
        .await
        .map_err(|e| {
            metrics::counter!("humidity_storage_errors_total", "op" => "insert").increment(1);
            e
        })?;

    metrics::counter!("humidity_readings_ingested_total").increment(1);
    metrics::gauge!("humidity_last_value").set(reading.humidity_value);
    info!(
        id = reading.id,
        location = %reading.location,
        humidity_value = reading.humidity_value,
        "Reading stored"
    );

    Ok(Json(reading))
}

/// Most recent readings, newest first
pub async fn list_readings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Reading>>, ApiError> {
    let readings = state
        .repository
        .recent_readings(RECENT_LIMIT)
        .await
        .map_err(|e| {
            metrics::counter!("humidity_storage_errors_total", "op" => "select").increment(1);
            e
        })?;

    Ok(Json(readings))
}

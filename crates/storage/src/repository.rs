//! Repository Implementation

use crate::{schema, Backend, DatabaseConfig, StorageError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Persisted humidity reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub id: i64,
    /// Server-assigned insert time
    pub timestamp: DateTime<Utc>,
    pub humidity_value: f64,
    pub location: String,
}

/// Reading to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    pub humidity_value: f64,
    pub location: String,
}

#[derive(sqlx::FromRow)]
struct ReadingRow {
    id: i64,
    timestamp: i64,
    humidity_value: f64,
    location: String,
}

impl TryFrom<ReadingRow> for Reading {
    type Error = StorageError;

    fn try_from(row: ReadingRow) -> Result<Self, Self::Error> {
        let timestamp = DateTime::<Utc>::from_timestamp_micros(row.timestamp).ok_or_else(|| {
            StorageError::SerializationError(format!(
                "timestamp {} of reading {} is out of range",
                row.timestamp, row.id
            ))
        })?;

        Ok(Reading {
            id: row.id,
            timestamp,
            humidity_value: row.humidity_value,
            location: row.location,
        })
    }
}

/// Repository for readings, backed by a bounded connection pool
///
/// Each call checks a connection out of the pool and returns it when done;
/// there is no long-lived shared connection. Inserts are serialized through
/// the timestamp clock so that timestamps increase in id order; reads are not.
pub struct Repository {
    pool: AnyPool,
    backend: Backend,
    /// Last timestamp handed out (unix micros), held for the whole insert
    last_timestamp: Mutex<i64>,
}

impl Repository {
    /// Connect, apply the schema and seed the timestamp clock
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StorageError> {
        sqlx::any::install_default_drivers();

        let backend = config.backend()?;
        let url = config.connection_url()?;

        let mut options = AnyPoolOptions::new()
            .max_connections(config.pool_size())
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs));
        if config.is_in_memory() {
            // Dropping the only connection would drop the database with it
            options = options.min_connections(1).idle_timeout(None).max_lifetime(None);
        }

        let pool = options.connect(&url).await?;
        info!(
            "Connected to {:?} database (pool size {})",
            backend,
            config.pool_size()
        );

        let version = schema::migrate(&pool, backend).await?;
        debug!("Schema at version {}", version);

        let last: Option<i64> = sqlx::query_scalar("SELECT MAX(timestamp) FROM humedad")
            .fetch_one(&pool)
            .await?;

        Ok(Self {
            pool,
            backend,
            last_timestamp: Mutex::new(last.unwrap_or(i64::MIN)),
        })
    }

    /// Backend in use
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Next insert timestamp: now, or one microsecond past the previous one
    fn next_timestamp(last: i64) -> i64 {
        Utc::now().timestamp_micros().max(last.saturating_add(1))
    }

    /// Insert a reading and return the stored row
    pub async fn insert_reading(&self, reading: NewReading) -> Result<Reading, StorageError> {
        let mut last = self.last_timestamp.lock().await;
        let timestamp = Self::next_timestamp(*last);

        let row: ReadingRow = sqlx::query_as(
            r#"
            INSERT INTO humedad (timestamp, humidity_value, location)
            VALUES ($1, $2, $3)
            RETURNING id, timestamp, humidity_value, location
            "#,
        )
        .bind(timestamp)
        .bind(reading.humidity_value)
        .bind(reading.location)
        .fetch_one(&self.pool)
        .await?;

        *last = timestamp;
        drop(last);

        debug!("Inserted reading with ID {}", row.id);
        row.try_into()
    }

    /// Most recent readings, newest first
    pub async fn recent_readings(&self, limit: usize) -> Result<Vec<Reading>, StorageError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows: Vec<ReadingRow> = sqlx::query_as(
            r#"
            SELECT id, timestamp, humidity_value, location
            FROM humedad
            ORDER BY timestamp DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Reading::try_from).collect()
    }

    /// Total stored readings
    pub async fn reading_count(&self) -> Result<i64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM humedad")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Round-trip a trivial query, returning its latency
    pub async fn ping(&self) -> Result<Duration, StorageError> {
        let start = Instant::now();
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(start.elapsed())
    }

    /// Close the pool, waiting for checked-out connections to return
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

//! Storage Layer
//!
//! Pooled SQL persistence for humidity readings. PostgreSQL in production,
//! SQLite for local runs and tests, both through the same `sqlx` Any pool.

mod config;
mod repository;
pub mod schema;

pub use config::{Backend, DatabaseConfig};
pub use repository::{NewReading, Reading, Repository};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Unsupported database URL: {0}")]
    UnsupportedUrl(String),
    #[error("Migration {version} failed: {message}")]
    MigrationError { version: i64, message: String },
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::DatabaseError(err.to_string())
    }
}

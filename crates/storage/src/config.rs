//! Database configuration

use crate::StorageError;
use serde::{Deserialize, Serialize};

/// SQL backend selected by the connection URL scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    Sqlite,
}

impl Backend {
    /// Detect the backend from a connection URL
    pub fn from_url(url: &str) -> Result<Self, StorageError> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(Backend::Postgres)
        } else if url.starts_with("sqlite:") {
            Ok(Backend::Sqlite)
        } else {
            let scheme = url.split(':').next().unwrap_or_default();
            Err(StorageError::UnsupportedUrl(format!("unknown scheme '{}'", scheme)))
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection string (`postgres://...` or `sqlite:...`)
    pub url: String,
    /// Upper bound on pooled connections
    pub max_connections: u32,
    /// How long a request waits for a pooled connection (seconds)
    pub acquire_timeout_secs: u64,
    /// Use TLS without certificate verification for PostgreSQL
    pub accept_invalid_certs: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 5,
            acquire_timeout_secs: 30,
            accept_invalid_certs: true,
        }
    }
}

impl DatabaseConfig {
    /// Config for a private in-memory SQLite database
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Backend named by the URL
    pub fn backend(&self) -> Result<Backend, StorageError> {
        Backend::from_url(&self.url)
    }

    /// Whether the URL names an in-memory SQLite database
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    /// URL handed to the driver
    ///
    /// For PostgreSQL with `accept_invalid_certs`, `sslmode=require` is added
    /// unless the URL already carries an `sslmode`. `require` encrypts the
    /// connection without verifying the server certificate.
    pub fn connection_url(&self) -> Result<String, StorageError> {
        let backend = self.backend()?;
        if backend != Backend::Postgres || !self.accept_invalid_certs || self.url.contains("sslmode=") {
            return Ok(self.url.clone());
        }

        let sep = if self.url.contains('?') { '&' } else { '?' };
        Ok(format!("{}{}sslmode=require", self.url, sep))
    }

    /// Effective pool size; in-memory SQLite must share one connection
    pub fn pool_size(&self) -> u32 {
        if self.is_in_memory() {
            1
        } else {
            self.max_connections.max(1)
        }
    }
}

//! Server configuration
//!
//! Layers, later wins: built-in defaults, an optional TOML file,
//! `HUMIDITY_<SECTION>__<KEY>` environment variables, then `DATABASE_URL`.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use storage::DatabaseConfig;

use crate::dashboard::DashboardConfig;

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_NAME: &str = "humidity-monitor";

/// Environment variable prefix for layered settings
pub const ENV_PREFIX: &str = "HUMIDITY";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub dashboard: DashboardConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    pub level: String,
    /// Emit JSON lines instead of plain text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load from the process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_sources(path, std::env::vars().collect())
    }

    /// Load from an explicit environment snapshot
    pub fn from_sources(path: Option<&Path>, env: HashMap<String, String>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };
        let database_url = env.get("DATABASE_URL").cloned();

        Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .source(Some(env)),
            )
            .set_override_option("database.url", database_url)?
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_sources(None, HashMap::new()).unwrap();
        assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.database.max_connections, 5);
        assert!(config.database.accept_invalid_certs);
        assert_eq!(config.dashboard.poll_interval_secs, 10);
        assert_eq!(config.dashboard.focus_location, "Ubicacion 1");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_database_url_overrides() {
        let config = AppConfig::from_sources(
            None,
            env(&[
                ("HUMIDITY_DATABASE__URL", "sqlite://from-prefix.db"),
                ("DATABASE_URL", "postgres://db/humedad"),
            ]),
        )
        .unwrap();
        assert_eq!(config.database.url, "postgres://db/humedad");
    }

    #[test]
    fn test_prefixed_environment() {
        let config = AppConfig::from_sources(
            None,
            env(&[
                ("HUMIDITY_SERVER__BIND_ADDR", "127.0.0.1:9000"),
                ("HUMIDITY_DATABASE__MAX_CONNECTIONS", "12"),
                ("HUMIDITY_DASHBOARD__FOCUS_LOCATION", "Invernadero"),
                ("HUMIDITY_LOGGING__JSON", "true"),
            ]),
        )
        .unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.database.max_connections, 12);
        assert_eq!(config.dashboard.focus_location, "Invernadero");
        assert!(config.logging.json);
    }

    #[test]
    fn test_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[dashboard]\npoll_interval_secs = 30\n\n[database]\naccept_invalid_certs = false"
        )
        .unwrap();
        file.flush().unwrap();

        let config = AppConfig::from_sources(Some(file.path()), HashMap::new()).unwrap();

        assert_eq!(config.dashboard.poll_interval_secs, 30);
        assert!(!config.database.accept_invalid_certs);
        assert_eq!(config.dashboard.focus_location, "Ubicacion 1");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let path = Path::new("/nonexistent/humidity-monitor.toml");
        assert!(AppConfig::from_sources(Some(path), HashMap::new()).is_err());
    }
}

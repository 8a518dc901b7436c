//! Versioned schema
//!
//! The single source of truth for the `humedad` table. Migrations are applied
//! in order at startup and recorded in `schema_version`. Only identity column
//! syntax differs between backends.

use crate::{Backend, StorageError};
use chrono::Utc;
use sqlx::AnyPool;
use tracing::info;

/// One schema step
#[derive(Debug)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub postgres: &'static [&'static str],
    pub sqlite: &'static [&'static str],
}

impl Migration {
    /// Statements for a backend
    pub fn statements(&self, backend: Backend) -> &'static [&'static str] {
        match backend {
            Backend::Postgres => self.postgres,
            Backend::Sqlite => self.sqlite,
        }
    }
}

// language=sql
const CREATE_READINGS_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_humedad_timestamp
        ON humedad (timestamp DESC, id DESC)
"#;

/// All migrations, ascending by version
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create humedad",
        // language=sql
        postgres: &[r#"
            CREATE TABLE IF NOT EXISTS humedad (
                id             BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
                timestamp      BIGINT           NOT NULL, -- unix time, microseconds
                humidity_value DOUBLE PRECISION NOT NULL,
                location       TEXT             NOT NULL
            )
        "#],
        // language=sql
        sqlite: &[r#"
            CREATE TABLE IF NOT EXISTS humedad (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp      INTEGER NOT NULL, -- unix time, microseconds
                humidity_value REAL    NOT NULL,
                location       TEXT    NOT NULL
            )
        "#],
    },
    Migration {
        version: 2,
        description: "index humedad by recency",
        postgres: &[CREATE_READINGS_INDEX],
        sqlite: &[CREATE_READINGS_INDEX],
    },
];

// language=sql
const CREATE_VERSION_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS schema_version (
        version     BIGINT NOT NULL PRIMARY KEY,
        description TEXT   NOT NULL,
        applied_at  BIGINT NOT NULL -- unix time, microseconds
    )
"#;

/// Highest applied version, 0 for a fresh database
pub async fn current_version(pool: &AnyPool) -> Result<i64, StorageError> {
    sqlx::query(CREATE_VERSION_TABLE).execute(pool).await?;
    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await?;
    Ok(version.unwrap_or(0))
}

/// Apply every pending migration, each in its own transaction
///
/// Returns the resulting schema version.
pub async fn migrate(pool: &AnyPool, backend: Backend) -> Result<i64, StorageError> {
    let start = current_version(pool).await?;
    let mut version = start;

    for migration in MIGRATIONS.iter().filter(|m| m.version > start) {
        let failed = |e: sqlx::Error| StorageError::MigrationError {
            version: migration.version,
            message: e.to_string(),
        };

        let mut tx = pool.begin().await.map_err(failed)?;
        for statement in migration.statements(backend) {
            sqlx::query(statement).execute(&mut *tx).await.map_err(failed)?;
        }
        sqlx::query("INSERT INTO schema_version (version, description, applied_at) VALUES ($1, $2, $3)")
            .bind(migration.version)
            .bind(migration.description)
            .bind(Utc::now().timestamp_micros())
            .execute(&mut *tx)
            .await
            .map_err(failed)?;
        tx.commit().await.map_err(failed)?;

        info!("Applied schema migration {} ({})", migration.version, migration.description);
        version = migration.version;
    }

    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_ordered() {
        let versions: Vec<i64> = MIGRATIONS.iter().map(|m| m.version).collect();
        let mut sorted = versions.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(versions, sorted);
        assert_eq!(versions.first(), Some(&1));
    }

    #[test]
    fn test_every_migration_has_both_dialects() {
        for migration in MIGRATIONS {
            assert!(!migration.postgres.is_empty(), "v{} has no postgres DDL", migration.version);
            assert!(!migration.sqlite.is_empty(), "v{} has no sqlite DDL", migration.version);
        }
    }

    #[test]
    fn test_table_name_is_lowercase() {
        assert!(MIGRATIONS[0].postgres[0].contains("EXISTS humedad"));
        assert!(MIGRATIONS[0].sqlite[0].contains("EXISTS humedad"));
    }
}

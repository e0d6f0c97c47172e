//! Database pool with split reader/writer connections in WAL mode.
//!
//! SQLite allows one writer at a time, so writes go through a single-connection
//! pool while reads share a small multi-connection pool.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

/// Split read/write pool for SQLite with WAL mode.
///
/// - `reader`: up to 8 connections for SELECT queries.
/// - `writer`: one connection for INSERT/UPDATE/DELETE.
#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Connect and run migrations on the writer before opening readers.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let base_opts = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(base_opts.clone())
            .await?;

        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(base_opts.read_only(true))
            .await?;

        Ok(Self { reader, writer })
    }

    /// Open `hookrelay.db` inside a data directory, creating both if needed.
    pub async fn open(data_dir: &Path) -> Result<Self, sqlx::Error> {
        crate::filesystem::ensure_data_dir(data_dir).await?;
        Self::new(&crate::filesystem::database_url(data_dir)).await
    }
}

/// Returns the default database URL inside the resolved data directory.
pub fn default_database_url() -> String {
    crate::filesystem::database_url(&crate::filesystem::resolve_data_dir())
}

/// A migrated pool in a fresh temporary directory. Keep the directory alive
/// for as long as the pool is used.
#[cfg(test)]
pub(crate) async fn test_pool() -> (DatabasePool, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let pool = DatabasePool::open(dir.path()).await.unwrap();
    (pool, dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pool_creates_tables() {
        let (pool, _dir) = test_pool().await;

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations' ORDER BY name",
        )
        .fetch_all(&pool.reader)
        .await
        .unwrap();

        let table_names: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();
        for table in [
            "credentials",
            "event_registrations",
            "executions",
            "workflow_shares",
            "workflows",
        ] {
            assert!(table_names.contains(&table), "{table} table missing");
        }
    }

    #[tokio::test]
    async fn test_pool_wal_mode() {
        let (pool, _dir) = test_pool().await;

        let result: (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&pool.writer)
            .await
            .unwrap();

        assert_eq!(result.0.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn test_pool_foreign_keys_enforced() {
        let (pool, _dir) = test_pool().await;

        let result: (i32,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool.writer)
            .await
            .unwrap();

        assert_eq!(result.0, 1, "foreign keys should be enabled");
    }

    #[test]
    fn test_default_database_url() {
        let url = default_database_url();
        assert!(url.starts_with("sqlite://"));
        assert!(url.contains("hookrelay.db"));
    }
}

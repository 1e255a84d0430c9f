//! Connection pools
//!
//! `DatabasePool` hides whether the tracker runs on SQLite or MySQL. The pool
//! is built once from configuration and passed to every repository as a
//! `DynDatabasePool`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    mysql::{MySqlPool, MySqlPoolOptions},
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::{DatabaseConfig, DatabaseDriver};

/// Borrowed handle to the concrete pool behind a `DatabasePool`.
///
/// Repositories match on this to pick the SQL dialect for each query.
#[derive(Clone, Copy)]
pub enum Backend<'a> {
    Sqlite(&'a SqlitePool),
    Mysql(&'a MySqlPool),
}

#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Run one statement, returning the number of affected rows
    async fn execute(&self, query: &str) -> Result<u64>;

    /// Round-trip `SELECT 1`
    async fn ping(&self) -> Result<()>;

    async fn close(&self);

    fn driver(&self) -> DatabaseDriver;

    /// Concrete pool for dialect-specific queries
    fn backend(&self) -> Backend<'_>;

    fn as_sqlite(&self) -> Option<&SqlitePool> {
        match self.backend() {
            Backend::Sqlite(pool) => Some(pool),
            Backend::Mysql(_) => None,
        }
    }
}

pub type DynDatabasePool = Arc<dyn DatabasePool>;

/// Where a SQLite URL points
#[derive(Debug, Clone, PartialEq, Eq)]
enum SqliteTarget {
    Memory,
    File(PathBuf),
}

impl SqliteTarget {
    /// Accepts `:memory:`, `sqlite::memory:`, `sqlite:<path>`,
    /// `sqlite://<path>` or a bare path; query parameters are dropped.
    fn parse(url: &str) -> Self {
        if url == ":memory:" || url.starts_with("sqlite::memory:") {
            return SqliteTarget::Memory;
        }
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);
        let path = path.split('?').next().unwrap_or(path);
        SqliteTarget::File(PathBuf::from(path))
    }
}

pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Open (creating if needed) a SQLite database with foreign keys on.
    ///
    /// Missing parent directories of a file database are created. An
    /// in-memory database lives on exactly one connection that is never
    /// recycled, since every new connection would see an empty database.
    pub async fn new(url: &str) -> Result<Self> {
        let target = SqliteTarget::parse(url);

        let (options, pool_options) = match &target {
            SqliteTarget::Memory => (
                SqliteConnectOptions::from_str("sqlite::memory:")?,
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .min_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None),
            ),
            SqliteTarget::File(path) => {
                if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                    std::fs::create_dir_all(dir)
                        .with_context(|| format!("Failed to create database directory {:?}", dir))?;
                }
                (
                    SqliteConnectOptions::new().filename(path),
                    SqlitePoolOptions::new().max_connections(10),
                )
            }
        };

        let pool = pool_options
            .connect_with(options.create_if_missing(true).foreign_keys(true))
            .await
            .with_context(|| format!("Failed to open SQLite database {}", url))?;

        Ok(Self { pool })
    }
}

pub struct MysqlDatabase {
    pool: MySqlPool,
}

impl MysqlDatabase {
    /// Connect to MySQL; the `mysql://` scheme may be omitted
    pub async fn new(url: &str) -> Result<Self> {
        let url = if url.starts_with("mysql://") {
            url.to_string()
        } else {
            format!("mysql://{}", url)
        };

        let pool = MySqlPoolOptions::new()
            .max_connections(20)
            .connect(&url)
            .await
            .context("Failed to connect to MySQL")?;

        Ok(Self { pool })
    }
}

/// Both backends share the same statement/ping/close plumbing
macro_rules! impl_database_pool {
    ($ty:ty, $driver:expr, $backend:path) => {
        #[async_trait]
        impl DatabasePool for $ty {
            async fn execute(&self, query: &str) -> Result<u64> {
                let done = sqlx::query(query)
                    .execute(&self.pool)
                    .await
                    .with_context(|| format!("Statement failed: {}", query))?;
                Ok(done.rows_affected())
            }

            async fn ping(&self) -> Result<()> {
                sqlx::query("SELECT 1")
                    .execute(&self.pool)
                    .await
                    .context("Database ping failed")?;
                Ok(())
            }

            async fn close(&self) {
                self.pool.close().await;
            }

            fn driver(&self) -> DatabaseDriver {
                $driver
            }

            fn backend(&self) -> Backend<'_> {
                $backend(&self.pool)
            }
        }
    };
}

impl_database_pool!(SqliteDatabase, DatabaseDriver::Sqlite, Backend::Sqlite);
impl_database_pool!(MysqlDatabase, DatabaseDriver::Mysql, Backend::Mysql);

/// Connect to the configured backend
pub async fn create_pool(config: &DatabaseConfig) -> Result<DynDatabasePool> {
    let pool: DynDatabasePool = match config.driver {
        DatabaseDriver::Sqlite => Arc::new(SqliteDatabase::new(&config.url).await?),
        DatabaseDriver::Mysql => Arc::new(MysqlDatabase::new(&config.url).await?),
    };
    Ok(pool)
}

/// Fresh in-memory SQLite database
pub async fn create_test_pool() -> Result<DynDatabasePool> {
    Ok(Arc::new(SqliteDatabase::new(":memory:").await?))
}

/// Whether an error chain bottoms out in a unique-constraint violation.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<sqlx::Error>())
        .filter_map(|e| e.as_database_error())
        .any(|db_err| db_err.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_target_parsing() {
        assert_eq!(SqliteTarget::parse(":memory:"), SqliteTarget::Memory);
        assert_eq!(SqliteTarget::parse("sqlite::memory:?cache=shared"), SqliteTarget::Memory);
        assert_eq!(
            SqliteTarget::parse("sqlite://data/proctrack.db?mode=rwc"),
            SqliteTarget::File(PathBuf::from("data/proctrack.db"))
        );
        assert_eq!(
            SqliteTarget::parse("sqlite:proctrack.db"),
            SqliteTarget::File(PathBuf::from("proctrack.db"))
        );
        assert_eq!(
            SqliteTarget::parse("/var/lib/proctrack/db.sqlite"),
            SqliteTarget::File(PathBuf::from("/var/lib/proctrack/db.sqlite"))
        );
    }

    #[tokio::test]
    async fn test_memory_pool_keeps_state_between_statements() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        assert_eq!(pool.driver(), DatabaseDriver::Sqlite);
        assert!(matches!(pool.backend(), Backend::Sqlite(_)));

        pool.execute("CREATE TABLE probe (id INTEGER PRIMARY KEY)").await.unwrap();
        let inserted = pool.execute("INSERT INTO probe (id) VALUES (1), (2)").await.unwrap();
        assert_eq!(inserted, 2);

        pool.ping().await.expect("Ping should succeed");
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced() {
        let pool = create_test_pool().await.unwrap();
        pool.execute("CREATE TABLE parent (id INTEGER PRIMARY KEY)").await.unwrap();
        pool.execute("CREATE TABLE child (parent_id INTEGER NOT NULL REFERENCES parent(id))")
            .await
            .unwrap();

        let result = pool.execute("INSERT INTO child (parent_id) VALUES (99)").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_file_database_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = dir.path().join("var").join("proctrack.db");

        let pool = create_pool(&DatabaseConfig {
            driver: DatabaseDriver::Sqlite,
            url: db_path.to_string_lossy().to_string(),
        })
        .await
        .expect("Failed to create pool");
        pool.ping().await.unwrap();

        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_unique_violation_detected_through_context() {
        let pool = create_test_pool().await.unwrap();
        pool.execute("CREATE TABLE t (code TEXT NOT NULL UNIQUE)").await.unwrap();
        pool.execute("INSERT INTO t (code) VALUES ('A')").await.unwrap();

        let err = pool
            .execute("INSERT INTO t (code) VALUES ('A')")
            .await
            .expect_err("duplicate insert must fail");
        assert!(is_unique_violation(&err));
        assert!(!is_unique_violation(&anyhow::anyhow!("unrelated failure")));
    }

    #[tokio::test]
    #[ignore = "Requires MySQL server"]
    async fn test_mysql_pool_ping() {
        let url = std::env::var("MYSQL_TEST_URL")
            .unwrap_or_else(|_| "mysql://root@localhost/test".to_string());

        let pool = create_pool(&DatabaseConfig {
            driver: DatabaseDriver::Mysql,
            url,
        })
        .await
        .expect("Failed to create pool");

        assert_eq!(pool.driver(), DatabaseDriver::Mysql);
        pool.ping().await.expect("Ping should succeed");
    }
}

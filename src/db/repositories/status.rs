//! Status repository

use crate::db::{Backend, DynDatabasePool};
use crate::models::Status;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

/// Status repository trait
#[async_trait]
pub trait StatusRepository: Send + Sync {
    /// Create a new status
    async fn create(&self, code: &str, label: &str) -> Result<Status>;

    /// Get status by code
    async fn get_by_code(&self, code: &str) -> Result<Option<Status>>;

    /// List all statuses ordered by label
    async fn list(&self) -> Result<Vec<Status>>;
}

/// SQLx-based status repository
pub struct SqlxStatusRepository {
    pool: DynDatabasePool,
}

impl SqlxStatusRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn StatusRepository> {
        Arc::new(Self::new(pool))
    }
}

const INSERT_STATUS: &str = "INSERT INTO statuses (code, label) VALUES (?, ?)";
const SELECT_BY_CODE: &str = "SELECT id, code, label FROM statuses WHERE code = ?";
const SELECT_ALL: &str = "SELECT id, code, label FROM statuses ORDER BY label";

// The statements are identical in both dialects; only the row type differs.
macro_rules! row_to_status {
    ($row:expr) => {
        Status {
            id: $row.get("id"),
            code: $row.get("code"),
            label: $row.get("label"),
        }
    };
}

#[async_trait]
impl StatusRepository for SqlxStatusRepository {
    async fn create(&self, code: &str, label: &str) -> Result<Status> {
        let id = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(INSERT_STATUS)
                .bind(code)
                .bind(label)
                .execute(pool)
                .await
                .context("Failed to create status")?
                .last_insert_rowid(),
            Backend::Mysql(pool) => sqlx::query(INSERT_STATUS)
                .bind(code)
                .bind(label)
                .execute(pool)
                .await
                .context("Failed to create status")?
                .last_insert_id() as i64,
        };

        Ok(Status {
            id,
            code: code.to_string(),
            label: label.to_string(),
        })
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Status>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let row = sqlx::query(SELECT_BY_CODE)
                    .bind(code)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get status by code")?;
                Ok(row.map(|row| row_to_status!(row)))
            }
            Backend::Mysql(pool) => {
                let row = sqlx::query(SELECT_BY_CODE)
                    .bind(code)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get status by code")?;
                Ok(row.map(|row| row_to_status!(row)))
            }
        }
    }

    async fn list(&self) -> Result<Vec<Status>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let rows = sqlx::query(SELECT_ALL)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list statuses")?;
                Ok(rows.iter().map(|row| row_to_status!(row)).collect())
            }
            Backend::Mysql(pool) => {
                let rows = sqlx::query(SELECT_ALL)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list statuses")?;
                Ok(rows.iter().map(|row| row_to_status!(row)).collect())
            }
        }
    }
}

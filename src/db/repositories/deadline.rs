//! Deadline instance repository
//!
//! Cross-process queries over open deadlines and the flags the office
//! flips by hand (`closed`, `notified`).

use crate::db::{Backend, DynDatabasePool};
use crate::models::{OpenDeadline, ProcessDeadline};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::Row;
use std::sync::Arc;

/// Deadline repository trait
#[async_trait]
pub trait DeadlineRepository: Send + Sync {
    /// Get a deadline instance by id
    async fn get_by_id(&self, id: i64) -> Result<Option<ProcessDeadline>>;

    /// Open deadlines with `due_date < today`, oldest first
    async fn list_overdue(&self, today: NaiveDate) -> Result<Vec<OpenDeadline>>;

    /// Open deadlines with `from <= due_date <= to`, soonest first
    async fn list_due_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<OpenDeadline>>;

    /// Number of open deadlines with `due_date < today`
    async fn count_overdue(&self, today: NaiveDate) -> Result<i64>;

    /// Close a deadline, optionally replacing its notes
    async fn close(&self, id: i64, notes: Option<&str>) -> Result<()>;

    /// Flag a deadline as notified
    async fn mark_notified(&self, id: i64) -> Result<()>;

    /// Flag every open, overdue, un-notified deadline as notified.
    ///
    /// Returns how many rows were flagged.
    async fn mark_overdue_notified(&self, today: NaiveDate) -> Result<u64>;
}

/// SQLx-based deadline repository
pub struct SqlxDeadlineRepository {
    pool: DynDatabasePool,
}

impl SqlxDeadlineRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn DeadlineRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_BY_ID: &str = r#"
    SELECT id, process_id, legal_deadline_id, due_date, notified, closed, notes
    FROM process_deadlines
    WHERE id = ?
"#;

const SELECT_OPEN: &str = r#"
    SELECT pdl.id, p.protocol_number, t.name AS type_name, ld.name AS deadline_name,
           pdl.due_date, pdl.notified
    FROM process_deadlines pdl
    JOIN processes p ON p.id = pdl.process_id
    JOIN process_types t ON t.id = p.type_id
    JOIN legal_deadlines ld ON ld.id = pdl.legal_deadline_id
"#;

const COUNT_OVERDUE: &str = r#"
    SELECT COUNT(*) AS count
    FROM process_deadlines
    WHERE closed = FALSE AND due_date < ?
"#;

const CLOSE_DEADLINE: &str =
    "UPDATE process_deadlines SET closed = TRUE, notes = COALESCE(?, notes) WHERE id = ?";

const MARK_NOTIFIED: &str = "UPDATE process_deadlines SET notified = TRUE WHERE id = ?";

const MARK_OVERDUE_NOTIFIED: &str = r#"
    UPDATE process_deadlines
    SET notified = TRUE
    WHERE closed = FALSE AND notified = FALSE AND due_date < ?
"#;

macro_rules! row_to_open {
    ($row:expr) => {
        OpenDeadline {
            id: $row.get("id"),
            protocol_number: $row.get("protocol_number"),
            type_name: $row.get("type_name"),
            deadline_name: $row.get("deadline_name"),
            due_date: $row.get("due_date"),
            notified: $row.get("notified"),
        }
    };
}

macro_rules! row_to_deadline {
    ($row:expr) => {
        ProcessDeadline {
            id: $row.get("id"),
            process_id: $row.get("process_id"),
            legal_deadline_id: $row.get("legal_deadline_id"),
            due_date: $row.get("due_date"),
            notified: $row.get("notified"),
            closed: $row.get("closed"),
            notes: $row.get("notes"),
        }
    };
}

#[async_trait]
impl DeadlineRepository for SqlxDeadlineRepository {
    async fn get_by_id(&self, id: i64) -> Result<Option<ProcessDeadline>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let row = sqlx::query(SELECT_BY_ID)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get deadline by ID")?;
                Ok(row.map(|row| row_to_deadline!(row)))
            }
            Backend::Mysql(pool) => {
                let row = sqlx::query(SELECT_BY_ID)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get deadline by ID")?;
                Ok(row.map(|row| row_to_deadline!(row)))
            }
        }
    }

    async fn list_overdue(&self, today: NaiveDate) -> Result<Vec<OpenDeadline>> {
        let sql = format!(
            "{} WHERE pdl.closed = FALSE AND pdl.due_date < ? ORDER BY pdl.due_date ASC, pdl.id ASC",
            SELECT_OPEN
        );
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let rows = sqlx::query(&sql)
                    .bind(today)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list overdue deadlines")?;
                Ok(rows.iter().map(|row| row_to_open!(row)).collect())
            }
            Backend::Mysql(pool) => {
                let rows = sqlx::query(&sql)
                    .bind(today)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list overdue deadlines")?;
                Ok(rows.iter().map(|row| row_to_open!(row)).collect())
            }
        }
    }

    async fn list_due_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<OpenDeadline>> {
        let sql = format!(
            "{} WHERE pdl.closed = FALSE AND pdl.due_date >= ? AND pdl.due_date <= ? ORDER BY pdl.due_date ASC, pdl.id ASC",
            SELECT_OPEN
        );
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let rows = sqlx::query(&sql)
                    .bind(from)
                    .bind(to)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list upcoming deadlines")?;
                Ok(rows.iter().map(|row| row_to_open!(row)).collect())
            }
            Backend::Mysql(pool) => {
                let rows = sqlx::query(&sql)
                    .bind(from)
                    .bind(to)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list upcoming deadlines")?;
                Ok(rows.iter().map(|row| row_to_open!(row)).collect())
            }
        }
    }

    async fn count_overdue(&self, today: NaiveDate) -> Result<i64> {
        let count: i64 = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(COUNT_OVERDUE)
                .bind(today)
                .fetch_one(pool)
                .await
                .context("Failed to count overdue deadlines")?
                .get("count"),
            Backend::Mysql(pool) => sqlx::query(COUNT_OVERDUE)
                .bind(today)
                .fetch_one(pool)
                .await
                .context("Failed to count overdue deadlines")?
                .get("count"),
        };
        Ok(count)
    }

    async fn close(&self, id: i64, notes: Option<&str>) -> Result<()> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                sqlx::query(CLOSE_DEADLINE)
                    .bind(notes)
                    .bind(id)
                    .execute(pool)
                    .await
                    .context("Failed to close deadline")?;
            }
            Backend::Mysql(pool) => {
                sqlx::query(CLOSE_DEADLINE)
                    .bind(notes)
                    .bind(id)
                    .execute(pool)
                    .await
                    .context("Failed to close deadline")?;
            }
        }
        Ok(())
    }

    async fn mark_notified(&self, id: i64) -> Result<()> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                sqlx::query(MARK_NOTIFIED)
                    .bind(id)
                    .execute(pool)
                    .await
                    .context("Failed to mark deadline notified")?;
            }
            Backend::Mysql(pool) => {
                sqlx::query(MARK_NOTIFIED)
                    .bind(id)
                    .execute(pool)
                    .await
                    .context("Failed to mark deadline notified")?;
            }
        }
        Ok(())
    }

    async fn mark_overdue_notified(&self, today: NaiveDate) -> Result<u64> {
        let affected = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(MARK_OVERDUE_NOTIFIED)
                .bind(today)
                .execute(pool)
                .await
                .context("Failed to mark overdue deadlines notified")?
                .rows_affected(),
            Backend::Mysql(pool) => sqlx::query(MARK_OVERDUE_NOTIFIED)
                .bind(today)
                .execute(pool)
                .await
                .context("Failed to mark overdue deadlines notified")?
                .rows_affected(),
        };
        Ok(affected)
    }
}

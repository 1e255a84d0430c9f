//! Legal deadline rule repository

use crate::db::{Backend, DynDatabasePool};
use crate::models::{CreateLegalDeadlineInput, LegalDeadline, StartEvent};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Legal deadline repository trait
#[async_trait]
pub trait LegalDeadlineRepository: Send + Sync {
    /// Create a new rule
    async fn create(&self, input: &CreateLegalDeadlineInput) -> Result<LegalDeadline>;

    /// List all rules ordered by id
    async fn list(&self) -> Result<Vec<LegalDeadline>>;

    /// Rules that are global or scoped to `type_id`, ordered by id
    async fn list_for_type(&self, type_id: i64) -> Result<Vec<LegalDeadline>>;
}

/// SQLx-based legal deadline repository
pub struct SqlxLegalDeadlineRepository {
    pool: DynDatabasePool,
}

impl SqlxLegalDeadlineRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn LegalDeadlineRepository> {
        Arc::new(Self::new(pool))
    }
}

const INSERT_RULE: &str = r#"
    INSERT INTO legal_deadlines (type_id, name, days_limit, start_event, business_days, description)
    VALUES (?, ?, ?, ?, ?, ?)
"#;

const SELECT_COLUMNS: &str =
    "SELECT id, type_id, name, days_limit, start_event, business_days, description FROM legal_deadlines";

#[async_trait]
impl LegalDeadlineRepository for SqlxLegalDeadlineRepository {
    async fn create(&self, input: &CreateLegalDeadlineInput) -> Result<LegalDeadline> {
        let id = match self.pool.backend() {
            Backend::Sqlite(pool) => create_rule_sqlite(pool, input).await?,
            Backend::Mysql(pool) => create_rule_mysql(pool, input).await?,
        };

        Ok(LegalDeadline {
            id,
            type_id: input.type_id,
            name: input.name.clone(),
            days_limit: input.days_limit,
            start_event: input.start_event,
            business_days: input.business_days,
            description: input.description.clone(),
        })
    }

    async fn list(&self) -> Result<Vec<LegalDeadline>> {
        let sql = format!("{} ORDER BY id", SELECT_COLUMNS);
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let rows = sqlx::query(&sql)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list legal deadlines")?;
                rows.iter().map(row_to_rule_sqlite).collect()
            }
            Backend::Mysql(pool) => {
                let rows = sqlx::query(&sql)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list legal deadlines")?;
                rows.iter().map(row_to_rule_mysql).collect()
            }
        }
    }

    async fn list_for_type(&self, type_id: i64) -> Result<Vec<LegalDeadline>> {
        let sql = format!(
            "{} WHERE type_id IS NULL OR type_id = ? ORDER BY id",
            SELECT_COLUMNS
        );
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let rows = sqlx::query(&sql)
                    .bind(type_id)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list legal deadlines for type")?;
                rows.iter().map(row_to_rule_sqlite).collect()
            }
            Backend::Mysql(pool) => {
                let rows = sqlx::query(&sql)
                    .bind(type_id)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list legal deadlines for type")?;
                rows.iter().map(row_to_rule_mysql).collect()
            }
        }
    }
}

fn parse_start_event(raw: &str) -> Result<StartEvent> {
    StartEvent::parse(raw).ok_or_else(|| anyhow!("Unknown start event in legal_deadlines: {}", raw))
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_rule_sqlite(pool: &SqlitePool, input: &CreateLegalDeadlineInput) -> Result<i64> {
    let result = sqlx::query(INSERT_RULE)
        .bind(input.type_id)
        .bind(&input.name)
        .bind(i64::from(input.days_limit))
        .bind(input.start_event.as_str())
        .bind(input.business_days)
        .bind(&input.description)
        .execute(pool)
        .await
        .context("Failed to create legal deadline")?;

    Ok(result.last_insert_rowid())
}

fn row_to_rule_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<LegalDeadline> {
    let days_limit: i64 = row.get("days_limit");
    let start_event: String = row.get("start_event");

    Ok(LegalDeadline {
        id: row.get("id"),
        type_id: row.get("type_id"),
        name: row.get("name"),
        days_limit: u32::try_from(days_limit).context("days_limit out of range")?,
        start_event: parse_start_event(&start_event)?,
        business_days: row.get("business_days"),
        description: row.get("description"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_rule_mysql(pool: &MySqlPool, input: &CreateLegalDeadlineInput) -> Result<i64> {
    let result = sqlx::query(INSERT_RULE)
        .bind(input.type_id)
        .bind(&input.name)
        .bind(i64::from(input.days_limit))
        .bind(input.start_event.as_str())
        .bind(input.business_days)
        .bind(&input.description)
        .execute(pool)
        .await
        .context("Failed to create legal deadline")?;

    Ok(result.last_insert_id() as i64)
}

fn row_to_rule_mysql(row: &sqlx::mysql::MySqlRow) -> Result<LegalDeadline> {
    let days_limit: i32 = row.get("days_limit");
    let start_event: String = row.get("start_event");

    Ok(LegalDeadline {
        id: row.get("id"),
        type_id: row.get("type_id"),
        name: row.get("name"),
        days_limit: u32::try_from(days_limit).context("days_limit out of range")?,
        start_event: parse_start_event(&start_event)?,
        business_days: row.get("business_days"),
        description: row.get("description"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxLegalDeadlineRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxLegalDeadlineRepository::new(pool.clone());
        (pool, repo)
    }

    async fn create_test_type(pool: &SqlitePool, code: &str) -> i64 {
        sqlx::query("INSERT INTO process_types (code, name) VALUES (?, ?)")
            .bind(code)
            .bind(code)
            .execute(pool)
            .await
            .expect("Failed to create test type")
            .last_insert_rowid()
    }

    fn rule_input(type_id: Option<i64>, name: &str, event: StartEvent) -> CreateLegalDeadlineInput {
        CreateLegalDeadlineInput {
            type_id,
            name: name.to_string(),
            days_limit: 30,
            start_event: event,
            business_days: false,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_create_rule() {
        let (_pool, repo) = setup_test_repo().await;
        let mut input = rule_input(None, "Document complement", StartEvent::Created);
        input.days_limit = 15;
        input.business_days = true;

        let created = repo.create(&input).await.expect("Failed to create rule");
        let listed = repo.list().await.expect("Failed to list rules");

        assert_eq!(listed, vec![created]);
        assert_eq!(listed[0].days_limit, 15);
        assert!(listed[0].business_days);
        assert_eq!(listed[0].start_event, StartEvent::Created);
    }

    #[tokio::test]
    async fn test_list_for_type_includes_global_rules() {
        let (pool, repo) = setup_test_repo().await;
        let sqlite = pool.as_sqlite().unwrap();
        let prom = create_test_type(sqlite, "PROM_CAP").await;
        let prog = create_test_type(sqlite, "PROG_MER").await;

        repo.create(&rule_input(None, "Global", StartEvent::Created)).await.unwrap();
        repo.create(&rule_input(Some(prom), "Training", StartEvent::Created)).await.unwrap();
        repo.create(&rule_input(Some(prog), "Merit", StartEvent::Created)).await.unwrap();

        let rules = repo.list_for_type(prom).await.expect("Failed to list rules");
        let names: Vec<&str> = rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Global", "Training"]);
    }

    #[tokio::test]
    async fn test_legacy_start_event_spelling_is_read() {
        let (pool, repo) = setup_test_repo().await;
        sqlx::query("INSERT INTO legal_deadlines (name, days_limit, start_event) VALUES ('Old', 10, 'created_date')")
            .execute(pool.as_sqlite().unwrap())
            .await
            .unwrap();

        let rules = repo.list().await.expect("Failed to list rules");
        assert_eq!(rules[0].start_event, StartEvent::Created);
    }

    #[tokio::test]
    async fn test_unknown_start_event_is_an_error() {
        let (pool, repo) = setup_test_repo().await;
        sqlx::query("INSERT INTO legal_deadlines (name, days_limit, start_event) VALUES ('Bad', 10, 'decision')")
            .execute(pool.as_sqlite().unwrap())
            .await
            .unwrap();

        assert!(repo.list().await.is_err());
    }
}

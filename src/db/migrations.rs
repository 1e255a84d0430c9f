//! Schema migrations
//!
//! Each migration carries its SQL for both dialects and is compiled into the
//! binary. Applied versions are recorded in `_migrations`; a migration and
//! its record are written in one transaction.
//!
//! # Usage
//!
//! ```ignore
//! use proctrack::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

use anyhow::{Context, Result};
use std::collections::BTreeSet;

use super::{Backend, DynDatabasePool};

#[derive(Debug, Clone)]
pub struct Migration {
    /// Unique, increasing
    pub version: i32,
    pub name: &'static str,
    /// `;`-separated statements
    pub up_sqlite: &'static str,
    pub up_mysql: &'static str,
}

/// All migrations, in application order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_process_types",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS process_types (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code VARCHAR(50) NOT NULL UNIQUE,
                name VARCHAR(200) NOT NULL,
                description TEXT
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS process_types (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                code VARCHAR(50) NOT NULL UNIQUE,
                name VARCHAR(200) NOT NULL,
                description TEXT
            );
        "#,
    },
    Migration {
        version: 2,
        name: "create_statuses",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS statuses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code VARCHAR(50) NOT NULL UNIQUE,
                label VARCHAR(100) NOT NULL
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS statuses (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                code VARCHAR(50) NOT NULL UNIQUE,
                label VARCHAR(100) NOT NULL
            );
        "#,
    },
    Migration {
        version: 3,
        name: "create_documents",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code VARCHAR(50) NOT NULL UNIQUE,
                name VARCHAR(200) NOT NULL,
                description TEXT
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS documents (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                code VARCHAR(50) NOT NULL UNIQUE,
                name VARCHAR(200) NOT NULL,
                description TEXT
            );
        "#,
    },
    Migration {
        version: 4,
        name: "create_required_documents",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS required_documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type_id INTEGER NOT NULL,
                document_id INTEGER NOT NULL,
                required BOOLEAN NOT NULL DEFAULT 1,
                doc_order INTEGER NOT NULL DEFAULT 0,
                UNIQUE (type_id, document_id),
                FOREIGN KEY (type_id) REFERENCES process_types(id) ON DELETE CASCADE,
                FOREIGN KEY (document_id) REFERENCES documents(id)
            );
            CREATE INDEX IF NOT EXISTS idx_required_documents_type ON required_documents(type_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS required_documents (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                type_id BIGINT NOT NULL,
                document_id BIGINT NOT NULL,
                required BOOLEAN NOT NULL DEFAULT TRUE,
                doc_order INT NOT NULL DEFAULT 0,
                UNIQUE KEY uq_required_documents (type_id, document_id),
                FOREIGN KEY (type_id) REFERENCES process_types(id) ON DELETE CASCADE,
                FOREIGN KEY (document_id) REFERENCES documents(id)
            );
            CREATE INDEX idx_required_documents_type ON required_documents(type_id);
        "#,
    },
    Migration {
        version: 5,
        name: "create_legal_deadlines",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS legal_deadlines (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type_id INTEGER,
                name VARCHAR(200) NOT NULL,
                days_limit INTEGER NOT NULL CHECK (days_limit >= 0),
                start_event VARCHAR(50) NOT NULL,
                business_days BOOLEAN NOT NULL DEFAULT 0,
                description TEXT,
                FOREIGN KEY (type_id) REFERENCES process_types(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_legal_deadlines_type ON legal_deadlines(type_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS legal_deadlines (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                type_id BIGINT,
                name VARCHAR(200) NOT NULL,
                days_limit INT NOT NULL,
                start_event VARCHAR(50) NOT NULL,
                business_days BOOLEAN NOT NULL DEFAULT FALSE,
                description TEXT,
                CHECK (days_limit >= 0),
                FOREIGN KEY (type_id) REFERENCES process_types(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_legal_deadlines_type ON legal_deadlines(type_id);
        "#,
    },
    Migration {
        version: 6,
        name: "create_processes",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS processes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                protocol_number VARCHAR(50) NOT NULL UNIQUE,
                type_id INTEGER NOT NULL,
                applicant_name VARCHAR(200) NOT NULL,
                applicant_registration VARCHAR(50),
                created_date DATE NOT NULL,
                status_id INTEGER NOT NULL,
                opinion TEXT,
                financial_effective_date DATE,
                closed_date DATE,
                notes TEXT,
                FOREIGN KEY (type_id) REFERENCES process_types(id),
                FOREIGN KEY (status_id) REFERENCES statuses(id)
            );
            CREATE INDEX IF NOT EXISTS idx_processes_type_status ON processes(type_id, status_id);
            CREATE INDEX IF NOT EXISTS idx_processes_created_date ON processes(created_date);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS processes (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                protocol_number VARCHAR(50) NOT NULL UNIQUE,
                type_id BIGINT NOT NULL,
                applicant_name VARCHAR(200) NOT NULL,
                applicant_registration VARCHAR(50),
                created_date DATE NOT NULL,
                status_id BIGINT NOT NULL,
                opinion TEXT,
                financial_effective_date DATE,
                closed_date DATE,
                notes TEXT,
                FOREIGN KEY (type_id) REFERENCES process_types(id),
                FOREIGN KEY (status_id) REFERENCES statuses(id)
            );
            CREATE INDEX idx_processes_type_status ON processes(type_id, status_id);
            CREATE INDEX idx_processes_created_date ON processes(created_date);
        "#,
    },
    Migration {
        version: 7,
        name: "create_process_documents",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS process_documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                process_id INTEGER NOT NULL,
                document_id INTEGER NOT NULL,
                required BOOLEAN NOT NULL DEFAULT 1,
                provided BOOLEAN NOT NULL DEFAULT 0,
                provided_date DATE,
                observations TEXT,
                UNIQUE (process_id, document_id),
                FOREIGN KEY (process_id) REFERENCES processes(id) ON DELETE CASCADE,
                FOREIGN KEY (document_id) REFERENCES documents(id)
            );
            CREATE INDEX IF NOT EXISTS idx_process_documents_process ON process_documents(process_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS process_documents (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                process_id BIGINT NOT NULL,
                document_id BIGINT NOT NULL,
                required BOOLEAN NOT NULL DEFAULT TRUE,
                provided BOOLEAN NOT NULL DEFAULT FALSE,
                provided_date DATE,
                observations TEXT,
                UNIQUE KEY uq_process_documents (process_id, document_id),
                FOREIGN KEY (process_id) REFERENCES processes(id) ON DELETE CASCADE,
                FOREIGN KEY (document_id) REFERENCES documents(id)
            );
        "#,
    },
    Migration {
        version: 8,
        name: "create_process_deadlines",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS process_deadlines (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                process_id INTEGER NOT NULL,
                legal_deadline_id INTEGER NOT NULL,
                due_date DATE NOT NULL,
                notified BOOLEAN NOT NULL DEFAULT 0,
                closed BOOLEAN NOT NULL DEFAULT 0,
                notes TEXT,
                UNIQUE (process_id, legal_deadline_id),
                FOREIGN KEY (process_id) REFERENCES processes(id) ON DELETE CASCADE,
                FOREIGN KEY (legal_deadline_id) REFERENCES legal_deadlines(id)
            );
            CREATE INDEX IF NOT EXISTS idx_process_deadlines_process ON process_deadlines(process_id);
            CREATE INDEX IF NOT EXISTS idx_process_deadlines_due ON process_deadlines(due_date);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS process_deadlines (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                process_id BIGINT NOT NULL,
                legal_deadline_id BIGINT NOT NULL,
                due_date DATE NOT NULL,
                notified BOOLEAN NOT NULL DEFAULT FALSE,
                closed BOOLEAN NOT NULL DEFAULT FALSE,
                notes TEXT,
                UNIQUE KEY uq_process_deadlines (process_id, legal_deadline_id),
                FOREIGN KEY (process_id) REFERENCES processes(id) ON DELETE CASCADE,
                FOREIGN KEY (legal_deadline_id) REFERENCES legal_deadlines(id)
            );
            CREATE INDEX idx_process_deadlines_due ON process_deadlines(due_date);
        "#,
    },
];

const RECORD_MIGRATION: &str = "INSERT INTO _migrations (version, name) VALUES (?, ?)";

/// Apply every migration not yet recorded, in version order.
///
/// Returns how many were applied; a second run returns 0.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    let applied = applied_versions(pool).await?;
    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|m| !applied.contains(&m.version))
        .collect();

    if pending.is_empty() {
        tracing::debug!("Schema up to date");
        return Ok(0);
    }

    for migration in &pending {
        tracing::info!("Applying migration {}: {}", migration.version, migration.name);
        apply(pool, migration)
            .await
            .with_context(|| format!("Migration {} ({}) failed", migration.version, migration.name))?;
    }

    tracing::info!("Applied {} migration(s)", pending.len());
    Ok(pending.len())
}

/// Number of migrations `run_migrations` would apply
pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    let applied = applied_versions(pool).await?;
    Ok(MIGRATIONS
        .iter()
        .filter(|m| !applied.contains(&m.version))
        .count())
}

/// Versions recorded in `_migrations`, creating the table on first use
async fn applied_versions(pool: &DynDatabasePool) -> Result<BTreeSet<i32>> {
    let versions = match pool.backend() {
        Backend::Sqlite(pool) => {
            sqlx::query(
                "CREATE TABLE IF NOT EXISTS _migrations (
                    version INTEGER PRIMARY KEY,
                    name VARCHAR(255) NOT NULL,
                    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
                )",
            )
            .execute(pool)
            .await?;
            sqlx::query_scalar::<_, i64>("SELECT version FROM _migrations")
                .fetch_all(pool)
                .await?
        }
        Backend::Mysql(pool) => {
            sqlx::query(
                "CREATE TABLE IF NOT EXISTS _migrations (
                    version INT PRIMARY KEY,
                    name VARCHAR(255) NOT NULL,
                    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
                )",
            )
            .execute(pool)
            .await?;
            sqlx::query_scalar::<_, i32>("SELECT version FROM _migrations")
                .fetch_all(pool)
                .await?
                .into_iter()
                .map(i64::from)
                .collect()
        }
    };

    versions
        .into_iter()
        .map(|v| i32::try_from(v).context("Migration version out of range"))
        .collect()
}

// MySQL commits DDL implicitly, so there the transaction only guarantees
// the record row is not written for a failed statement.
async fn apply(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    match pool.backend() {
        Backend::Sqlite(pool) => {
            let mut tx = pool.begin().await?;
            for statement in split_sql_statements(migration.up_sqlite) {
                sqlx::query(statement)
                    .execute(&mut *tx)
                    .await
                    .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
            }
            sqlx::query(RECORD_MIGRATION)
                .bind(migration.version)
                .bind(migration.name)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
        }
        Backend::Mysql(pool) => {
            let mut tx = pool.begin().await?;
            for statement in split_sql_statements(migration.up_mysql) {
                sqlx::query(statement)
                    .execute(&mut *tx)
                    .await
                    .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
            }
            sqlx::query(RECORD_MIGRATION)
                .bind(migration.version)
                .bind(migration.name)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
        }
    }
    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Split SQL into individual statements, dropping comment-only fragments
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

/// Check if a string contains only SQL comments
fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

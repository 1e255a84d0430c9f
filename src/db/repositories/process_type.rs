//! Process type repository
//!
//! Process types and their document templates.

use crate::db::{Backend, DynDatabasePool};
use crate::models::{CreateProcessTypeInput, ProcessType, RequiredDocument};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Process type repository trait
#[async_trait]
pub trait ProcessTypeRepository: Send + Sync {
    /// Create a new process type
    async fn create(&self, input: &CreateProcessTypeInput) -> Result<ProcessType>;

    /// Get process type by code
    async fn get_by_code(&self, code: &str) -> Result<Option<ProcessType>>;

    /// List all process types ordered by name
    async fn list(&self) -> Result<Vec<ProcessType>>;

    /// Add a document to a type's template
    async fn add_required_document(
        &self,
        type_id: i64,
        document_id: i64,
        required: bool,
        doc_order: i32,
    ) -> Result<RequiredDocument>;

    /// Template lines of a type in checklist order
    async fn list_required_documents(&self, type_id: i64) -> Result<Vec<RequiredDocument>>;
}

/// SQLx-based process type repository
pub struct SqlxProcessTypeRepository {
    pool: DynDatabasePool,
}

impl SqlxProcessTypeRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ProcessTypeRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ProcessTypeRepository for SqlxProcessTypeRepository {
    async fn create(&self, input: &CreateProcessTypeInput) -> Result<ProcessType> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => create_type_sqlite(pool, input).await,
            Backend::Mysql(pool) => create_type_mysql(pool, input).await,
        }
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<ProcessType>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => get_type_by_code_sqlite(pool, code).await,
            Backend::Mysql(pool) => get_type_by_code_mysql(pool, code).await,
        }
    }

    async fn list(&self) -> Result<Vec<ProcessType>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => list_types_sqlite(pool).await,
            Backend::Mysql(pool) => list_types_mysql(pool).await,
        }
    }

    async fn add_required_document(
        &self,
        type_id: i64,
        document_id: i64,
        required: bool,
        doc_order: i32,
    ) -> Result<RequiredDocument> {
        let id = match self.pool.backend() {
            Backend::Sqlite(pool) => {
                insert_required_sqlite(pool, type_id, document_id, required, doc_order).await?
            }
            Backend::Mysql(pool) => {
                insert_required_mysql(pool, type_id, document_id, required, doc_order).await?
            }
        };

        Ok(RequiredDocument {
            id,
            type_id,
            document_id,
            required,
            doc_order,
        })
    }

    async fn list_required_documents(&self, type_id: i64) -> Result<Vec<RequiredDocument>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => list_required_sqlite(pool, type_id).await,
            Backend::Mysql(pool) => list_required_mysql(pool, type_id).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_type_sqlite(pool: &SqlitePool, input: &CreateProcessTypeInput) -> Result<ProcessType> {
    let result = sqlx::query("INSERT INTO process_types (code, name, description) VALUES (?, ?, ?)")
        .bind(&input.code)
        .bind(&input.name)
        .bind(&input.description)
        .execute(pool)
        .await
        .context("Failed to create process type")?;

    Ok(ProcessType {
        id: result.last_insert_rowid(),
        code: input.code.clone(),
        name: input.name.clone(),
        description: input.description.clone(),
    })
}

async fn get_type_by_code_sqlite(pool: &SqlitePool, code: &str) -> Result<Option<ProcessType>> {
    let row = sqlx::query("SELECT id, code, name, description FROM process_types WHERE code = ?")
        .bind(code)
        .fetch_optional(pool)
        .await
        .context("Failed to get process type by code")?;

    Ok(row.map(|row| ProcessType {
        id: row.get("id"),
        code: row.get("code"),
        name: row.get("name"),
        description: row.get("description"),
    }))
}

async fn list_types_sqlite(pool: &SqlitePool) -> Result<Vec<ProcessType>> {
    let rows = sqlx::query("SELECT id, code, name, description FROM process_types ORDER BY name")
        .fetch_all(pool)
        .await
        .context("Failed to list process types")?;

    Ok(rows
        .iter()
        .map(|row| ProcessType {
            id: row.get("id"),
            code: row.get("code"),
            name: row.get("name"),
            description: row.get("description"),
        })
        .collect())
}

async fn insert_required_sqlite(
    pool: &SqlitePool,
    type_id: i64,
    document_id: i64,
    required: bool,
    doc_order: i32,
) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO required_documents (type_id, document_id, required, doc_order) VALUES (?, ?, ?, ?)",
    )
    .bind(type_id)
    .bind(document_id)
    .bind(required)
    .bind(doc_order)
    .execute(pool)
    .await
    .context("Failed to add required document")?;

    Ok(result.last_insert_rowid())
}

async fn list_required_sqlite(pool: &SqlitePool, type_id: i64) -> Result<Vec<RequiredDocument>> {
    let rows = sqlx::query(
        r#"
        SELECT id, type_id, document_id, required, doc_order
        FROM required_documents
        WHERE type_id = ?
        ORDER BY doc_order, id
        "#,
    )
    .bind(type_id)
    .fetch_all(pool)
    .await
    .context("Failed to list required documents")?;

    Ok(rows
        .iter()
        .map(|row| RequiredDocument {
            id: row.get("id"),
            type_id: row.get("type_id"),
            document_id: row.get("document_id"),
            required: row.get("required"),
            doc_order: row.get("doc_order"),
        })
        .collect())
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_type_mysql(pool: &MySqlPool, input: &CreateProcessTypeInput) -> Result<ProcessType> {
    let result = sqlx::query("INSERT INTO process_types (code, name, description) VALUES (?, ?, ?)")
        .bind(&input.code)
        .bind(&input.name)
        .bind(&input.description)
        .execute(pool)
        .await
        .context("Failed to create process type")?;

    Ok(ProcessType {
        id: result.last_insert_id() as i64,
        code: input.code.clone(),
        name: input.name.clone(),
        description: input.description.clone(),
    })
}

async fn get_type_by_code_mysql(pool: &MySqlPool, code: &str) -> Result<Option<ProcessType>> {
    let row = sqlx::query("SELECT id, code, name, description FROM process_types WHERE code = ?")
        .bind(code)
        .fetch_optional(pool)
        .await
        .context("Failed to get process type by code")?;

    Ok(row.map(|row| ProcessType {
        id: row.get("id"),
        code: row.get("code"),
        name: row.get("name"),
        description: row.get("description"),
    }))
}

async fn list_types_mysql(pool: &MySqlPool) -> Result<Vec<ProcessType>> {
    let rows = sqlx::query("SELECT id, code, name, description FROM process_types ORDER BY name")
        .fetch_all(pool)
        .await
        .context("Failed to list process types")?;

    Ok(rows
        .iter()
        .map(|row| ProcessType {
            id: row.get("id"),
            code: row.get("code"),
            name: row.get("name"),
            description: row.get("description"),
        })
        .collect())
}

async fn insert_required_mysql(
    pool: &MySqlPool,
    type_id: i64,
    document_id: i64,
    required: bool,
    doc_order: i32,
) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO required_documents (type_id, document_id, required, doc_order) VALUES (?, ?, ?, ?)",
    )
    .bind(type_id)
    .bind(document_id)
    .bind(required)
    .bind(doc_order)
    .execute(pool)
    .await
    .context("Failed to add required document")?;

    Ok(result.last_insert_id() as i64)
}

async fn list_required_mysql(pool: &MySqlPool, type_id: i64) -> Result<Vec<RequiredDocument>> {
    let rows = sqlx::query(
        r#"
        SELECT id, type_id, document_id, required, doc_order
        FROM required_documents
        WHERE type_id = ?
        ORDER BY doc_order, id
        "#,
    )
    .bind(type_id)
    .fetch_all(pool)
    .await
    .context("Failed to list required documents")?;

    Ok(rows
        .iter()
        .map(|row| RequiredDocument {
            id: row.get("id"),
            type_id: row.get("type_id"),
            document_id: row.get("document_id"),
            required: row.get("required"),
            doc_order: row.get("doc_order"),
        })
        .collect())
}

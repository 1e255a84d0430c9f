//! Document catalog repository

use crate::db::{Backend, DynDatabasePool};
use crate::models::Document;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

/// Document catalog repository trait
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Create a new catalog document
    async fn create(&self, code: &str, name: &str, description: Option<&str>) -> Result<Document>;

    /// Get document by code
    async fn get_by_code(&self, code: &str) -> Result<Option<Document>>;

    /// List all documents ordered by name
    async fn list(&self) -> Result<Vec<Document>>;
}

/// SQLx-based document repository
pub struct SqlxDocumentRepository {
    pool: DynDatabasePool,
}

impl SqlxDocumentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn DocumentRepository> {
        Arc::new(Self::new(pool))
    }
}

const INSERT_DOCUMENT: &str = "INSERT INTO documents (code, name, description) VALUES (?, ?, ?)";
const SELECT_BY_CODE: &str = "SELECT id, code, name, description FROM documents WHERE code = ?";
const SELECT_ALL: &str = "SELECT id, code, name, description FROM documents ORDER BY name";

macro_rules! row_to_document {
    ($row:expr) => {
        Document {
            id: $row.get("id"),
            code: $row.get("code"),
            name: $row.get("name"),
            description: $row.get("description"),
        }
    };
}

#[async_trait]
impl DocumentRepository for SqlxDocumentRepository {
    async fn create(&self, code: &str, name: &str, description: Option<&str>) -> Result<Document> {
        let id = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(INSERT_DOCUMENT)
                .bind(code)
                .bind(name)
                .bind(description)
                .execute(pool)
                .await
                .context("Failed to create document")?
                .last_insert_rowid(),
            Backend::Mysql(pool) => sqlx::query(INSERT_DOCUMENT)
                .bind(code)
                .bind(name)
                .bind(description)
                .execute(pool)
                .await
                .context("Failed to create document")?
                .last_insert_id() as i64,
        };

        Ok(Document {
            id,
            code: code.to_string(),
            name: name.to_string(),
            description: description.map(str::to_string),
        })
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Document>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let row = sqlx::query(SELECT_BY_CODE)
                    .bind(code)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get document by code")?;
                Ok(row.map(|row| row_to_document!(row)))
            }
            Backend::Mysql(pool) => {
                let row = sqlx::query(SELECT_BY_CODE)
                    .bind(code)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get document by code")?;
                Ok(row.map(|row| row_to_document!(row)))
            }
        }
    }

    async fn list(&self) -> Result<Vec<Document>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let rows = sqlx::query(SELECT_ALL)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list documents")?;
                Ok(rows.iter().map(|row| row_to_document!(row)).collect())
            }
            Backend::Mysql(pool) => {
                let rows = sqlx::query(SELECT_ALL)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list documents")?;
                Ok(rows.iter().map(|row| row_to_document!(row)).collect())
            }
        }
    }
}

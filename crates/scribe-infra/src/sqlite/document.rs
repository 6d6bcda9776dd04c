//! SQLite document store.
//!
//! Saves are full-content replacement upserts under a stable id; the row's
//! `created_at` is set once and preserved on every subsequent update.

use sqlx::Row;

use scribe_core::repository::DocumentStore;
use scribe_types::chat::Document;
use scribe_types::error::RepositoryError;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `DocumentStore`.
pub struct SqliteDocumentStore {
    pool: DatabasePool,
}

impl SqliteDocumentStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct DocumentRow {
    id: String,
    title: String,
    content: String,
    user_id: String,
    created_at: String,
}

impl DocumentRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            user_id: row.try_get("user_id")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_document(self) -> Result<Document, RepositoryError> {
        let created_at = parse_datetime(&self.created_at)?;

        Ok(Document {
            id: self.id,
            title: self.title,
            content: self.content,
            user_id: self.user_id,
            created_at,
        })
    }
}

impl DocumentStore for SqliteDocumentStore {
    async fn get(&self, id: &str) -> Result<Option<Document>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM documents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let document_row = DocumentRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(document_row.into_document()?))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, document: &Document) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO documents (id, title, content, user_id, created_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                   title = excluded.title,
                   content = excluded.content"#,
        )
        .bind(&document.id)
        .bind(&document.title)
        .bind(&document.content)
        .bind(&document.user_id)
        .bind(format_datetime(&document.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }
}

//! SQLite suggestion store.
//!
//! Suggestions are batch-inserted at the end of a requestSuggestions tool
//! execution and are immutable afterwards.

use sqlx::Row;

use scribe_core::repository::SuggestionStore;
use scribe_types::chat::Suggestion;
use scribe_types::error::RepositoryError;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `SuggestionStore`.
pub struct SqliteSuggestionStore {
    pool: DatabasePool,
}

impl SqliteSuggestionStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// All suggestions for a document, oldest first. Used by tests and the
    /// panel read path.
    pub async fn list_for_document(
        &self,
        document_id: &str,
    ) -> Result<Vec<Suggestion>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM suggestions WHERE document_id = ? ORDER BY created_at ASC",
        )
        .bind(document_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut suggestions = Vec::with_capacity(rows.len());
        for row in &rows {
            let suggestion_row = SuggestionRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            suggestions.push(suggestion_row.into_suggestion()?);
        }

        Ok(suggestions)
    }
}

struct SuggestionRow {
    id: String,
    document_id: String,
    document_created_at: String,
    original_text: String,
    suggested_text: String,
    description: String,
    is_resolved: i64,
    user_id: String,
    created_at: String,
}

impl SuggestionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            document_id: row.try_get("document_id")?,
            document_created_at: row.try_get("document_created_at")?,
            original_text: row.try_get("original_text")?,
            suggested_text: row.try_get("suggested_text")?,
            description: row.try_get("description")?,
            is_resolved: row.try_get("is_resolved")?,
            user_id: row.try_get("user_id")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_suggestion(self) -> Result<Suggestion, RepositoryError> {
        Ok(Suggestion {
            id: self.id,
            document_id: self.document_id,
            document_created_at: parse_datetime(&self.document_created_at)?,
            original_text: self.original_text,
            suggested_text: self.suggested_text,
            description: self.description,
            is_resolved: self.is_resolved != 0,
            user_id: self.user_id,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

impl SuggestionStore for SqliteSuggestionStore {
    async fn save_batch(&self, suggestions: &[Suggestion]) -> Result<(), RepositoryError> {
        for suggestion in suggestions {
            sqlx::query(
                r#"INSERT INTO suggestions
                   (id, document_id, document_created_at, original_text, suggested_text,
                    description, is_resolved, user_id, created_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(&suggestion.id)
            .bind(&suggestion.document_id)
            .bind(format_datetime(&suggestion.document_created_at))
            .bind(&suggestion.original_text)
            .bind(&suggestion.suggested_text)
            .bind(&suggestion.description)
            .bind(suggestion.is_resolved as i64)
            .bind(&suggestion.user_id)
            .bind(format_datetime(&suggestion.created_at))
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        }

        Ok(())
    }
}

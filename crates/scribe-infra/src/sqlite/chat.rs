//! SQLite chat store.
//!
//! Implements `ChatStore` from `scribe-core` using sqlx with split
//! read/write pools. The message list is stored as a JSON column and
//! replaced wholesale on save; `created_at` survives the upsert.

use sqlx::Row;

use scribe_core::repository::ChatStore;
use scribe_types::chat::Chat;
use scribe_types::error::RepositoryError;
use scribe_types::message::ChatMessage;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `ChatStore`.
pub struct SqliteChatStore {
    pool: DatabasePool,
}

impl SqliteChatStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct ChatRow {
    id: String,
    user_id: String,
    messages: String,
    created_at: String,
}

impl ChatRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            messages: row.try_get("messages")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_chat(self) -> Result<Chat, RepositoryError> {
        let messages: Vec<ChatMessage> = serde_json::from_str(&self.messages)
            .map_err(|e| RepositoryError::Query(format!("invalid messages JSON: {e}")))?;
        let created_at = parse_datetime(&self.created_at)?;

        Ok(Chat {
            id: self.id,
            user_id: self.user_id,
            messages,
            created_at,
        })
    }
}

impl ChatStore for SqliteChatStore {
    async fn get(&self, id: &str) -> Result<Option<Chat>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chats WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let chat_row =
                    ChatRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(chat_row.into_chat()?))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, chat: &Chat) -> Result<(), RepositoryError> {
        let messages = serde_json::to_string(&chat.messages)
            .map_err(|e| RepositoryError::Query(format!("failed to encode messages: {e}")))?;

        sqlx::query(
            r#"INSERT INTO chats (id, user_id, messages, created_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                   user_id = excluded.user_id,
                   messages = excluded.messages"#,
        )
        .bind(&chat.id)
        .bind(&chat.user_id)
        .bind(&messages)
        .bind(format_datetime(&chat.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM chats WHERE id = ?")
            .bind(id)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

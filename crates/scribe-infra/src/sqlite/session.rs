//! SQLite auth session store.
//!
//! Bearer tokens are SHA-256 hashed and looked up in the `sessions` table.
//! A session row may carry no user id; such sessions authenticate but skip
//! all persistence.

use chrono::Utc;
use sha2::{Digest, Sha256};
use sqlx::Row;
use uuid::Uuid;

use scribe_types::error::RepositoryError;
use scribe_types::identity::AuthSession;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed auth session lookup.
pub struct SqliteSessionStore {
    pool: DatabasePool,
}

impl SqliteSessionStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Resolve a bearer token to a session, touching `last_used_at`.
    pub async fn get_by_token(
        &self,
        token: &str,
    ) -> Result<Option<AuthSession>, RepositoryError> {
        let token_hash = hash_token(token);

        let row = sqlx::query("SELECT * FROM sessions WHERE token_hash = ?")
            .bind(&token_hash)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let id: String = row
            .try_get("id")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        let user_id: Option<String> = row
            .try_get("user_id")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        let created_at: String = row
            .try_get("created_at")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        // Best effort, don't fail the request on a bookkeeping write.
        let _ = sqlx::query("UPDATE sessions SET last_used_at = ? WHERE id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(&id)
            .execute(&self.pool.writer)
            .await;

        Ok(Some(AuthSession {
            id,
            user_id,
            created_at: parse_datetime(&created_at)?,
        }))
    }

    /// Create a session for a user and return the plaintext bearer token.
    pub async fn create_session(
        &self,
        user_id: Option<&str>,
    ) -> Result<String, RepositoryError> {
        let token = format!("scrb_{}", Uuid::now_v7().simple());
        let id = Uuid::now_v7().to_string();

        sqlx::query(
            "INSERT INTO sessions (id, token_hash, user_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(hash_token(&token))
        .bind(user_id)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(token)
    }

    /// Ensure at least one session exists; returns the plaintext token only
    /// when a fresh one was created (shown to the operator once).
    pub async fn ensure_session(&self) -> Result<Option<String>, RepositoryError> {
        let existing = sqlx::query("SELECT id FROM sessions LIMIT 1")
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if existing.is_some() {
            return Ok(None);
        }

        let token = self
            .create_session(Some(&Uuid::now_v7().to_string()))
            .await?;
        Ok(Some(token))
    }
}

/// Compute the SHA-256 hash of a bearer token (lowercase hex).
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{:x}", digest)
}

//! Persistence gateway traits.
//!
//! Implementations live in scribe-infra (SQLite). Uses native async fn in
//! traits (RPITIT, Rust 2024 edition).

use scribe_types::chat::{Chat, Document, Suggestion};
use scribe_types::error::RepositoryError;

/// Repository trait for persisted chats.
pub trait ChatStore: Send + Sync {
    /// Get a chat by its opaque id.
    fn get(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Chat>, RepositoryError>> + Send;

    /// Save a chat, replacing the full message list on conflict.
    fn save(
        &self,
        chat: &Chat,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a chat. Returns `NotFound` if no row was removed.
    fn delete(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}

/// Repository trait for persisted documents.
pub trait DocumentStore: Send + Sync {
    fn get(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Document>, RepositoryError>> + Send;

    /// Save a document, replacing title and content on conflict while
    /// preserving the original `created_at`.
    fn save(
        &self,
        document: &Document,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}

/// Repository trait for persisted suggestions.
pub trait SuggestionStore: Send + Sync {
    /// Insert a batch of suggestions in one operation.
    fn save_batch(
        &self,
        suggestions: &[Suggestion],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}

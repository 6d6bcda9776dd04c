//! Persisted entities: chats, documents, suggestions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::ChatMessage;

/// A persisted conversation.
///
/// The id is an opaque client-supplied string; the message list is replaced
/// wholesale on every save, after sanitization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    pub user_id: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
}

/// A drafted text artifact rendered in the side panel.
///
/// Created by the create-document tool; subsequent updates replace `content`
/// in full under the same id and title. Never deleted by this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// An edit suggestion for a document, immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: String,
    pub document_id: String,
    /// Snapshot of the document's creation time, not an ownership link.
    pub document_created_at: DateTime<Utc>,
    pub original_text: String,
    pub suggested_text: String,
    pub description: String,
    pub is_resolved: bool,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

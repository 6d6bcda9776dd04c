//! Authenticated session identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A resolved auth session.
///
/// Produced by the session collaborator from a bearer token. A session may
/// carry no user id; such requests are served but skip all persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuthSession {
    /// The user identity for persistence decisions, if present.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}

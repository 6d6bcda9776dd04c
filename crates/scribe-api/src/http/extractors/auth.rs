//! Bearer session authentication extractor.
//!
//! Extracts the session token from:
//! - `Authorization: Bearer <token>` header
//! - `X-API-Key: <token>` header
//!
//! Tokens are SHA-256 hashed and resolved against the `sessions` table. A
//! request with no valid token is rejected with 401 before any handler
//! work, so unauthenticated requests can never reach persistence.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use scribe_types::identity::AuthSession;

use crate::http::error::AppError;
use crate::state::AppState;

/// Authenticated session. Extracting this validates the bearer token.
pub struct Session(pub AuthSession);

impl Session {
    /// The user identity for persistence decisions, if present.
    pub fn user_id(&self) -> Option<&str> {
        self.0.user_id()
    }
}

impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)?;

        match state.sessions.get_by_token(&token).await {
            Ok(Some(session)) => Ok(Session(session)),
            Ok(None) => Err(AppError::Unauthorized(
                "Invalid session token. Provide a valid token via 'Authorization: Bearer <token>' or 'X-API-Key: <token>' header.".to_string(),
            )),
            Err(e) => Err(AppError::Internal(format!("Database error: {e}"))),
        }
    }
}

/// Extract the session token from request headers.
fn extract_token(parts: &Parts) -> Result<String, AppError> {
    // Try Authorization: Bearer <token>
    if let Some(auth) = parts.headers.get("authorization") {
        let auth_str = auth.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid Authorization header encoding".to_string())
        })?;
        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return Ok(token.trim().to_string());
        }
    }

    // Try X-API-Key header
    if let Some(token) = parts.headers.get("x-api-key") {
        let token_str = token.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid X-API-Key header encoding".to_string())
        })?;
        return Ok(token_str.trim().to_string());
    }

    Err(AppError::Unauthorized(
        "Missing session token. Provide via 'Authorization: Bearer <token>' or 'X-API-Key: <token>' header.".to_string(),
    ))
}

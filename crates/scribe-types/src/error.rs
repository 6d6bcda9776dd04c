use thiserror::Error;

/// Errors from repository operations (trait definitions live in scribe-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,
}

/// Errors from the retrieval service adapter.
///
/// These never reach the client: the orchestration layer degrades every
/// retrieval failure to a sentinel context string.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("retrieval credential source absent or invalid: {0}")]
    AuthConfiguration(String),

    #[error("retrieval transport error: {0}")]
    Http(String),

    #[error("retrieval service returned HTTP {status}: {message}")]
    Service { status: u16, message: String },

    #[error("retrieval deserialization error: {0}")]
    Deserialization(String),
}

/// Errors from the weather forecast adapter.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("forecast transport error: {0}")]
    Http(String),

    #[error("forecast deserialization error: {0}")]
    Deserialization(String),
}

/// Errors from tool invocation parsing and execution.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: '{0}'")]
    UnknownTool(String),

    #[error("invalid parameters for '{tool}': {message}")]
    InvalidParameters { tool: String, message: String },

    #[error("document not found")]
    DocumentNotFound,

    #[error("tool execution failed: {0}")]
    Execution(String),
}

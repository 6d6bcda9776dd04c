//! Retrieval client port and the degrade policy.
//!
//! The adapter (scribe-infra) flattens extractive answers into
//! `"Page <n>: <content>"` lines; [`retrieve_context`] applies the recovery
//! policy: empty results and failures both collapse to sentinel strings so a
//! retrieval problem can never abort the conversational turn.

use scribe_types::error::RetrievalError;
use tracing::warn;

/// Sentinel returned when the index has nothing relevant.
pub const NO_RESULTS_SENTINEL: &str = "No relevant information found in the documents.";

/// Sentinel returned when retrieval itself failed.
pub const RETRIEVAL_ERROR_SENTINEL: &str = "Error retrieving document-based answers.";

/// Port for the external document-search service.
///
/// `search` returns the flattened extractive-answer text, possibly empty
/// when the service had results but no answers. Implementations live in
/// scribe-infra. Uses native async fn in traits (RPITIT).
pub trait RetrievalClient: Send + Sync {
    fn search(
        &self,
        query: &str,
    ) -> impl std::future::Future<Output = Result<String, RetrievalError>> + Send;
}

/// Retrieve grounding context for a query, never failing.
///
/// Empty answers become [`NO_RESULTS_SENTINEL`]; any error is logged and
/// masked as [`RETRIEVAL_ERROR_SENTINEL`].
pub async fn retrieve_context<R: RetrievalClient>(client: &R, query: &str) -> String {
    match client.search(query).await {
        Ok(answers) if answers.trim().is_empty() => NO_RESULTS_SENTINEL.to_string(),
        Ok(answers) => answers,
        Err(err) => {
            warn!(error = %err, "retrieval degraded to sentinel");
            RETRIEVAL_ERROR_SENTINEL.to_string()
        }
    }
}

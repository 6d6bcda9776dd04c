//! Discovery-engine retrieval adapter.
//!
//! Issues a search request against the configured serving endpoint and
//! flattens every extractive answer across all results into
//! `"Page <n>: <content>"` lines, preserving service order. The degrade
//! policy (sentinels, never failing the turn) lives in scribe-core.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use scribe_core::retrieval::RetrievalClient;
use scribe_types::error::RetrievalError;

use crate::config::{RetrievalConfig, SEARCH_TOKEN_VAR};

/// Port for obtaining the bearer credential used by the search request.
///
/// Uses native async fn in traits (RPITIT).
pub trait CredentialSource: Send + Sync {
    fn bearer_token(
        &self,
    ) -> impl std::future::Future<Output = Result<SecretString, RetrievalError>> + Send;
}

/// Reads the bearer credential from an environment variable.
///
/// An absent or empty variable is an auth-configuration error; the turn
/// orchestration masks it as the retrieval-error sentinel.
pub struct EnvCredentialSource {
    var: String,
}

impl EnvCredentialSource {
    pub fn new() -> Self {
        Self {
            var: SEARCH_TOKEN_VAR.to_string(),
        }
    }

    pub fn with_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredentialSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialSource for EnvCredentialSource {
    async fn bearer_token(&self) -> Result<SecretString, RetrievalError> {
        match std::env::var(&self.var) {
            Ok(value) if !value.trim().is_empty() => Ok(SecretString::from(value)),
            _ => Err(RetrievalError::AuthConfiguration(format!(
                "{} is not set",
                self.var
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    query: &'a str,
    page_size: u32,
    query_expansion_spec: QueryExpansionSpec,
    spell_correction_spec: SpellCorrectionSpec,
    content_search_spec: ContentSearchSpec,
    session: &'a str,
}

#[derive(Debug, Serialize)]
struct QueryExpansionSpec {
    condition: &'static str,
}

#[derive(Debug, Serialize)]
struct SpellCorrectionSpec {
    mode: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContentSearchSpec {
    extractive_content_spec: ExtractiveContentSpec,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExtractiveContentSpec {
    max_extractive_answer_count: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    document: Option<ResultDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultDocument {
    derived_struct_data: Option<DerivedStructData>,
}

#[derive(Debug, Deserialize)]
struct DerivedStructData {
    #[serde(default)]
    extractive_answers: Vec<ExtractiveAnswer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtractiveAnswer {
    // The service reports page numbers as strings; tolerate numbers too.
    page_number: Option<serde_json::Value>,
    content: Option<String>,
}

fn page_label(page_number: &Option<serde_json::Value>) -> String {
    match page_number {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => "?".to_string(),
    }
}

/// Flatten every extractive answer into one newline-joined string.
fn flatten_extractive_answers(response: &SearchResponse) -> String {
    response
        .results
        .iter()
        .filter_map(|result| result.document.as_ref())
        .filter_map(|document| document.derived_struct_data.as_ref())
        .flat_map(|data| data.extractive_answers.iter())
        .map(|answer| {
            format!(
                "Page {}: {}",
                page_label(&answer.page_number),
                answer.content.as_deref().unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Retrieval client for a managed extractive-answer search index.
pub struct DiscoveryRetrievalClient<C> {
    client: reqwest::Client,
    config: RetrievalConfig,
    credentials: C,
}

impl<C: CredentialSource> DiscoveryRetrievalClient<C> {
    pub fn new(config: RetrievalConfig, credentials: C) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            config,
            credentials,
        }
    }
}

impl<C: CredentialSource> RetrievalClient for DiscoveryRetrievalClient<C> {
    async fn search(&self, query: &str) -> Result<String, RetrievalError> {
        let token = self.credentials.bearer_token().await?;

        let payload = SearchRequest {
            query,
            page_size: self.config.page_size,
            query_expansion_spec: QueryExpansionSpec { condition: "AUTO" },
            spell_correction_spec: SpellCorrectionSpec { mode: "AUTO" },
            content_search_spec: ContentSearchSpec {
                extractive_content_spec: ExtractiveContentSpec {
                    max_extractive_answer_count: 1,
                },
            },
            session: &self.config.session,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(token.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| RetrievalError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::Deserialization(e.to_string()))?;

        Ok(flatten_extractive_answers(&body))
    }
}

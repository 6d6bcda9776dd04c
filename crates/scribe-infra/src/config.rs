//! Service configuration.
//!
//! Non-secret settings come from `{data_dir}/config.toml` with sensible
//! defaults when the file is missing or malformed. Secrets (the completion
//! API key and the retrieval bearer credential) are read from the
//! environment only and wrapped in [`SecretString`].

use std::path::Path;

use secrecy::SecretString;
use serde::Deserialize;

/// Environment variable holding the completion provider API key.
pub const LLM_API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Environment variable holding the retrieval bearer credential.
pub const SEARCH_TOKEN_VAR: &str = "SCRIBE_SEARCH_TOKEN";

fn default_llm_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_retrieval_endpoint() -> String {
    "https://discoveryengine.googleapis.com/v1alpha/servingConfigs/default_search:search"
        .to_string()
}

fn default_page_size() -> u32 {
    10
}

fn default_retrieval_session() -> String {
    "sessions/-".to_string()
}

/// Completion provider settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
        }
    }
}

/// Retrieval service settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_retrieval_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_retrieval_session")]
    pub session: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            endpoint: default_retrieval_endpoint(),
            page_size: default_page_size(),
            session: default_retrieval_session(),
        }
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: defaults.
/// - Unreadable or malformed file: logged warning, defaults.
pub async fn load_config(data_dir: &Path) -> ServiceConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ServiceConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ServiceConfig::default();
        }
    };

    match toml::from_str::<ServiceConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ServiceConfig::default()
        }
    }
}

/// Read a required secret from the environment.
pub fn secret_from_env(var: &str) -> anyhow::Result<SecretString> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(SecretString::from(value)),
        _ => anyhow::bail!("environment variable {var} is not set"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config.llm.base_url, "https://api.openai.com");
        assert_eq!(config.retrieval.page_size, 10);
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[llm]
base_url = "http://localhost:8080"

[retrieval]
endpoint = "http://localhost:9090/search"
page_size = 5
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.llm.base_url, "http://localhost:8080");
        assert_eq!(config.retrieval.endpoint, "http://localhost:9090/search");
        assert_eq!(config.retrieval.page_size, 5);
        // Unspecified fields keep their defaults.
        assert_eq!(config.retrieval.session, "sessions/-");
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_defaults() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.retrieval.page_size, 10);
    }
}

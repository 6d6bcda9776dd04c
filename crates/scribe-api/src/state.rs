//! Application state wiring all services together.
//!
//! The turn service is generic over repository/client traits; AppState pins
//! it to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use scribe_core::llm::LlmProvider;
use scribe_core::turn::TurnService;
use scribe_infra::config::{LLM_API_KEY_VAR, load_config, secret_from_env};
use scribe_infra::llm::openai::OpenAiCompatProvider;
use scribe_infra::retrieval::{DiscoveryRetrievalClient, EnvCredentialSource};
use scribe_infra::sqlite::chat::SqliteChatStore;
use scribe_infra::sqlite::document::SqliteDocumentStore;
use scribe_infra::sqlite::pool::DatabasePool;
use scribe_infra::sqlite::session::SqliteSessionStore;
use scribe_infra::sqlite::suggestion::SqliteSuggestionStore;
use scribe_infra::weather::OpenMeteoClient;

/// Concrete type alias for the turn service pinned to infra implementations.
pub type ConcreteTurnService = TurnService<
    SqliteChatStore,
    SqliteDocumentStore,
    SqliteSuggestionStore,
    DiscoveryRetrievalClient<EnvCredentialSource>,
    OpenMeteoClient,
>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub turn_service: Arc<ConcreteTurnService>,
    pub chats: Arc<SqliteChatStore>,
    pub sessions: Arc<SqliteSessionStore>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: connect to the DB, wire services.
    pub async fn init(data_dir: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;

        let db_url = format!("sqlite://{}?mode=rwc", data_dir.join("scribe.db").display());
        let db_pool = DatabasePool::new(&db_url).await?;

        let api_key = secret_from_env(LLM_API_KEY_VAR)?;
        let provider: Arc<dyn LlmProvider> =
            Arc::new(OpenAiCompatProvider::new(api_key, config.llm.base_url.clone()));

        let retrieval = Arc::new(DiscoveryRetrievalClient::new(
            config.retrieval.clone(),
            EnvCredentialSource::new(),
        ));

        let chats = Arc::new(SqliteChatStore::new(db_pool.clone()));
        let documents = Arc::new(SqliteDocumentStore::new(db_pool.clone()));
        let suggestions = Arc::new(SqliteSuggestionStore::new(db_pool.clone()));
        let sessions = Arc::new(SqliteSessionStore::new(db_pool.clone()));
        let forecast = Arc::new(OpenMeteoClient::new());

        let turn_service = Arc::new(TurnService::new(
            provider,
            retrieval,
            chats.clone(),
            documents,
            suggestions,
            forecast,
        ));

        Ok(Self {
            turn_service,
            chats,
            sessions,
            data_dir,
        })
    }
}

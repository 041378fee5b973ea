use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::agent::instructions::{KNOWLEDGE_AGENT_INSTRUCTIONS, WEB_SEARCH_INSTRUCTIONS};
use crate::agent::{KnowledgeAgent, WebSearchAgent};
use crate::controller::ConversationController;
use crate::core::config::{AppPaths, AssistantSettings, ConfigService};
use crate::core::errors::ApiError;
use crate::knowledge::{KnowledgeStore, SqliteKnowledgeStore};
use crate::llm::{LlmProvider, OpenAiProvider};
use crate::session::SessionRegistry;
use crate::tools::{WebSearch, WebSearchClient};

pub mod error;

use error::InitializationError;

/// The wired-up assistant: knowledge store plus the controller that owns
/// both agents.
pub struct AssistantRuntime {
    pub knowledge: Arc<dyn KnowledgeStore>,
    pub controller: Arc<ConversationController>,
}

#[derive(Clone)]
pub enum AssistantStatus {
    Ready(Arc<AssistantRuntime>),
    /// Initialization failed; interaction is disabled.
    Failed(String),
}

/// Global application state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: ConfigService,
    pub settings: AssistantSettings,
    pub sessions: SessionRegistry,
    pub assistant: AssistantStatus,
}

impl AppState {
    /// Loads configuration and builds the assistant. A failure is logged and
    /// kept in [`AssistantStatus::Failed`] so the server can still report it.
    pub async fn initialize(paths: Arc<AppPaths>) -> Arc<Self> {
        let config = ConfigService::new(paths.clone());

        let (settings, assistant) = match load_settings(&config) {
            Ok(settings) => {
                let assistant = match build_runtime(&paths, &settings).await {
                    Ok(runtime) => AssistantStatus::Ready(Arc::new(runtime)),
                    Err(err) => {
                        tracing::error!("Application initialization failed: {}", err);
                        AssistantStatus::Failed(err.to_string())
                    }
                };
                (settings, assistant)
            }
            Err(err) => {
                tracing::error!("Application initialization failed: {}", err);
                (
                    AssistantSettings::from_config(&Value::Null),
                    AssistantStatus::Failed(err.to_string()),
                )
            }
        };

        let sessions = SessionRegistry::new();
        sessions.spawn_idle_sweeper(Duration::from_secs(settings.session_idle_secs));

        Arc::new(AppState {
            paths,
            config,
            settings,
            sessions,
            assistant,
        })
    }

    pub fn with_runtime(
        paths: Arc<AppPaths>,
        settings: AssistantSettings,
        assistant: AssistantStatus,
    ) -> Self {
        AppState {
            config: ConfigService::new(paths.clone()),
            paths,
            settings,
            sessions: SessionRegistry::new(),
            assistant,
        }
    }

    pub fn runtime(&self) -> Result<&Arc<AssistantRuntime>, ApiError> {
        match &self.assistant {
            AssistantStatus::Ready(runtime) => Ok(runtime),
            AssistantStatus::Failed(reason) => Err(ApiError::ServiceUnavailable(format!(
                "Assistant is not available: {}",
                reason
            ))),
        }
    }
}

fn load_settings(config: &ConfigService) -> Result<AssistantSettings, InitializationError> {
    let value = config
        .load_config()
        .map_err(|e| InitializationError::Config(e.into()))?;
    Ok(AssistantSettings::from_config(&value))
}

async fn build_runtime(
    paths: &AppPaths,
    settings: &AssistantSettings,
) -> Result<AssistantRuntime, InitializationError> {
    let api_key = settings.llm.resolve_api_key().ok_or_else(|| {
        InitializationError::Credential(
            "set OPENAI_API_KEY or llm.api_key in secrets.yaml".to_string(),
        )
    })?;

    let persist_dir = paths.resolve_data_path(&settings.knowledge.persist_dir);
    let store = SqliteKnowledgeStore::open(&persist_dir, &settings.knowledge.collection)
        .await
        .map_err(|e| InitializationError::Knowledge(e.into()))?;
    tracing::info!("Connected to knowledge store at {}", store.db_path().display());
    log_store_diagnostics(&store).await;
    let knowledge: Arc<dyn KnowledgeStore> = Arc::new(store);

    let llm = OpenAiProvider::new(&settings.llm, api_key)
        .map_err(|e| InitializationError::Llm(e.into()))?;
    tracing::info!("Using {} chat model {}", llm.name(), llm.chat_model());
    let llm = Arc::new(llm);

    let search = Arc::new(WebSearchClient::new(settings.search.clone()));
    let search_provider = search.provider_name().to_string();

    let answering = Arc::new(KnowledgeAgent::new(
        knowledge.clone(),
        llm.clone(),
        KNOWLEDGE_AGENT_INSTRUCTIONS,
        settings.knowledge.top_k,
    ));
    let web_search = Arc::new(WebSearchAgent::new(search, llm, WEB_SEARCH_INSTRUCTIONS));

    let controller = ConversationController::new(
        answering,
        web_search,
        settings.fallback.clone(),
        &settings.topic,
        &search_provider,
    );
    tracing::info!("Agents initialized successfully");

    Ok(AssistantRuntime {
        knowledge,
        controller: Arc::new(controller),
    })
}

async fn log_store_diagnostics(store: &SqliteKnowledgeStore) {
    match store.list_collections().await {
        Ok(collections) => tracing::info!("Available collections: {:?}", collections),
        Err(err) => tracing::warn!("Could not list collections: {}", err),
    }
    match store.count().await {
        Ok(count) => tracing::info!(
            "Collection '{}' has {} documents",
            store.collection(),
            count
        ),
        Err(err) => tracing::warn!(
            "Could not confirm collection '{}': {}",
            store.collection(),
            err
        ),
    }
}

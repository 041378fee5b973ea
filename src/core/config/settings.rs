//! Typed view over the merged YAML config.
//!
//! Every field has a default so an empty config still yields a usable
//! assistant, provided the API key is supplied through the environment.

use std::env;

use serde::Serialize;
use serde_json::Value;

use crate::agent::fallback::FallbackPolicy;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

pub const DEFAULT_TOPIC: &str = "DPDPA";
pub const DEFAULT_PERSIST_DIR: &str = "dpdpa_chroma_lc_final_v5";
pub const DEFAULT_COLLECTION: &str = "dpdpa_knowledge_lc_final_v5";
pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_SEARCH_PROVIDER: &str = "duckduckgo";
pub const DEFAULT_SEARCH_MAX_RESULTS: usize = 8;
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 3_600;

#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeSettings {
    pub persist_dir: String,
    pub collection: String,
    pub top_k: usize,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub request_timeout_secs: u64,
    api_key: Option<String>,
}

impl LlmSettings {
    /// `OPENAI_API_KEY` wins over `llm.api_key` from the secrets file.
    pub fn resolve_api_key(&self) -> Option<String> {
        env::var(API_KEY_ENV)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .or_else(|| self.api_key.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchSettings {
    pub provider: String,
    pub max_results: usize,
    pub google_api_key: Option<String>,
    pub google_engine_id: Option<String>,
    pub brave_api_key: Option<String>,
    pub bing_api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AssistantSettings {
    pub topic: String,
    pub knowledge: KnowledgeSettings,
    pub llm: LlmSettings,
    pub search: SearchSettings,
    pub fallback: FallbackPolicy,
    pub cors_allowed_origins: Vec<String>,
    /// Sessions untouched this long are dropped from the registry.
    pub session_idle_secs: u64,
}

impl AssistantSettings {
    pub fn from_config(config: &Value) -> Self {
        let knowledge = KnowledgeSettings {
            persist_dir: string_at(config, "knowledge", "persist_dir")
                .unwrap_or_else(|| DEFAULT_PERSIST_DIR.to_string()),
            collection: string_at(config, "knowledge", "collection")
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            top_k: u64_at(config, "knowledge", "top_k")
                .map(|v| v as usize)
                .unwrap_or(DEFAULT_TOP_K),
        };

        let llm = LlmSettings {
            base_url: string_at(config, "llm", "base_url")
                .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            chat_model: string_at(config, "llm", "chat_model")
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            embedding_model: string_at(config, "llm", "embedding_model")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            request_timeout_secs: u64_at(config, "llm", "request_timeout_secs")
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            api_key: string_at(config, "llm", "api_key"),
        };

        let search = SearchSettings {
            provider: string_at(config, "search", "provider")
                .unwrap_or_else(|| DEFAULT_SEARCH_PROVIDER.to_string()),
            max_results: u64_at(config, "search", "max_results")
                .map(|v| v as usize)
                .unwrap_or(DEFAULT_SEARCH_MAX_RESULTS),
            google_api_key: string_at(config, "search", "google_search_api_key"),
            google_engine_id: string_at(config, "search", "google_search_engine_id"),
            brave_api_key: string_at(config, "search", "brave_search_api_key"),
            bing_api_key: string_at(config, "search", "bing_search_api_key"),
        };

        let cors_allowed_origins = config
            .get("server")
            .and_then(|v| v.get("cors_allowed_origins"))
            .and_then(|v| v.as_array())
            .map(|list| {
                list.iter()
                    .filter_map(|item| item.as_str())
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(|item| item.to_string())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        Self {
            topic: string_at(config, "assistant", "topic")
                .unwrap_or_else(|| DEFAULT_TOPIC.to_string()),
            knowledge,
            llm,
            search,
            fallback: FallbackPolicy::from_config(config),
            cors_allowed_origins,
            session_idle_secs: u64_at(config, "server", "session_idle_secs")
                .unwrap_or(DEFAULT_SESSION_IDLE_SECS),
        }
    }
}

fn string_at(config: &Value, section: &str, key: &str) -> Option<String> {
    config
        .get(section)
        .and_then(|v| v.get(key))
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

fn u64_at(config: &Value, section: &str, key: &str) -> Option<u64> {
    config
        .get(section)
        .and_then(|v| v.get(key))
        .and_then(|v| v.as_u64())
}

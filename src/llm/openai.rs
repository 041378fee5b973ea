use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::LlmProvider;
use super::types::ChatRequest;
use crate::core::config::settings::LlmSettings;
use crate::core::errors::ApiError;

/// Client for an OpenAI-compatible `/chat/completions` + `/embeddings` API.
#[derive(Clone)]
pub struct OpenAiProvider {
    base_url: String,
    api_key: String,
    chat_model: String,
    embedding_model: String,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(settings: &LlmSettings, api_key: String) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(ApiError::internal)?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key,
            chat_model: settings.chat_model.clone(),
            embedding_model: settings.embedding_model.clone(),
            client,
        })
    }

    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = json!({
            "model": self.chat_model,
            "messages": request.messages,
            "stream": false,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(t) = request.temperature {
                obj.insert("temperature".to_string(), json!(t));
            }
            if let Some(t) = request.max_tokens {
                obj.insert("max_tokens".to_string(), json!(t));
            }
        }

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::upstream)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!(
                "chat completion failed ({}): {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(ApiError::upstream)?;
        extract_chat_content(&payload)
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        let url = format!("{}/embeddings", self.base_url);

        let body = json!({
            "model": self.embedding_model,
            "input": inputs,
        });

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::upstream)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!(
                "embedding request failed ({}): {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(ApiError::upstream)?;
        Ok(extract_embeddings(&payload))
    }
}

fn extract_chat_content(payload: &Value) -> Result<String, ApiError> {
    payload["choices"][0]["message"]["content"]
        .as_str()
        .map(|content| content.to_string())
        .ok_or_else(|| ApiError::Upstream("chat completion returned no content".to_string()))
}

fn extract_embeddings(payload: &Value) -> Vec<Vec<f32>> {
    let mut embeddings = Vec::new();
    if let Some(data) = payload["data"].as_array() {
        for item in data {
            if let Some(vals) = item["embedding"].as_array() {
                let vec: Vec<f32> = vals
                    .iter()
                    .filter_map(|v| v.as_f64().map(|f| f as f32))
                    .collect();
                embeddings.push(vec);
            }
        }
    }
    embeddings
}

use async_trait::async_trait;

use super::types::ChatRequest;
use crate::core::errors::ApiError;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "openai")
    fn name(&self) -> &str;

    /// chat completion (non-streaming)
    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError>;

    /// generate embeddings
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError>;
}

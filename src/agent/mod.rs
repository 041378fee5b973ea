//! Answering agents and the post-processing applied to their output.

pub mod fallback;
pub mod instructions;
pub mod knowledge_agent;
pub mod modes;
pub mod response;
pub mod sources;
pub mod web_agent;

use async_trait::async_trait;

use crate::core::errors::ApiError;

pub use fallback::FallbackPolicy;
pub use knowledge_agent::KnowledgeAgent;
pub use modes::AnswerMode;
pub use response::{normalize, AgentResponse, NormalizedResponse, Source, SourceCitation, TextResult};
pub use sources::format_sources;
pub use web_agent::WebSearchAgent;

/// A prompt-in, response-out agent boundary.
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;

    /// `prompt` is what the model is asked, including any mode prefix.
    /// `query` is the user's own text and drives retrieval or search.
    async fn run(&self, prompt: &str, query: &str) -> Result<AgentResponse, ApiError>;
}

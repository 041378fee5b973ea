use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] anyhow::Error),

    #[error("Missing LLM credentials: {0}")]
    Credential(String),

    #[error("Failed to connect to knowledge store: {0}")]
    Knowledge(#[source] anyhow::Error),

    #[error("Failed to initialize LLM client: {0}")]
    Llm(#[source] anyhow::Error),
}

//! In-memory doubles for the network-facing traits.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::agent::{Agent, AgentResponse};
use crate::core::errors::ApiError;
use crate::llm::{ChatRequest, LlmProvider};
use crate::tools::{SearchResult, WebSearch};

pub struct ScriptedLlm {
    reply: Result<String, String>,
    embedding: Option<Vec<f32>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedLlm {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            embedding: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            embedding: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
        self.requests.lock().unwrap().push(request);
        self.reply.clone().map_err(ApiError::Upstream)
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        match &self.embedding {
            Some(embedding) => Ok(inputs.iter().map(|_| embedding.clone()).collect()),
            None => Err(ApiError::Upstream("embeddings unavailable".to_string())),
        }
    }
}

pub struct StaticSearch {
    results: Result<Vec<SearchResult>, String>,
    queries: Mutex<Vec<String>>,
}

impl StaticSearch {
    pub fn with_results(results: Vec<SearchResult>) -> Self {
        Self {
            results: Ok(results),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            results: Err(message.to_string()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebSearch for StaticSearch {
    fn provider_name(&self) -> &str {
        "StaticSearch"
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ApiError> {
        self.queries.lock().unwrap().push(query.to_string());
        self.results.clone().map_err(ApiError::Upstream)
    }
}

/// Replays queued responses in order; an empty queue is an error.
pub struct ScriptedAgent {
    name: String,
    responses: Mutex<VecDeque<Result<AgentResponse, String>>>,
    prompts: Mutex<Vec<String>>,
    queries: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedAgent {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            responses: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Sleeps before answering, like a slow model call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn then(self, response: AgentResponse) -> Self {
        self.responses.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn then_fail(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, prompt: &str, query: &str) -> Result<AgentResponse, ApiError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.queries.lock().unwrap().push(query.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(ApiError::Upstream(message)),
            None => Err(ApiError::Internal("no scripted response left".to_string())),
        }
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::instructions::{build_knowledge_context, build_knowledge_system_prompt};
use super::response::{AgentResponse, Source, SourceCitation, TextResult};
use super::Agent;
use crate::core::errors::ApiError;
use crate::knowledge::{DocumentSearchResult, KnowledgeStore};
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};

const SEARCH_TOOL_NAME: &str = "search_knowledge_base";

/// Answers from the persisted knowledge collection: retrieve, then ask the
/// model to answer from the retrieved excerpts.
pub struct KnowledgeAgent {
    store: Arc<dyn KnowledgeStore>,
    llm: Arc<dyn LlmProvider>,
    instructions: String,
    top_k: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetrievalMethod {
    Embedding,
    Keyword,
}

impl RetrievalMethod {
    fn as_str(self) -> &'static str {
        match self {
            RetrievalMethod::Embedding => "embedding",
            RetrievalMethod::Keyword => "keyword",
        }
    }
}

impl KnowledgeAgent {
    pub fn new(
        store: Arc<dyn KnowledgeStore>,
        llm: Arc<dyn LlmProvider>,
        instructions: &str,
        top_k: usize,
    ) -> Self {
        Self {
            store,
            llm,
            instructions: build_knowledge_system_prompt(instructions),
            top_k: top_k.max(1),
        }
    }

    async fn retrieve(
        &self,
        query: &str,
    ) -> Result<(Vec<DocumentSearchResult>, RetrievalMethod), ApiError> {
        match self.llm.embed(&[query.to_string()]).await {
            Ok(mut embeddings) if !embeddings.is_empty() => {
                let embedding = embeddings.swap_remove(0);
                let results = self.store.search(&embedding, self.top_k).await?;
                if !results.is_empty() {
                    return Ok((results, RetrievalMethod::Embedding));
                }
                tracing::debug!("No embedded documents matched, using keyword search");
            }
            Ok(_) => tracing::warn!("Embedding backend returned no vectors"),
            Err(err) => tracing::warn!("Query embedding failed, using keyword search: {}", err),
        }

        let results = self.store.text_search(query, self.top_k).await?;
        Ok((results, RetrievalMethod::Keyword))
    }
}

/// One citation per distinct document/page/url, in retrieval order.
fn citations(results: &[DocumentSearchResult]) -> Vec<Source> {
    let mut seen: Vec<SourceCitation> = Vec::new();
    for result in results {
        let citation = SourceCitation {
            document_name: result.document.document_name(),
            page_label: result.document.page_label(),
            url: result.document.url(),
        };
        if citation.is_empty() || seen.contains(&citation) {
            continue;
        }
        seen.push(citation);
    }
    seen.into_iter().map(Source::from).collect()
}

#[async_trait]
impl Agent for KnowledgeAgent {
    fn name(&self) -> &str {
        "knowledge"
    }

    async fn run(&self, prompt: &str, query: &str) -> Result<AgentResponse, ApiError> {
        let (results, method) = self.retrieve(query).await?;
        tracing::info!(
            "Retrieved {} excerpts from '{}' via {} search",
            results.len(),
            self.store.collection(),
            method.as_str()
        );

        let request = ChatRequest::new(vec![
            ChatMessage::system(self.instructions.clone()),
            ChatMessage::system(build_knowledge_context(&results)),
            ChatMessage::user(prompt),
        ]);
        let content = self.llm.chat(request).await?;

        let tool_calls = json!([{
            "tool_name": SEARCH_TOOL_NAME,
            "tool_args": { "query": query, "limit": self.top_k },
            "method": method.as_str(),
            "result_count": results.len(),
        }]);

        Ok(AgentResponse::Structured(TextResult {
            content,
            sources: citations(&results),
            tool_calls: Some(tool_calls),
        }))
    }
}

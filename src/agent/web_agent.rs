use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::instructions::build_search_context;
use super::response::{AgentResponse, Source, SourceCitation, TextResult};
use super::Agent;
use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::tools::WebSearch;

/// Searches the live web and has the model summarize what it found.
pub struct WebSearchAgent {
    search: Arc<dyn WebSearch>,
    llm: Arc<dyn LlmProvider>,
    instructions: String,
}

impl WebSearchAgent {
    pub fn new(search: Arc<dyn WebSearch>, llm: Arc<dyn LlmProvider>, instructions: &str) -> Self {
        Self {
            search,
            llm,
            instructions: instructions.to_string(),
        }
    }
}

#[async_trait]
impl Agent for WebSearchAgent {
    fn name(&self) -> &str {
        "web_search"
    }

    async fn run(&self, prompt: &str, query: &str) -> Result<AgentResponse, ApiError> {
        let results = self.search.search(query).await?;
        tracing::info!(
            "{} returned {} results",
            self.search.provider_name(),
            results.len()
        );

        let request = ChatRequest::new(vec![
            ChatMessage::system(self.instructions.clone()),
            ChatMessage::system(build_search_context(query, &results)),
            ChatMessage::user(prompt),
        ]);
        let content = self.llm.chat(request).await?;

        let sources = results
            .iter()
            .map(|result| {
                Source::from(SourceCitation {
                    url: Some(result.url.clone()),
                    ..SourceCitation::default()
                })
            })
            .collect();
        let tool_calls = json!([{
            "tool_name": "web_search",
            "tool_args": { "query": query },
            "provider": self.search.provider_name(),
            "result_count": results.len(),
        }]);

        Ok(AgentResponse::Structured(TextResult {
            content,
            sources,
            tool_calls: Some(tool_calls),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedLlm, StaticSearch};
    use crate::tools::SearchResult;

    #[tokio::test]
    async fn summarizes_search_results_with_url_sources() {
        let search = Arc::new(StaticSearch::with_results(vec![SearchResult {
            title: "DPDP Rules notified".to_string(),
            url: "https://meity.gov.in/dpdp-rules".to_string(),
            snippet: "The rules were notified.".to_string(),
        }]));
        let llm = Arc::new(ScriptedLlm::replying("- Rules notified (Source: meity.gov.in)"));
        let agent = WebSearchAgent::new(search.clone(), llm.clone(), "search well");

        let AgentResponse::Structured(result) = agent.run("Latest DPDPA info on: rules", "Latest DPDPA info on: rules").await.unwrap() else {
            panic!("expected a structured result");
        };

        assert_eq!(search.queries(), vec!["Latest DPDPA info on: rules".to_string()]);
        assert_eq!(result.content, "- Rules notified (Source: meity.gov.in)");
        assert_eq!(result.sources.len(), 1);
        let tool_calls = result.tool_calls.unwrap();
        assert_eq!(tool_calls[0]["provider"], "StaticSearch");
        assert_eq!(tool_calls[0]["result_count"], 1);

        let requests = llm.requests();
        assert!(requests[0].messages[1].content.contains("https://meity.gov.in/dpdp-rules"));
    }

    #[tokio::test]
    async fn search_failure_propagates() {
        let search = Arc::new(StaticSearch::failing("rate limited"));
        let llm = Arc::new(ScriptedLlm::replying("unused"));
        let agent = WebSearchAgent::new(search, llm.clone(), "search well");

        let err = agent.run("penalties", "penalties").await.unwrap_err();
        assert!(err.to_string().contains("rate limited"));
        assert!(llm.requests().is_empty());
    }
}

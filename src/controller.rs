//! Drives one interaction at a time against a session's conversation state.

use std::sync::Arc;
use std::time::Instant;

use crate::agent::instructions::DETAILED_MODE_PREFIX;
use crate::agent::{format_sources, normalize, Agent, FallbackPolicy};
use crate::core::errors::ApiError;
use crate::session::{ConversationState, SessionHandle, Turn, TurnDetails};

pub struct ConversationController {
    answering: Arc<dyn Agent>,
    web_search: Arc<dyn Agent>,
    fallback: FallbackPolicy,
    detailed_prefix: String,
    topic: String,
    search_provider: String,
}

impl ConversationController {
    pub fn new(
        answering: Arc<dyn Agent>,
        web_search: Arc<dyn Agent>,
        fallback: FallbackPolicy,
        topic: &str,
        search_provider: &str,
    ) -> Self {
        Self {
            answering,
            web_search,
            fallback,
            detailed_prefix: DETAILED_MODE_PREFIX.to_string(),
            topic: topic.to_string(),
            search_provider: search_provider.to_string(),
        }
    }

    /// Answers `input` from the knowledge base and appends the user turn and
    /// the assistant turn. Returns the assistant turn's index.
    ///
    /// Agent failures are recorded as an error turn rather than returned.
    pub async fn submit(&self, state: &mut ConversationState, input: &str) -> Result<usize, ApiError> {
        if input.trim().is_empty() {
            return Err(ApiError::BadRequest("Message must not be empty".to_string()));
        }

        state.push(Turn::user(input));

        let mode = state.mode();
        tracing::info!("Running {} agent in {} mode", self.answering.name(), mode.as_str());
        let prompt = mode.compose_prompt(&self.detailed_prefix, input);

        let started = Instant::now();
        let turn = match self.answering.run(&prompt, input).await {
            Ok(response) => {
                let normalized = normalize(response);
                let elapsed_secs = started.elapsed().as_secs_f64();
                let offer_search = self
                    .fallback
                    .should_offer_web_search(&normalized.answer, &normalized.sources);
                let content = format!("{}{}", normalized.answer, format_sources(&normalized.sources));

                Turn::knowledge(
                    content,
                    TurnDetails {
                        offer_search,
                        elapsed_secs,
                        tool_calls: normalized.tool_calls,
                        original_prompt: input.to_string(),
                        message_index: Some(state.messages.len()),
                    },
                )
            }
            Err(err) => {
                tracing::error!("Error processing query '{}': {}", input, err);
                Turn::error(format!("Sorry, I encountered an error: {}", err))
            }
        };

        Ok(state.push(turn))
    }

    /// Runs [`Self::submit`] on its own task holding the session lock. The
    /// exchange is recorded in full even if the caller stops waiting.
    pub async fn submit_detached(self: &Arc<Self>, session: SessionHandle, input: String) -> Result<usize, ApiError> {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            let mut state = session.lock().await;
            controller.submit(&mut state, &input).await
        })
        .await
        .map_err(ApiError::internal)?
    }

    /// Records the web search offered by turn `index` and runs it on its own
    /// task, so a dropped request cannot lose the pending action.
    pub async fn search_web_detached(
        self: &Arc<Self>,
        session: SessionHandle,
        index: usize,
    ) -> Result<Option<usize>, ApiError> {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            let mut state = session.lock().await;
            controller.request_web_search(&mut state, index)?;
            Ok::<_, ApiError>(controller.process_pending(&mut state).await)
        })
        .await
        .map_err(ApiError::internal)?
    }

    pub fn request_web_search(&self, state: &mut ConversationState, index: usize) -> Result<String, ApiError> {
        let prompt = state.request_web_search(index)?;
        tracing::info!("Web search requested for message {}", index);
        Ok(prompt)
    }

    /// Runs the pending web search, if any, and appends its turn.
    pub async fn process_pending(&self, state: &mut ConversationState) -> Option<usize> {
        let original_prompt = state.take_pending()?;
        tracing::info!("Performing internet search for: {}", original_prompt);

        let started = Instant::now();
        let query = format!("Latest {} info on: {}", self.topic, original_prompt);
        let turn = match self.web_search.run(&query, &query).await {
            Ok(response) => {
                let normalized = normalize(response);
                let elapsed_secs = started.elapsed().as_secs_f64();
                Turn::web(
                    self.compose_web_content(&original_prompt, &normalized.answer),
                    TurnDetails {
                        offer_search: false,
                        elapsed_secs,
                        tool_calls: normalized.tool_calls,
                        original_prompt,
                        message_index: None,
                    },
                )
            }
            Err(err) => {
                tracing::error!("Internet search error: {}", err);
                Turn::error(format!("Sorry, the internet search failed: {}", err))
            }
        };

        Some(state.push(turn))
    }

    pub fn clear(&self, state: &mut ConversationState) {
        state.clear();
        tracing::info!("Cleared chat history");
    }

    pub fn set_detailed_mode(&self, state: &mut ConversationState, detailed: bool) {
        state.detailed_mode = detailed;
    }

    fn compose_web_content(&self, question: &str, findings: &str) -> String {
        format!(
            "\n> **Your Question:** {}\n\n**Recent Web Findings:**\n\n{}\n\n---\n*Source: Internet Search via {}. Please verify accuracy.*\n",
            question, findings, self.search_provider
        )
    }
}

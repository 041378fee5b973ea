use chrono::{DateTime, Utc};

use super::turn::Turn;
use crate::agent::AnswerMode;
use crate::core::errors::ApiError;

/// Everything one chat session remembers.
#[derive(Debug, Clone)]
pub struct ConversationState {
    pub messages: Vec<Turn>,
    pub pending_web_search: Option<String>,
    pub detailed_mode: bool,
    pub created_at: DateTime<Utc>,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            pending_web_search: None,
            detailed_mode: false,
            created_at: Utc::now(),
        }
    }
}

impl ConversationState {
    pub fn mode(&self) -> AnswerMode {
        AnswerMode::from_detailed(self.detailed_mode)
    }

    /// Appends a turn and returns its index.
    pub fn push(&mut self, turn: Turn) -> usize {
        self.messages.push(turn);
        self.messages.len() - 1
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.pending_web_search = None;
    }

    /// Records the original prompt of the knowledge turn at `index` as the
    /// pending web search, replacing any earlier one.
    pub fn request_web_search(&mut self, index: usize) -> Result<String, ApiError> {
        let turn = self
            .messages
            .get(index)
            .ok_or_else(|| ApiError::NotFound(format!("No message at index {}", index)))?;

        if !turn.offers_web_search() {
            return Err(ApiError::BadRequest(format!(
                "Message {} does not offer a web search",
                index
            )));
        }

        let prompt = turn
            .details
            .as_ref()
            .map(|details| details.original_prompt.clone())
            .unwrap_or_default();
        self.pending_web_search = Some(prompt.clone());
        Ok(prompt)
    }

    pub fn take_pending(&mut self) -> Option<String> {
        self.pending_web_search.take()
    }
}

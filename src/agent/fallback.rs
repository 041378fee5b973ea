use serde_json::Value;

use super::response::Source;

pub const DEFAULT_MIN_WORDS: usize = 30;

pub const DEFAULT_HEDGE_PHRASES: [&str; 7] = [
    "unable to find",
    "no specific information",
    "don't have details",
    "recommend checking online",
    "could not find",
    "general understanding",
    "latest update",
];

/// Decides when a knowledge-base answer looks thin enough to offer a live
/// web search.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackPolicy {
    pub min_words: usize,
    /// Stored lowercased.
    pub hedge_phrases: Vec<String>,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            min_words: DEFAULT_MIN_WORDS,
            hedge_phrases: DEFAULT_HEDGE_PHRASES
                .iter()
                .map(|phrase| phrase.to_string())
                .collect(),
        }
    }
}

impl FallbackPolicy {
    /// Reads `fallback.min_words` and `fallback.hedge_phrases`, keeping the
    /// defaults for anything missing.
    pub fn from_config(config: &Value) -> Self {
        let mut policy = Self::default();
        let Some(section) = config.get("fallback") else {
            return policy;
        };

        if let Some(min_words) = section.get("min_words").and_then(|v| v.as_u64()) {
            policy.min_words = min_words as usize;
        }
        if let Some(phrases) = section.get("hedge_phrases").and_then(|v| v.as_array()) {
            policy.hedge_phrases = phrases
                .iter()
                .filter_map(|v| v.as_str())
                .map(|phrase| phrase.trim().to_lowercase())
                .filter(|phrase| !phrase.is_empty())
                .collect();
        }

        policy
    }

    pub fn should_offer_web_search(&self, answer: &str, sources: &[Source]) -> bool {
        if answer.is_empty() || sources.is_empty() {
            return true;
        }
        if answer.split_whitespace().count() < self.min_words {
            return true;
        }

        let lowered = answer.to_lowercase();
        self.hedge_phrases
            .iter()
            .any(|phrase| lowered.contains(phrase.as_str()))
    }
}

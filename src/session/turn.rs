use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Which kind of turn this is, shown as an avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnIcon {
    User,
    Knowledge,
    Web,
    Error,
}

impl TurnIcon {
    pub fn glyph(self) -> &'static str {
        match self {
            TurnIcon::User => "🧑‍💻",
            TurnIcon::Knowledge => "🧠",
            TurnIcon::Web => "🌐",
            TurnIcon::Error => "⚠️",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnDetails {
    pub offer_search: bool,
    pub elapsed_secs: f64,
    pub tool_calls: Option<Value>,
    pub original_prompt: String,
    /// Position of the owning turn in the log. Knowledge turns only.
    pub message_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    pub role: Role,
    pub icon: TurnIcon,
    pub content: String,
    pub details: Option<TurnDetails>,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    fn new(role: Role, icon: TurnIcon, content: String, details: Option<TurnDetails>) -> Self {
        Self {
            role,
            icon,
            content,
            details,
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, TurnIcon::User, content.into(), None)
    }

    pub fn knowledge(content: impl Into<String>, details: TurnDetails) -> Self {
        Self::new(Role::Assistant, TurnIcon::Knowledge, content.into(), Some(details))
    }

    pub fn web(content: impl Into<String>, details: TurnDetails) -> Self {
        Self::new(Role::Assistant, TurnIcon::Web, content.into(), Some(details))
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, TurnIcon::Error, content.into(), None)
    }

    /// True for a knowledge turn whose answer was judged thin.
    pub fn offers_web_search(&self) -> bool {
        self.icon == TurnIcon::Knowledge
            && self.details.as_ref().is_some_and(|details| details.offer_search)
    }
}

//! JSON rendering of a conversation log.

use serde::Serialize;
use serde_json::Value;

use super::state::ConversationState;
use super::turn::{Role, Turn, TurnIcon};

#[derive(Debug, Serialize)]
pub struct TechnicalDetails {
    /// Seconds with two decimals, e.g. "1.27s".
    pub elapsed: String,
    pub elapsed_secs: f64,
    pub tool_calls: Value,
}

#[derive(Debug, Serialize)]
pub struct TurnView {
    pub index: usize,
    pub role: Role,
    pub kind: TurnIcon,
    pub avatar: &'static str,
    pub content: String,
    /// Whether the "search the web for the latest" action is shown.
    pub offer_search: bool,
    pub technical_details: Option<TechnicalDetails>,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct ConversationView {
    pub detailed_mode: bool,
    pub mode: &'static str,
    pub pending_web_search: Option<String>,
    pub messages: Vec<TurnView>,
}

pub fn render_conversation(state: &ConversationState) -> ConversationView {
    ConversationView {
        detailed_mode: state.detailed_mode,
        mode: state.mode().as_str(),
        pending_web_search: state.pending_web_search.clone(),
        messages: state
            .messages
            .iter()
            .enumerate()
            .map(|(index, turn)| render_turn(index, turn))
            .collect(),
    }
}

fn render_turn(index: usize, turn: &Turn) -> TurnView {
    let technical_details = match (turn.icon, &turn.details) {
        (TurnIcon::Web, _) | (_, None) => None,
        (_, Some(details)) => Some(TechnicalDetails {
            elapsed: format!("{:.2}s", details.elapsed_secs),
            elapsed_secs: details.elapsed_secs,
            tool_calls: display_tool_calls(details.tool_calls.as_ref()),
        }),
    };

    TurnView {
        index,
        role: turn.role,
        kind: turn.icon,
        avatar: turn.icon.glyph(),
        content: turn.content.clone(),
        offer_search: turn.offers_web_search(),
        technical_details,
        created_at: turn.created_at.to_rfc3339(),
    }
}

/// Non-empty objects and arrays pass through as JSON; other values become
/// their string form; absent calls show as "N/A".
pub fn display_tool_calls(tool_calls: Option<&Value>) -> Value {
    match tool_calls {
        Some(Value::Array(items)) if !items.is_empty() => Value::Array(items.clone()),
        Some(Value::Object(map)) if !map.is_empty() => Value::Object(map.clone()),
        Some(Value::Null) | None => Value::String("N/A".to_string()),
        Some(Value::String(text)) => Value::String(text.clone()),
        Some(other) => Value::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::turn::TurnDetails;
    use serde_json::json;

    fn details(offer_search: bool, tool_calls: Option<Value>) -> TurnDetails {
        TurnDetails {
            offer_search,
            elapsed_secs: 1.2345,
            tool_calls,
            original_prompt: "What is consent?".to_string(),
            message_index: Some(1),
        }
    }

    #[test]
    fn knowledge_turns_expose_action_and_details() {
        let mut state = ConversationState::default();
        state.push(Turn::user("What is consent?"));
        state.push(Turn::knowledge("answer", details(true, Some(json!([{ "tool_name": "search_knowledge_base" }])))));
        state.push(Turn::web("findings", details(false, None)));

        let view = render_conversation(&state);

        assert_eq!(view.mode, "concise");
        assert_eq!(view.messages[0].avatar, "🧑‍💻");
        assert!(view.messages[0].technical_details.is_none());

        let knowledge = &view.messages[1];
        assert!(knowledge.offer_search);
        let tech = knowledge.technical_details.as_ref().unwrap();
        assert_eq!(tech.elapsed, "1.23s");
        assert_eq!(tech.tool_calls[0]["tool_name"], "search_knowledge_base");

        let web = &view.messages[2];
        assert_eq!(web.avatar, "🌐");
        assert!(!web.offer_search);
        assert!(web.technical_details.is_none());
    }

    #[test]
    fn tool_calls_display_falls_back_to_text() {
        assert_eq!(display_tool_calls(None), json!("N/A"));
        assert_eq!(display_tool_calls(Some(&json!(null))), json!("N/A"));
        assert_eq!(display_tool_calls(Some(&json!([]))), json!("[]"));
        assert_eq!(display_tool_calls(Some(&json!("search_knowledge_base"))), json!("search_knowledge_base"));
        assert_eq!(display_tool_calls(Some(&json!({ "a": 1 }))), json!({ "a": 1 }));
    }
}

//! Agent results and their normalization into `(answer, sources, tool_calls)`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Mapping keys searched, in order, for the answer text.
pub const ANSWER_KEYS: [&str; 5] = ["response", "output", "answer", "text", "content"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceCitation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl SourceCitation {
    pub fn is_empty(&self) -> bool {
        self.document_name.is_none() && self.page_label.is_none() && self.url.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Source {
    Citation(SourceCitation),
    Text(String),
    Other(Value),
}

impl Source {
    /// Interprets a loosely-typed source entry. Objects carrying at least one
    /// citation field become citations; strings stay text; anything else is
    /// kept verbatim.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(text) => Source::Text(text),
            Value::Object(ref map) => {
                let citation = SourceCitation {
                    document_name: scalar_string(map.get("document_name")),
                    page_label: scalar_string(map.get("page_label")),
                    url: scalar_string(map.get("url")),
                };
                if citation.is_empty() {
                    Source::Other(value)
                } else {
                    Source::Citation(citation)
                }
            }
            other => Source::Other(other),
        }
    }
}

impl From<SourceCitation> for Source {
    fn from(citation: SourceCitation) -> Self {
        Source::Citation(citation)
    }
}

fn scalar_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// A structured result that exposes its answer text directly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextResult {
    pub content: String,
    pub sources: Vec<Source>,
    pub tool_calls: Option<Value>,
}

/// The closed set of shapes an agent call may return.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentResponse {
    Structured(TextResult),
    Mapping(Map<String, Value>),
    Raw(String),
}

impl From<Value> for AgentResponse {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => AgentResponse::Mapping(map),
            Value::String(text) => AgentResponse::Raw(text),
            other => AgentResponse::Raw(other.to_string()),
        }
    }
}

impl From<String> for AgentResponse {
    fn from(text: String) -> Self {
        AgentResponse::Raw(text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedResponse {
    pub answer: String,
    pub sources: Vec<Source>,
    pub tool_calls: Option<Value>,
}

/// Extracts answer text, sources and tool-call metadata.
///
/// Normalization cannot fail: every `AgentResponse` shape has a text form,
/// and a mapping without an answer key renders as its own JSON.
pub fn normalize(response: AgentResponse) -> NormalizedResponse {
    match response {
        AgentResponse::Structured(result) => normalize_structured(result),
        AgentResponse::Mapping(map) => normalize_mapping(map),
        AgentResponse::Raw(text) => NormalizedResponse {
            answer: text,
            sources: Vec::new(),
            tool_calls: None,
        },
    }
}

fn normalize_structured(result: TextResult) -> NormalizedResponse {
    NormalizedResponse {
        answer: result.content,
        sources: result.sources,
        tool_calls: result.tool_calls,
    }
}

fn normalize_mapping(map: Map<String, Value>) -> NormalizedResponse {
    let answer = ANSWER_KEYS
        .iter()
        .find_map(|key| map.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string);

    let sources = match map.get("sources") {
        Some(Value::Array(items)) => items.iter().cloned().map(Source::from_value).collect(),
        _ => Vec::new(),
    };

    let tool_calls = map.get("tool_calls").filter(|v| !v.is_null()).cloned();
    let answer = answer.unwrap_or_else(|| Value::Object(map).to_string());

    NormalizedResponse {
        answer,
        sources,
        tool_calls,
    }
}

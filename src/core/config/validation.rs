use serde_json::{Map, Value};

use crate::core::errors::ApiError;

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(assistant) = expect_optional_object(root, "assistant")? {
        validate_non_empty_string_field(assistant, "assistant.topic", "topic")?;
    }

    if let Some(knowledge) = expect_optional_object(root, "knowledge")? {
        validate_non_empty_string_field(knowledge, "knowledge.persist_dir", "persist_dir")?;
        validate_non_empty_string_field(knowledge, "knowledge.collection", "collection")?;
        validate_u64_field(knowledge, "knowledge.top_k", "top_k", 1, 100)?;
    }

    if let Some(llm) = expect_optional_object(root, "llm")? {
        validate_non_empty_string_field(llm, "llm.base_url", "base_url")?;
        validate_non_empty_string_field(llm, "llm.chat_model", "chat_model")?;
        validate_non_empty_string_field(llm, "llm.embedding_model", "embedding_model")?;
        validate_optional_string_field(llm, "llm.api_key", "api_key")?;
        validate_u64_field(
            llm,
            "llm.request_timeout_secs",
            "request_timeout_secs",
            1,
            3_600,
        )?;
    }

    if let Some(search) = expect_optional_object(root, "search")? {
        validate_optional_string_field(search, "search.provider", "provider")?;
        validate_u64_field(search, "search.max_results", "max_results", 1, 50)?;
        for key in [
            "google_search_api_key",
            "google_search_engine_id",
            "brave_search_api_key",
            "bing_search_api_key",
        ] {
            validate_optional_string_field(search, &format!("search.{}", key), key)?;
        }
    }

    if let Some(fallback) = expect_optional_object(root, "fallback")? {
        validate_u64_field(fallback, "fallback.min_words", "min_words", 0, 10_000)?;
        validate_string_array_field(fallback, "fallback.hedge_phrases", "hedge_phrases")?;
    }

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
        validate_u64_field(
            server,
            "server.session_idle_secs",
            "session_idle_secs",
            1,
            604_800,
        )?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_non_empty_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if text.trim().is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': value cannot be empty",
            path
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if !value.is_null() && value.as_str().is_none() {
        return Err(config_type_error(path, "string"));
    }
    Ok(())
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::BadRequest(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_empty_and_well_formed_configs() {
        assert!(validate_config(&json!({})).is_ok());
        assert!(validate_config(&json!({
            "knowledge": { "collection": "dpdpa", "top_k": 5 },
            "llm": { "chat_model": "gpt-4o", "request_timeout_secs": 60, "api_key": null },
            "fallback": { "min_words": 30, "hedge_phrases": ["could not find"] },
            "server": { "cors_allowed_origins": ["http://localhost:5173"] }
        }))
        .is_ok());
    }

    #[test]
    fn rejects_wrong_types_and_ranges() {
        let err = validate_config(&json!({ "knowledge": "dpdpa" })).unwrap_err();
        assert!(err.to_string().contains("knowledge"));

        let err = validate_config(&json!({ "knowledge": { "top_k": 0 } })).unwrap_err();
        assert!(err.to_string().contains("between 1 and 100"));

        let err = validate_config(&json!({ "fallback": { "hedge_phrases": ["ok", ""] } }))
            .unwrap_err();
        assert!(err.to_string().contains("fallback.hedge_phrases[1]"));

        let err = validate_config(&json!({ "server": { "session_idle_secs": 0 } })).unwrap_err();
        assert!(err.to_string().contains("server.session_idle_secs"));

        let err = validate_config(&json!({ "llm": { "chat_model": "  " } })).unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }
}

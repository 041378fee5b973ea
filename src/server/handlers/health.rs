use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::{AppState, AssistantStatus};

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "initialized": matches!(state.assistant, AssistantStatus::Ready(_)),
    }))
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let active_sessions = state.sessions.len().await;

    let runtime = match &state.assistant {
        AssistantStatus::Ready(runtime) => runtime,
        AssistantStatus::Failed(reason) => {
            return Ok(Json(json!({
                "initialized": false,
                "error": reason,
                "topic": state.settings.topic,
                "active_sessions": active_sessions,
            })));
        }
    };

    let knowledge = &runtime.knowledge;
    let document_count = match knowledge.count().await {
        Ok(count) => Some(count),
        Err(err) => {
            tracing::warn!("Could not confirm collection '{}': {}", knowledge.collection(), err);
            None
        }
    };
    let collections = knowledge.list_collections().await.unwrap_or_default();

    Ok(Json(json!({
        "initialized": true,
        "topic": state.settings.topic,
        "knowledge": {
            "collection": knowledge.collection(),
            "document_count": document_count,
            "collections": collections,
        },
        "search_provider": state.settings.search.provider,
        "active_sessions": active_sessions,
    })))
}

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::session::{render_conversation, SessionHandle};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitMessageRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateModeRequest {
    pub detailed: bool,
}

async fn find_session(state: &AppState, session_id: &str) -> Result<SessionHandle, ApiError> {
    state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))
}

pub async fn create_session(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    state.runtime()?;
    let (session_id, handle) = state.sessions.create().await;
    let conversation = handle.lock().await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "session_id": session_id,
            "created_at": conversation.created_at.to_rfc3339(),
            "conversation": render_conversation(&conversation),
        })),
    ))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.runtime()?;
    let handle = find_session(&state, &session_id).await?;
    let conversation = handle.lock().await;

    Ok(Json(json!({
        "session_id": session_id,
        "created_at": conversation.created_at.to_rfc3339(),
        "message_count": conversation.messages.len(),
        "conversation": render_conversation(&conversation),
    })))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.runtime()?;
    if !state.sessions.remove(&session_id).await {
        return Err(ApiError::NotFound("Session not found".to_string()));
    }
    Ok(Json(json!({"status": "success"})))
}

pub async fn get_messages(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.runtime()?;
    let handle = find_session(&state, &session_id).await?;
    let conversation = handle.lock().await;
    Ok(Json(render_conversation(&conversation)))
}

pub async fn submit_message(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(payload): Json<SubmitMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let runtime = state.runtime()?;
    let handle = find_session(&state, &session_id).await?;

    let index = runtime
        .controller
        .submit_detached(handle.clone(), payload.message)
        .await?;
    let conversation = handle.lock().await;

    Ok(Json(json!({
        "message_index": index,
        "conversation": render_conversation(&conversation),
    })))
}

pub async fn clear_messages(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let runtime = state.runtime()?;
    let handle = find_session(&state, &session_id).await?;
    let mut conversation = handle.lock().await;
    runtime.controller.clear(&mut conversation);
    Ok(Json(render_conversation(&conversation)))
}

pub async fn update_mode(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(payload): Json<UpdateModeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let runtime = state.runtime()?;
    let handle = find_session(&state, &session_id).await?;
    let mut conversation = handle.lock().await;
    runtime
        .controller
        .set_detailed_mode(&mut conversation, payload.detailed);
    Ok(Json(json!({
        "detailed_mode": conversation.detailed_mode,
        "mode": conversation.mode().as_str(),
        "status": conversation.mode().status_message(),
    })))
}

/// Records the web search offered by a knowledge turn and runs it straight
/// away as the next render pass.
pub async fn search_web(
    State(state): State<Arc<AppState>>,
    Path((session_id, index)): Path<(String, usize)>,
) -> Result<impl IntoResponse, ApiError> {
    let runtime = state.runtime()?;
    let handle = find_session(&state, &session_id).await?;

    let message_index = runtime
        .controller
        .search_web_detached(handle.clone(), index)
        .await?;
    let conversation = handle.lock().await;

    Ok(Json(json!({
        "message_index": message_index,
        "conversation": render_conversation(&conversation),
    })))
}

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{config, health, sessions};
use crate::state::AppState;

/// Creates the application router with all routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state.settings.cors_allowed_origins);
    Router::new()
        .route("/health", get(health::health))
        .route("/api/status", get(health::get_status))
        .route("/api/config", get(config::get_config))
        .route("/api/sessions", post(sessions::create_session))
        .route(
            "/api/sessions/:session_id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route(
            "/api/sessions/:session_id/messages",
            get(sessions::get_messages)
                .post(sessions::submit_message)
                .delete(sessions::clear_messages),
        )
        .route(
            "/api/sessions/:session_id/mode",
            put(sessions::update_mode),
        )
        .route(
            "/api/sessions/:session_id/messages/:index/web-search",
            post(sessions::search_web),
        )
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(configured: &[String]) -> CorsLayer {
    let mut origins: Vec<HeaderValue> = configured
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    if origins.is_empty() {
        origins = default_local_origins()
            .into_iter()
            .filter_map(|origin| HeaderValue::from_str(origin).ok())
            .collect();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
}

fn default_local_origins() -> Vec<&'static str> {
    vec![
        "http://localhost",
        "http://localhost:3000",
        "http://localhost:5173",
        "http://localhost:8501",
        "http://127.0.0.1",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:5173",
        "http://127.0.0.1:8501",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::agent::{AgentResponse, FallbackPolicy};
    use crate::controller::ConversationController;
    use crate::core::config::{AppPaths, AssistantSettings};
    use crate::knowledge::SqliteKnowledgeStore;
    use crate::state::{AssistantRuntime, AssistantStatus};
    use crate::testing::ScriptedAgent;

    struct TestApp {
        _dir: tempfile::TempDir,
        router: Router,
    }

    fn test_paths(dir: &tempfile::TempDir) -> Arc<AppPaths> {
        Arc::new(AppPaths::with_dirs(
            dir.path().to_path_buf(),
            dir.path().join("data"),
        ))
    }

    async fn ready_app(answering: ScriptedAgent, web: ScriptedAgent) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let paths = test_paths(&dir);
        let store = SqliteKnowledgeStore::open(&dir.path().join("kb"), "dpdpa_test")
            .await
            .unwrap();
        let controller = ConversationController::new(
            Arc::new(answering),
            Arc::new(web),
            FallbackPolicy::default(),
            "DPDPA",
            "DuckDuckGo",
        );
        let runtime = AssistantRuntime {
            knowledge: Arc::new(store),
            controller: Arc::new(controller),
        };
        let state = AppState::with_runtime(
            paths,
            AssistantSettings::from_config(&Value::Null),
            AssistantStatus::Ready(Arc::new(runtime)),
        );
        TestApp {
            _dir: dir,
            router: router(Arc::new(state)),
        }
    }

    async fn send(app: &TestApp, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn new_session(app: &TestApp) -> String {
        let (status, body) = send(app, "POST", "/api/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn status_reports_knowledge_collection() {
        let app = ready_app(ScriptedAgent::new("knowledge"), ScriptedAgent::new("web")).await;

        let (status, body) = send(&app, "GET", "/api/status", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["initialized"], true);
        assert_eq!(body["knowledge"]["collection"], "dpdpa_test");
        assert_eq!(body["knowledge"]["document_count"], 0);
        assert_eq!(body["knowledge"]["collections"], json!(["dpdpa_test"]));
    }

    #[tokio::test]
    async fn conversation_flow_through_web_search() {
        let answering = ScriptedAgent::new("knowledge")
            .then(AgentResponse::Raw("I could not find that.".to_string()));
        let web = ScriptedAgent::new("web")
            .then(AgentResponse::Raw("- Rules notified".to_string()));
        let app = ready_app(answering, web).await;
        let session_id = new_session(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/sessions/{}/messages", session_id),
            Some(json!({ "message": "Are the rules out?" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message_index"], 1);
        let knowledge = &body["conversation"]["messages"][1];
        assert_eq!(knowledge["avatar"], "🧠");
        assert_eq!(knowledge["offer_search"], true);
        assert_eq!(knowledge["technical_details"]["tool_calls"], "N/A");

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/sessions/{}/messages/1/web-search", session_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message_index"], 2);
        let web_turn = &body["conversation"]["messages"][2];
        assert_eq!(web_turn["avatar"], "🌐");
        assert!(web_turn["content"].as_str().unwrap().contains("- Rules notified"));
        assert_eq!(body["conversation"]["pending_web_search"], Value::Null);

        let (status, body) = send(
            &app,
            "DELETE",
            &format!("/api/sessions/{}/messages", session_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["messages"], json!([]));
    }

    #[tokio::test]
    async fn blank_messages_and_unknown_sessions_are_rejected() {
        let app = ready_app(ScriptedAgent::new("knowledge"), ScriptedAgent::new("web")).await;
        let session_id = new_session(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/sessions/{}/messages", session_id),
            Some(json!({ "message": "  " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("empty"));

        let (status, _) = send(&app, "GET", "/api/sessions/missing/messages", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/sessions/{}/messages/0/web-search", session_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn mode_toggle_is_reflected_in_the_session() {
        let app = ready_app(ScriptedAgent::new("knowledge"), ScriptedAgent::new("web")).await;
        let session_id = new_session(&app).await;

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/api/sessions/{}/mode", session_id),
            Some(json!({ "detailed": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mode"], "detailed");

        let (_, body) = send(&app, "GET", &format!("/api/sessions/{}", session_id), None).await;
        assert_eq!(body["conversation"]["detailed_mode"], true);

        let (status, _) = send(&app, "DELETE", &format!("/api/sessions/{}", session_id), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "GET", &format!("/api/sessions/{}", session_id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn failed_initialization_disables_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::with_runtime(
            test_paths(&dir),
            AssistantSettings::from_config(&Value::Null),
            AssistantStatus::Failed("Missing LLM credentials".to_string()),
        );
        let app = TestApp {
            _dir: dir,
            router: router(Arc::new(state)),
        };

        let (status, body) = send(&app, "POST", "/api/sessions", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().unwrap().contains("Missing LLM credentials"));

        let (status, body) = send(&app, "GET", "/api/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["initialized"], false);

        let (_, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(body["status"], "ok");
    }
}

pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::interview::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/personas", get(handlers::handle_list_personas))
        .route("/api/interview/start", post(handlers::handle_start))
        .route("/api/interview/respond", post(handlers::handle_respond))
        .route("/api/interview/retry", post(handlers::handle_retry))
        .route("/api/interview/end", post(handlers::handle_end))
        .route("/api/interview/status", get(handlers::handle_status))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::interview::persona::PersonaCatalog;
    use crate::interview::registry::{SessionId, SessionRegistry};
    use crate::llm_client::testing::{StubClientFactory, StubCompletionClient};
    use crate::llm_client::{CompletionError, DEFAULT_API_URL, DEFAULT_MODEL};

    const KEY: &str = "sk-or-v1-test";

    const FEEDBACK_JSON: &str = r#"{
        "domain_knowledge_score": 6,
        "communication_score": 7,
        "problem_solving_score": 8,
        "organization_fit_score": 7,
        "strengths": ["Structured", "Curious", "Concise"],
        "improvements": ["Numbers", "Depth", "Examples"],
        "overall_assessment": "Good session."
    }"#;

    fn test_config() -> Config {
        Config {
            port: 0,
            rust_log: "debug".to_string(),
            openrouter_api_url: DEFAULT_API_URL.to_string(),
            openrouter_model: DEFAULT_MODEL.to_string(),
            app_referer: "http://localhost".to_string(),
            app_title: "test".to_string(),
            session_ttl: Duration::from_secs(60),
            session_sweep_interval: Duration::from_secs(60),
        }
    }

    fn test_app(stub: StubCompletionClient) -> (Router, Arc<StubClientFactory>, AppState) {
        let factory = Arc::new(StubClientFactory::new(stub));
        let state = AppState {
            config: test_config(),
            catalog: Arc::new(PersonaCatalog::builtin()),
            sessions: Arc::new(SessionRegistry::new()),
            llm: factory.clone(),
        };
        (build_router(state.clone()), factory, state)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        key: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(key) = key {
            builder = builder.header("X-API-Key", key);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn start(app: &Router, persona_id: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/interview/start",
            Some(KEY),
            Some(json!({ "persona_id": persona_id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _, _) = test_app(StubCompletionClient::default());
        let (status, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["active_sessions"], 0);
    }

    #[tokio::test]
    async fn test_list_personas_needs_no_key() {
        let (app, _, _) = test_app(StubCompletionClient::default());
        let (status, body) = send(&app, Method::GET, "/api/personas", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let personas = body["personas"].as_array().unwrap();
        assert_eq!(personas.len(), 5);
        assert_eq!(personas[0]["id"], "mit");
        assert!(personas[0].get("script").is_none());
    }

    #[tokio::test]
    async fn test_start_requires_valid_key() {
        let (app, _, _) = test_app(StubCompletionClient::default());
        let body = Some(json!({ "persona_id": "tech" }));

        let (status, json) =
            send(&app, Method::POST, "/api/interview/start", None, body.clone()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["message"], "API key required");

        let (status, json) = send(
            &app,
            Method::POST,
            "/api/interview/start",
            Some("not-a-key"),
            body,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["message"], "Invalid API key format");
    }

    #[tokio::test]
    async fn test_start_validates_persona() {
        let (app, _, state) = test_app(StubCompletionClient::default());

        let (status, json) = send(
            &app,
            Method::POST,
            "/api/interview/start",
            Some(KEY),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["message"], "persona_id not specified");

        let (status, json) = send(
            &app,
            Method::POST,
            "/api/interview/start",
            Some(KEY),
            Some(json!({ "persona_id": "astronaut" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(state.sessions.len().await, 0);
    }

    #[tokio::test]
    async fn test_full_interview_flow() {
        let stub = StubCompletionClient::new(vec![
            Ok("Tell me about the eviction policy you chose.".to_string()),
            Ok(FEEDBACK_JSON.to_string()),
        ]);
        let (app, factory, state) = test_app(stub);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/interview/start",
            Some(KEY),
            Some(json!({ "persona_id": "tech" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["persona"]["name"], "Alex Rivera");
        assert_eq!(body["persona"]["company"], "TechStartup Inc");
        assert!(body["opening_question"]
            .as_str()
            .unwrap()
            .starts_with("Hey! I'm Alex"));
        let session_id = body["session_id"].as_str().unwrap().to_string();
        assert_eq!(factory.client.call_count(), 0);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/interview/respond",
            Some(KEY),
            Some(json!({ "session_id": session_id, "user_message": "I built a distributed cache" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "Tell me about the eviction policy you chose.");

        let uri = format!("/api/interview/status?session_id={session_id}");
        let (status, body) = send(&app, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "active");
        assert_eq!(body["persona_id"], "tech");
        assert_eq!(body["message_count"], 2);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/interview/end",
            Some(KEY),
            Some(json!({ "session_id": session_id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message_count"], 1);
        assert_eq!(body["turn_count"], 2);
        assert_eq!(body["feedback"]["kind"], "structured");
        assert_eq!(body["feedback"]["problem_solving_score"], 8);
        assert!(body["duration"].as_str().unwrap().ends_with('s'));

        // session is discarded once feedback is produced
        let (status, _) = send(&app, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(state.sessions.len().await, 0);
        assert_eq!(factory.keys(), vec![KEY.to_string()]);
    }

    #[tokio::test]
    async fn test_status_does_not_wait_on_busy_session() {
        let (app, _, state) = test_app(StubCompletionClient::always("ok"));
        let session_id = start(&app, "case").await;
        let id: SessionId = session_id.parse().unwrap();
        let handle = state.sessions.peek(&id).await.unwrap();

        let uri = format!("/api/interview/status?session_id={session_id}");
        {
            let _in_flight = handle.session.lock().await;
            let (status, body) = send(&app, Method::GET, &uri, None, None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], "busy");
            assert_eq!(body["persona_id"], "case");
            assert!(body["message_count"].is_null());
        }

        let (status, body) = send(&app, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "active");
        assert_eq!(body["message_count"], 0);
    }

    #[tokio::test]
    async fn test_status_polling_does_not_keep_session_alive() {
        let (app, _, state) = test_app(StubCompletionClient::always("ok"));
        let session_id = start(&app, "mit").await;
        let uri = format!("/api/interview/status?session_id={session_id}");

        tokio::time::sleep(Duration::from_millis(20)).await;
        let (status, _) = send(&app, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);

        // idle since start, polls notwithstanding
        assert_eq!(
            state.sessions.sweep_expired(Duration::from_millis(10)).await,
            1
        );
        let (status, _) = send(&app, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_session_is_bound_to_its_key() {
        let (app, _, _) = test_app(StubCompletionClient::always("ok"));
        let session_id = start(&app, "hr").await;

        let (status, json) = send(
            &app,
            Method::POST,
            "/api/interview/respond",
            Some("sk-or-v1-someone-else"),
            Some(json!({ "session_id": session_id, "user_message": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["message"], "Invalid API key for this session");
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let (app, _, _) = test_app(StubCompletionClient::always("ok"));
        for id in ["session_1712.5", "6f1c2c1e-8c7a-4a57-9d47-5d8f0f0b9a11", ""] {
            let (status, _) = send(
                &app,
                Method::POST,
                "/api/interview/respond",
                Some(KEY),
                Some(json!({ "session_id": id, "user_message": "hi" })),
            )
            .await;
            assert_eq!(status, StatusCode::NOT_FOUND, "id {id:?}");
        }
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let (app, factory, _) = test_app(StubCompletionClient::always("ok"));
        let session_id = start(&app, "mit").await;

        let (status, json) = send(
            &app,
            Method::POST,
            "/api/interview/respond",
            Some(KEY),
            Some(json!({ "session_id": session_id, "user_message": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["message"], "No message provided");
        assert_eq!(factory.client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_timeout_then_retry() {
        let stub = StubCompletionClient::new(vec![
            Err(CompletionError::timeout()),
            Ok("Sorry, you cut out. Go on.".to_string()),
        ]);
        let (app, _, _) = test_app(stub);
        let session_id = start(&app, "case").await;

        let (status, json) = send(
            &app,
            Method::POST,
            "/api/interview/respond",
            Some(KEY),
            Some(json!({ "session_id": session_id, "user_message": "I'd start with revenue" })),
        )
        .await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(json["error"]["code"], "LLM_TIMEOUT");

        let (status, json) = send(
            &app,
            Method::POST,
            "/api/interview/retry",
            Some(KEY),
            Some(json!({ "session_id": session_id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["response"], "Sorry, you cut out. Go on.");

        let (status, json) = send(
            &app,
            Method::POST,
            "/api/interview/retry",
            Some(KEY),
            Some(json!({ "session_id": session_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_provider_error_message_is_surfaced() {
        let stub = StubCompletionClient::new(vec![Err(CompletionError::ProviderError {
            status: 401,
            message: "No auth credentials found".to_string(),
        })]);
        let (app, _, _) = test_app(stub);
        let session_id = start(&app, "broker").await;

        let (status, json) = send(
            &app,
            Method::POST,
            "/api/interview/respond",
            Some(KEY),
            Some(json!({ "session_id": session_id, "user_message": "Rates are rising" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["error"]["message"], "No auth credentials found");
    }

    #[tokio::test]
    async fn test_end_without_exchanges_keeps_session() {
        let (app, factory, state) = test_app(StubCompletionClient::always(FEEDBACK_JSON));
        let session_id = start(&app, "tech").await;

        let (status, json) = send(
            &app,
            Method::POST,
            "/api/interview/end",
            Some(KEY),
            Some(json!({ "session_id": session_id })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"]["message"], "No interview data available");
        assert_eq!(state.sessions.len().await, 1);
        assert_eq!(factory.client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_end_with_unstructured_feedback_returns_raw() {
        let stub = StubCompletionClient::new(vec![
            Ok("Go on.".to_string()),
            Ok("You did fine overall.".to_string()),
        ]);
        let (app, _, _) = test_app(stub);
        let session_id = start(&app, "mit").await;
        send(
            &app,
            Method::POST,
            "/api/interview/respond",
            Some(KEY),
            Some(json!({ "session_id": session_id, "user_message": "I like math" })),
        )
        .await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/interview/end",
            Some(KEY),
            Some(json!({ "session_id": session_id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["feedback"]["kind"], "raw");
        assert_eq!(body["feedback"]["raw_feedback"], "You did fine overall.");
    }
}

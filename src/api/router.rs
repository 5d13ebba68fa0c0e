//! API router.
//!
//! Returns a composable `Router` with all routes under `/api/`.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

pub fn api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

fn build_router(ctx: ApiContext) -> Router {
    let protected = Router::new()
        .route("/chat", post(endpoints::chat::send))
        .with_state(ctx.clone())
        .route_layer(axum::middleware::from_fn(middleware::user::require_user));

    let open = Router::new()
        .route("/health", get(endpoints::health::check))
        .with_state(ctx);

    Router::new()
        .nest("/api", protected)
        .nest("/api", open)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::db::repository::{insert_chunk, DocumentChunk};
    use crate::models::enums::ChunkStatus;
    use crate::pipeline::rag::generation::mock::{MockProvider, Shared};
    use crate::pipeline::rag::generation::AnswerGenerator;

    struct TestApp {
        core: Arc<CoreState>,
        primary: Arc<MockProvider>,
        _dir: tempfile::TempDir,
    }

    fn test_app(primary: MockProvider, secondary: Option<MockProvider>) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let primary = Arc::new(primary);
        let generator = AnswerGenerator::new(
            Box::new(Shared(primary.clone())),
            secondary.map(|p| Box::new(p) as Box<dyn crate::pipeline::rag::generation::GenerationProvider>),
        );
        let core = Arc::new(CoreState::new(dir.path().join("test.db"), generator));
        TestApp {
            core,
            primary,
            _dir: dir,
        }
    }

    fn chat_request(user: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("Content-Type", "application/json");
        if let Some(user) = user {
            builder = builder.header("X-User-Id", user);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_open() {
        let app = test_app(MockProvider::replying("p", "ok."), None);
        let req = Request::get("/api/health").body(Body::empty()).unwrap();

        let response = api_router(app.core.clone()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["fallback_configured"], false);
    }

    #[tokio::test]
    async fn chat_requires_user_header() {
        let app = test_app(MockProvider::replying("p", "ok."), None);
        let response = api_router(app.core.clone())
            .oneshot(chat_request(None, r#"{"message":"What is FOLFOX?"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(app.primary.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_message_rejected() {
        let app = test_app(MockProvider::replying("p", "ok."), None);
        let response = api_router(app.core.clone())
            .oneshot(chat_request(Some("u1"), r#"{"message":"   "}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(app.primary.call_count(), 0);
    }

    #[tokio::test]
    async fn brief_treatment_question_end_to_end() {
        let app = test_app(
            MockProvider::replying("p", "FOLFOX and CAPOX are standard options. Treatment usually"),
            None,
        );
        let body = r#"{"message":"What chemotherapy drugs treat stage 3 colon cancer?","response_length":"brief"}"#;

        let response = api_router(app.core.clone())
            .oneshot(chat_request(Some("u1"), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["query_type"], "treatment");
        assert_eq!(json["retrieved_count"], 0);
        assert_eq!(json["is_urgent"], false);
        assert_eq!(json["patient_context_used"], false);
        assert_eq!(json["api_used"], "primary");
        assert_eq!(json["answer"], "FOLFOX and CAPOX are standard options.");
    }

    #[tokio::test]
    async fn exchanges_feed_later_history_and_retrieval() {
        let app = test_app(MockProvider::replying("p", "Answer."), None);
        {
            let conn = app.core.open_db().unwrap();
            insert_chunk(
                &conn,
                &DocumentChunk {
                    id: "c1".into(),
                    document_id: "guide".into(),
                    content: "Oxaliplatin neuropathy often causes cold sensitivity.".into(),
                    status: ChunkStatus::Ready,
                },
            )
            .unwrap();
        }

        let router = api_router(app.core.clone());
        let first = router
            .clone()
            .oneshot(chat_request(Some("u1"), r#"{"message":"Why do my hands tingle with oxaliplatin?"}"#))
            .await
            .unwrap();
        let first = json_body(first).await;
        assert_eq!(first["retrieved_count"], 1);

        router
            .oneshot(chat_request(Some("u1"), r#"{"message":"Will it go away?"}"#))
            .await
            .unwrap();
        assert!(app
            .primary
            .prompt()
            .contains("Patient: Why do my hands tingle with oxaliplatin?"));
    }

    #[tokio::test]
    async fn sessions_keep_separate_history() {
        let app = test_app(MockProvider::replying("p", "Answer."), None);
        let router = api_router(app.core.clone());

        router
            .clone()
            .oneshot(chat_request(Some("u1"), r#"{"message":"First question","session_id":"a"}"#))
            .await
            .unwrap();
        router
            .oneshot(chat_request(Some("u1"), r#"{"message":"Second question","session_id":"b"}"#))
            .await
            .unwrap();

        assert!(!app.primary.prompt().contains("CONVERSATION HISTORY:"));
    }

    #[tokio::test]
    async fn fallback_provider_answers_when_primary_fails() {
        let app = test_app(
            MockProvider::failing("p"),
            Some(MockProvider::replying("s", "Secondary answer.")),
        );
        let response = api_router(app.core.clone())
            .oneshot(chat_request(Some("u1"), r#"{"message":"What is screening?"}"#))
            .await
            .unwrap();

        let json = json_body(response).await;
        assert_eq!(json["api_used"], "secondary");
        assert_eq!(json["answer"], "Secondary answer.");
    }

    #[tokio::test]
    async fn generation_failure_returns_503_and_stores_nothing() {
        let app = test_app(MockProvider::failing("p"), Some(MockProvider::failing("s")));
        let response = api_router(app.core.clone())
            .oneshot(chat_request(Some("u1"), r#"{"message":"What is FOLFOX?"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let conn = app.core.open_db().unwrap();
        let stored: i64 = conn
            .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(stored, 0);
    }

    #[tokio::test]
    async fn unreachable_database_still_answers() {
        let dir = tempfile::tempdir().unwrap();
        let primary = Arc::new(MockProvider::replying("p", "FOLFOX is a regimen."));
        let generator = AnswerGenerator::new(Box::new(Shared(primary.clone())), None);
        // A directory is not a database file.
        let core = Arc::new(CoreState::new(dir.path().to_path_buf(), generator));

        let response = api_router(core)
            .oneshot(chat_request(Some("u1"), r#"{"message":"What is FOLFOX?"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["retrieved_count"], 0);
        assert_eq!(json["patient_context_used"], false);
        assert_eq!(json["answer"], "FOLFOX is a regimen.");
        assert_eq!(primary.call_count(), 1);
    }

    #[tokio::test]
    async fn urgent_message_carries_banner() {
        let app = test_app(MockProvider::replying("p", "Please call now."), None);
        let response = api_router(app.core.clone())
            .oneshot(chat_request(Some("u1"), r#"{"message":"I can't breathe and have chest pain"}"#))
            .await
            .unwrap();

        let json = json_body(response).await;
        assert_eq!(json["is_urgent"], true);
        assert!(json["answer"].as_str().unwrap().starts_with("URGENT:"));
    }
}

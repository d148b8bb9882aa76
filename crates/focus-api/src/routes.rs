use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{conversations, health};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/conversations", post(conversations::record_turn))
        .route("/conversations/history", get(conversations::get_history))
        .route("/system/clear-cache", post(conversations::clear_cache))
        .route("/system/cache-stats", get(conversations::cache_stats));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    use focus_core::domain::{ConversationTurn, NewTurn, UserId};
    use focus_core::ports::DurableStore;
    use focus_core::{HistoryCacheConfig, HistoryError};
    use focus_infrastructure::{MemoryConversationStore, MemoryHistoryCache};

    use crate::state::HistoryCache;

    struct DownStore;

    #[async_trait]
    impl DurableStore for DownStore {
        async fn insert(&self, _turn: &NewTurn) -> Result<ConversationTurn, HistoryError> {
            Err(HistoryError::durable("connection refused"))
        }

        async fn query_recent(
            &self,
            _user_id: &UserId,
            _limit: usize,
        ) -> Result<Vec<ConversationTurn>, HistoryError> {
            Err(HistoryError::durable("connection refused"))
        }

        async fn ping(&self) -> Result<(), HistoryError> {
            Err(HistoryError::durable("connection refused"))
        }
    }

    fn app_with(durable: Arc<dyn DurableStore>) -> Router {
        let config = HistoryCacheConfig::new(3, 100).unwrap();
        let history = HistoryCache::new(durable, Arc::new(MemoryHistoryCache::new()), config);
        build_router(AppState::new(Arc::new(history)))
    }

    fn app() -> Router {
        app_with(Arc::new(MemoryConversationStore::new()))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn record(app: &Router, user_id: &str, message: &str) -> Response {
        app.clone()
            .oneshot(post_json(
                "/api/v1/conversations",
                json!({ "user_id": user_id, "message": message, "response": "ok" }),
            ))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_record_then_read_history() {
        let app = app();
        for message in ["A", "B", "C", "D"] {
            let response = record(&app, "u1", message).await;
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = app
            .clone()
            .oneshot(get("/api/v1/conversations/history?user_id=u1&limit=2"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        let messages: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["message"].as_str().unwrap())
            .collect();
        assert_eq!(messages, vec!["C", "D"]);
    }

    #[tokio::test]
    async fn test_metadata_round_trips_through_api() {
        let app = app();
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/conversations",
                json!({
                    "user_id": "u1",
                    "message": "plan my day",
                    "response": "Here is a plan",
                    "metadata": { "primary_agent": "planning" }
                }),
            ))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["data"]["metadata"]["primary_agent"], "planning");
    }

    #[tokio::test]
    async fn test_blank_user_is_bad_request() {
        let response = record(&app(), "  ", "hello").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_zero_limit_is_bad_request() {
        let response = app()
            .oneshot(get("/api/v1/conversations/history?user_id=u1&limit=0"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_clear_cache_reports_whether_entry_existed() {
        let app = app();
        record(&app, "u1", "hello").await;

        let request = || post_json("/api/v1/system/clear-cache", json!({ "user_id": "u1" }));
        let first = json_body(app.clone().oneshot(request()).await.unwrap()).await;
        assert_eq!(first["data"]["cleared"], true);

        let second = json_body(app.clone().oneshot(request()).await.unwrap()).await;
        assert_eq!(second["data"]["cleared"], false);

        // Durable history survives
        let history = json_body(
            app.clone()
                .oneshot(get("/api/v1/conversations/history?user_id=u1"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(history["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cache_stats_counts_reads() {
        let app = app();
        record(&app, "u1", "hello").await;
        app.clone()
            .oneshot(get("/api/v1/conversations/history?user_id=u1"))
            .await
            .unwrap();

        let body = json_body(app.oneshot(get("/api/v1/system/cache-stats")).await.unwrap()).await;
        assert_eq!(body["data"]["appends"], 1);
        assert_eq!(body["data"]["hits"], 1);
    }

    #[tokio::test]
    async fn test_durable_outage_is_service_unavailable() {
        let app = app_with(Arc::new(DownStore));

        let response = record(&app, "u1", "hello").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(response).await["error"]["code"], "STORAGE_UNAVAILABLE");

        let ready = app.oneshot(get("/health/ready")).await.unwrap();
        assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_ready_when_stores_respond() {
        let response = app().oneshot(get("/health/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ready");
        assert_eq!(body["fast_store"], true);
    }
}

//! HTTP route definitions

use crate::{AppState, GatewayConfig, handlers, middleware};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main router
pub fn create_router(state: Arc<AppState>) -> Router {
    // Create rate limiter
    let rate_limiter = middleware::create_rate_limiter(state.config.rate_limit_rps);
    if middleware::spawn_rate_limiter_sweeper(&rate_limiter, middleware::RATE_LIMIT_SWEEP_INTERVAL)
        .is_none()
    {
        tracing::warn!("No async runtime, idle rate limiter entries will not be swept");
    }

    // Operations that need an identity. route_layer keeps unknown paths a 404;
    // the last layer added runs first, so auth precedes rate limiting.
    let protected = Router::new()
        .route("/folders", post(handlers::create_folder))
        .route("/uploads/initiate", post(handlers::initiate_upload))
        .route("/uploads/complete", post(handlers::complete_upload))
        .route("/tasks/{id}", get(handlers::get_task))
        .route_layer(axum_middleware::from_fn_with_state(
            rate_limiter,
            middleware::rate_limit_middleware,
        ))
        .route_layer(axum_middleware::from_fn_with_state(
            Arc::clone(&state),
            middleware::auth_middleware,
        ));

    let public = Router::new()
        .route("/login", post(handlers::login))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness));

    let router = protected
        .merge(public)
        // Apply middleware
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(state.config.max_body_size));

    let router = match cors_layer(&state.config) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.with_state(state)
}

/// CORS configuration
fn cors_layer(config: &GatewayConfig) -> Option<CorsLayer> {
    if !config.cors_enabled {
        return None;
    }

    let origin = if config.cors_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            config
                .cors_origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };

    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(Any),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use bytes::Bytes;
    use filegate_engine::{
        CompleteUpload, CreateFolder, EngineError, EngineResponse, FileEngine, Identity,
        InitiateUpload,
    };
    use parking_lot::Mutex;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const SECRET: &str = "router-test-secret";

    /// Records every engine call; optionally rejects them all
    #[derive(Default)]
    struct RecordingEngine {
        calls: Mutex<Vec<(&'static str, Value)>>,
        reject_with: Option<(u16, &'static str)>,
    }

    impl RecordingEngine {
        fn rejecting(status: u16, body: &'static str) -> Self {
            Self {
                reject_with: Some((status, body)),
                ..Default::default()
            }
        }

        fn record(&self, op: &'static str, payload: Value) -> filegate_engine::Result<EngineResponse> {
            self.calls.lock().push((op, payload));
            match self.reject_with {
                Some((status, body)) => Err(EngineError::Rejected {
                    status,
                    body: Bytes::from_static(body.as_bytes()),
                    content_type: Some("application/json".to_string()),
                }),
                None => Ok(json!({ "op": op, "status": "queued" })),
            }
        }

        fn calls(&self) -> Vec<(&'static str, Value)> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl FileEngine for RecordingEngine {
        async fn create_folder(&self, request: &CreateFolder) -> filegate_engine::Result<EngineResponse> {
            self.record("create_folder", serde_json::to_value(request).unwrap())
        }

        async fn initiate_upload(&self, request: &InitiateUpload) -> filegate_engine::Result<EngineResponse> {
            self.record("initiate_upload", serde_json::to_value(request).unwrap())
        }

        async fn complete_upload(&self, request: &CompleteUpload) -> filegate_engine::Result<EngineResponse> {
            self.record("complete_upload", serde_json::to_value(request).unwrap())
        }

        async fn get_task(&self, task_id: &str) -> filegate_engine::Result<EngineResponse> {
            self.record("get_task", json!(task_id))
        }

        async fn health(&self) -> filegate_engine::Result<EngineResponse> {
            self.record("health", Value::Null)
        }
    }

    fn test_config() -> GatewayConfig {
        GatewayConfig {
            jwt_secret: Some(SECRET.to_string()),
            ..Default::default()
        }
    }

    fn app_with(config: GatewayConfig, engine: Arc<RecordingEngine>) -> (Router, Arc<AppState>) {
        let state = Arc::new(AppState::with_engine(config, engine).unwrap());
        (create_router(Arc::clone(&state)), state)
    }

    fn token_for(state: &AppState, who: &str) -> String {
        let identity = Identity::new(who).unwrap();
        state.tokens.as_ref().unwrap().issue(&identity).unwrap().token
    }

    fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_with(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_folder_uses_resolved_identity() {
        let engine = Arc::new(RecordingEngine::default());
        let (app, state) = app_with(test_config(), Arc::clone(&engine));
        let token = token_for(&state, "alice@example.com");

        let response = app
            .oneshot(post_json(
                "/folders",
                Some(&token),
                json!({"path": "/docs", "folderName": "reports", "createdBy": "mallory@example.com"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"op": "create_folder", "status": "queued"})
        );
        assert_eq!(
            engine.calls(),
            vec![(
                "create_folder",
                json!({"path": "/docs", "folderName": "reports", "createdBy": "alice@example.com"})
            )]
        );
    }

    #[tokio::test]
    async fn test_initiate_upload_missing_fields_never_reach_engine() {
        let bodies = [
            (json!({"filename": "a.pdf", "mimeType": "application/pdf"}), "path"),
            (json!({"path": "/docs", "mimeType": "application/pdf"}), "filename"),
            (json!({"path": "/docs", "filename": "a.pdf"}), "mimeType"),
        ];

        for (body, field) in bodies {
            let engine = Arc::new(RecordingEngine::default());
            let (app, state) = app_with(test_config(), Arc::clone(&engine));
            let token = token_for(&state, "alice@example.com");

            let response = app
                .oneshot(post_json("/uploads/initiate", Some(&token), body))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(body_json(response).await["error"]["field"], field);
            assert!(engine.calls().is_empty());
        }
    }

    #[tokio::test]
    async fn test_initiate_upload_attributes_caller() {
        let engine = Arc::new(RecordingEngine::default());
        let (app, state) = app_with(test_config(), Arc::clone(&engine));
        let token = token_for(&state, "alice@example.com");

        let response = app
            .oneshot(post_json(
                "/uploads/initiate",
                Some(&token),
                json!({
                    "path": "/docs",
                    "filename": "a.pdf",
                    "mimeType": "application/pdf",
                    "createdBy": "mallory@example.com",
                    "size": 2048
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let calls = engine.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1["createdBy"], "alice@example.com");
        assert_eq!(calls[0].1["size"], 2048);
    }

    #[tokio::test]
    async fn test_complete_upload_empty_id_rejected() {
        let engine = Arc::new(RecordingEngine::default());
        let (app, state) = app_with(test_config(), Arc::clone(&engine));
        let token = token_for(&state, "alice@example.com");

        let response = app
            .oneshot(post_json("/uploads/complete", Some(&token), json!({"uploadId": ""})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["error"]["field"], "uploadId");
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_complete_upload_sends_no_identity() {
        let engine = Arc::new(RecordingEngine::default());
        let (app, state) = app_with(test_config(), Arc::clone(&engine));
        let token = token_for(&state, "alice@example.com");

        app.oneshot(post_json("/uploads/complete", Some(&token), json!({"uploadId": "u-1"})))
            .await
            .unwrap();

        assert_eq!(engine.calls(), vec![("complete_upload", json!({"uploadId": "u-1"}))]);
    }

    #[tokio::test]
    async fn test_engine_rejection_keeps_status_and_body() {
        let engine = Arc::new(RecordingEngine::rejecting(404, r#"{"error":"unknown upload"}"#));
        let (app, state) = app_with(test_config(), Arc::clone(&engine));
        let token = token_for(&state, "alice@example.com");

        let response = app
            .oneshot(post_json("/uploads/complete", Some(&token), json!({"uploadId": "u-123"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({"error": "unknown upload"}));
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthenticated() {
        let engine = Arc::new(RecordingEngine::default());
        let (app, _) = app_with(test_config(), Arc::clone(&engine));

        let response = app
            .oneshot(post_json("/folders", None, json!({"path": "/docs", "folderName": "reports"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"]["code"], "Unauthenticated");
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_forged_token_is_unauthenticated() {
        let engine = Arc::new(RecordingEngine::default());
        let (app, _) = app_with(test_config(), Arc::clone(&engine));

        let forged = crate::auth::TokenAuthority::new("not-the-secret", None, None, 3600)
            .issue(&Identity::new("alice@example.com").unwrap())
            .unwrap();

        let response = app
            .oneshot(get_with("/tasks/t-9", Some(&forged.token)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_is_validation_error() {
        let engine = Arc::new(RecordingEngine::default());
        let (app, state) = app_with(test_config(), Arc::clone(&engine));
        let token = token_for(&state, "alice@example.com");

        let request = Request::builder()
            .method("POST")
            .uri("/folders")
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::from("{not json"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["error"]["field"], "body");
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_get_task_is_idempotent() {
        let engine = Arc::new(RecordingEngine::default());
        let (app, state) = app_with(test_config(), Arc::clone(&engine));
        let token = token_for(&state, "alice@example.com");

        let first = app
            .clone()
            .oneshot(get_with("/tasks/t-9", Some(&token)))
            .await
            .unwrap();
        let second = app
            .oneshot(get_with("/tasks/t-9", Some(&token)))
            .await
            .unwrap();

        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(body_json(first).await, body_json(second).await);
        assert_eq!(
            engine.calls(),
            vec![("get_task", json!("t-9")), ("get_task", json!("t-9"))]
        );
    }

    #[tokio::test]
    async fn test_auth_disabled_uses_dev_identity() {
        let engine = Arc::new(RecordingEngine::default());
        let config = GatewayConfig {
            auth_enabled: false,
            ..Default::default()
        };
        let (app, _) = app_with(config, Arc::clone(&engine));

        let response = app
            .oneshot(post_json("/folders", None, json!({"path": "/", "folderName": "tmp"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(engine.calls()[0].1["createdBy"], crate::auth::DEV_IDENTITY);
    }

    #[tokio::test]
    async fn test_rate_limit_per_identity() {
        let engine = Arc::new(RecordingEngine::default());
        let config = GatewayConfig {
            rate_limit_rps: 1,
            ..test_config()
        };
        let (app, state) = app_with(config, Arc::clone(&engine));
        let token = token_for(&state, "alice@example.com");

        let first = app
            .clone()
            .oneshot(get_with("/tasks/t-1", Some(&token)))
            .await
            .unwrap();
        let second = app
            .oneshot(get_with("/tasks/t-1", Some(&token)))
            .await
            .unwrap();

        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(engine.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_health_is_public_and_tagged() {
        let engine = Arc::new(RecordingEngine::default());
        let (app, _) = app_with(test_config(), Arc::clone(&engine));

        let request = Request::builder()
            .uri("/health")
            .header("x-request-id", "req-42")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-request-id"], "req-42");
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_readiness_asks_engine() {
        let engine = Arc::new(RecordingEngine::default());
        let (app, _) = app_with(test_config(), Arc::clone(&engine));

        let response = app.oneshot(get_with("/ready", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ready");
        assert_eq!(engine.calls(), vec![("health", Value::Null)]);
    }

    #[tokio::test]
    async fn test_login_issues_usable_token() {
        let engine = Arc::new(RecordingEngine::default());
        let config = GatewayConfig {
            users: vec![crate::UserCredential {
                email: "alice@example.com".to_string(),
                password_blake3: crate::auth::password_digest("s3cret").to_hex().to_string(),
            }],
            ..test_config()
        };
        let (app, _) = app_with(config, Arc::clone(&engine));

        let response = app
            .clone()
            .oneshot(post_json(
                "/login",
                None,
                json!({"email": "alice@example.com", "password": "s3cret"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let login = body_json(response).await;
        assert_eq!(login["tokenType"], "Bearer");
        let token = login["token"].as_str().unwrap().to_string();

        let response = app
            .oneshot(post_json(
                "/folders",
                Some(&token),
                json!({"path": "/docs", "folderName": "reports"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(engine.calls()[0].1["createdBy"], "alice@example.com");
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let engine = Arc::new(RecordingEngine::default());
        let config = GatewayConfig {
            users: vec![crate::UserCredential {
                email: "alice@example.com".to_string(),
                password_blake3: crate::auth::password_digest("s3cret").to_hex().to_string(),
            }],
            ..test_config()
        };
        let (app, _) = app_with(config, engine);

        let response = app
            .oneshot(post_json(
                "/login",
                None,
                json!({"email": "alice@example.com", "password": "guess"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::health;
use super::middleware::{logging_middleware, metrics_middleware, rate_limit_middleware};
use super::state::AppState;
use super::v1;
use crate::domain::medical::MAX_IMAGE_BYTES;
use crate::infrastructure::observability::create_metrics_router;

/// Room for the text fields that travel with an image upload
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the full router with application state
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .nest("/api/v1", v1::create_v1_router())
        .with_state(state.clone());

    if let Some(metrics) = state.metrics.clone() {
        router = router.merge(create_metrics_router(metrics));
    }

    router
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + FORM_OVERHEAD_BYTES))
        .layer(middleware::from_fn_with_state(state, rate_limit_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::domain::llm::MockLlmProvider;
    use crate::domain::ContentPart;
    use crate::domain::medical::{EMERGENCY_MESSAGE, MEDICAL_DISCLAIMER};
    use crate::domain::{Cache, HistoryRepository};
    use crate::infrastructure::cache::InMemoryCache;
    use crate::infrastructure::history::InMemoryHistoryRepository;
    use crate::infrastructure::llm::{LlmTargets, ModelTarget};
    use crate::infrastructure::rate_limit::{RateLimiter, RateLimiterConfig};
    use crate::infrastructure::services::{
        AiGateway, AiGatewayConfig, MedicalQueryService, SearchGateway, SearchGatewayConfig,
    };

    const BOUNDARY: &str = "mediverse-test-boundary";

    struct TestApp {
        router: Router,
        llm: Arc<MockLlmProvider>,
        history: Arc<InMemoryHistoryRepository>,
    }

    fn test_app(llm: MockLlmProvider, limiter: Option<RateLimiter>) -> TestApp {
        let llm = Arc::new(llm);
        let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new());
        let history = Arc::new(InMemoryHistoryRepository::new());

        let service = MedicalQueryService::new(
            SearchGateway::new(None, cache.clone(), SearchGatewayConfig::default()),
            AiGateway::new(
                LlmTargets {
                    primary: ModelTarget::new(llm.clone(), "gemini-2.5-flash"),
                    expert: None,
                },
                cache.clone(),
                AiGatewayConfig::default(),
            ),
            history.clone(),
        );

        let mut state = AppState::new(Arc::new(service), cache);
        if let Some(limiter) = limiter {
            state = state.with_rate_limiter(Arc::new(limiter));
        }

        TestApp {
            router: create_router(state),
            llm,
            history,
        }
    }

    fn default_app() -> TestApp {
        test_app(
            MockLlmProvider::new("gemini").with_reply("Influenza usually resolves in a week."),
            None,
        )
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn multipart_request(parts: &[(&str, Option<(&str, &str)>, &[u8])]) -> Request<Body> {
        let mut body = Vec::new();
        for (name, file, data) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match file {
                Some((filename, content_type)) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, filename, content_type
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                ),
            }
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/v1/analyze")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            width,
            height,
            image::Rgb([30, 30, 30]),
        ));
        let mut buffer = std::io::Cursor::new(Vec::new());
        image.write_to(&mut buffer, image::ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let app = default_app();

        let (status, body) = send(&app.router, get("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "mediverse");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_root_live_and_ready() {
        let app = default_app();

        let (status, body) = send(&app.router, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Mediverse API");

        let (status, _) = send(&app.router, get("/live")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app.router, get("/ready")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["checks"][0]["name"], "cache");
        assert_eq!(body["checks"][1]["backend"], "in_memory");
    }

    #[tokio::test]
    async fn test_metrics_route_absent_when_disabled() {
        let app = default_app();
        let (status, _) = send(&app.router, get("/metrics")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_query_success() {
        let app = default_app();

        let (status, body) = send(
            &app.router,
            post_json("/api/v1/query", serde_json::json!({ "query": "How long does the flu last?" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["query"], "How long does the flu last?");
        assert_eq!(body["response"], "Influenza usually resolves in a week.");
        assert_eq!(body["disclaimer"], MEDICAL_DISCLAIMER);
        assert_eq!(body["sources"], serde_json::json!([]));
        assert!(body["confidence_score"].as_f64().unwrap() >= 0.5);
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_identical_queries_hit_cache() {
        let app = default_app();
        let request = || {
            post_json(
                "/api/v1/query",
                serde_json::json!({ "query": "How long does the flu last?", "mode": "quick" }),
            )
        };

        let (_, first) = send(&app.router, request()).await;
        let (_, second) = send(&app.router, request()).await;

        assert_eq!(app.llm.calls(), 1);
        assert_eq!(first["response"], second["response"]);
        assert_eq!(first["confidence_score"], second["confidence_score"]);
    }

    #[tokio::test]
    async fn test_emergency_query_is_rejected() {
        let app = default_app();

        let (status, body) = send(
            &app.router,
            post_json("/api/v1/query", serde_json::json!({ "query": "Chest pain for 2 hours" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "emergency");
        assert_eq!(body["error"]["type"], "invalid_request_error");
        assert_eq!(body["error"]["message"], EMERGENCY_MESSAGE);
        assert_eq!(app.llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_short_query_and_invalid_mode() {
        let app = default_app();

        let (status, body) = send(
            &app.router,
            post_json("/api/v1/query", serde_json::json!({ "query": "flu" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "too_short");

        let (status, body) = send(
            &app.router,
            post_json(
                "/api/v1/query",
                serde_json::json!({ "query": "What are flu symptoms?", "mode": "turbo" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_mode");
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let app = default_app();

        let (status, body) = send(
            &app.router,
            post_json("/api/v1/query", serde_json::json!({ "mode": "quick" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_json");
    }

    #[tokio::test]
    async fn test_upstream_failure_is_generic_500() {
        let app = test_app(
            MockLlmProvider::new("gemini").with_error("HTTP 500: upstream exploded"),
            None,
        );

        let (status, body) = send(
            &app.router,
            post_json("/api/v1/query", serde_json::json!({ "query": "What are flu symptoms?" })),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["type"], "server_error");
        assert!(!body["error"]["message"].as_str().unwrap().contains("exploded"));
    }

    fn query_from(peer: [u8; 4], forwarded_for: Option<&str>) -> Request<Body> {
        let mut request =
            post_json("/api/v1/query", serde_json::json!({ "query": "What are flu symptoms?" }));
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((peer, 40000))));
        if let Some(value) = forwarded_for {
            request
                .headers_mut()
                .insert("x-forwarded-for", value.parse().unwrap());
        }
        request
    }

    fn limited_app(config: RateLimiterConfig) -> TestApp {
        test_app(MockLlmProvider::new("gemini"), Some(RateLimiter::new(config)))
    }

    #[tokio::test]
    async fn test_rate_limit_rejects_request_crossing_quota() {
        let app = limited_app(RateLimiterConfig::new(2, Duration::from_secs(60)));
        let peer = [198, 51, 100, 4];

        for _ in 0..2 {
            let (status, _) = send(&app.router, query_from(peer, None)).await;
            assert_eq!(status, StatusCode::OK);
        }

        let response = app.router.clone().oneshot(query_from(peer, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key("retry-after"));
        assert_eq!(response.headers()["x-ratelimit-remaining"], "0");

        // Health checks stay reachable
        let (status, _) = send(&app.router, get("/health")).await;
        assert_eq!(status, StatusCode::OK);

        // Another peer has its own window
        let (status, _) = send(&app.router, query_from([198, 51, 100, 5], None)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rotating_forwarded_for_does_not_reset_quota() {
        let app = limited_app(RateLimiterConfig::new(2, Duration::from_secs(60)));
        let peer = [1, 2, 3, 4];

        let mut statuses = Vec::new();
        for i in 0..6 {
            let forwarded = format!("10.9.9.{}", i);
            let (status, _) = send(&app.router, query_from(peer, Some(&forwarded))).await;
            statuses.push(status);
        }

        assert_eq!(statuses[0], StatusCode::OK);
        assert_eq!(statuses[1], StatusCode::OK);
        assert!(statuses[2..]
            .iter()
            .all(|status| *status == StatusCode::TOO_MANY_REQUESTS));
    }

    #[tokio::test]
    async fn test_forwarded_for_keys_clients_when_trusted() {
        let app = limited_app(
            RateLimiterConfig::new(1, Duration::from_secs(60)).with_trust_forwarded_for(true),
        );
        let proxy = [10, 0, 0, 1];

        let (status, _) = send(&app.router, query_from(proxy, Some("203.0.113.7"))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app.router, query_from(proxy, Some("203.0.113.7"))).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

        let (status, _) = send(&app.router, query_from(proxy, Some("203.0.113.8"))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_history_is_newest_first_and_clamped() {
        let app = default_app();

        for query in ["What are flu symptoms?", "How is asthma treated?"] {
            let (status, _) = send(
                &app.router,
                post_json("/api/v1/query", serde_json::json!({ "query": query })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            // distinct timestamps
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        for _ in 0..50 {
            if app.history.count().await.unwrap() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let (status, body) = send(&app.router, get("/api/v1/history?limit=0")).await;
        assert_eq!(status, StatusCode::OK);
        let entries = body.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["query"], "[QUICK CONSULT] How is asthma treated?");
        assert_eq!(
            entries[0]["response_preview"],
            "Influenza usually resolves in a week...."
        );

        let (_, body) = send(&app.router, get("/api/v1/history")).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_analyze_with_image() {
        let app = default_app();

        let png = png_bytes(1600, 800);

        let request = multipart_request(&[
            ("query", None, b"Please review this wrist x-ray"),
            ("mode", None, b"quick"),
            ("image", Some(("wrist.png", "image/png")), png.as_slice()),
        ]);
        let (status, body) = send(&app.router, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["query"], "Please review this wrist x-ray");

        let (_, llm_request) = app.llm.last_request().unwrap();
        let parts = llm_request.messages[0].content_parts();
        let (data, media_type) = parts
            .iter()
            .find_map(|part| match part {
                ContentPart::ImageBase64 { data, media_type } => Some((data, media_type)),
                _ => None,
            })
            .unwrap();

        assert_eq!(media_type, "image/jpeg");
        let bytes = STANDARD.decode(data).unwrap();
        let forwarded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((forwarded.width(), forwarded.height()), (1024, 512));
    }

    #[tokio::test]
    async fn test_analyze_rejects_undecodable_image() {
        let app = default_app();

        let request = multipart_request(&[
            ("query", None, b"Please review this wrist x-ray"),
            ("image", Some(("wrist.png", "image/png")), b"\x89PNG not really pixels"),
        ]);
        let (status, body) = send(&app.router, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Invalid image file");
        assert_eq!(body["error"]["param"], "image");
        assert_eq!(app.llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_analyze_rejects_non_image_upload() {
        let app = default_app();

        let request = multipart_request(&[
            ("query", None, b"Please review this document"),
            ("image", Some(("notes.txt", "text/plain")), b"plain text"),
        ]);
        let (status, body) = send(&app.router, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "File must be an image");
        assert_eq!(app.llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_analyze_without_image_uses_mode() {
        let app = default_app();

        let request = multipart_request(&[
            ("query", None, b"What are flu symptoms?"),
            ("mode", None, b"expert"),
        ]);
        let (status, _) = send(&app.router, request).await;

        assert_eq!(status, StatusCode::OK);
        let (_, llm_request) = app.llm.last_request().unwrap();
        assert!(!llm_request.messages[0].has_image());
    }

    #[tokio::test]
    async fn test_analyze_requires_query() {
        let app = default_app();

        let request = multipart_request(&[("mode", None, b"quick")]);
        let (status, body) = send(&app.router, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["param"], "query");
    }
}

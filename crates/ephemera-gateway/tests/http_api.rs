use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use ephemera_core::{
    ContentValidator, ExpiryPolicy, Paste, PasteError, PasteReceipt, PasteStats, Pastebin,
    StorageError, ValidationLimits,
};
use ephemera_gateway::model::{CreatePasteResponse, ExpiryOptionsResponse, PasteResponse};
use ephemera_gateway::{App, AppState};
use ephemera_generator::RandomGenerator;
use ephemera_ratelimit::{RateLimitConfig, RateLimiters};
use ephemera_service::{PasteService, ServiceConfig};
use ephemera_storage::{ConnectionPool, InMemoryRepository, PoolConfig, SqliteRepository};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const BASE_URL: &str = "https://paste.example.com";

fn service(max_bytes: usize) -> PasteService<InMemoryRepository, RandomGenerator> {
    let config = ServiceConfig::builder()
        .validator(ContentValidator::new(
            ValidationLimits::builder().max_bytes(max_bytes).build(),
        ))
        .build();
    PasteService::with_config(
        InMemoryRepository::new(),
        RandomGenerator::new(8).unwrap(),
        config,
    )
}

fn app() -> Router {
    let state = AppState::builder()
        .pastebin(Arc::new(service(64)))
        .base_url(BASE_URL)
        .build();
    App::router(state)
}

fn app_with_limits(create: usize, view: usize) -> Router {
    let limit = |max_requests| RateLimitConfig::builder().max_requests(max_requests).build();
    let state = AppState::builder()
        .pastebin(Arc::new(service(64)))
        .limiters(Arc::new(RateLimiters::new(limit(create), limit(view))))
        .base_url(BASE_URL)
        .build();
    App::router(state)
}

fn create_request(client: &str, body: Value) -> Request<Body> {
    Request::post("/api/paste")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", client)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(client: &str, path: &str) -> Request<Body> {
    Request::get(path)
        .header("x-forwarded-for", client)
        .body(Body::empty())
        .unwrap()
}

async fn json_body<T: serde::de::DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create(app: &Router, content: &str) -> CreatePasteResponse {
    let response = app
        .clone()
        .oneshot(create_request("10.0.0.1", json!({ "content": content })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await
}

#[tokio::test]
async fn create_then_fetch() {
    let app = app();
    let created = create(&app, "hello").await;
    assert_eq!(created.id.len(), 8);
    assert_eq!(created.url, format!("{BASE_URL}/api/paste/{}", created.id));

    let response = app
        .clone()
        .oneshot(get_request("10.0.0.1", &format!("/api/paste/{}", created.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let paste: PasteResponse = json_body(response).await;
    assert_eq!(paste.id, created.id);
    assert_eq!(paste.content, "hello");
    assert_eq!(paste.expires_at, created.expires_at);
}

#[tokio::test]
async fn chosen_expiry_sets_lifetime() {
    let app = app();
    let response = app
        .clone()
        .oneshot(create_request(
            "10.0.0.1",
            json!({ "content": "short lived", "expiry": "10min" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: CreatePasteResponse = json_body(response).await;

    let response = app
        .oneshot(get_request("10.0.0.1", &format!("/api/paste/{}", created.id)))
        .await
        .unwrap();
    let paste: PasteResponse = json_body(response).await;
    let lifetime = paste.expires_at.as_second() - paste.created_at.as_second();
    assert_eq!(lifetime, 600);
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let response = app()
        .oneshot(get_request("10.0.0.1", "/health"))
        .await
        .unwrap();
    let headers = response.headers();
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    assert_eq!(
        headers[header::REFERRER_POLICY],
        "strict-origin-when-cross-origin"
    );
    assert!(headers.contains_key(header::CONTENT_SECURITY_POLICY));
}

#[tokio::test]
async fn remaining_quota_is_reported() {
    let app = app_with_limits(3, 3);
    let response = app
        .clone()
        .oneshot(create_request("10.0.0.7", json!({ "content": "one" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()["x-ratelimit-remaining"], "2");
}

#[tokio::test]
async fn malformed_id_is_bad_request() {
    let response = app()
        .oneshot(get_request("10.0.0.1", "/api/paste/bad!id!!"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("invalid paste id"));
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let response = app()
        .oneshot(get_request("10.0.0.1", "/api/paste/abcdEFGH"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = json_body(response).await;
    assert_eq!(body["error"], "paste not found or expired");
}

#[tokio::test]
async fn empty_content_is_rejected() {
    let response = app()
        .oneshot(create_request("10.0.0.1", json!({ "content": "  \n " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(response).await;
    assert_eq!(body["error"], "content cannot be empty");
}

#[tokio::test]
async fn oversized_content_is_payload_too_large() {
    let response = app()
        .oneshot(create_request("10.0.0.1", json!({ "content": "x".repeat(65) })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn oversized_body_is_refused_before_parsing() {
    let state = AppState::builder()
        .pastebin(Arc::new(service(64)))
        .base_url(BASE_URL)
        .body_limit(128)
        .build();
    let response = App::router(state)
        .oneshot(create_request("10.0.0.1", json!({ "content": "y".repeat(1024) })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let request = Request::post("/api/paste")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"content\": "))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn create_limit_is_per_client() {
    let app = app_with_limits(2, 100);
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(create_request("203.0.113.5", json!({ "content": "spam" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(create_request("203.0.113.5, 10.0.0.1", json!({ "content": "spam" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = json_body(response).await;
    assert_eq!(body["error"], "rate limit exceeded, try again later");

    let response = app
        .oneshot(create_request("198.51.100.9", json!({ "content": "fine" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn view_limit_applies_to_reads() {
    let app = app_with_limits(10, 1);
    let created = create(&app, "read me once").await;
    let path = format!("/api/paste/{}", created.id);

    let first = app.clone().oneshot(get_request("10.9.9.9", &path)).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let second = app.oneshot(get_request("10.9.9.9", &path)).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn expiry_options_are_listed() {
    let response = app()
        .oneshot(get_request("10.0.0.1", "/api/expiry-options"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let options: ExpiryOptionsResponse = json_body(response).await;
    assert_eq!(options.default, "1day");
    let keys: Vec<_> = options.options.iter().map(|o| o.key.as_str()).collect();
    assert_eq!(
        keys,
        ["10min", "1hour", "1day", "1week", "1month", "never"]
    );
    assert_eq!(options.options[1].seconds, 3600);
}

#[tokio::test]
async fn expiry_options_follow_the_service_default() {
    let config = ServiceConfig::builder()
        .expiry(ExpiryPolicy::new("10min").unwrap())
        .build();
    let service = PasteService::with_config(
        InMemoryRepository::new(),
        RandomGenerator::new(8).unwrap(),
        config,
    );
    let app = App::router(
        AppState::builder()
            .pastebin(Arc::new(service))
            .base_url(BASE_URL)
            .build(),
    );

    let response = app
        .clone()
        .oneshot(get_request("10.0.0.1", "/api/expiry-options"))
        .await
        .unwrap();
    let options: ExpiryOptionsResponse = json_body(response).await;
    assert_eq!(options.default, "10min");

    // the advertised default is the one applied when no expiry is sent
    let created = create(&app, "defaulted").await;
    let response = app
        .oneshot(get_request("10.0.0.1", &format!("/api/paste/{}", created.id)))
        .await
        .unwrap();
    let paste: PasteResponse = json_body(response).await;
    assert_eq!(paste.expires_at.as_second() - paste.created_at.as_second(), 600);
}

#[tokio::test]
async fn fully_escaped_content_at_the_size_limit_is_accepted() {
    let app = App::router(
        AppState::builder()
            .pastebin(Arc::new(PasteService::new(
                InMemoryRepository::new(),
                RandomGenerator::new(8).unwrap(),
            )))
            .base_url(BASE_URL)
            .build(),
    );

    // 50 lines of 5,000 four-byte characters: just under the 1 MiB content limit
    let line = r"\ud83d\ude00".repeat(5_000);
    let escaped = vec![line; 50].join("\\n");
    let body = format!("{{\"content\":\"{escaped}\"}}");
    assert!(body.is_ascii());
    assert!(body.len() > 3_000_000);

    let request = Request::post("/api/paste")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let created: CreatePasteResponse = json_body(response).await;
    let response = app
        .oneshot(get_request("10.0.0.1", &format!("/api/paste/{}", created.id)))
        .await
        .unwrap();
    let paste: PasteResponse = json_body(response).await;
    assert_eq!(paste.content.len(), 50 * 5_000 * 4 + 49);
    assert!(paste.content.starts_with("\u{1F600}\u{1F600}"));
}

#[tokio::test]
async fn forwarded_header_is_ignored_when_untrusted() {
    let limit = RateLimitConfig::builder().max_requests(1).build();
    let state = AppState::builder()
        .pastebin(Arc::new(service(64)))
        .limiters(Arc::new(RateLimiters::new(limit, limit)))
        .base_url(BASE_URL)
        .trust_forwarded_for(false)
        .build();
    let app = App::router(state);

    let first = app
        .clone()
        .oneshot(create_request("198.51.100.1", json!({ "content": "one" })))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    // a rotated header does not buy a fresh allowance
    let second = app
        .oneshot(create_request("198.51.100.2", json!({ "content": "two" })))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn health_reports_counts() {
    let app = app();
    create(&app, "counted").await;

    let response = app.oneshot(get_request("10.0.0.1", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["pastes"]["total"], 1);
}

#[derive(Default)]
struct BrokenPastebin {
    expiry: ExpiryPolicy,
}

#[async_trait]
impl Pastebin for BrokenPastebin {
    async fn create_paste(&self, _: &str, _: &str) -> Result<PasteReceipt, PasteError> {
        Err(StorageError::PoolExhausted("pool timed out".into()).into())
    }

    async fn get_paste(&self, _: &str) -> Result<Paste, PasteError> {
        Err(StorageError::Query("disk I/O error".into()).into())
    }

    async fn stats(&self) -> Result<PasteStats, PasteError> {
        Err(StorageError::Unavailable("pool closed".into()).into())
    }

    fn expiry_policy(&self) -> &ExpiryPolicy {
        &self.expiry
    }
}

fn broken_app() -> Router {
    let state = AppState::builder()
        .pastebin(Arc::new(BrokenPastebin::default()))
        .base_url(BASE_URL)
        .build();
    App::router(state)
}

#[tokio::test]
async fn health_is_unavailable_without_storage() {
    let response = broken_app()
        .oneshot(get_request("10.0.0.1", "/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = json_body(response).await;
    assert_eq!(body["status"], "unavailable");
    assert!(body.get("pastes").is_none());
}

#[tokio::test]
async fn storage_failures_hide_details() {
    let response = broken_app()
        .oneshot(create_request("10.0.0.1", json!({ "content": "x" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = json_body(response).await;
    assert_eq!(body["error"], "storage temporarily unavailable");

    let response = broken_app()
        .oneshot(get_request("10.0.0.1", "/api/paste/abcdEFGH"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = json_body(response).await;
    assert_eq!(body["error"], "storage temporarily unavailable");
}

#[tokio::test]
async fn sqlite_backed_round_trip() {
    let dir = TempDir::new().unwrap();
    let config = PoolConfig::builder()
        .database_url(format!(
            "sqlite://{}",
            dir.path().join("gateway.db").display()
        ))
        .build();
    let pool = ConnectionPool::connect(&config).await.unwrap();
    let service = PasteService::new(
        SqliteRepository::new(pool.clone()),
        RandomGenerator::new(8).unwrap(),
    );
    let app = App::router(
        AppState::builder()
            .pastebin(Arc::new(service))
            .base_url(BASE_URL)
            .build(),
    );

    let created = create(&app, "persisted\nacross rows").await;
    let response = app
        .oneshot(get_request("10.0.0.1", &format!("/api/paste/{}", created.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let paste: PasteResponse = json_body(response).await;
    assert_eq!(paste.content, "persisted\nacross rows");

    pool.close().await;
}

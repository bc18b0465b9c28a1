#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use mota_core::clock::ManualClock;
use mota_db::memory::InMemoryStore;
use mota_engine::{EngineConfig, NotificationCenter};
use mota_events::EventBus;
use tower::ServiceExt;

use mota_api::config::AppConfig;
use mota_api::router::build_app_router;
use mota_api::state::AppState;

/// A test `AppConfig` with the dev CORS origin and a 30-second timeout.
pub fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        retention_interval_secs: 3600,
        database_url: String::new(),
        engine: EngineConfig::default(),
    }
}

/// Application plus the in-memory store behind it.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    /// A fresh clone of the router for a single `oneshot` call.
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Build the full application router over an in-memory store, frozen at
/// Wednesday 2024-06-05 12:00 UTC.
pub fn build_test_app() -> TestApp {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 5, 12, 0, 0).unwrap(),
    ));
    let center = NotificationCenter::new(
        store.clone(),
        store.clone(),
        Arc::new(EventBus::default()),
        test_config().engine,
    )
    .with_clock(clock.clone());

    let state = AppState {
        center: Arc::new(center),
        config: Arc::new(test_config()),
    };
    TestApp {
        router: build_app_router(state),
        store,
        clock,
    }
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    user_id: Option<i64>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = user_id {
        builder = builder.header("x-user-id", id.to_string());
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str, user_id: i64) -> Response<Body> {
    send(app, Method::GET, uri, Some(user_id), None).await
}

pub async fn get_anonymous(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn post(app: Router, uri: &str, user_id: i64) -> Response<Body> {
    send(app, Method::POST, uri, Some(user_id), None).await
}

pub async fn post_json(
    app: Router,
    uri: &str,
    user_id: i64,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(user_id), Some(body)).await
}

/// Producer submission; no caller header.
pub async fn submit(app: Router, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, "/api/v1/notifications", None, Some(body)).await
}

/// Producer batch submission; no caller header.
pub async fn submit_batch(app: Router, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, "/api/v1/notifications/batch", None, Some(body)).await
}

pub async fn put_json(
    app: Router,
    uri: &str,
    user_id: i64,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(user_id), Some(body)).await
}

pub async fn delete(app: Router, uri: &str, user_id: i64) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(user_id), None).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// A normal task comment for `user_id` on `task`.
pub fn task_comment(user_id: i64, task: i64) -> serde_json::Value {
    serde_json::json!({
        "userId": user_id,
        "type": "task_comment",
        "category": "task",
        "title": "New comment",
        "content": format!("comment on task {task}"),
        "senderId": 9,
        "relatedType": "task",
        "relatedId": task,
    })
}

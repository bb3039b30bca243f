//! Common test utilities for integration tests
//!
//! Builds the full router over an in-memory database and a scripted
//! runtime, and wraps request/response plumbing for `tower::ServiceExt`.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use agentdeck::adapters::http::build_router;
use agentdeck::adapters::runtime::MockRuntime;
use agentdeck::adapters::sqlite::create_migrated_test_pool;
use agentdeck::domain::models::Config;
use agentdeck::infrastructure::setup::build_app_state;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub runtime: Arc<MockRuntime>,
    pub deployments_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_runtime(MockRuntime::new()).await
    }

    pub async fn with_runtime(runtime: MockRuntime) -> Self {
        Self::build(runtime, |_| {}).await
    }

    /// App whose deployment ports come from `start..=end`.
    pub async fn with_port_range(start: u16, end: u16) -> Self {
        Self::build(MockRuntime::new(), |config| {
            config.deployment.port_range_start = start;
            config.deployment.port_range_end = end;
        })
        .await
    }

    async fn build(runtime: MockRuntime, configure: impl FnOnce(&mut Config)) -> Self {
        let pool = create_migrated_test_pool().await.expect("failed to create test database");
        let deployments_dir = tempfile::tempdir().expect("failed to create temp dir");

        let mut config = Config::default();
        config.deployment.root_dir = deployments_dir.path().to_path_buf();
        configure(&mut config);

        let runtime = Arc::new(runtime);
        let state = build_app_state(pool.clone(), &config, runtime.clone()).expect("failed to build app state");

        Self {
            router: build_router(Arc::new(state), true),
            pool,
            runtime,
            deployments_dir,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("failed to build request");

        let response = self.router.clone().oneshot(request).await.expect("request failed");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to read body")
            .to_bytes();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }

    /// Register a tool and return its id.
    pub async fn create_tool(&self, name: &str, package: &str, required: &[&str]) -> i64 {
        let (status, body) = self
            .post(
                "/tools",
                serde_json::json!({
                    "name": name,
                    "package": package,
                    "description": format!("{name} tool"),
                    "required_env_names": required,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "unexpected body: {body}");
        body["id"].as_i64().expect("tool id")
    }

    /// Create an agent and return its id.
    pub async fn create_agent(&self, name: &str) -> String {
        let (status, body) = self
            .post(
                "/agents",
                serde_json::json!({
                    "name": name,
                    "instruction": "You are helpful.",
                    "model": "gemini-2.0-flash",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "unexpected body: {body}");
        body["id"].as_str().expect("agent id").to_string()
    }

    /// Poll a deployment until it leaves `deploying`.
    pub async fn wait_for_deployment(&self, id: &str) -> Value {
        for _ in 0..100 {
            let (status, body) = self.get(&format!("/deployments/{id}")).await;
            assert_eq!(status, StatusCode::OK);
            if body["status"] != "deploying" {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("deployment {id} never left deploying");
    }
}

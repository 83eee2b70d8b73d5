//! Shared helpers for the in-process HTTP scenario tests.
//!
//! The router is driven with `tower::ServiceExt::oneshot`; no socket is bound.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use pdv_backoffice_api::{build_router, ApiConfig, AppState};
use pdv_db::{Database, DbConfig};
use serde_json::Value;
use tower::ServiceExt; // oneshot

pub const SECRET: &str = "scenario-test-secret";

pub struct TestApp {
    pub state: Arc<AppState>,
    pub operator_id: String,
    pub token: String,
}

/// Fresh in-memory database with one operator ("ana") and a valid token.
pub async fn spawn() -> TestApp {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    // Most scenarios never log in, so skip the argon2 cost here
    let operator = db
        .operators()
        .create("ana", "Ana Souza", "not-a-real-hash")
        .await
        .unwrap();

    let state = Arc::new(AppState::new(db, ApiConfig::for_tests(SECRET)));
    let token = state
        .jwt
        .issue(&operator.id, &operator.username)
        .unwrap()
        .access_token;

    TestApp {
        state,
        operator_id: operator.id,
        token,
    }
}

impl TestApp {
    pub fn token_issued_at(&self, at: DateTime<Utc>) -> String {
        self.state
            .jwt
            .issue_at(&self.operator_id, "ana", at)
            .unwrap()
            .access_token
    }

    /// Drive the router with a single request and return (status, json body).
    pub async fn call(&self, req: Request<Body>) -> (StatusCode, Value) {
        let router = build_router(Arc::clone(&self.state));
        let resp = router.oneshot(req).await.expect("oneshot failed");
        let status = resp.status();
        let bytes = resp
            .into_body()
            .collect()
            .await
            .expect("body collect failed")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body is not valid JSON")
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.call(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.call(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Authenticated GET.
    pub async fn get_auth(&self, uri: &str) -> (StatusCode, Value) {
        self.get(uri, Some(&self.token)).await
    }

    /// Authenticated POST.
    pub async fn post_auth(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.post(uri, Some(&self.token), body).await
    }

    /// Opens a session on the default till and returns its id.
    pub async fn open(&self, initial_float: i64) -> String {
        let (status, body) = self
            .post_auth(
                "/v1/caixa/open",
                serde_json::json!({ "initialFloat": initial_float }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "open failed: {body}");
        body["sessionId"].as_str().unwrap().to_string()
    }
}

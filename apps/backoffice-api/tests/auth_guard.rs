//! In-process scenario tests for the auth guard in both modes.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::{Duration, Utc};
use pdv_backoffice_api::auth::hash_password;
use serde_json::json;

use common::spawn;

// ---------------------------------------------------------------------------
// Required mode
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_token_is_rejected_before_the_handler() {
    let app = spawn().await;

    let (status, body) = app
        .post("/v1/caixa/open", None, json!({ "initialFloat": 100 }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert!(body["message"].is_string());

    // Handler never ran
    let open = app
        .state
        .db
        .registers()
        .find_open_for_till("caixa-01")
        .await
        .unwrap();
    assert!(open.is_none());
}

#[tokio::test]
async fn expired_token_is_rejected_before_the_handler() {
    let app = spawn().await;
    let expired = app.token_issued_at(Utc::now() - Duration::hours(2));

    let (status, body) = app
        .post("/v1/caixa/open", Some(&expired), json!({ "initialFloat": 100 }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app.get("/v1/caixa/history", Some(&expired)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert!(app
        .state
        .db
        .registers()
        .find_open_for_till("caixa-01")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn malformed_credentials_are_rejected() {
    let app = spawn().await;

    let (status, _) = app.get("/v1/caixa/status", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .method("GET")
        .uri("/v1/caixa/status")
        .header(header::AUTHORIZATION, "Basic YW5hOnNlbmhh")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.call(req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn token_from_another_secret_is_rejected() {
    let app = spawn().await;
    let foreign = pdv_backoffice_api::JwtManager::new("someone-else".to_string(), 3600)
        .issue(&app.operator_id, "ana")
        .unwrap()
        .access_token;

    let (status, _) = app.get("/v1/caixa/status", Some(&foreign)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Optional mode
// ---------------------------------------------------------------------------

#[tokio::test]
async fn optional_mode_without_token_is_anonymous() {
    let app = spawn().await;
    let (status, body) = app.get("/v1/auth/whoami", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], false);
    assert!(body["username"].is_null());
}

#[tokio::test]
async fn optional_mode_with_expired_token_is_anonymous() {
    let app = spawn().await;
    let expired = app.token_issued_at(Utc::now() - Duration::hours(2));
    let (status, body) = app.get("/v1/auth/whoami", Some(&expired)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], false);
}

#[tokio::test]
async fn optional_mode_with_valid_token_has_identity() {
    let app = spawn().await;
    let (status, body) = app.get_auth("/v1/auth/whoami").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["username"], "ana");
    assert_eq!(body["operatorId"], app.operator_id.as_str());
}

// ---------------------------------------------------------------------------
// POST /v1/auth/login
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_issues_a_working_token() {
    let app = spawn().await;
    let hash = hash_password("s3nha-do-caixa").unwrap();
    app.state
        .db
        .operators()
        .create("bia", "Beatriz", &hash)
        .await
        .unwrap();

    let (status, body) = app
        .post(
            "/v1/auth/login",
            None,
            json!({ "username": "bia", "password": "s3nha-do-caixa" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["expiresIn"], 3600);

    let token = body["accessToken"].as_str().unwrap();
    let (status, whoami) = app.get("/v1/auth/whoami", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(whoami["username"], "bia");

    // Recorded as the opener
    let (status, _) = app
        .post("/v1/caixa/open", Some(token), json!({ "initialFloat": 0 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, view) = app.get("/v1/caixa/status", Some(token)).await;
    assert_eq!(view["openedBy"], "bia");
}

#[tokio::test]
async fn login_failures_look_the_same() {
    let app = spawn().await;
    let hash = hash_password("right").unwrap();
    app.state
        .db
        .operators()
        .create("bia", "Beatriz", &hash)
        .await
        .unwrap();

    let (wrong_status, wrong) = app
        .post(
            "/v1/auth/login",
            None,
            json!({ "username": "bia", "password": "wrong" }),
        )
        .await;
    let (unknown_status, unknown) = app
        .post(
            "/v1/auth/login",
            None,
            json!({ "username": "nobody", "password": "right" }),
        )
        .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong, unknown);
}

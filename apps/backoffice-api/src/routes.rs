//! Axum router for the back-office API.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers, so tests can drive the bare router.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{auth, caixa, health};
use crate::AppState;

/// Build the complete application router wired to the given shared state.
///
/// ```text
/// GET  /v1/health                    public
/// POST /v1/auth/login                public
/// GET  /v1/auth/whoami               optional auth
/// POST /v1/caixa/open                required auth
/// GET  /v1/caixa/status              required auth
/// GET  /v1/caixa/history             required auth
/// POST /v1/caixa/{id}/movements      required auth
/// GET  /v1/caixa/{id}/movements      required auth
/// POST /v1/caixa/{id}/sales          required auth
/// POST /v1/caixa/{id}/close          required auth
/// ```
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health::health))
        .route("/v1/auth/login", post(auth::login))
        .route("/v1/auth/whoami", get(auth::whoami))
        .route("/v1/caixa/open", post(caixa::open_session))
        .route("/v1/caixa/status", get(caixa::status))
        .route("/v1/caixa/history", get(caixa::history))
        .route(
            "/v1/caixa/{id}/movements",
            post(caixa::record_movement).get(caixa::list_movements),
        )
        .route("/v1/caixa/{id}/sales", post(caixa::accrue_sale))
        .route("/v1/caixa/{id}/close", post(caixa::close_session))
        .with_state(state)
}

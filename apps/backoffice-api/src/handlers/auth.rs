//! Login and identity endpoints.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::{info, warn};

use crate::api_types::{LoginRequest, LoginResponse, WhoAmIResponse};
use crate::auth::{verify_password, AuthError, MaybeOperator};
use crate::error::ApiResult;
use crate::AppState;

// POST /v1/auth/login
//
// Unknown user, inactive user and wrong password all answer the same 401.
pub(crate) async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(req) = payload?;

    let operator = state.db.operators().find_by_username(req.username.trim()).await?;

    let operator = match operator {
        Some(op) if op.is_active && verify_password(&req.password, &op.password_hash) => op,
        _ => {
            warn!(username = %req.username, "Login failed");
            return Err(AuthError::InvalidCredentials.into());
        }
    };

    let issued = state.jwt.issue(&operator.id, &operator.username)?;

    info!(operator_id = %operator.id, username = %operator.username, "Operator logged in");

    Ok(Json(LoginResponse {
        access_token: issued.access_token,
        token_type: "Bearer".to_string(),
        expires_in: issued.expires_in,
    }))
}

// GET /v1/auth/whoami
pub(crate) async fn whoami(MaybeOperator(claims): MaybeOperator) -> Json<WhoAmIResponse> {
    Json(match claims {
        Some(claims) => WhoAmIResponse {
            authenticated: true,
            operator_id: Some(claims.sub),
            username: Some(claims.username),
        },
        None => WhoAmIResponse {
            authenticated: false,
            operator_id: None,
            username: None,
        },
    })
}

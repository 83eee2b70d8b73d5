//! Caixa (register session) endpoints.
//!
//! Handlers only translate HTTP to repository calls and repository results
//! to `pdv_core::views`; every number in a response comes from the
//! reconciliation engine.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use pdv_core::{
    HistoryPage, Movement, PageInfo, Pagination, ReconciliationSummary, SessionSummary,
    SessionView,
};
use tracing::info;

use crate::api_types::{
    AccrueSaleRequest, CloseSessionRequest, HistoryQuery, OpenSessionRequest,
    OpenSessionResponse, RecordMovementRequest, SaleAccruedResponse, StatusQuery,
};
use crate::auth::Operator;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

// ---------------------------------------------------------------------------
// POST /v1/caixa/open
// ---------------------------------------------------------------------------

pub(crate) async fn open_session(
    State(state): State<Arc<AppState>>,
    operator: Operator,
    payload: Result<Json<OpenSessionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<OpenSessionResponse>)> {
    let Json(req) = payload?;
    let till_id = req
        .till_id
        .unwrap_or_else(|| state.config.till_id.clone());

    let session = state
        .db
        .registers()
        .open(&till_id, req.initial_float, operator.username())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(OpenSessionResponse {
            session_id: session.id,
            till_id: session.till_id,
            opened_at: session.opened_at,
        }),
    ))
}

// ---------------------------------------------------------------------------
// POST /v1/caixa/{id}/movements
// ---------------------------------------------------------------------------

pub(crate) async fn record_movement(
    State(state): State<Arc<AppState>>,
    operator: Operator,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<RecordMovementRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Movement>)> {
    let Path(session_id) = path?;
    let Json(req) = payload?;

    let movement = state
        .db
        .registers()
        .record_movement(&session_id, req.into(), operator.username())
        .await?;

    Ok((StatusCode::CREATED, Json(movement)))
}

// ---------------------------------------------------------------------------
// GET /v1/caixa/{id}/movements
// ---------------------------------------------------------------------------

pub(crate) async fn list_movements(
    State(state): State<Arc<AppState>>,
    _operator: Operator,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Vec<Movement>>> {
    let Path(session_id) = path?;

    // 404 for unknown sessions rather than an empty list
    state.db.registers().require(&session_id).await?;
    let movements = state.db.movements().list_for_session(&session_id).await?;

    Ok(Json(movements))
}

// ---------------------------------------------------------------------------
// POST /v1/caixa/{id}/sales
// ---------------------------------------------------------------------------

pub(crate) async fn accrue_sale(
    State(state): State<Arc<AppState>>,
    _operator: Operator,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<AccrueSaleRequest>, JsonRejection>,
) -> ApiResult<Json<SaleAccruedResponse>> {
    let Path(session_id) = path?;
    let Json(req) = payload?;

    let session = state
        .db
        .registers()
        .accrue_sale(&session_id, req.method, req.amount)
        .await?;

    Ok(Json(SaleAccruedResponse {
        session_id: session.id,
        registered: session.registered,
        registered_total: session.registered.total(),
    }))
}

// ---------------------------------------------------------------------------
// POST /v1/caixa/{id}/close
// ---------------------------------------------------------------------------

pub(crate) async fn close_session(
    State(state): State<Arc<AppState>>,
    operator: Operator,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<CloseSessionRequest>, JsonRejection>,
) -> ApiResult<Json<ReconciliationSummary>> {
    let Path(session_id) = path?;
    let Json(req) = payload?;

    let session = state
        .db
        .registers()
        .close(&session_id, req.into(), operator.username())
        .await?;

    let summary = ReconciliationSummary::build(&session, &state.config.discrepancy_policy)
        .ok_or_else(|| ApiError::Internal(format!("session {session_id} closed without counts")))?;

    if let Some(cash) = &summary.reconciliation.cash_discrepancy {
        info!(
            session_id = %summary.session_id,
            amount = %cash.amount,
            classification = ?cash.classification,
            severity = %cash.severity,
            "Cash discrepancy at close"
        );
    }

    Ok(Json(summary))
}

// ---------------------------------------------------------------------------
// GET /v1/caixa/status[?sessionId=|?tillId=]
// ---------------------------------------------------------------------------

/// The named session, or the open session of `tillId` (the configured till
/// when omitted). `null` when the till has nothing open.
pub(crate) async fn status(
    State(state): State<Arc<AppState>>,
    _operator: Operator,
    query: Result<Query<StatusQuery>, QueryRejection>,
) -> ApiResult<Json<Option<SessionView>>> {
    let Query(query) = query?;
    let registers = state.db.registers();

    let session = match query.session_id.as_deref() {
        Some(id) => Some(registers.require(id).await?),
        None => {
            let till_id = query
                .till_id
                .unwrap_or_else(|| state.config.till_id.clone());
            registers.find_open_for_till(&till_id).await?
        }
    };

    let Some(session) = session else {
        return Ok(Json(None));
    };

    let movements = state.db.movements().list_for_session(&session.id).await?;

    Ok(Json(Some(SessionView::build(
        &session,
        movements,
        &state.config.discrepancy_policy,
    ))))
}

// ---------------------------------------------------------------------------
// GET /v1/caixa/history?page=&limit=&tillId=
// ---------------------------------------------------------------------------

pub(crate) async fn history(
    State(state): State<Arc<AppState>>,
    _operator: Operator,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> ApiResult<Json<HistoryPage>> {
    let Query(query) = query?;
    let pagination = Pagination::new(query.page, query.limit)?;
    let till_id = query
        .till_id
        .unwrap_or_else(|| state.config.till_id.clone());

    let registers = state.db.registers();
    let sessions = registers.list_paginated(Some(&till_id), pagination).await?;
    let total = registers.count(Some(&till_id)).await?;

    let policy = &state.config.discrepancy_policy;
    Ok(Json(HistoryPage {
        sessions: sessions
            .iter()
            .map(|s| SessionSummary::build(s, policy))
            .collect(),
        page_info: PageInfo::new(pagination, total),
    }))
}

//! Request and response bodies for the HTTP API.
//!
//! Wire format is camelCase JSON with money as integer centavos. Read models
//! (`SessionView`, `HistoryPage`, ...) come straight from `pdv_core::views`.

use chrono::{DateTime, Utc};
use pdv_core::{CloseRequest, Money, MovementKind, NewMovement, PaymentMethod, PaymentTotals};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
    pub database: bool,
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoAmIResponse {
    pub authenticated: bool,
    pub operator_id: Option<String>,
    pub username: Option<String>,
}

// ---------------------------------------------------------------------------
// Caixa
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionRequest {
    pub initial_float: Money,
    /// Defaults to the till this instance is configured for.
    #[serde(default)]
    pub till_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionResponse {
    pub session_id: String,
    pub till_id: String,
    pub opened_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMovementRequest {
    pub kind: MovementKind,
    pub amount: Money,
    pub reason: String,
}

impl From<RecordMovementRequest> for NewMovement {
    fn from(req: RecordMovementRequest) -> Self {
        NewMovement {
            kind: req.kind,
            amount: req.amount,
            reason: req.reason,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccrueSaleRequest {
    pub method: PaymentMethod,
    pub amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleAccruedResponse {
    pub session_id: String,
    pub registered: PaymentTotals,
    pub registered_total: Money,
}

/// Close dialog input. `finalCash` is mandatory; omitted conferred values
/// count as zero.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseSessionRequest {
    pub final_cash: Money,
    #[serde(default)]
    pub conferred_credit: Option<Money>,
    #[serde(default)]
    pub conferred_debit: Option<Money>,
    #[serde(default)]
    pub conferred_pix: Option<Money>,
    #[serde(default)]
    pub conferred_other: Option<Money>,
}

impl From<CloseSessionRequest> for CloseRequest {
    fn from(req: CloseSessionRequest) -> Self {
        CloseRequest {
            final_cash: req.final_cash,
            conferred_credit: req.conferred_credit,
            conferred_debit: req.conferred_debit,
            conferred_pix: req.conferred_pix,
            conferred_other: req.conferred_other,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub session_id: Option<String>,
    /// Ignored when `sessionId` is given.
    pub till_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub till_id: Option<String>,
}

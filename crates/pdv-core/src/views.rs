//! # Caixa View DTOs
//!
//! Read models handed to presentation layers. Each one is built from a
//! [`RegisterSession`] through [`reconcile`], so the screens (status panel,
//! close dialog, history table) show the same numbers without computing any
//! of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::reconciliation::{reconcile, Discrepancy, DiscrepancyPolicy, Reconciliation};
use crate::types::{Movement, Pagination, RegisterSession, SessionStatus};

/// The status panel: a session, its reconciliation so far, and its movements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: String,
    pub till_id: String,
    pub status: SessionStatus,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    pub opened_by: String,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
    pub closed_by: Option<String>,
    pub reconciliation: Reconciliation,
    pub movements: Vec<Movement>,
}

impl SessionView {
    pub fn build(
        session: &RegisterSession,
        movements: Vec<Movement>,
        policy: &DiscrepancyPolicy,
    ) -> Self {
        SessionView {
            id: session.id.clone(),
            till_id: session.till_id.clone(),
            status: session.status(),
            opened_at: session.opened_at,
            opened_by: session.opened_by.clone(),
            closed_at: session.counted.as_ref().map(|c| c.closed_at),
            closed_by: session.counted.as_ref().map(|c| c.closed_by.clone()),
            reconciliation: reconcile(session, policy),
            movements,
        }
    }
}

/// What the close operation returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationSummary {
    pub session_id: String,
    pub till_id: String,
    #[ts(as = "String")]
    pub closed_at: DateTime<Utc>,
    pub closed_by: String,
    pub reconciliation: Reconciliation,
}

impl ReconciliationSummary {
    /// Returns `None` for a session that is still open.
    pub fn build(session: &RegisterSession, policy: &DiscrepancyPolicy) -> Option<Self> {
        let counted = session.counted.as_ref()?;
        Some(ReconciliationSummary {
            session_id: session.id.clone(),
            till_id: session.till_id.clone(),
            closed_at: counted.closed_at,
            closed_by: counted.closed_by.clone(),
            reconciliation: reconcile(session, policy),
        })
    }
}

/// One row of the history table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub till_id: String,
    pub status: SessionStatus,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    pub opened_by: String,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
    pub closed_by: Option<String>,
    pub initial_float: Money,
    pub registered_total: Money,
    pub expected_cash: Money,
    pub final_cash: Option<Money>,
    pub conferred_total: Option<Money>,
    pub cash_discrepancy: Option<Discrepancy>,
    pub total_discrepancy: Option<Discrepancy>,
}

impl SessionSummary {
    pub fn build(session: &RegisterSession, policy: &DiscrepancyPolicy) -> Self {
        let r = reconcile(session, policy);
        SessionSummary {
            id: session.id.clone(),
            till_id: session.till_id.clone(),
            status: session.status(),
            opened_at: session.opened_at,
            opened_by: session.opened_by.clone(),
            closed_at: session.counted.as_ref().map(|c| c.closed_at),
            closed_by: session.counted.as_ref().map(|c| c.closed_by.clone()),
            initial_float: r.initial_float,
            registered_total: r.registered_total,
            expected_cash: r.expected_cash,
            final_cash: r.final_cash,
            conferred_total: r.conferred_total,
            cash_discrepancy: r.cash_discrepancy,
            total_discrepancy: r.total_discrepancy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl PageInfo {
    pub fn new(pagination: Pagination, total: u64) -> Self {
        let limit = pagination.limit.max(1) as u64;
        PageInfo {
            page: pagination.page,
            limit: pagination.limit,
            total,
            total_pages: total.div_ceil(limit) as u32,
        }
    }
}

/// A page of history rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    pub sessions: Vec<SessionSummary>,
    pub page_info: PageInfo,
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Reconciliation Engine
//!
//! Derives every reconciliation figure from a [`RegisterSession`]'s stored
//! fields. Pure functions only; views and handlers read the results and never
//! redo the arithmetic.
//!
//! ## Formulas
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  net_movements    = insertions − withdrawals                           │
//! │  registered_total = cash + credit + debit + pix + other                │
//! │  expected_cash    = initial_float + registered_cash + net_movements    │
//! │                                                                         │
//! │  (closed only)                                                          │
//! │  conferred_cash   = final_cash − initial_float − net_movements         │
//! │  conferred_total  = conferred_cash + Σ conferred non-cash               │
//! │                                                                         │
//! │  cash quebra      = final_cash − expected_cash                         │
//! │  method quebra    = conferred_m − registered_m                         │
//! │  total quebra     = conferred_total − registered_total                 │
//! │                                                                         │
//! │  quebra < 0 → DEFICIT    quebra = 0 → EXACT    quebra > 0 → SURPLUS    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Note that `final_cash − expected_cash` and
//! `conferred_cash − registered_cash` are the same number; the cash line of
//! the per-method breakdown agrees with the cash-only discrepancy.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{PaymentMethod, RegisterSession};

// =============================================================================
// Classification & Severity
// =============================================================================

/// Sign of a discrepancy. The same rule applies to every discrepancy the
/// engine produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// System recorded more than was physically present.
    Deficit,
    /// Counted matches registered to the centavo.
    Exact,
    /// More was counted than registered, usually unregistered sales.
    Surplus,
}

impl Classification {
    pub fn of(amount: Money) -> Self {
        match amount.cents().cmp(&0) {
            Ordering::Less => Classification::Deficit,
            Ordering::Equal => Classification::Exact,
            Ordering::Greater => Classification::Surplus,
        }
    }
}

/// How a classification should be presented. Business policy, not math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Ok,
    Warning,
    Critical,
}

impl Severity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Severity::Ok => "ok",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ok" => Ok(Severity::Ok),
            "warning" => Ok(Severity::Warning),
            "critical" => Ok(Severity::Critical),
            _ => Err(ValidationError::NotAllowed {
                field: "severity".to_string(),
                allowed: vec![
                    "ok".to_string(),
                    "warning".to_string(),
                    "critical".to_string(),
                ],
            }),
        }
    }
}

/// Maps each classification to a severity label.
///
/// The default treats a deficit as critical and a surplus as a warning.
/// Deployments that weigh both directions the same can set them equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscrepancyPolicy {
    pub deficit: Severity,
    pub exact: Severity,
    pub surplus: Severity,
}

impl DiscrepancyPolicy {
    pub fn severity(&self, classification: Classification) -> Severity {
        match classification {
            Classification::Deficit => self.deficit,
            Classification::Exact => self.exact,
            Classification::Surplus => self.surplus,
        }
    }

    /// Classifies `amount` and attaches this policy's severity.
    pub fn assess(&self, amount: Money) -> Discrepancy {
        let classification = Classification::of(amount);
        Discrepancy {
            amount,
            classification,
            severity: self.severity(classification),
        }
    }
}

impl Default for DiscrepancyPolicy {
    fn default() -> Self {
        DiscrepancyPolicy {
            deficit: Severity::Critical,
            exact: Severity::Ok,
            surplus: Severity::Warning,
        }
    }
}

// =============================================================================
// Results
// =============================================================================

/// A signed discrepancy with its classification and severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Discrepancy {
    pub amount: Money,
    pub classification: Classification,
    pub severity: Severity,
}

/// One payment method's registered vs. conferred line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MethodReconciliation {
    pub method: PaymentMethod,
    pub registered: Money,
    /// `None` while the session is open.
    pub conferred: Option<Money>,
    pub discrepancy: Option<Discrepancy>,
}

/// Everything the engine knows about a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub initial_float: Money,
    pub insertions: Money,
    pub withdrawals: Money,
    pub net_movements: Money,
    pub registered_total: Money,
    pub expected_cash: Money,
    pub final_cash: Option<Money>,
    pub conferred_cash: Option<Money>,
    pub conferred_total: Option<Money>,
    pub cash_discrepancy: Option<Discrepancy>,
    pub total_discrepancy: Option<Discrepancy>,
    pub methods: Vec<MethodReconciliation>,
}

// =============================================================================
// Engine
// =============================================================================

/// Insertions minus withdrawals.
pub fn net_manual_movements(session: &RegisterSession) -> Money {
    session.insertions - session.withdrawals
}

/// Sum of the five registered totals. Defined while open (sales to date).
pub fn registered_total(session: &RegisterSession) -> Money {
    session.registered.total()
}

/// What the drawer should hold absent any discrepancy.
pub fn expected_cash(session: &RegisterSession) -> Money {
    session.initial_float + session.registered.cash + net_manual_movements(session)
}

/// Cash attributable to sales, derived from the count at close.
pub fn conferred_cash(session: &RegisterSession) -> Option<Money> {
    session
        .counted
        .as_ref()
        .map(|c| c.final_cash - session.initial_float - net_manual_movements(session))
}

/// Conferred cash plus every conferred non-cash total.
pub fn conferred_total(session: &RegisterSession) -> Option<Money> {
    let cash = conferred_cash(session)?;
    session
        .counted
        .as_ref()
        .map(|c| cash + c.conferred.total())
}

/// Conferred value for one method: derived for cash, counted for the rest.
pub fn conferred_for(session: &RegisterSession, method: PaymentMethod) -> Option<Money> {
    match method {
        PaymentMethod::Cash => conferred_cash(session),
        _ => session
            .counted
            .as_ref()
            .and_then(|c| c.conferred.get(method)),
    }
}

/// `final_cash − expected_cash`, once counted.
pub fn cash_discrepancy(session: &RegisterSession) -> Option<Money> {
    session
        .counted
        .as_ref()
        .map(|c| c.final_cash - expected_cash(session))
}

/// `conferred_m − registered_m`, once counted.
pub fn method_discrepancy(session: &RegisterSession, method: PaymentMethod) -> Option<Money> {
    conferred_for(session, method).map(|conferred| conferred - session.registered.get(method))
}

/// `conferred_total − registered_total`, once counted.
pub fn total_discrepancy(session: &RegisterSession) -> Option<Money> {
    conferred_total(session).map(|conferred| conferred - registered_total(session))
}

/// Builds the full reconciliation for a session under `policy`.
pub fn reconcile(session: &RegisterSession, policy: &DiscrepancyPolicy) -> Reconciliation {
    let methods = PaymentMethod::ALL
        .iter()
        .map(|&method| MethodReconciliation {
            method,
            registered: session.registered.get(method),
            conferred: conferred_for(session, method),
            discrepancy: method_discrepancy(session, method).map(|d| policy.assess(d)),
        })
        .collect();

    Reconciliation {
        initial_float: session.initial_float,
        insertions: session.insertions,
        withdrawals: session.withdrawals,
        net_movements: net_manual_movements(session),
        registered_total: registered_total(session),
        expected_cash: expected_cash(session),
        final_cash: session.counted.as_ref().map(|c| c.final_cash),
        conferred_cash: conferred_cash(session),
        conferred_total: conferred_total(session),
        cash_discrepancy: cash_discrepancy(session).map(|d| policy.assess(d)),
        total_discrepancy: total_discrepancy(session).map(|d| policy.assess(d)),
        methods,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Domain Types
//!
//! Core domain types for the cash-register ("caixa") subsystem.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────────┐        ┌─────────────────────┐               │
//! │  │   RegisterSession    │ 1    * │      Movement       │               │
//! │  │  ──────────────────  │───────►│  ─────────────────  │               │
//! │  │  id, till_id         │        │  kind (in/out)      │               │
//! │  │  initial_float       │        │  amount (> 0)       │               │
//! │  │  registered (5x)     │        │  reason             │               │
//! │  │  insertions          │        └─────────────────────┘               │
//! │  │  withdrawals         │                                               │
//! │  │  counted: Option<──────────► CountedTotals (set once, at close)     │
//! │  └──────────────────────┘        final_cash + conferred (4x)           │
//! │                                                                         │
//! │  PaymentMethod: Cash | Credit | Debit | Pix | Other                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::accumulate;
use crate::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale was paid. Each method gets its own registered/conferred pair.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash in the drawer.
    Cash,
    /// Credit card.
    Credit,
    /// Debit card.
    Debit,
    /// PIX instant transfer.
    Pix,
    /// Vouchers, store credit and anything else.
    Other,
}

impl PaymentMethod {
    /// Every method, in display order.
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Cash,
        PaymentMethod::Credit,
        PaymentMethod::Debit,
        PaymentMethod::Pix,
        PaymentMethod::Other,
    ];

    /// Methods counted from receipts/terminal reports at close.
    /// Cash is counted separately as `final_cash`.
    pub const NON_CASH: [PaymentMethod; 4] = [
        PaymentMethod::Credit,
        PaymentMethod::Debit,
        PaymentMethod::Pix,
        PaymentMethod::Other,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Credit => "credit",
            PaymentMethod::Debit => "debit",
            PaymentMethod::Pix => "pix",
            PaymentMethod::Other => "other",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "payment method".to_string(),
                allowed: PaymentMethod::ALL
                    .iter()
                    .map(|m| m.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Session Status
// =============================================================================

/// Lifecycle state of a register session. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Open,
    Closed,
}

impl SessionStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Open => "open",
            SessionStatus::Closed => "closed",
        }
    }
}

// =============================================================================
// Movement
// =============================================================================

/// Direction of a manual cash movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Cash put into the drawer ("reforço").
    Insertion,
    /// Cash taken out of the drawer ("sangria").
    Withdrawal,
}

/// A manual cash insertion or withdrawal recorded during an open session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub id: String,
    pub session_id: String,
    pub kind: MovementKind,
    /// Always positive; the direction lives in `kind`.
    pub amount: Money,
    pub reason: String,
    #[ts(as = "String")]
    pub occurred_at: DateTime<Utc>,
    pub recorded_by: String,
}

/// Input for recording a movement, before it gets an id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovement {
    pub kind: MovementKind,
    pub amount: Money,
    pub reason: String,
}

// =============================================================================
// Per-method totals
// =============================================================================

/// System-recorded sales totals, one per payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTotals {
    pub cash: Money,
    pub credit: Money,
    pub debit: Money,
    pub pix: Money,
    pub other: Money,
}

impl PaymentTotals {
    pub fn get(&self, method: PaymentMethod) -> Money {
        match method {
            PaymentMethod::Cash => self.cash,
            PaymentMethod::Credit => self.credit,
            PaymentMethod::Debit => self.debit,
            PaymentMethod::Pix => self.pix,
            PaymentMethod::Other => self.other,
        }
    }

    fn slot_mut(&mut self, method: PaymentMethod) -> &mut Money {
        match method {
            PaymentMethod::Cash => &mut self.cash,
            PaymentMethod::Credit => &mut self.credit,
            PaymentMethod::Debit => &mut self.debit,
            PaymentMethod::Pix => &mut self.pix,
            PaymentMethod::Other => &mut self.other,
        }
    }

    /// Adds `amount` to the given method's running total.
    ///
    /// Fails without changing anything when the total would pass
    /// [`crate::MAX_AMOUNT_CENTS`].
    pub fn add(&mut self, method: PaymentMethod, amount: Money) -> Result<(), ValidationError> {
        let slot = self.slot_mut(method);
        *slot = accumulate(&format!("registered {method}"), *slot, amount)?;
        Ok(())
    }

    /// Sum over all five methods.
    pub fn total(&self) -> Money {
        PaymentMethod::ALL.iter().map(|m| self.get(*m)).sum()
    }
}

/// Physically counted totals for the non-cash methods, entered at close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ConferredTotals {
    pub credit: Money,
    pub debit: Money,
    pub pix: Money,
    pub other: Money,
}

impl ConferredTotals {
    /// Conferred value for a non-cash method. Cash has no conferred slot here;
    /// it is derived from `final_cash` by the reconciliation engine.
    pub fn get(&self, method: PaymentMethod) -> Option<Money> {
        match method {
            PaymentMethod::Cash => None,
            PaymentMethod::Credit => Some(self.credit),
            PaymentMethod::Debit => Some(self.debit),
            PaymentMethod::Pix => Some(self.pix),
            PaymentMethod::Other => Some(self.other),
        }
    }

    pub fn total(&self) -> Money {
        self.credit + self.debit + self.pix + self.other
    }
}

/// Everything entered when a session is closed. Written exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CountedTotals {
    /// Cash physically in the drawer at close.
    pub final_cash: Money,
    pub conferred: ConferredTotals,
    #[ts(as = "String")]
    pub closed_at: DateTime<Utc>,
    pub closed_by: String,
}

/// Close-time input. Omitted conferred values count as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CloseRequest {
    pub final_cash: Money,
    pub conferred_credit: Option<Money>,
    pub conferred_debit: Option<Money>,
    pub conferred_pix: Option<Money>,
    pub conferred_other: Option<Money>,
}

// =============================================================================
// Register Session
// =============================================================================

/// One till's open-to-close working period.
///
/// State lives in `counted`: `None` means open, `Some` means closed. There is
/// no separate status flag that could disagree with it. Transitions are in
/// [`crate::session`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RegisterSession {
    pub id: String,
    pub till_id: String,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    pub opened_by: String,
    /// Cash seeded into the drawer at open ("fundo de troco").
    pub initial_float: Money,
    pub registered: PaymentTotals,
    /// Sum of all insertion movements.
    pub insertions: Money,
    /// Sum of all withdrawal movements.
    pub withdrawals: Money,
    pub counted: Option<CountedTotals>,
}

// =============================================================================
// Pagination
// =============================================================================

/// A validated 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    /// Builds a page request, applying defaults for missing values.
    ///
    /// `page` defaults to 1, `limit` to [`DEFAULT_PAGE_SIZE`] and may not
    /// exceed [`MAX_PAGE_SIZE`].
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Result<Self, ValidationError> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);

        if page == 0 {
            return Err(ValidationError::MustBePositive {
                field: "page".to_string(),
            });
        }

        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(ValidationError::OutOfRange {
                field: "limit".to_string(),
                min: 1,
                max: MAX_PAGE_SIZE as i64,
            });
        }

        Ok(Pagination { page, limit })
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_totals_total_includes_all_methods() {
        let totals = PaymentTotals {
            cash: Money::from_cents(100),
            credit: Money::from_cents(200),
            debit: Money::from_cents(300),
            pix: Money::from_cents(400),
            other: Money::from_cents(500),
        };
        assert_eq!(totals.total().cents(), 1500);
        assert_eq!(PaymentTotals::default().total(), Money::zero());
    }

    #[test]
    fn test_payment_totals_add() {
        let mut totals = PaymentTotals::default();
        totals.add(PaymentMethod::Pix, Money::from_cents(250)).unwrap();
        totals.add(PaymentMethod::Pix, Money::from_cents(250)).unwrap();
        assert_eq!(totals.pix.cents(), 500);
        assert_eq!(totals.total().cents(), 500);
    }

    #[test]
    fn test_payment_totals_add_past_ceiling_leaves_total() {
        let mut totals = PaymentTotals::default();
        totals
            .add(PaymentMethod::Cash, Money::from_cents(crate::MAX_AMOUNT_CENTS))
            .unwrap();

        let err = totals
            .add(PaymentMethod::Cash, Money::from_cents(1))
            .unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
        assert_eq!(totals.cash.cents(), crate::MAX_AMOUNT_CENTS);
    }

    #[test]
    fn test_conferred_has_no_cash_slot() {
        let conferred = ConferredTotals::default();
        assert_eq!(conferred.get(PaymentMethod::Cash), None);
        assert_eq!(conferred.get(PaymentMethod::Debit), Some(Money::zero()));
    }

    #[test]
    fn test_payment_method_from_str() {
        assert_eq!("pix".parse::<PaymentMethod>().unwrap(), PaymentMethod::Pix);
        assert_eq!(" CASH ".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_pagination_defaults_and_bounds() {
        let p = Pagination::new(None, None).unwrap();
        assert_eq!(p, Pagination::default());
        assert_eq!(p.offset(), 0);

        let p = Pagination::new(Some(3), Some(10)).unwrap();
        assert_eq!(p.offset(), 20);

        assert!(Pagination::new(Some(0), None).is_err());
        assert!(Pagination::new(None, Some(0)).is_err());
        assert!(Pagination::new(None, Some(MAX_PAGE_SIZE + 1)).is_err());
    }
}

//! # Register Session State Machine
//!
//! Every change to a [`RegisterSession`] goes through this module, whether it
//! is created fresh or re-read from the database inside a transaction.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   open(initial_float) ──► ┌────────┐  close(final_cash, conferred…)     │
//! │                           │  OPEN  │ ─────────────────────────────┐     │
//! │                           └────────┘                              ▼     │
//! │                            │    ▲                          ┌──────────┐ │
//! │      record_movement() ────┤    │                          │  CLOSED  │ │
//! │      accrue_sale()     ────┘────┘                          └──────────┘ │
//! │                                                              terminal   │
//! │                                                                         │
//! │   CLOSED rejects: close (AlreadyClosed), movements/sales (SessionClosed)│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{
    CloseRequest, ConferredTotals, CountedTotals, Movement, MovementKind, NewMovement,
    PaymentMethod, PaymentTotals, RegisterSession, SessionStatus,
};
use crate::validation::{
    accumulate, validate_non_negative, validate_positive, validate_reason, validate_till_id,
};

impl RegisterSession {
    /// Opens a new session for `till_id` with the given cash float.
    ///
    /// Whether the till already has an open session is a storage question;
    /// the repository checks that in the same transaction as the insert.
    pub fn open(
        till_id: &str,
        initial_float: Money,
        opened_by: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        validate_till_id(till_id)?;
        validate_non_negative("initial float", initial_float)?;

        Ok(RegisterSession {
            id: Uuid::new_v4().to_string(),
            till_id: till_id.trim().to_string(),
            opened_at: now,
            opened_by: opened_by.to_string(),
            initial_float,
            registered: PaymentTotals::default(),
            insertions: Money::zero(),
            withdrawals: Money::zero(),
            counted: None,
        })
    }

    pub fn status(&self) -> SessionStatus {
        match self.counted {
            None => SessionStatus::Open,
            Some(_) => SessionStatus::Closed,
        }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.counted.is_none()
    }

    /// Fails with [`CoreError::SessionClosed`] once the session is closed.
    pub fn ensure_open(&self) -> CoreResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(CoreError::SessionClosed(self.id.clone()))
        }
    }

    /// Records a manual insertion or withdrawal and updates the aggregates.
    ///
    /// State is checked before input so a closed session always reports
    /// `SessionClosed`, whatever the payload.
    pub fn record_movement(
        &mut self,
        movement: NewMovement,
        recorded_by: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<Movement> {
        self.ensure_open()?;
        validate_positive("amount", movement.amount)?;
        let reason = validate_reason(&movement.reason)?;

        match movement.kind {
            MovementKind::Insertion => {
                self.insertions = accumulate("insertions", self.insertions, movement.amount)?;
            }
            MovementKind::Withdrawal => {
                self.withdrawals = accumulate("withdrawals", self.withdrawals, movement.amount)?;
            }
        }

        Ok(Movement {
            id: Uuid::new_v4().to_string(),
            session_id: self.id.clone(),
            kind: movement.kind,
            amount: movement.amount,
            reason,
            occurred_at: now,
            recorded_by: recorded_by.to_string(),
        })
    }

    /// Adds a posted sale payment to the registered total of its method.
    pub fn accrue_sale(&mut self, method: PaymentMethod, amount: Money) -> CoreResult<()> {
        self.ensure_open()?;
        validate_positive("sale amount", amount)?;

        self.registered.add(method, amount)?;
        Ok(())
    }

    /// Closes the session, writing the counted totals once.
    pub fn close(
        &mut self,
        request: CloseRequest,
        closed_by: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<&CountedTotals> {
        if !self.is_open() {
            return Err(CoreError::SessionAlreadyClosed(self.id.clone()));
        }

        let conferred = ConferredTotals {
            credit: request.conferred_credit.unwrap_or_default(),
            debit: request.conferred_debit.unwrap_or_default(),
            pix: request.conferred_pix.unwrap_or_default(),
            other: request.conferred_other.unwrap_or_default(),
        };

        validate_non_negative("final cash", request.final_cash)?;
        validate_non_negative("conferred credit", conferred.credit)?;
        validate_non_negative("conferred debit", conferred.debit)?;
        validate_non_negative("conferred pix", conferred.pix)?;
        validate_non_negative("conferred other", conferred.other)?;

        Ok(self.counted.insert(CountedTotals {
            final_cash: request.final_cash,
            conferred,
            closed_at: now,
            closed_by: closed_by.to_string(),
        }))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

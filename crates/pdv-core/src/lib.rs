//! # pdv-core: Pure Business Logic for the PDV Back-Office
//!
//! This crate holds the cash-register ("caixa") rules as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      PDV Back-Office Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Back-office frontend (browser)                  │   │
//! │  │     Caixa status ──► Movements ──► Close dialog ──► History     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP + Bearer JWT                      │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  backoffice-api (axum)                          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ★ pdv-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌────────────────┐        │   │
//! │  │  │  money  │ │  types  │ │ session │ │ reconciliation │        │   │
//! │  │  └─────────┘ └─────────┘ └─────────┘ └────────────────┘        │   │
//! │  │  ┌────────────┐ ┌─────────┐                                    │   │
//! │  │  │ validation │ │  views  │   NO I/O • NO DATABASE • NO NETWORK │   │
//! │  │  └────────────┘ └─────────┘                                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                   pdv-db (SQLite repositories)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer-centavo `Money` type
//! - [`types`] - RegisterSession, Movement, PaymentMethod, Pagination
//! - [`session`] - Open / movement / sale / close transitions
//! - [`reconciliation`] - Expected vs. counted arithmetic and classification
//! - [`views`] - Read models for status, close and history screens
//! - [`validation`] - Input rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use pdv_core::reconciliation::{reconcile, Classification, DiscrepancyPolicy};
//! use pdv_core::{CloseRequest, Money, MovementKind, NewMovement, RegisterSession};
//!
//! let now = Utc::now();
//! let mut caixa = RegisterSession::open("caixa-01", Money::from_cents(20000), "ana", now)?;
//! caixa.record_movement(
//!     NewMovement {
//!         kind: MovementKind::Insertion,
//!         amount: Money::from_cents(3000),
//!         reason: "reforço".into(),
//!     },
//!     "ana",
//!     now,
//! )?;
//! caixa.close(
//!     CloseRequest { final_cash: Money::from_cents(23500), ..Default::default() },
//!     "ana",
//!     now,
//! )?;
//!
//! let r = reconcile(&caixa, &DiscrepancyPolicy::default());
//! assert_eq!(r.expected_cash.cents(), 23000);
//! assert_eq!(r.cash_discrepancy.unwrap().classification, Classification::Surplus);
//! # Ok::<(), pdv_core::CoreError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod reconciliation;
pub mod session;
pub mod types;
pub mod validation;
pub mod views;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use reconciliation::{Classification, Discrepancy, DiscrepancyPolicy, Reconciliation, Severity};
pub use types::*;
pub use views::{HistoryPage, PageInfo, ReconciliationSummary, SessionSummary, SessionView};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Till used when the deployment does not configure one.
///
/// Single-till stores never set it; multi-till stores run one API instance
/// per till or pass their own ids.
pub const DEFAULT_TILL_ID: &str = "caixa-01";

/// Maximum length of a movement justification, in characters.
pub const MAX_REASON_LENGTH: usize = 255;

/// History page size when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound on history page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Largest amount any single input or running total may hold, in centavos
/// (R$ 1.000.000.000,00).
///
/// Keeps every sum the reconciliation engine forms far inside `i64`.
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000_000;

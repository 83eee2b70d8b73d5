//! # Error Types
//!
//! Domain-specific error types for pdv-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  pdv-core errors (this file)                                           │
//! │  ├── CoreError        - Caixa state machine violations                 │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  pdv-db errors (separate crate)                                        │
//! │  └── DbError          - Database failures, wraps CoreError             │
//! │                                                                         │
//! │  backoffice-api errors (in app)                                        │
//! │  └── ApiError         - What the HTTP client sees (code + message)     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Caixa business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No register session with this id.
    #[error("Register session not found: {0}")]
    SessionNotFound(String),

    /// Opening a session while the till already has one open.
    ///
    /// ## User Workflow
    /// ```text
    /// Operator clicks "Abrir caixa"
    ///      │
    ///      ▼
    /// till caixa-01 already has session 7f3c… open
    ///      │
    ///      ▼
    /// SessionAlreadyOpen { till_id: "caixa-01", session_id: "7f3c…" }
    ///      │
    ///      ▼
    /// UI offers to jump to the open session instead
    /// ```
    #[error("Till {till_id} already has an open register session ({session_id})")]
    SessionAlreadyOpen { till_id: String, session_id: String },

    /// Closing a session that is already closed. Counted values stay as they were.
    #[error("Register session {0} is already closed")]
    SessionAlreadyClosed(String),

    /// Recording a movement or sale against a closed session.
    #[error("Register session {0} is closed and no longer accepts changes")]
    SessionClosed(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any state transition is attempted.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::SessionAlreadyOpen {
            till_id: "caixa-01".to_string(),
            session_id: "abc".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Till caixa-01 already has an open register session (abc)"
        );

        let err = CoreError::SessionAlreadyClosed("abc".to_string());
        assert_eq!(err.to_string(), "Register session abc is already closed");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "reason".to_string(),
        };
        assert_eq!(err.to_string(), "reason is required");

        let err = ValidationError::MustBePositive {
            field: "amount".to_string(),
        };
        assert_eq!(err.to_string(), "amount must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "reason".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}

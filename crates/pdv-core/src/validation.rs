//! # Validation Module
//!
//! Input validation for caixa operations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler                                                 │
//! │  └── Type validation (JSON deserialization, cents as integers)         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: pdv-core                                                     │
//! │  └── THIS MODULE: amounts, reasons, identifiers                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  ├── CHECK (amount > 0), CHECK (initial_float_cents >= 0)              │
//! │  └── partial UNIQUE index: one open session per till                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_AMOUNT_CENTS, MAX_REASON_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Monetary Validators
// =============================================================================

/// Validates an amount that may be zero but never negative
/// (initial float, final cash, conferred totals).
///
/// ```rust
/// use pdv_core::money::Money;
/// use pdv_core::validation::validate_non_negative;
///
/// assert!(validate_non_negative("final cash", Money::from_cents(0)).is_ok());
/// assert!(validate_non_negative("final cash", Money::from_cents(-1)).is_err());
/// assert!(validate_non_negative("final cash", Money::from_cents(i64::MAX)).is_err());
/// ```
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    validate_ceiling(field, amount, 0)
}

/// Validates an amount that must be strictly positive
/// (movements, sale postings).
pub fn validate_positive(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    validate_ceiling(field, amount, 1)
}

/// Adds `amount` to a running total (registered per method, insertions,
/// withdrawals), refusing results above [`MAX_AMOUNT_CENTS`].
///
/// ## Returns
/// The new total.
pub fn accumulate(field: &str, total: Money, amount: Money) -> ValidationResult<Money> {
    let sum = total
        .checked_add(amount)
        .ok_or_else(|| out_of_range(field, 0))?;

    validate_ceiling(field, sum, 0)?;
    Ok(sum)
}

fn validate_ceiling(field: &str, amount: Money, min: i64) -> ValidationResult<()> {
    if amount.cents() > MAX_AMOUNT_CENTS {
        return Err(out_of_range(field, min));
    }

    Ok(())
}

fn out_of_range(field: &str, min: i64) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min,
        max: MAX_AMOUNT_CENTS,
    }
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a movement justification.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most [`MAX_REASON_LENGTH`] characters
///
/// ## Returns
/// The trimmed reason.
pub fn validate_reason(reason: &str) -> ValidationResult<String> {
    let reason = reason.trim();

    if reason.is_empty() {
        return Err(ValidationError::Required {
            field: "reason".to_string(),
        });
    }

    if reason.chars().count() > MAX_REASON_LENGTH {
        return Err(ValidationError::TooLong {
            field: "reason".to_string(),
            max: MAX_REASON_LENGTH,
        });
    }

    Ok(reason.to_string())
}

/// Validates a till identifier (e.g. `caixa-01`).
pub fn validate_till_id(till_id: &str) -> ValidationResult<()> {
    let till_id = till_id.trim();

    if till_id.is_empty() {
        return Err(ValidationError::Required {
            field: "till_id".to_string(),
        });
    }

    if till_id.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "till_id".to_string(),
            max: 50,
        });
    }

    if !till_id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "till_id".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_non_negative() {
        assert!(validate_non_negative("x", Money::zero()).is_ok());
        assert!(validate_non_negative("x", Money::from_cents(1)).is_ok());
        assert!(validate_non_negative("x", Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive("amount", Money::from_cents(1)).is_ok());
        assert!(validate_positive("amount", Money::zero()).is_err());
        assert!(validate_positive("amount", Money::from_cents(-100)).is_err());
    }

    #[test]
    fn test_amounts_are_capped() {
        let cap = Money::from_cents(MAX_AMOUNT_CENTS);
        let over = Money::from_cents(MAX_AMOUNT_CENTS + 1);

        assert!(validate_non_negative("initial float", cap).is_ok());
        assert!(validate_positive("amount", cap).is_ok());
        assert!(matches!(
            validate_non_negative("initial float", over),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            validate_positive("amount", Money::from_cents(i64::MAX)),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_accumulate() {
        let cap = Money::from_cents(MAX_AMOUNT_CENTS);

        assert_eq!(
            accumulate("registered cash", Money::from_cents(100), Money::from_cents(50)).unwrap(),
            Money::from_cents(150)
        );
        assert_eq!(accumulate("insertions", Money::zero(), cap).unwrap(), cap);
        assert!(accumulate("insertions", cap, Money::from_cents(1)).is_err());
        // i64 overflow is reported the same way, not as a panic
        assert!(matches!(
            accumulate("insertions", Money::from_cents(i64::MAX), Money::from_cents(1)),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_reason() {
        assert_eq!(validate_reason("  sangria  ").unwrap(), "sangria");
        assert!(validate_reason("").is_err());
        assert!(validate_reason("   ").is_err());
        assert!(validate_reason(&"a".repeat(MAX_REASON_LENGTH)).is_ok());
        assert!(validate_reason(&"a".repeat(MAX_REASON_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_reason_counts_chars_not_bytes() {
        // "ç" is two bytes in UTF-8
        assert!(validate_reason(&"ç".repeat(MAX_REASON_LENGTH)).is_ok());
    }

    #[test]
    fn test_validate_till_id() {
        assert!(validate_till_id("caixa-01").is_ok());
        assert!(validate_till_id("").is_err());
        assert!(validate_till_id("caixa 01").is_err());
        assert!(validate_till_id(&"c".repeat(51)).is_err());
    }
}

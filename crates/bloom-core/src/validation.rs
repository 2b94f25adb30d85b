//! # Validation Module
//!
//! Input validation for the ledger services.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request body (serde)                                         │
//! │  ├── Types and decimal parsing (Money)                                 │
//! │  └── Unknown fields / wrong JSON shape                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (before any transaction starts)                  │
//! │  ├── Amount signs, split-payment rule                                  │
//! │  └── Method names, required text, note length                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Inside the transaction (balance module)                      │
//! │  ├── Over-payment / over-refund against current ledger state           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Database (SQLite)                                            │
//! │  └── CHECK (amount_cents > 0), NOT NULL, foreign keys                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{LedgerError, ValidationError};
use crate::money::Money;
use crate::types::PaymentMethod;
use crate::MAX_NOTE_LENGTH;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Amount Validators
// =============================================================================

/// Validates the cash/card pair of a payment registration.
///
/// ## Rules
/// - Neither part may be negative
/// - At least one part must be strictly positive
///
/// ```rust
/// use bloom_core::money::Money;
/// use bloom_core::validation::validate_split_payment;
///
/// assert!(validate_split_payment(Money::from_cents(4000), Money::zero()).is_ok());
/// assert!(validate_split_payment(Money::zero(), Money::zero()).is_err());
/// ```
pub fn validate_split_payment(cash: Money, card: Money) -> Result<(), LedgerError> {
    if cash.is_negative() {
        return Err(LedgerError::invalid_amount("cash amount must not be negative"));
    }
    if card.is_negative() {
        return Err(LedgerError::invalid_amount("card amount must not be negative"));
    }
    if !cash.is_positive() && !card.is_positive() {
        return Err(LedgerError::invalid_amount(
            "at least one of cash or card must be greater than zero",
        ));
    }
    if cash.checked_add(card).is_none() {
        return Err(LedgerError::invalid_amount("amount is too large"));
    }
    Ok(())
}

/// Validates a refund amount: strictly positive.
pub fn validate_refund_amount(amount: Money) -> Result<(), LedgerError> {
    if !amount.is_positive() {
        return Err(LedgerError::invalid_amount("refund amount must be greater than zero"));
    }
    Ok(())
}

/// Validates a booking price: zero is allowed (complimentary service).
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "price".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Parses a payment method name.
///
/// Empty input is reported as unknown rather than missing, since the
/// request did carry the field.
pub fn parse_method(method: &str) -> Result<PaymentMethod, LedgerError> {
    method.parse()
}

/// Normalizes an optional refund note.
///
/// Blank notes collapse to `None`; anything longer than
/// [`MAX_NOTE_LENGTH`] characters is rejected.
pub fn normalize_note(note: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };

    if note.chars().count() > MAX_NOTE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "note".to_string(),
            max: MAX_NOTE_LENGTH,
        });
    }

    Ok(Some(note.to_string()))
}

/// Validates a required free-text field such as a client name.
pub fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

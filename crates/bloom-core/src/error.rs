//! # Error Types
//!
//! Domain-specific error types for bloom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bloom-core errors (this file)                                         │
//! │  ├── LedgerError      - Business rule rejections (never retried)       │
//! │  └── ValidationError  - Malformed input                                │
//! │                                                                         │
//! │  bloom-db errors (separate crate)                                      │
//! │  ├── DbError            - Persistence failures                         │
//! │  └── RegistrationError  - LedgerError | DbError                        │
//! │                                                                         │
//! │  bloom-api errors                                                      │
//! │  └── ApiError         - HTTP status + {error: message}                 │
//! │                                                                         │
//! │  Flow: ValidationError → LedgerError → RegistrationError → ApiError    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every rejection is decided before a write is committed, so a
//! `LedgerError` always means "nothing changed".

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse classification used by the transport layer to pick a status code
/// and a logging level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-range input. Caller fixes the request.
    Validation,
    /// Referenced booking/payment is missing or soft-deleted.
    NotFound,
    /// Business rule breach: over-payment, over-refund, missing attribution.
    InvariantViolation,
    /// Transaction or connection failure. Opaque to the caller.
    Persistence,
}

// =============================================================================
// Ledger Error
// =============================================================================

/// Rejections raised by the payment and refund registration services.
///
/// ## User Workflow
/// ```text
/// Payment dialog: cash 20.00
///      │
///      ▼
/// already paid 90.00 of 100.00
///      │
///      ▼
/// ExceedsBookingPrice { overage: 10.00 }
///      │
///      ▼
/// UI shows: "Payment exceeds booking price by 10.00"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Amount is zero, negative, or (for split payments) both parts are zero.
    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// Payment method string is not one of the known methods.
    #[error("Unknown payment method: {0}")]
    UnknownMethod(String),

    /// No acting user could be resolved for an operation that needs one.
    #[error("A signed-in user is required to record a refund")]
    Unauthorized,

    /// Booking does not exist or is soft-deleted.
    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    /// Payment does not exist or is soft-deleted.
    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    /// Recording the payment would push the paid total above the price.
    #[error("Payment exceeds booking price by {overage}")]
    ExceedsBookingPrice { overage: Money },

    /// Refund is larger than what is left to refund on the payment.
    #[error("Refund exceeds refundable balance of {refundable}")]
    ExceedsRefundableBalance { refundable: Money },

    /// Input failed a validation rule.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl LedgerError {
    /// Creates an InvalidAmount error.
    pub fn invalid_amount(reason: impl Into<String>) -> Self {
        LedgerError::InvalidAmount {
            reason: reason.into(),
        }
    }

    /// Returns the error's taxonomy kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidAmount { .. }
            | LedgerError::UnknownMethod(_)
            | LedgerError::Validation(_) => ErrorKind::Validation,
            LedgerError::BookingNotFound(_) | LedgerError::PaymentNotFound(_) => ErrorKind::NotFound,
            LedgerError::Unauthorized
            | LedgerError::ExceedsBookingPrice { .. }
            | LedgerError::ExceedsRefundableBalance { .. } => ErrorKind::InvariantViolation,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., malformed decimal).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Unit Tests
// =============================================================================

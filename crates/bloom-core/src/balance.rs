//! # Balance Calculator
//!
//! Pure money math over a booking's payment rows and ledger events.
//!
//! ## The Two Ceilings
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Booking price 100.00                                                   │
//! │  ├── Payment A  cash 40.00 ──┐                                          │
//! │  │     └── REFUND 20.00      │ refundable(A) = 40.00 - 20.00 = 20.00   │
//! │  └── Payment B  card 30.00 ──┤                                          │
//! │                              ▼                                          │
//! │               already paid = 70.00   remaining = 30.00                  │
//! │                                                                         │
//! │  charge ceiling : already_paid + incoming <= price                      │
//! │  refund ceiling : requested <= amount - prior refunds (per payment)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The charge ceiling is computed from active payment rows, so a refund
//! does not reopen room for new payments on the same booking.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::LedgerError;
use crate::money::Money;
use crate::types::{Payment, PaymentEvent, PaymentEventType, PaymentMethod};

// =============================================================================
// Paid By Method
// =============================================================================

/// Totals of active payments, split by method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaidByMethod {
    #[ts(type = "string")]
    pub cash: Money,
    #[ts(type = "string")]
    pub card: Money,
}

impl PaidByMethod {
    /// Cash plus card.
    #[inline]
    pub fn total(&self) -> Money {
        self.cash + self.card
    }
}

/// Sums active payments per method.
///
/// Soft-deleted rows are skipped.
///
/// ```rust
/// use bloom_core::balance::sum_by_method;
///
/// let paid = sum_by_method(&[]);
/// assert!(paid.total().is_zero());
/// ```
pub fn sum_by_method(payments: &[Payment]) -> PaidByMethod {
    payments
        .iter()
        .filter(|p| p.is_active())
        .fold(PaidByMethod::default(), |mut acc, p| {
            match p.method {
                PaymentMethod::Cash => acc.cash += p.amount,
                PaymentMethod::CreditCard => acc.card += p.amount,
            }
            acc
        })
}

/// `price - paid`.
///
/// Negative only while validating a request that is about to be rejected;
/// never persisted.
#[inline]
pub fn remaining_balance(price: Money, paid: Money) -> Money {
    price - paid
}

// =============================================================================
// Ceilings
// =============================================================================

/// Checks that `incoming` fits under the booking price.
///
/// On failure the error carries the overage: how much too much was asked.
pub fn check_charge_fits(price: Money, already_paid: Money, incoming: Money) -> Result<(), LedgerError> {
    let after = already_paid
        .checked_add(incoming)
        .ok_or_else(|| LedgerError::invalid_amount("amount is too large"))?;

    if after > price {
        return Err(LedgerError::ExceedsBookingPrice {
            overage: after - price,
        });
    }

    Ok(())
}

/// Sum of active REFUND events in `events` that offset `payment_id`.
pub fn refunded_against(payment_id: &str, events: &[PaymentEvent]) -> Money {
    events
        .iter()
        .filter(|e| e.is_active())
        .filter(|e| e.event_type == PaymentEventType::Refund)
        .filter(|e| e.payment_id.as_deref() == Some(payment_id))
        .map(|e| e.amount)
        .sum()
}

/// Original amount minus prior refunds, floored at zero.
#[inline]
pub fn refundable_balance(payment_amount: Money, prior_refunds: Money) -> Money {
    let left = payment_amount - prior_refunds;
    if left.is_negative() {
        Money::zero()
    } else {
        left
    }
}

/// Checks that a refund request fits under the refundable balance.
pub fn check_refund_fits(refundable: Money, requested: Money) -> Result<(), LedgerError> {
    if requested > refundable {
        return Err(LedgerError::ExceedsRefundableBalance { refundable });
    }
    Ok(())
}

// =============================================================================
// Balance Summary
// =============================================================================

/// Everything the payment dialog shows for one booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BalanceSummary {
    pub booking_id: String,
    #[ts(type = "string")]
    pub price: Money,
    pub paid: PaidByMethod,
    #[ts(type = "string")]
    pub total_paid: Money,
    #[ts(type = "string")]
    pub total_refunded: Money,
    #[ts(type = "string")]
    pub remaining: Money,
}

impl BalanceSummary {
    /// Builds the summary from the booking's price, its payment rows and its
    /// ledger events.
    pub fn compute(booking_id: &str, price: Money, payments: &[Payment], events: &[PaymentEvent]) -> Self {
        let paid = sum_by_method(payments);
        let total_paid = paid.total();
        let total_refunded = events
            .iter()
            .filter(|e| e.is_active() && e.event_type == PaymentEventType::Refund)
            .map(|e| e.amount)
            .sum();

        BalanceSummary {
            booking_id: booking_id.to_string(),
            price,
            paid,
            total_paid,
            total_refunded,
            remaining: remaining_balance(price, total_paid),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

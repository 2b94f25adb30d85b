//! # Domain Types
//!
//! Core domain types used throughout Bloom.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │    Booking      │   │    Payment      │   │   PaymentEvent      │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  id (UUID)      │◄──│  booking_id     │   │  booking_id         │   │
//! │  │  price          │   │  method         │◄──│  payment_id         │   │
//! │  │  status         │   │  amount         │   │  type CHARGE|REFUND │   │
//! │  │  deleted_at     │   │  deleted_at     │   │  performed_by       │   │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │ BookingStatus   │   │ PaymentMethod   │   │ PaymentEventType    │   │
//! │  │  pending        │   │  cash           │   │  CHARGE             │   │
//! │  │  confirmed      │   │  credit_card    │   │  REFUND             │   │
//! │  │  cancelled      │   └─────────────────┘   └─────────────────────┘   │
//! │  │  completed      │                                                    │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Soft Deletes
//! No row is ever physically removed by the ledger. `deleted_at = None`
//! means active; a timestamp means the row is hidden from balances and
//! queries but kept for audit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{LedgerError, ValidationError};
use crate::money::Money;

// =============================================================================
// Booking Status
// =============================================================================

/// Where a booking is in its appointment lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Requested, not yet confirmed by the salon.
    #[default]
    Pending,
    /// Confirmed appointment.
    Confirmed,
    /// Cancelled (usually together with a soft delete).
    Cancelled,
    /// Appointment took place.
    Completed,
}

impl BookingStatus {
    /// Returns the lowercase wire/database name.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" | "canceled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: ["pending", "confirmed", "cancelled", "completed"]
                    .map(String::from)
                    .to_vec(),
            }),
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the client paid. Payments are recorded manually; no card network
/// is involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on the salon's own terminal.
    CreditCard,
}

impl PaymentMethod {
    /// Returns the snake_case wire/database name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::CreditCard => "credit_card",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the method names the UI sends.
///
/// ```rust
/// use bloom_core::PaymentMethod;
///
/// assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
/// assert_eq!("card".parse::<PaymentMethod>().unwrap(), PaymentMethod::CreditCard);
/// assert!("voucher".parse::<PaymentMethod>().is_err());
/// ```
impl FromStr for PaymentMethod {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "credit_card" | "card" => Ok(PaymentMethod::CreditCard),
            other => Err(LedgerError::UnknownMethod(other.to_string())),
        }
    }
}

// =============================================================================
// Payment Event Type
// =============================================================================

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentEventType {
    /// Money received; increases the booking's paid total.
    Charge,
    /// Money returned; decreases the booking's paid total.
    Refund,
}

// =============================================================================
// Booking
// =============================================================================

/// A scheduled appointment with its price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Booking {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Client's display name at booking time.
    pub client_name: String,

    /// Service booked (snapshot of the catalog name).
    pub service_name: String,

    /// Appointment start.
    #[ts(as = "String")]
    pub starts_at: DateTime<Utc>,

    /// Price of the appointment. Never negative.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "price_cents"))]
    #[ts(type = "string")]
    pub price: Money,

    pub status: BookingStatus,

    /// Soft-delete marker. `None` = active.
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// Bumped by every ledger write against the booking.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Whether the booking has not been soft-deleted.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Input for scheduling a booking.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewBooking {
    pub client_name: String,
    pub service_name: String,
    #[ts(as = "String")]
    pub starts_at: DateTime<Utc>,
    #[ts(type = "string | number")]
    pub price: Money,
    #[serde(default)]
    pub status: BookingStatus,
}

// =============================================================================
// Payment
// =============================================================================

/// A recorded charge against a booking.
///
/// Immutable after insert except for `deleted_at`. Refunds never touch
/// this row; they are separate [`PaymentEvent`]s pointing at it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub booking_id: String,
    pub method: PaymentMethod,
    /// Amount charged. Always > 0.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "amount_cents"))]
    #[ts(type = "string")]
    pub amount: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Whether the payment has not been soft-deleted.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

// =============================================================================
// Payment Event
// =============================================================================

/// An append-only ledger entry.
///
/// Both kinds are attributed to the booking so a booking has one ordered
/// timeline. `payment_id` names the payment a CHARGE recorded or a REFUND
/// offsets, which is what the refundable-balance check sums over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PaymentEvent {
    pub id: String,
    pub booking_id: String,
    pub payment_id: Option<String>,
    #[serde(rename = "type")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "type"))]
    pub event_type: PaymentEventType,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "amount_cents"))]
    #[ts(type = "string")]
    pub amount: Money,
    pub method: PaymentMethod,
    /// Acting user. `None` only for imported/system entries.
    pub performed_by: Option<String>,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl PaymentEvent {
    /// Whether the event has not been soft-deleted.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// A ledger entry as shown in the audit view.
///
/// `email` holds the performing user's email when known, or
/// [`SYSTEM_ACTOR_LABEL`](crate::SYSTEM_ACTOR_LABEL) when the event has no
/// performing user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PaymentEventRecord {
    pub id: String,
    #[serde(rename = "type")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "type"))]
    pub event_type: PaymentEventType,
    pub method: PaymentMethod,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "amount_cents"))]
    #[ts(type = "string")]
    pub amount: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub performed_by: Option<String>,
    pub email: Option<String>,
    pub note: Option<String>,
}

// =============================================================================
// User
// =============================================================================

/// Identity of a staff member, owned by the external auth system.
///
/// The ledger only reads it to label who performed an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

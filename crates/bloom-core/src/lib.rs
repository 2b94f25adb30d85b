//! # bloom-core: Pure Ledger Logic for Bloom
//!
//! Everything that decides whether money is handled correctly lives here,
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Bloom Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Calendar / Booking UI (web)                     │   │
//! │  │   Payment dialog ──► Refund dialog ──► Ledger view ──► Calendar │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP + SSE                             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    bloom-api (axum)                             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bloom-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  balance  │  │ projector │  │   │
//! │  │   │  Booking  │  │   Money   │  │ PaidBy... │  │ RawChange │  │   │
//! │  │   │  Payment  │  │  parsing  │  │ refunds   │  │ DomainEvt │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 bloom-db (Ledger Store, SQLite)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Booking, Payment, PaymentEvent, ...)
//! - [`money`] - Fixed-point money in integer cents
//! - [`balance`] - Paid/remaining/refundable math and the ledger invariants
//! - [`projector`] - Raw change notification → domain change event
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use bloom_core::balance::{check_charge_fits, remaining_balance};
//! use bloom_core::money::Money;
//!
//! let price: Money = "100.00".parse().unwrap();
//! let paid = Money::from_cents(7000);
//!
//! assert_eq!(remaining_balance(price, paid).to_string(), "30.00");
//! assert!(check_charge_fits(price, paid, Money::from_cents(4000)).is_err());
//! ```

pub mod balance;
pub mod error;
pub mod money;
pub mod projector;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{ErrorKind, LedgerError, ValidationError};
pub use money::Money;
pub use projector::{DomainChangeEvent, DomainChangeType, RawChange, RawChangeKind, SoftDeletable};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Label shown in the ledger view for events without a performing user.
///
/// Historical rows imported from the previous system carry no
/// `performed_by`; they render with this label instead of an email.
pub const SYSTEM_ACTOR_LABEL: &str = "System";

/// Maximum length of the free-text note attached to a refund.
pub const MAX_NOTE_LENGTH: usize = 500;

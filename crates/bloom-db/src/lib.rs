//! # bloom-db: Ledger Store for Bloom
//!
//! SQLite storage for bookings, payments and the payment event ledger, and
//! the services that write to it under the ledger invariants.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bloom Data Flow                                  │
//! │                                                                         │
//! │  POST /bookings/{id}/payments                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     bloom-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ BookingRepo   │    │ 001_init.sql │  │   │
//! │  │   │ SqlitePool    │◄───│ PaymentRepo   │    │              │  │   │
//! │  │   │ ChangeFeed    │    │ LedgerRepo    │    │              │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │ RawChange<Booking> after commit                    │   │
//! │  └───────────┼─────────────────────────────────────────────────────┘   │
//! │              ▼                                                          │
//! │   bloom-api SSE stream ──► projector ──► browsers                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`feed`] - Raw change feed
//! - [`error`] - Database and registration error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bloom_db::{Database, DbConfig, LedgerScope};
//!
//! let db = Database::new(DbConfig::new("bloom.db")).await?;
//!
//! db.payments().register_payment(&booking_id, cash, card, Some(&user_id)).await?;
//! let timeline = db.ledger().list_events(&LedgerScope::Booking(booking_id)).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod feed;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, PaymentError, RefundError, RegistrationError};
pub use feed::{ChangeFeed, DEFAULT_FEED_CAPACITY};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::booking::BookingRepository;
pub use repository::ledger::{LedgerRepository, LedgerScope};
pub use repository::payment::PaymentRepository;
pub use repository::user::UserRepository;

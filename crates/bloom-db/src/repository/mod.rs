//! # Repository Module
//!
//! Database repository implementations for the Bloom ledger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.payments().register_payment(id, cash, card, user)          │
//! │       ▼                                                                 │
//! │  PaymentRepository ──────► bloom-core balance checks                   │
//! │       │                                                                 │
//! │       │  one SQLite transaction                                        │
//! │       ▼                                                                 │
//! │  SQLite Database ──commit──► ChangeFeed                                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`BookingRepository`](booking::BookingRepository) - Booking CRUD and balance
//! - [`PaymentRepository`](payment::PaymentRepository) - Payment registration
//! - [`LedgerRepository`](ledger::LedgerRepository) - Refund registration and ledger queries
//! - [`UserRepository`](user::UserRepository) - Identity lookups
//!
//! The transaction helpers shared between repositories take a bare
//! `&mut SqliteConnection`, so they run on a pooled connection or inside a
//! transaction alike.

pub mod booking;
pub mod ledger;
pub mod payment;
pub mod user;

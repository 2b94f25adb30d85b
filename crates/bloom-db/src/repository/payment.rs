//! # Payment Repository
//!
//! The Payment Registration Service: records cash/card charges against a
//! booking without ever letting the paid total exceed the booking price.
//!
//! ## Registration Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  register_payment(booking, cash 40.00, card 30.00)                      │
//! │                                                                         │
//! │  validate_split_payment()            ← no I/O, rejects before BEGIN    │
//! │  BEGIN                                                                  │
//! │  ├── UPDATE bookings (no-op)          ← takes the write lock first     │
//! │  ├── SELECT booking, active payments  ← nobody else can write now      │
//! │  ├── check_charge_fits()              ← ExceedsBookingPrice → ROLLBACK │
//! │  ├── INSERT payment (cash) + CHARGE event                              │
//! │  ├── INSERT payment (card) + CHARGE event                              │
//! │  └── UPDATE bookings.updated_at                                        │
//! │  COMMIT                                                                 │
//! │  ChangeFeed::publish(Update(old, new))                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any error after BEGIN drops the transaction, which rolls it back. A split
//! payment therefore lands as two rows or none.

use bloom_core::balance::{check_charge_fits, sum_by_method};
use bloom_core::validation::validate_split_payment;
use bloom_core::{LedgerError, Money, Payment, PaymentEvent, PaymentEventType, PaymentMethod, RawChange};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbResult, PaymentError};
use crate::feed::ChangeFeed;
use crate::repository::booking::{fetch_booking, take_write_lock, touch_booking};
use crate::repository::ledger::insert_payment_event;

const PAYMENT_COLUMNS: &str = "id, booking_id, method, amount_cents, created_at, deleted_at";

/// Repository for payment database operations.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        PaymentRepository { pool, feed }
    }

    /// Records a (possibly split) payment against an active booking.
    ///
    /// ## Arguments
    /// * `booking_id` - Booking being paid
    /// * `cash` - Cash part, `>= 0`
    /// * `card` - Card part, `>= 0`
    /// * `performed_by` - Acting user, `None` for system-recorded payments
    ///
    /// ## Returns
    /// The inserted payment rows, one per non-zero part (cash first).
    ///
    /// ## Errors
    /// * `InvalidAmount` - a part is negative or both are zero
    /// * `BookingNotFound` - booking missing or soft-deleted
    /// * `ExceedsBookingPrice` - the paid total would pass the price
    /// * `Persistence` - the transaction failed
    pub async fn register_payment(
        &self,
        booking_id: &str,
        cash: Money,
        card: Money,
        performed_by: Option<&str>,
    ) -> Result<Vec<Payment>, PaymentError> {
        validate_split_payment(cash, card)?;

        debug!(booking_id = %booking_id, %cash, %card, "Registering payment");

        let mut tx = self.pool.begin().await?;

        if !take_write_lock(&mut tx, booking_id).await? {
            warn!(booking_id = %booking_id, "Payment rejected: booking not found");
            return Err(LedgerError::BookingNotFound(booking_id.to_string()).into());
        }

        let old = fetch_booking(&mut tx, booking_id, true)
            .await?
            .ok_or_else(|| LedgerError::BookingNotFound(booking_id.to_string()))?;

        let existing = fetch_booking_payments(&mut tx, booking_id).await?;
        let already_paid = sum_by_method(&existing).total();

        if let Err(rejection) = check_charge_fits(old.price, already_paid, cash + card) {
            warn!(
                booking_id = %booking_id,
                price = %old.price,
                already_paid = %already_paid,
                error = %rejection,
                "Payment rejected"
            );
            return Err(rejection.into());
        }

        let now = Utc::now();
        let mut inserted = Vec::with_capacity(2);

        for (method, amount) in [(PaymentMethod::Cash, cash), (PaymentMethod::CreditCard, card)] {
            if !amount.is_positive() {
                continue;
            }

            let payment = Payment {
                id: Uuid::new_v4().to_string(),
                booking_id: booking_id.to_string(),
                method,
                amount,
                created_at: now,
                deleted_at: None,
            };
            insert_payment(&mut tx, &payment).await?;

            let charge = PaymentEvent {
                id: Uuid::new_v4().to_string(),
                booking_id: booking_id.to_string(),
                payment_id: Some(payment.id.clone()),
                event_type: PaymentEventType::Charge,
                amount,
                method,
                performed_by: performed_by.map(str::to_string),
                note: None,
                created_at: now,
                deleted_at: None,
            };
            insert_payment_event(&mut tx, &charge).await?;

            inserted.push(payment);
        }

        let new = touch_booking(&mut tx, booking_id).await?;

        tx.commit().await?;

        info!(
            booking_id = %booking_id,
            rows = inserted.len(),
            total = %(cash + card),
            remaining = %(new.price - already_paid - cash - card),
            "Payment registered"
        );
        self.feed.publish(RawChange::update(old, new));

        Ok(inserted)
    }

    /// Lists the active payments of a booking, oldest first.
    pub async fn list_for_booking(&self, booking_id: &str) -> DbResult<Vec<Payment>> {
        let mut conn = self.pool.acquire().await?;
        fetch_booking_payments(&mut conn, booking_id).await
    }

    /// Gets a payment by ID if it is active.
    pub async fn get_active(&self, id: &str) -> DbResult<Option<Payment>> {
        let mut conn = self.pool.acquire().await?;
        fetch_active_payment(&mut conn, id).await
    }
}

// =============================================================================
// Shared Helpers
// =============================================================================

async fn insert_payment(conn: &mut SqliteConnection, payment: &Payment) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO payments (id, booking_id, method, amount_cents, created_at, deleted_at)
        VALUES (?1, ?2, ?3, ?4, ?5, NULL)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.booking_id)
    .bind(payment.method)
    .bind(payment.amount)
    .bind(payment.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Active payments of a booking, oldest first.
pub(crate) async fn fetch_booking_payments(conn: &mut SqliteConnection, booking_id: &str) -> DbResult<Vec<Payment>> {
    let sql = format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments \
         WHERE booking_id = ?1 AND deleted_at IS NULL \
         ORDER BY created_at, rowid"
    );

    let payments = sqlx::query_as::<_, Payment>(&sql)
        .bind(booking_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(payments)
}

pub(crate) async fn fetch_active_payment(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Payment>> {
    let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = ?1 AND deleted_at IS NULL");

    let payment = sqlx::query_as::<_, Payment>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(payment)
}

// =============================================================================
// Unit Tests
// =============================================================================

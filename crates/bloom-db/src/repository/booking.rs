//! # Booking Repository
//!
//! Thin CRUD for bookings, plus the balance read used by the payment dialog.
//!
//! ## Booking Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Booking Lifecycle                                 │
//! │                                                                         │
//! │  1. SCHEDULE                                                           │
//! │     └── create() → Booking { status: Pending }      feed: INSERT       │
//! │                                                                         │
//! │  2. PROGRESS                                                           │
//! │     └── update_status() → Confirmed / Completed     feed: UPDATE       │
//! │     └── payments/refunds bump updated_at            feed: UPDATE       │
//! │                                                                         │
//! │  3. CANCEL                                                             │
//! │     └── soft_delete() → deleted_at set, Cancelled   feed: UPDATE       │
//! │         (projected to subscribers as DELETE)                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use bloom_core::balance::BalanceSummary;
use bloom_core::validation::{validate_price, validate_required_text};
use bloom_core::{Booking, BookingStatus, LedgerError, NewBooking, RawChange};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult, RegistrationError};
use crate::feed::ChangeFeed;
use crate::repository::ledger::fetch_booking_events;
use crate::repository::payment::fetch_booking_payments;

/// Maximum length of client and service names.
const MAX_NAME_LENGTH: usize = 200;

const BOOKING_COLUMNS: &str = r#"
    id, client_name, service_name, starts_at, price_cents, status,
    deleted_at, created_at, updated_at
"#;

/// Repository for booking database operations.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl BookingRepository {
    /// Creates a new BookingRepository.
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        BookingRepository { pool, feed }
    }

    /// Schedules a new booking.
    ///
    /// Names are trimmed; the price must not be negative.
    pub async fn create(&self, new: &NewBooking) -> Result<Booking, RegistrationError> {
        validate_required_text("client_name", &new.client_name, MAX_NAME_LENGTH).map_err(LedgerError::from)?;
        validate_required_text("service_name", &new.service_name, MAX_NAME_LENGTH).map_err(LedgerError::from)?;
        validate_price(new.price).map_err(LedgerError::from)?;

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            client_name: new.client_name.trim().to_string(),
            service_name: new.service_name.trim().to_string(),
            starts_at: new.starts_at,
            price: new.price,
            status: new.status,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %booking.id, price = %booking.price, "Creating booking");

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, client_name, service_name, starts_at, price_cents, status,
                deleted_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7, ?8)
            "#,
        )
        .bind(&booking.id)
        .bind(&booking.client_name)
        .bind(&booking.service_name)
        .bind(booking.starts_at)
        .bind(booking.price)
        .bind(booking.status)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        info!(id = %booking.id, "Booking created");
        self.feed.publish(RawChange::insert(booking.clone()));

        Ok(booking)
    }

    /// Gets a booking by ID, including soft-deleted ones.
    pub async fn get(&self, id: &str) -> DbResult<Option<Booking>> {
        let mut conn = self.pool.acquire().await?;
        fetch_booking(&mut conn, id, false).await
    }

    /// Gets a booking by ID if it is active.
    pub async fn get_active(&self, id: &str) -> DbResult<Option<Booking>> {
        let mut conn = self.pool.acquire().await?;
        fetch_booking(&mut conn, id, true).await
    }

    /// Changes the status of an active booking.
    pub async fn update_status(&self, id: &str, status: BookingStatus) -> DbResult<Booking> {
        debug!(id = %id, status = %status, "Updating booking status");

        let mut tx = self.pool.begin().await?;
        take_write_lock(&mut tx, id).await?;

        let old = fetch_booking(&mut tx, id, true)
            .await?
            .ok_or_else(|| DbError::not_found("Booking", id))?;

        sqlx::query("UPDATE bookings SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        let new = fetch_booking(&mut tx, id, false)
            .await?
            .ok_or_else(|| DbError::not_found("Booking", id))?;

        tx.commit().await?;

        self.feed.publish(RawChange::update(old, new.clone()));
        Ok(new)
    }

    /// Soft-deletes a booking: sets `deleted_at` and marks it cancelled.
    ///
    /// Payments and ledger events are left untouched, so refunds against
    /// its payments remain possible.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting booking");

        let mut tx = self.pool.begin().await?;
        take_write_lock(&mut tx, id).await?;

        let old = fetch_booking(&mut tx, id, true)
            .await?
            .ok_or_else(|| DbError::not_found("Booking", id))?;

        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE bookings SET
                status = ?2,
                deleted_at = ?3,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(BookingStatus::Cancelled)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let new = fetch_booking(&mut tx, id, false)
            .await?
            .ok_or_else(|| DbError::not_found("Booking", id))?;

        tx.commit().await?;

        info!(id = %id, "Booking soft-deleted");
        self.feed.publish(RawChange::update(old, new));
        Ok(())
    }

    /// Paid, refunded and remaining amounts for a booking.
    ///
    /// Works for cancelled bookings too, since refunds may follow a
    /// cancellation.
    pub async fn balance(&self, id: &str) -> DbResult<BalanceSummary> {
        let mut conn = self.pool.acquire().await?;

        let booking = fetch_booking(&mut conn, id, false)
            .await?
            .ok_or_else(|| DbError::not_found("Booking", id))?;
        let payments = fetch_booking_payments(&mut conn, id).await?;
        let events = fetch_booking_events(&mut conn, id).await?;

        Ok(BalanceSummary::compute(&booking.id, booking.price, &payments, &events))
    }
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// Loads a booking on the given connection.
pub(crate) async fn fetch_booking(
    conn: &mut SqliteConnection,
    id: &str,
    active_only: bool,
) -> DbResult<Option<Booking>> {
    let sql = if active_only {
        format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1 AND deleted_at IS NULL")
    } else {
        format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1")
    };

    let booking = sqlx::query_as::<_, Booking>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(booking)
}

/// Takes SQLite's write lock by touching the booking row.
///
/// Must be the first statement of a ledger transaction. Concurrent writers
/// then queue on the busy timeout instead of reading a balance that another
/// transaction is about to change. Returns whether an active booking matched.
pub(crate) async fn take_write_lock(conn: &mut SqliteConnection, booking_id: &str) -> DbResult<bool> {
    let result = sqlx::query("UPDATE bookings SET updated_at = updated_at WHERE id = ?1 AND deleted_at IS NULL")
        .bind(booking_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Bumps `updated_at` and returns the new snapshot.
pub(crate) async fn touch_booking(conn: &mut SqliteConnection, booking_id: &str) -> DbResult<Booking> {
    sqlx::query("UPDATE bookings SET updated_at = ?2 WHERE id = ?1")
        .bind(booking_id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

    fetch_booking(conn, booking_id, false)
        .await?
        .ok_or_else(|| DbError::not_found("Booking", booking_id))
}

// =============================================================================
// Unit Tests
// =============================================================================

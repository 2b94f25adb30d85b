//! # Ledger Repository
//!
//! The append-only payment event ledger: the Refund Registration Service
//! and the Ledger Query.
//!
//! ## Refund Checks
//! ```text
//! register_refund(payment, 20.00, "cash", note, user)
//!      │
//!      ├── amount > 0                 else InvalidAmount
//!      ├── method known               else UnknownMethod
//!      ├── acting user present        else Unauthorized
//!      ├── note <= 500 chars          else Validation
//!      │
//!      ▼  BEGIN (write lock via the payment's booking)
//!      ├── payment active             else PaymentNotFound
//!      ├── amount <= amount − prior refunds
//!      │                              else ExceedsRefundableBalance
//!      ├── INSERT REFUND event
//!      └── UPDATE bookings.updated_at
//!      COMMIT → ChangeFeed
//! ```
//!
//! A refund only needs the payment to be active. The booking may already
//! be cancelled.

use bloom_core::balance::{check_refund_fits, refundable_balance, refunded_against};
use bloom_core::validation::{normalize_note, parse_method, validate_refund_amount};
use bloom_core::{
    LedgerError, Money, PaymentEvent, PaymentEventRecord, PaymentEventType, RawChange, SYSTEM_ACTOR_LABEL,
};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult, RefundError};
use crate::feed::ChangeFeed;
use crate::repository::booking::{fetch_booking, touch_booking};
use crate::repository::payment::fetch_active_payment;

const EVENT_COLUMNS: &str = r#"
    id, booking_id, payment_id, type, amount_cents, method,
    performed_by, note, created_at, deleted_at
"#;

/// Which slice of the ledger to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerScope {
    /// Every event on the booking's timeline.
    Booking(String),
    /// The CHARGE and REFUNDs tied to one payment.
    Payment(String),
}

/// Repository for the payment event ledger.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        LedgerRepository { pool, feed }
    }

    /// Records a refund against a prior payment.
    ///
    /// ## Returns
    /// The id of the new REFUND event.
    pub async fn register_refund(
        &self,
        payment_id: &str,
        amount: Money,
        method: &str,
        note: Option<&str>,
        performed_by: Option<&str>,
    ) -> Result<String, RefundError> {
        validate_refund_amount(amount)?;
        let method = parse_method(method)?;
        let performed_by = performed_by
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(LedgerError::Unauthorized)?;
        let note = normalize_note(note).map_err(LedgerError::from)?;

        debug!(payment_id = %payment_id, %amount, %method, "Registering refund");

        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query(
            r#"
            UPDATE bookings SET updated_at = updated_at
            WHERE id = (SELECT booking_id FROM payments WHERE id = ?1 AND deleted_at IS NULL)
            "#,
        )
        .bind(payment_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if locked == 0 {
            warn!(payment_id = %payment_id, "Refund rejected: payment not found");
            return Err(LedgerError::PaymentNotFound(payment_id.to_string()).into());
        }

        let payment = fetch_active_payment(&mut tx, payment_id)
            .await?
            .ok_or_else(|| LedgerError::PaymentNotFound(payment_id.to_string()))?;

        let old = fetch_booking(&mut tx, &payment.booking_id, false)
            .await?
            .ok_or_else(|| LedgerError::PaymentNotFound(payment_id.to_string()))?;

        let events = fetch_payment_events(&mut tx, payment_id).await?;
        let refundable = refundable_balance(payment.amount, refunded_against(payment_id, &events));

        if let Err(rejection) = check_refund_fits(refundable, amount) {
            warn!(
                payment_id = %payment_id,
                requested = %amount,
                refundable = %refundable,
                "Refund rejected"
            );
            return Err(rejection.into());
        }

        let event = PaymentEvent {
            id: Uuid::new_v4().to_string(),
            booking_id: payment.booking_id.clone(),
            payment_id: Some(payment.id.clone()),
            event_type: PaymentEventType::Refund,
            amount,
            method,
            performed_by: Some(performed_by.to_string()),
            note,
            created_at: Utc::now(),
            deleted_at: None,
        };
        insert_payment_event(&mut tx, &event).await?;

        let new = touch_booking(&mut tx, &payment.booking_id).await?;

        tx.commit().await?;

        info!(
            event_id = %event.id,
            payment_id = %payment_id,
            booking_id = %payment.booking_id,
            %amount,
            refundable_after = %(refundable - amount),
            "Refund registered"
        );
        self.feed.publish(RawChange::update(old, new));

        Ok(event.id)
    }

    /// Active ledger events for a booking or payment, newest first.
    ///
    /// Ties on `created_at` fall back to reverse insertion order, so repeated
    /// reads without writes in between return the same sequence.
    pub async fn list_events(&self, scope: &LedgerScope) -> DbResult<Vec<PaymentEventRecord>> {
        let (filter, id) = match scope {
            LedgerScope::Booking(id) => ("e.booking_id", id),
            LedgerScope::Payment(id) => ("e.payment_id", id),
        };

        debug!(?scope, "Listing ledger events");

        let sql = format!(
            r#"
            SELECT
                e.id,
                e.type,
                e.method,
                e.amount_cents,
                e.created_at,
                e.performed_by,
                CASE WHEN e.performed_by IS NULL THEN ?2 ELSE u.email END AS email,
                e.note
            FROM payment_events e
            LEFT JOIN users u ON u.id = e.performed_by
            WHERE {filter} = ?1 AND e.deleted_at IS NULL
            ORDER BY e.created_at DESC, e.rowid DESC
            "#
        );

        let records = sqlx::query_as::<_, PaymentEventRecord>(&sql)
            .bind(id)
            .bind(SYSTEM_ACTOR_LABEL)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    /// What is left to refund on a payment.
    pub async fn refundable_balance(&self, payment_id: &str) -> DbResult<Money> {
        let mut conn = self.pool.acquire().await?;

        let payment = fetch_active_payment(&mut conn, payment_id)
            .await?
            .ok_or_else(|| DbError::not_found("Payment", payment_id))?;
        let events = fetch_payment_events(&mut conn, payment_id).await?;

        Ok(refundable_balance(payment.amount, refunded_against(payment_id, &events)))
    }
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// Appends one event to the ledger on the caller's transaction.
pub(crate) async fn insert_payment_event(conn: &mut SqliteConnection, event: &PaymentEvent) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO payment_events (
            id, booking_id, payment_id, type, amount_cents, method,
            performed_by, note, created_at, deleted_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL)
        "#,
    )
    .bind(&event.id)
    .bind(&event.booking_id)
    .bind(&event.payment_id)
    .bind(event.event_type)
    .bind(event.amount)
    .bind(event.method)
    .bind(&event.performed_by)
    .bind(&event.note)
    .bind(event.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Active events on a booking's timeline, oldest first.
pub(crate) async fn fetch_booking_events(conn: &mut SqliteConnection, booking_id: &str) -> DbResult<Vec<PaymentEvent>> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM payment_events \
         WHERE booking_id = ?1 AND deleted_at IS NULL \
         ORDER BY created_at, rowid"
    );

    let events = sqlx::query_as::<_, PaymentEvent>(&sql)
        .bind(booking_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(events)
}

/// Active events tied to one payment, oldest first.
async fn fetch_payment_events(conn: &mut SqliteConnection, payment_id: &str) -> DbResult<Vec<PaymentEvent>> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM payment_events \
         WHERE payment_id = ?1 AND deleted_at IS NULL \
         ORDER BY created_at, rowid"
    );

    let events = sqlx::query_as::<_, PaymentEvent>(&sql)
        .bind(payment_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(events)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistrationError;
    use crate::{Database, DbConfig};
    use bloom_core::{BookingStatus, NewBooking, PaymentMethod, RawChangeKind, User};
    use std::time::Duration;

    fn c(cents: i64) -> Money {
        Money::from_cents(cents)
    }

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.users()
            .upsert(&User {
                id: "u1".to_string(),
                email: "reception@bloom.test".to_string(),
                display_name: Some("Reception".to_string()),
            })
            .await
            .unwrap();
        db
    }

    /// Booking priced 100.00 with a single 50.00 cash payment.
    async fn paid_booking(db: &Database) -> (String, String) {
        let booking = db
            .bookings()
            .create(&NewBooking {
                client_name: "Katherine Johnson".to_string(),
                service_name: "Facial".to_string(),
                starts_at: Utc::now(),
                price: c(10000),
                status: BookingStatus::Confirmed,
            })
            .await
            .unwrap();
        let payments = db
            .payments()
            .register_payment(&booking.id, c(5000), c(0), Some("u1"))
            .await
            .unwrap();
        (booking.id, payments[0].id.clone())
    }

    #[tokio::test]
    async fn test_refund_within_bounds() {
        let db = setup().await;
        let (booking_id, payment_id) = paid_booking(&db).await;

        let event_id = db
            .ledger()
            .register_refund(&payment_id, c(2000), "cash", Some("client complaint"), Some("u1"))
            .await
            .unwrap();

        let events = db
            .ledger()
            .list_events(&LedgerScope::Payment(payment_id.clone()))
            .await
            .unwrap();
        let refunds: Vec<_> = events
            .iter()
            .filter(|e| e.event_type == PaymentEventType::Refund)
            .collect();
        assert_eq!(refunds.len(), 1);
        assert_eq!(refunds[0].id, event_id);
        assert_eq!(refunds[0].amount, c(2000));
        assert_eq!(refunds[0].note.as_deref(), Some("client complaint"));
        assert_eq!(refunds[0].email.as_deref(), Some("reception@bloom.test"));

        assert_eq!(db.ledger().refundable_balance(&payment_id).await.unwrap(), c(3000));

        let summary = db.bookings().balance(&booking_id).await.unwrap();
        assert_eq!(summary.total_refunded, c(2000));
    }

    #[tokio::test]
    async fn test_refund_exceeding_balance() {
        let db = setup().await;
        let (_, payment_id) = paid_booking(&db).await;
        db.ledger()
            .register_refund(&payment_id, c(2000), "cash", None, Some("u1"))
            .await
            .unwrap();

        let err = db
            .ledger()
            .register_refund(&payment_id, c(4000), "cash", None, Some("u1"))
            .await
            .unwrap_err();

        match err {
            RegistrationError::Rejected(LedgerError::ExceedsRefundableBalance { refundable }) => {
                assert_eq!(refundable, c(3000));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_refund_full_amount_then_nothing_left() {
        let db = setup().await;
        let (_, payment_id) = paid_booking(&db).await;

        db.ledger()
            .register_refund(&payment_id, c(5000), "credit_card", None, Some("u1"))
            .await
            .unwrap();
        assert!(db.ledger().refundable_balance(&payment_id).await.unwrap().is_zero());

        assert!(db
            .ledger()
            .register_refund(&payment_id, c(1), "cash", None, Some("u1"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_refund_validation_order() {
        let db = setup().await;
        let (_, payment_id) = paid_booking(&db).await;
        let ledger = db.ledger();

        let err = ledger
            .register_refund(&payment_id, c(0), "bitcoin", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::Rejected(LedgerError::InvalidAmount { .. })));

        let err = ledger
            .register_refund(&payment_id, c(100), "bitcoin", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::Rejected(LedgerError::UnknownMethod(_))));

        let err = ledger
            .register_refund(&payment_id, c(100), "cash", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::Rejected(LedgerError::Unauthorized)));

        let err = ledger
            .register_refund("missing", c(100), "cash", None, Some("u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::Rejected(LedgerError::PaymentNotFound(_))));
    }

    #[tokio::test]
    async fn test_refund_after_cancellation() {
        let db = setup().await;
        let (booking_id, payment_id) = paid_booking(&db).await;
        db.bookings().soft_delete(&booking_id).await.unwrap();

        assert!(db
            .ledger()
            .register_refund(&payment_id, c(5000), "cash", None, Some("u1"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_refund_does_not_reopen_charge_capacity() {
        let db = setup().await;
        let (booking_id, payment_id) = paid_booking(&db).await;
        db.payments()
            .register_payment(&booking_id, c(5000), c(0), None)
            .await
            .unwrap();
        db.ledger()
            .register_refund(&payment_id, c(2000), "cash", None, Some("u1"))
            .await
            .unwrap();

        assert!(db
            .payments()
            .register_payment(&booking_id, c(1), c(0), None)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_list_events_booking_scope_newest_first() {
        let db = setup().await;
        let (booking_id, payment_id) = paid_booking(&db).await;
        db.payments()
            .register_payment(&booking_id, c(0), c(1000), None)
            .await
            .unwrap();
        let refund_id = db
            .ledger()
            .register_refund(&payment_id, c(500), "cash", None, Some("u1"))
            .await
            .unwrap();

        let events = db
            .ledger()
            .list_events(&LedgerScope::Booking(booking_id))
            .await
            .unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].id, refund_id);
        assert_eq!(events[1].event_type, PaymentEventType::Charge);
        assert_eq!(events[1].method, PaymentMethod::CreditCard);
        assert_eq!(events[1].email.as_deref(), Some(SYSTEM_ACTOR_LABEL));
        assert_eq!(events[2].amount, c(5000));
        assert_eq!(events[2].performed_by.as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn test_list_events_is_idempotent() {
        let db = setup().await;
        let (booking_id, payment_id) = paid_booking(&db).await;
        db.ledger()
            .register_refund(&payment_id, c(100), "cash", None, Some("u1"))
            .await
            .unwrap();
        db.ledger()
            .register_refund(&payment_id, c(100), "cash", None, Some("u1"))
            .await
            .unwrap();

        let scope = LedgerScope::Booking(booking_id);
        let first = db.ledger().list_events(&scope).await.unwrap();
        let second = db.ledger().list_events(&scope).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unknown_user_has_no_email() {
        let db = setup().await;
        let (_, payment_id) = paid_booking(&db).await;
        db.ledger()
            .register_refund(&payment_id, c(100), "cash", None, Some("someone-else"))
            .await
            .unwrap();

        let events = db
            .ledger()
            .list_events(&LedgerScope::Payment(payment_id))
            .await
            .unwrap();
        assert_eq!(events[0].performed_by.as_deref(), Some("someone-else"));
        assert!(events[0].email.is_none());
    }

    #[tokio::test]
    async fn test_list_events_empty_scope() {
        let db = setup().await;
        let events = db
            .ledger()
            .list_events(&LedgerScope::Payment("missing".to_string()))
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_refund_publishes_booking_update() {
        let db = setup().await;
        let (booking_id, payment_id) = paid_booking(&db).await;
        let mut rx = db.change_feed().subscribe();

        db.ledger()
            .register_refund(&payment_id, c(100), "cash", None, Some("u1"))
            .await
            .unwrap();

        let change = rx.recv().await.unwrap();
        assert_eq!(change.kind, RawChangeKind::Update);
        assert_eq!(change.new.unwrap().id, booking_id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_refunds_cannot_exceed_payment() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("ledger.db"))
            .max_connections(4)
            .busy_timeout(Duration::from_secs(10));
        let db = Database::new(config).await.unwrap();
        let (_, payment_id) = paid_booking(&db).await;

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let db = db.clone();
                let payment_id = payment_id.clone();
                tokio::spawn(async move {
                    db.ledger()
                        .register_refund(&payment_id, c(3000), "cash", None, Some("u1"))
                        .await
                })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                matches!(
                    err,
                    RegistrationError::Rejected(LedgerError::ExceedsRefundableBalance { refundable })
                        if *refundable == c(2000)
                ),
                "unexpected error: {err:?}"
            );
        }

        assert_eq!(db.ledger().refundable_balance(&payment_id).await.unwrap(), c(2000));
    }
}

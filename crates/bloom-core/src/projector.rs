//! # Event Projector
//!
//! Turns raw row-change notifications into domain events.
//!
//! The store only knows about inserts, updates and deletes. Clients care
//! about one more thing: a row that was soft-deleted. An update that sets
//! `deleted_at` is therefore reported as a DELETE carrying the row as it
//! looked before it disappeared.
//!
//! ```text
//!   raw change                       domain event
//!   ──────────                       ────────────
//!   Insert(new)                 ──►  INSERT(new)
//!   Update(old, new)
//!     old active, new deleted   ──►  DELETE(old)
//!     anything else             ──►  UPDATE(new)
//!   Delete(old)                 ──►  DELETE(old)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{Booking, Payment, PaymentEvent};

// =============================================================================
// Soft Deletable
// =============================================================================

/// A row carrying a nullable soft-delete marker.
pub trait SoftDeletable {
    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    fn is_soft_deleted(&self) -> bool {
        self.deleted_at().is_some()
    }
}

impl SoftDeletable for Booking {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

impl SoftDeletable for Payment {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

impl SoftDeletable for PaymentEvent {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

// =============================================================================
// Raw Change
// =============================================================================

/// Kind of a raw store notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RawChangeKind {
    Insert,
    Update,
    Delete,
}

/// A raw notification with before/after snapshots.
///
/// Inserts carry only `new`, deletes only `old`, updates both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawChange<T> {
    pub kind: RawChangeKind,
    pub old: Option<T>,
    pub new: Option<T>,
}

impl<T> RawChange<T> {
    pub fn insert(new: T) -> Self {
        RawChange {
            kind: RawChangeKind::Insert,
            old: None,
            new: Some(new),
        }
    }

    pub fn update(old: T, new: T) -> Self {
        RawChange {
            kind: RawChangeKind::Update,
            old: Some(old),
            new: Some(new),
        }
    }

    pub fn delete(old: T) -> Self {
        RawChange {
            kind: RawChangeKind::Delete,
            old: Some(old),
            new: None,
        }
    }
}

// =============================================================================
// Domain Change Event
// =============================================================================

/// Domain event type as seen by subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum DomainChangeType {
    Insert,
    Update,
    Delete,
}

/// What a subscriber receives: `{"type": "...", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DomainChangeEvent<T> {
    #[serde(rename = "type")]
    pub kind: DomainChangeType,
    pub data: T,
}

impl<T> DomainChangeEvent<T> {
    fn new(kind: DomainChangeType, data: T) -> Self {
        DomainChangeEvent { kind, data }
    }
}

// =============================================================================
// Projection
// =============================================================================

/// Applies the soft-delete rule to one raw change.
///
/// Returns `None` when the change lacks the snapshot its rule needs
/// (an insert without `new`, for example).
///
/// ```rust
/// use bloom_core::projector::{project, DomainChangeType, RawChange, SoftDeletable};
/// use chrono::{DateTime, Utc};
///
/// #[derive(Clone)]
/// struct Row(Option<DateTime<Utc>>);
/// impl SoftDeletable for Row {
///     fn deleted_at(&self) -> Option<DateTime<Utc>> { self.0 }
/// }
///
/// let event = project(RawChange::update(Row(None), Row(Some(Utc::now())))).unwrap();
/// assert_eq!(event.kind, DomainChangeType::Delete);
/// assert!(event.data.0.is_none());
/// ```
pub fn project<T: SoftDeletable>(change: RawChange<T>) -> Option<DomainChangeEvent<T>> {
    let RawChange { kind, old, new } = change;

    match kind {
        RawChangeKind::Insert => new.map(|n| DomainChangeEvent::new(DomainChangeType::Insert, n)),
        RawChangeKind::Delete => old.map(|o| DomainChangeEvent::new(DomainChangeType::Delete, o)),
        RawChangeKind::Update => {
            let new = new?;
            match old {
                Some(old) if !old.is_soft_deleted() && new.is_soft_deleted() => {
                    Some(DomainChangeEvent::new(DomainChangeType::Delete, old))
                }
                _ => Some(DomainChangeEvent::new(DomainChangeType::Update, new)),
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

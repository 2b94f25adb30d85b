//! # Raw Change Feed
//!
//! In-process broadcast of booking row changes, published after commit.
//!
//! ```text
//!   BookingRepository ──┐
//!   PaymentRepository ──┼── tx.commit() ──► ChangeFeed::publish(RawChange)
//!   LedgerRepository  ──┘                          │
//!                                     ┌────────────┼────────────┐
//!                                     ▼            ▼            ▼
//!                                subscriber    subscriber   subscriber
//!                              (SSE stream)  (SSE stream)     (test)
//! ```
//!
//! Delivery is at-most-once. A subscriber that falls more than `capacity`
//! notifications behind loses the oldest ones and sees `Lagged` on its next
//! receive. Nothing is replayed to late subscribers.

use bloom_core::{Booking, RawChange};
use tokio::sync::broadcast;
use tracing::trace;

/// Default number of notifications buffered per subscriber.
pub const DEFAULT_FEED_CAPACITY: usize = 256;

/// Broadcast handle for raw booking changes. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<RawChange<Booking>>,
}

impl ChangeFeed {
    /// Creates a feed buffering up to `capacity` notifications per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        ChangeFeed { tx }
    }

    /// Publishes a change to every current subscriber.
    ///
    /// Returns the number of subscribers that received it. Having none is
    /// not an error.
    pub fn publish(&self, change: RawChange<Booking>) -> usize {
        let kind = change.kind;
        let delivered = self.tx.send(change).unwrap_or(0);
        trace!(?kind, delivered, "Published raw change");
        delivered
    }

    /// Opens a new subscription. Dropping the receiver releases it.
    pub fn subscribe(&self) -> broadcast::Receiver<RawChange<Booking>> {
        self.tx.subscribe()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        ChangeFeed::new(DEFAULT_FEED_CAPACITY)
    }
}

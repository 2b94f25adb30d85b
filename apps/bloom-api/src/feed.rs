//! # Booking Change Stream (SSE)
//!
//! Pushes projected booking changes to calendar clients over
//! `text/event-stream`.
//!
//! ## Frame Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  retry: 5000                  ← once, reconnect delay for EventSource  │
//! │                                                                         │
//! │  : connected                  ← keep-alive comment, every N seconds    │
//! │                                                                         │
//! │  data: {"type":"INSERT","data":{...booking...}}                        │
//! │                                                                         │
//! │  data: {"type":"DELETE","data":{...booking before delete...}}          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One broadcast receiver per connection. It lives inside the response
//! body, so a client abort drops the body and releases the subscription.
//! Delivery is at-most-once: a lagging client skips what it missed and
//! nothing is replayed on reconnect.

use std::convert::Infallible;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use bloom_core::projector::project;
use bloom_core::{Booking, RawChange};
use futures_util::stream;
use tokio::sync::{broadcast, watch};
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::state::AppState;

const KEEPALIVE_FRAME: &[u8] = b": connected\n\n";

/// `GET /bookings/events/stream`
pub async fn stream_booking_changes(State(state): State<AppState>) -> Response {
    let connection = Connection {
        retry: Some(Bytes::from(format!("retry: {}\n\n", state.config.sse_retry_ms))),
        changes: state.db.change_feed().subscribe(),
        keepalive: keepalive_interval(&state),
        shutdown: state.shutdown_signal(),
    };

    info!(
        subscribers = state.db.change_feed().subscriber_count(),
        "Change stream client connected"
    );

    let body = Body::from_stream(stream::unfold(connection, next_frame));

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache, no-transform"),
            (header::CONNECTION, "keep-alive"),
        ],
        body,
    )
        .into_response()
}

fn keepalive_interval(state: &AppState) -> Interval {
    let mut ticker = interval(state.config.sse_keepalive());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Per-connection stream state.
struct Connection {
    /// Pending `retry:` frame, sent before anything else.
    retry: Option<Bytes>,
    changes: broadcast::Receiver<RawChange<Booking>>,
    keepalive: Interval,
    shutdown: watch::Receiver<bool>,
}

enum Step {
    Change(RawChange<Booking>),
    Keepalive,
    Skipped(u64),
    Recheck,
    End,
}

async fn next_frame(mut conn: Connection) -> Option<(Result<Bytes, Infallible>, Connection)> {
    if let Some(retry) = conn.retry.take() {
        return Some((Ok(retry), conn));
    }

    loop {
        if *conn.shutdown.borrow() {
            debug!("Change stream closed for shutdown");
            return None;
        }

        let step = tokio::select! {
            received = conn.changes.recv() => match received {
                Ok(change) => Step::Change(change),
                Err(broadcast::error::RecvError::Lagged(missed)) => Step::Skipped(missed),
                Err(broadcast::error::RecvError::Closed) => Step::End,
            },
            _ = conn.keepalive.tick() => Step::Keepalive,
            changed = conn.shutdown.changed() => match changed {
                Ok(()) => Step::Recheck,
                Err(_) => Step::End,
            },
        };

        match step {
            Step::Change(change) => {
                if let Some(frame) = encode_change(change) {
                    return Some((Ok(frame), conn));
                }
            }
            Step::Keepalive => return Some((Ok(Bytes::from_static(KEEPALIVE_FRAME)), conn)),
            Step::Skipped(missed) => {
                warn!(missed, "Change stream client lagging, notifications skipped");
            }
            Step::Recheck => {}
            Step::End => {
                debug!("Change stream closed, feed ended");
                return None;
            }
        }
    }
}

/// Projects a raw change and renders it as a `data:` frame.
fn encode_change(change: RawChange<Booking>) -> Option<Bytes> {
    let kind = change.kind;

    let Some(event) = project(change) else {
        debug!(?kind, "Raw change produced no domain event");
        return None;
    };

    match serde_json::to_string(&event) {
        Ok(json) => Some(Bytes::from(format!("data: {json}\n\n"))),
        Err(e) => {
            warn!(error = %e, "Failed to encode change event");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{get, send, test_state};
    use axum::http::StatusCode;
    use bloom_core::{BookingStatus, Money, NewBooking};
    use chrono::Utc;
    use futures_util::StreamExt;

    const STREAM_URI: &str = "/bookings/events/stream";

    async fn next_text(body: &mut axum::body::BodyDataStream) -> String {
        let chunk = body.next().await.unwrap().unwrap();
        String::from_utf8(chunk.to_vec()).unwrap()
    }

    fn new_booking() -> NewBooking {
        NewBooking {
            client_name: "Ana Souza".to_string(),
            service_name: "Haircut".to_string(),
            starts_at: Utc::now(),
            price: Money::from_cents(10000),
            status: BookingStatus::Pending,
        }
    }

    #[tokio::test]
    async fn test_stream_headers_and_opening_frames() {
        let state = test_state().await;
        let response = send(&state, get(STREAM_URI)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache, no-transform");
        assert_eq!(response.headers()[header::CONNECTION], "keep-alive");

        let mut body = response.into_body().into_data_stream();
        assert_eq!(next_text(&mut body).await, "retry: 5000\n\n");
        assert_eq!(next_text(&mut body).await, ": connected\n\n");
    }

    #[tokio::test]
    async fn test_stream_delivers_projected_changes() {
        let state = test_state().await;
        let response = send(&state, get(STREAM_URI)).await;
        let mut body = response.into_body().into_data_stream();

        next_text(&mut body).await;
        next_text(&mut body).await;

        let booking = state.db.bookings().create(&new_booking()).await.unwrap();
        let frame = next_text(&mut body).await;
        assert!(frame.starts_with("data: "));
        assert!(frame.ends_with("\n\n"));

        let json: serde_json::Value = serde_json::from_str(frame.trim_start_matches("data: ").trim_end()).unwrap();
        assert_eq!(json["type"], "INSERT");
        assert_eq!(json["data"]["id"], booking.id.as_str());
        assert_eq!(json["data"]["price"], "100.00");

        state.db.bookings().soft_delete(&booking.id).await.unwrap();
        let frame = next_text(&mut body).await;
        let json: serde_json::Value = serde_json::from_str(frame.trim_start_matches("data: ").trim_end()).unwrap();
        assert_eq!(json["type"], "DELETE");
        assert!(json["data"]["deleted_at"].is_null());
    }

    #[tokio::test]
    async fn test_dropping_body_releases_subscription() {
        let state = test_state().await;
        let feed = state.db.change_feed().clone();

        for _ in 0..3 {
            let response = send(&state, get(STREAM_URI)).await;
            assert_eq!(feed.subscriber_count(), 1);
            drop(response);
            assert_eq!(feed.subscriber_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_shutdown_ends_stream() {
        let state = test_state().await;
        let response = send(&state, get(STREAM_URI)).await;
        let mut body = response.into_body().into_data_stream();

        next_text(&mut body).await;
        next_text(&mut body).await;

        state.begin_shutdown();
        assert!(body.next().await.is_none());
    }

    #[test]
    fn test_unprojectable_change_is_skipped() {
        let change: RawChange<Booking> = RawChange {
            kind: bloom_core::RawChangeKind::Insert,
            old: None,
            new: None,
        };
        assert!(encode_change(change).is_none());
    }
}

//! # bloom-api: HTTP Surface for the Bloom Ledger
//!
//! ## Routes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST   /bookings                    routes::bookings                  │
//! │  GET    /bookings/{id}               routes::bookings                  │
//! │  PATCH  /bookings/{id}/status        routes::bookings                  │
//! │  DELETE /bookings/{id}               routes::bookings                  │
//! │  GET    /bookings/{id}/balance       routes::bookings                  │
//! │  POST   /bookings/{id}/payments      routes::payments                  │
//! │  GET    /bookings/{id}/events        routes::ledger                    │
//! │  GET    /bookings/events/stream      feed (SSE)                        │
//! │  POST   /payments/{id}/refunds       routes::refunds                   │
//! │  GET    /payments/{id}/events        routes::ledger                    │
//! │  GET    /health                      routes::health                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The acting user comes from a header set by the upstream auth proxy
//! (see [`identity`]). Errors are `{"error": "..."}` bodies (see [`error`]).

pub mod config;
pub mod error;
pub mod feed;
pub mod identity;
pub mod routes;
pub mod state;

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub use config::ApiConfig;
pub use state::AppState;

use routes::{bookings, health, ledger, payments, refunds};

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/bookings", post(bookings::create_booking))
        .route("/bookings/events/stream", get(feed::stream_booking_changes))
        .route(
            "/bookings/{id}",
            get(bookings::get_booking).delete(bookings::delete_booking),
        )
        .route("/bookings/{id}/status", patch(bookings::update_status))
        .route("/bookings/{id}/balance", get(bookings::booking_balance))
        .route("/bookings/{id}/payments", post(payments::register_payment))
        .route("/bookings/{id}/events", get(ledger::booking_events))
        .route("/payments/{id}/refunds", post(refunds::register_refund))
        .route("/payments/{id}/events", get(ledger::payment_events))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

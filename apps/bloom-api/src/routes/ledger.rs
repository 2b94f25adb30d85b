//! # Ledger Queries
//!
//! Audit views over payment events, newest first. An empty result is
//! reported as 404 so the UI can tell "nothing recorded" apart from a
//! list it should render.

use axum::extract::{Path, State};
use axum::Json;
use bloom_core::PaymentEventRecord;
use bloom_db::LedgerScope;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `GET /payments/{id}/events`
pub async fn payment_events(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> ApiResult<Json<Vec<PaymentEventRecord>>> {
    list(&state, LedgerScope::Payment(payment_id)).await
}

/// `GET /bookings/{id}/events`
pub async fn booking_events(
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
) -> ApiResult<Json<Vec<PaymentEventRecord>>> {
    list(&state, LedgerScope::Booking(booking_id)).await
}

async fn list(state: &AppState, scope: LedgerScope) -> ApiResult<Json<Vec<PaymentEventRecord>>> {
    let events = state.db.ledger().list_events(&scope).await?;

    if events.is_empty() {
        let message = match &scope {
            LedgerScope::Booking(id) => format!("No events found for booking {id}"),
            LedgerScope::Payment(id) => format!("No events found for payment {id}"),
        };
        return Err(ApiError::not_found(message));
    }

    Ok(Json(events))
}

//! # Booking Endpoints
//!
//! ```text
//! POST   /bookings               - schedule a booking
//! GET    /bookings/{id}          - fetch (cancelled bookings included)
//! PATCH  /bookings/{id}/status   - change status
//! DELETE /bookings/{id}          - soft-delete (cancel)
//! GET    /bookings/{id}/balance  - paid / refunded / remaining
//! ```

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use bloom_core::balance::BalanceSummary;
use bloom_core::{Booking, BookingStatus, NewBooking};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: BookingStatus,
}

pub async fn create_booking(
    State(state): State<AppState>,
    payload: Result<Json<NewBooking>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Booking>)> {
    let Json(new) = payload?;
    let booking = state.db.bookings().create(&new).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn get_booking(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Booking>> {
    state
        .db
        .bookings()
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Booking not found: {id}")))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> ApiResult<Json<Booking>> {
    let Json(update) = payload?;
    let booking = state.db.bookings().update_status(&id, update.status).await?;
    Ok(Json(booking))
}

pub async fn delete_booking(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.bookings().soft_delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn booking_balance(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<BalanceSummary>> {
    Ok(Json(state.db.bookings().balance(&id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::*;
    use bloom_core::Money;
    use serde_json::json;

    fn new_booking_body(price: serde_json::Value) -> serde_json::Value {
        json!({
            "client_name": "Marta Lima",
            "service_name": "Manicure",
            "starts_at": "2026-03-02T14:00:00Z",
            "price": price,
        })
    }

    #[tokio::test]
    async fn test_booking_lifecycle() {
        let state = test_state().await;

        let response = send(&state, json_request("POST", "/bookings", None, new_booking_body(json!("45.50")))).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let created = json_body(response).await;
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["price"], "45.50");
        assert_eq!(created["status"], "pending");

        let response = send(
            &state,
            json_request("PATCH", &format!("/bookings/{id}/status"), None, json!({ "status": "confirmed" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "confirmed");

        let response = send(&state, get(&format!("/bookings/{id}"))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(
            &state,
            axum::http::Request::builder()
                .method("DELETE")
                .uri(format!("/bookings/{id}"))
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        // Cancelled bookings stay readable.
        let response = send(&state, get(&format!("/bookings/{id}"))).await;
        let cancelled = json_body(response).await;
        assert_eq!(cancelled["status"], "cancelled");
        assert!(cancelled["deleted_at"].is_string());
    }

    #[tokio::test]
    async fn test_negative_price_rejected() {
        let state = test_state().await;

        let response = send(&state, json_request("POST", "/bookings", None, new_booking_body(json!(-10)))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_booking() {
        let state = test_state().await;

        assert_eq!(send(&state, get("/bookings/missing")).await.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            send(&state, get("/bookings/missing/balance")).await.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            send(
                &state,
                json_request("PATCH", "/bookings/missing/status", None, json!({ "status": "completed" }))
            )
            .await
            .status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_invalid_status_rejected() {
        let state = test_state().await;
        let id = booking_priced(&state, 1000).await;

        let response = send(
            &state,
            json_request("PATCH", &format!("/bookings/{id}/status"), None, json!({ "status": "archived" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_balance() {
        let state = test_state().await;
        let id = booking_priced(&state, 10000).await;
        state
            .db
            .payments()
            .register_payment(&id, Money::from_cents(4000), Money::from_cents(3000), None)
            .await
            .unwrap();

        let response = send(&state, get(&format!("/bookings/{id}/balance"))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let balance = json_body(response).await;
        assert_eq!(balance["paid"]["cash"], "40.00");
        assert_eq!(balance["paid"]["card"], "30.00");
        assert_eq!(balance["remaining"], "30.00");
    }
}

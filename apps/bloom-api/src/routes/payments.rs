//! # Payment Registration
//!
//! `POST /bookings/{id}/payments` records a cash/card split against a
//! booking. Either part may be omitted (treated as zero) but not both.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use bloom_core::Money;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::identity::CurrentUser;
use crate::routes::Registered;
use crate::state::AppState;

/// Request body. Amounts accept JSON numbers or decimal strings.
#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    #[serde(default)]
    pub cash: Money,

    #[serde(default)]
    pub card: Money,
}

/// Registers a split payment.
pub async fn register_payment(
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
    user: CurrentUser,
    payload: Result<Json<PaymentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Registered>)> {
    let Json(request) = payload?;

    state
        .db
        .payments()
        .register_payment(&booking_id, request.cash, request.card, user.id())
        .await?;

    Ok((StatusCode::CREATED, Json(Registered::ok())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_split_payment_created() {
        let state = test_state().await;
        let booking = booking_priced(&state, 10000).await;

        let response = send(
            &state,
            json_request(
                "POST",
                &format!("/bookings/{booking}/payments"),
                Some("user-1"),
                json!({ "cash": 40, "card": "30.00" }),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json_body(response).await, json!({ "success": true }));

        let payments = state.db.payments().list_for_booking(&booking).await.unwrap();
        assert_eq!(payments.len(), 2);

        let balance = state.db.bookings().balance(&booking).await.unwrap();
        assert_eq!(balance.remaining, Money::from_cents(3000));
    }

    #[tokio::test]
    async fn test_payment_without_user_is_accepted() {
        let state = test_state().await;
        let booking = booking_priced(&state, 5000).await;

        let response = send(
            &state,
            json_request("POST", &format!("/bookings/{booking}/payments"), None, json!({ "card": 50 })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_overpayment_rejected() {
        let state = test_state().await;
        let booking = booking_priced(&state, 10000).await;
        let uri = format!("/bookings/{booking}/payments");

        let first = send(&state, json_request("POST", &uri, Some("user-1"), json!({ "cash": 90 }))).await;
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = send(&state, json_request("POST", &uri, Some("user-1"), json!({ "cash": 20 }))).await;
        assert_eq!(second.status(), StatusCode::BAD_REQUEST);

        let body = json_body(second).await;
        assert!(body["error"].as_str().unwrap().contains("10.00"));

        let payments = state.db.payments().list_for_booking(&booking).await.unwrap();
        assert_eq!(payments.len(), 1);
    }

    #[tokio::test]
    async fn test_zero_and_negative_amounts_rejected() {
        let state = test_state().await;
        let booking = booking_priced(&state, 10000).await;
        let uri = format!("/bookings/{booking}/payments");

        let empty = send(&state, json_request("POST", &uri, None, json!({}))).await;
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

        let negative = send(&state, json_request("POST", &uri, None, json!({ "cash": -5 }))).await;
        assert_eq!(negative.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_booking_is_not_found() {
        let state = test_state().await;

        let response = send(
            &state,
            json_request("POST", "/bookings/missing/payments", None, json!({ "cash": 10 })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let state = test_state().await;
        let booking = booking_priced(&state, 10000).await;

        let response = send(
            &state,
            json_request(
                "POST",
                &format!("/bookings/{booking}/payments"),
                None,
                json!({ "cash": "forty" }),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
    }
}

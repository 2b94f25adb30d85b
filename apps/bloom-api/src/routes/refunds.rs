//! # Refund Registration
//!
//! `POST /payments/{id}/refunds` appends a REFUND event against a prior
//! payment. Unlike payments, a refund always needs an acting user.

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

#[derive(Debug, Deserialize)]
pub struct RefundRequest {
    pub amount: Money,

    /// `cash` or `credit_card`
    pub method: String,

    #[serde(default)]
    pub note: Option<String>,
}

/// Registers a refund; responds with the new event id.
pub async fn register_refund(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
    user: CurrentUser,
    payload: Result<Json<RefundRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Registered>)> {
    let Json(request) = payload?;

    let event_id = state
        .db
        .ledger()
        .register_refund(
            &payment_id,
            request.amount,
            &request.method,
            request.note.as_deref(),
            user.id(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(Registered::with_event(event_id))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::*;
    use serde_json::json;

    /// Booking priced 50.00, paid in full by card. Returns the payment id.
    async fn paid_booking(state: &AppState) -> String {
        let booking = booking_priced(state, 5000).await;
        let payments = state
            .db
            .payments()
            .register_payment(&booking, Money::zero(), Money::from_cents(5000), Some("user-1"))
            .await
            .unwrap();
        payments[0].id.clone()
    }

    #[tokio::test]
    async fn test_refund_within_bounds() {
        let state = test_state().await;
        let payment = paid_booking(&state).await;

        let response = send(
            &state,
            json_request(
                "POST",
                &format!("/payments/{payment}/refunds"),
                Some("user-1"),
                json!({ "amount": 20, "method": "cash", "note": "Late start" }),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert!(body["event_id"].is_string());

        let refundable = state.db.ledger().refundable_balance(&payment).await.unwrap();
        assert_eq!(refundable, Money::from_cents(3000));
    }

    #[tokio::test]
    async fn test_refund_exceeding_balance_rejected() {
        let state = test_state().await;
        let payment = paid_booking(&state).await;
        let uri = format!("/payments/{payment}/refunds");

        let first = send(
            &state,
            json_request("POST", &uri, Some("user-1"), json!({ "amount": "20.00", "method": "cash" })),
        )
        .await;
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = send(
            &state,
            json_request("POST", &uri, Some("user-1"), json!({ "amount": 40, "method": "cash" })),
        )
        .await;
        assert_eq!(second.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(second).await["error"].as_str().unwrap().contains("30.00"));
    }

    #[tokio::test]
    async fn test_refund_requires_user() {
        let state = test_state().await;
        let payment = paid_booking(&state).await;

        let response = send(
            &state,
            json_request(
                "POST",
                &format!("/payments/{payment}/refunds"),
                None,
                json!({ "amount": 10, "method": "cash" }),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_method_rejected() {
        let state = test_state().await;
        let payment = paid_booking(&state).await;

        let response = send(
            &state,
            json_request(
                "POST",
                &format!("/payments/{payment}/refunds"),
                Some("user-1"),
                json!({ "amount": 10, "method": "voucher" }),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_payment_is_not_found() {
        let state = test_state().await;

        let response = send(
            &state,
            json_request(
                "POST",
                "/payments/missing/refunds",
                Some("user-1"),
                json!({ "amount": 10, "method": "cash" }),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_amount_is_bad_request() {
        let state = test_state().await;
        let payment = paid_booking(&state).await;

        let response = send(
            &state,
            json_request(
                "POST",
                &format!("/payments/{payment}/refunds"),
                Some("user-1"),
                json!({ "method": "cash" }),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

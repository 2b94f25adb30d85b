//! HTTP route handlers, one module per resource.

pub mod bookings;
pub mod health;
pub mod ledger;
pub mod payments;
pub mod refunds;

use serde::Serialize;

/// Body returned by the registration endpoints.
#[derive(Debug, Serialize)]
pub struct Registered {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

impl Registered {
    pub fn ok() -> Self {
        Registered { success: true, event_id: None }
    }

    pub fn with_event(event_id: String) -> Self {
        Registered {
            success: true,
            event_id: Some(event_id),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::Body;
    use axum::http::{Request, Response};
    use bloom_core::{BookingStatus, Money, NewBooking};
    use bloom_db::{Database, DbConfig};
    use chrono::Utc;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::ApiConfig;
    use crate::state::AppState;

    pub async fn test_state() -> AppState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        AppState::new(db, ApiConfig::default())
    }

    pub async fn booking_priced(state: &AppState, cents: i64) -> String {
        let booking = state
            .db
            .bookings()
            .create(&NewBooking {
                client_name: "Ana Souza".to_string(),
                service_name: "Haircut".to_string(),
                starts_at: Utc::now(),
                price: Money::from_cents(cents),
                status: BookingStatus::Confirmed,
            })
            .await
            .unwrap();
        booking.id
    }

    /// Sends one request through a fresh router.
    pub async fn send(state: &AppState, request: Request<Body>) -> Response<Body> {
        crate::router(state.clone()).oneshot(request).await.unwrap()
    }

    pub fn json_request(method: &str, uri: &str, user: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(user) = user {
            builder = builder.header("x-user-id", user);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    pub async fn json_body(response: Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}

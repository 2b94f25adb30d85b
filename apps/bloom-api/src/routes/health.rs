use axum::extract::State;
use axum::http::StatusCode;
use tracing::warn;

use crate::state::AppState;

/// `GET /health`: 200 `OK` while the database answers, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> (StatusCode, &'static str) {
    if state.db.health_check().await {
        (StatusCode::OK, "OK")
    } else {
        warn!("Health check failed: database unreachable");
        (StatusCode::SERVICE_UNAVAILABLE, "Database unavailable")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::*;

    #[tokio::test]
    async fn test_health_ok() {
        let state = test_state().await;

        let response = send(&state, get("/health")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"OK");
    }

    #[tokio::test]
    async fn test_health_after_close() {
        let state = test_state().await;
        state.db.close().await;

        let response = send(&state, get("/health")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}

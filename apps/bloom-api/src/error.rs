//! HTTP error mapping.
//!
//! Every failure leaves the API as `{"error": "<message>"}` with a status
//! picked from the error kind:
//!
//! ```text
//! Validation          → 400
//! InvariantViolation  → 400   (Unauthorized → 401)
//! NotFound            → 404
//! Persistence         → 500   generic message, details only in the log
//! ```

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bloom_core::{ErrorKind, LedgerError};
use bloom_db::{DbError, RegistrationError};
use serde::Serialize;
use tracing::{debug, error};

/// Message returned for persistence failures.
const INTERNAL_MESSAGE: &str = "Internal server error";

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NotFound(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Ledger(e) => e.kind(),
            ApiError::Database(e) => e.kind(),
            ApiError::InvalidRequest(_) => ErrorKind::Validation,
            ApiError::NotFound(_) => ErrorKind::NotFound,
        }
    }

    pub fn status(&self) -> StatusCode {
        if matches!(self, ApiError::Ledger(LedgerError::Unauthorized)) {
            return StatusCode::UNAUTHORIZED;
        }

        match self.kind() {
            ErrorKind::Validation | ErrorKind::InvariantViolation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::Rejected(e) => ApiError::Ledger(e),
            RegistrationError::Persistence(e) => ApiError::Database(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "Request failed");
            INTERNAL_MESSAGE.to_string()
        } else {
            debug!(%status, error = %self, "Request rejected");
            self.to_string()
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use bloom_core::Money;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(LedgerError::invalid_amount("zero")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(LedgerError::ExceedsBookingPrice {
                overage: Money::from_cents(1000)
            })
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(LedgerError::Unauthorized).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(LedgerError::PaymentNotFound("p".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(DbError::not_found("Booking", "b")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(DbError::QueryFailed("disk I/O error".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_persistence_message_is_generic() {
        let response = ApiError::from(DbError::QueryFailed("disk I/O error".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], INTERNAL_MESSAGE);
    }
}

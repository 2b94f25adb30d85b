//! Acting-user extraction.
//!
//! Authentication happens upstream. By the time a request reaches this
//! server the auth proxy has put the resolved user id in a header (name
//! configurable, `x-user-id` by default). This extractor only reads it.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::state::AppState;

/// The resolved user id of the caller, if any.
///
/// Never rejects: endpoints decide whether an anonymous caller is
/// acceptable (payments) or not (refunds).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub Option<String>);

impl CurrentUser {
    pub fn id(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(state.config.identity_header.as_str())
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        Ok(CurrentUser(user))
    }
}

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use userauth_core::Principal;

use crate::error::AppError;
use crate::state::AppState;

/// The caller, authenticated from the `Authorization: Bearer` header.
pub struct AuthUser(pub Principal);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let principal = state.pipeline.authenticate(auth_header)?;
        Ok(AuthUser(principal))
    }
}

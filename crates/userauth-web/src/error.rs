use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use userauth_core::AuthError;

#[derive(Debug)]
pub enum AppError {
    Auth(AuthError),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Auth(err) => match err {
                AuthError::PolicyViolation(_) | AuthError::InvalidInput(_) => {
                    StatusCode::BAD_REQUEST
                }
                AuthError::Unauthenticated | AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
                AuthError::Forbidden => StatusCode::FORBIDDEN,
                AuthError::NotFound(_) => StatusCode::NOT_FOUND,
                AuthError::Conflict(_) => StatusCode::CONFLICT,
                AuthError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
                AuthError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Auth(AuthError::Internal) => "Internal server error".to_string(),
            AppError::Auth(err) => err.to_string(),
            AppError::Internal(msg) => {
                // Log the real error server-side, return generic message to client
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
        };

        let body = ErrorBody {
            success: false,
            error: message,
        };
        let mut response = (status, axum::Json(body)).into_response();

        if let AppError::Auth(AuthError::RateLimited { retry_after }) = &self {
            // Whole seconds, rounded up, at least 1.
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            if let Ok(value) = HeaderValue::from_str(&secs.max(1).to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Auth(e)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        tracing::error!("Internal error: {:#}", e);
        AppError::Internal("Internal server error".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use userauth_core::PolicyError;

    fn status_of(err: AuthError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn status_mapping() {
        assert_eq!(status_of(PolicyError::TooShort.into()), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(AuthError::InvalidInput("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(AuthError::Unauthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AuthError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AuthError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(status_of(AuthError::NotFound("user")), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AuthError::Conflict("x".into())), StatusCode::CONFLICT);
        assert_eq!(status_of(AuthError::Internal), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn rate_limited_sets_retry_after() {
        let response = AppError::from(AuthError::RateLimited {
            retry_after: Duration::from_millis(41_200),
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }

    #[test]
    fn retry_after_is_at_least_one_second() {
        let response = AppError::from(AuthError::RateLimited {
            retry_after: Duration::ZERO,
        })
        .into_response();
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");
    }

    #[test]
    fn internal_from_anyhow() {
        let err = AppError::from(anyhow::anyhow!("disk on fire"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

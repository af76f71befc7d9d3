//! Error types for `userauth-core`.
//!
//! Pipeline operations return [`AuthResult<T>`], an alias for
//! `Result<T, AuthError>`. Every variant is an outcome the caller may act
//! on; none of them carries internal detail. Component errors
//! ([`TokenError`], [`StoreError`], [`HashError`]) are folded into it here,
//! and anything that is not the caller's fault is logged and reported as
//! [`AuthError::Internal`].

use std::time::Duration;

use crate::password::{HashError, PolicyError};
use crate::store::StoreError;
use crate::token::TokenError;

/// Caller-visible outcome of a failed pipeline step.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The password does not meet the strength policy.
    #[error("{0}")]
    PolicyViolation(#[from] PolicyError),

    /// A username, email or update body broke an input rule.
    #[error("{0}")]
    InvalidInput(String),

    /// Missing, malformed, forged or expired bearer token.
    #[error("invalid or expired token")]
    Unauthenticated,

    /// Login failed. Unknown email and wrong password look the same.
    #[error("invalid email or password")]
    Unauthorized,

    /// Authenticated, but not the owner of the resource.
    #[error("you can only modify your own profile")]
    Forbidden,

    /// A uniqueness constraint would be violated.
    #[error("{0}")]
    Conflict(String),

    /// The client exhausted its request window.
    #[error("rate limit exceeded, please try again later")]
    RateLimited { retry_after: Duration },

    /// The requested resource does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Storage or crypto backend failure. Details are only logged.
    #[error("internal server error")]
    Internal,
}

/// Convenience alias used throughout `userauth-core`.
pub type AuthResult<T> = Result<T, AuthError>;

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => AuthError::Unauthenticated,
            TokenError::Signing(msg) => {
                tracing::error!("token signing failed: {msg}");
                AuthError::Internal
            }
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(field) => AuthError::Conflict(format!("{field} already taken")),
            StoreError::Unavailable(msg) => {
                tracing::error!("account store failure: {msg}");
                AuthError::Internal
            }
        }
    }
}

impl From<HashError> for AuthError {
    fn from(err: HashError) -> Self {
        match err {
            HashError::Policy(policy) => AuthError::PolicyViolation(policy),
            HashError::Backend(msg) => {
                tracing::error!("password hashing failed: {msg}");
                AuthError::Internal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::UniqueField;

    #[test]
    fn policy_violation_displays_rule() {
        let err = AuthError::from(PolicyError::MissingDigit);
        assert_eq!(err.to_string(), "password must contain a number");
    }

    #[test]
    fn invalid_token_becomes_unauthenticated() {
        let err: AuthError = TokenError::Invalid.into();
        assert!(matches!(err, AuthError::Unauthenticated));
        assert_eq!(err.to_string(), "invalid or expired token");
    }

    #[test]
    fn signing_failure_hides_detail() {
        let err: AuthError = TokenError::Signing("key material".to_string()).into();
        assert!(matches!(err, AuthError::Internal));
        assert!(!err.to_string().contains("key material"));
    }

    #[test]
    fn duplicate_becomes_conflict() {
        let err: AuthError = StoreError::Duplicate(UniqueField::Email).into();
        assert!(matches!(err, AuthError::Conflict(_)));
        assert_eq!(err.to_string(), "email already taken");
    }

    #[test]
    fn store_outage_hides_detail() {
        let err: AuthError = StoreError::Unavailable("connection refused on 10.0.0.5".into()).into();
        assert!(matches!(err, AuthError::Internal));
        assert_eq!(err.to_string(), "internal server error");
    }

    #[test]
    fn hash_policy_error_keeps_rule() {
        let err: AuthError = HashError::Policy(PolicyError::TooShort).into();
        assert!(matches!(err, AuthError::PolicyViolation(PolicyError::TooShort)));
    }

    #[test]
    fn hash_backend_error_is_internal() {
        let err: AuthError = HashError::Backend("oom".into()).into();
        assert!(matches!(err, AuthError::Internal));
    }

    #[test]
    fn not_found_names_resource() {
        assert_eq!(AuthError::NotFound("user").to_string(), "user not found");
    }

    #[test]
    fn login_failure_message_is_uniform() {
        assert_eq!(AuthError::Unauthorized.to_string(), "invalid email or password");
    }

    #[test]
    fn auth_result_err() {
        let result: AuthResult<i32> = Err(AuthError::Forbidden);
        assert!(result.is_err());
    }
}

//! Stateless HS256 access tokens.
//!
//! A token is a compact JWT carrying `sub` (the account id as a string),
//! `iat` and `exp` in Unix seconds. Nothing is stored server side; a token
//! stops working once `exp` is reached.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::clock::{unix_seconds, Clock};

/// Lifetime of a token issued without an explicit TTL.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
}

/// A freshly signed token and its expiry in Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Bad signature, malformed payload, wrong algorithm or expired.
    /// Callers never learn which.
    #[error("invalid token")]
    Invalid,

    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Issues and verifies access tokens with a shared HMAC secret.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(secret: &str, default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against `clock` in `verify`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            default_ttl,
            clock,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Signs a token for `subject` valid for the default TTL.
    pub fn issue(&self, subject: &str) -> Result<IssuedToken, TokenError> {
        self.issue_with_ttl(subject, self.default_ttl)
    }

    /// Signs a token for `subject` valid for `ttl`.
    ///
    /// A zero `ttl` produces a token that is already expired.
    pub fn issue_with_ttl(&self, subject: &str, ttl: Duration) -> Result<IssuedToken, TokenError> {
        let now = unix_seconds(self.clock.as_ref());
        let claims = Claims {
            sub: subject.to_string(),
            iat: now,
            exp: now.saturating_add(ttl.as_secs()),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
        })
    }

    /// Checks signature and expiry and returns the claims.
    ///
    /// Expiry is exclusive: a token is rejected from the second `exp` is
    /// reached, with no leeway.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!(reason = rejection_reason(e.kind()), "rejected access token");
                return Err(TokenError::Invalid);
            }
        };

        if unix_seconds(self.clock.as_ref()) >= claims.exp {
            tracing::debug!(reason = "expired", "rejected access token");
            return Err(TokenError::Invalid);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

fn rejection_reason(kind: &ErrorKind) -> &'static str {
    match kind {
        ErrorKind::InvalidSignature => "bad signature",
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => "unexpected algorithm",
        ErrorKind::MissingRequiredClaim(_) => "missing claim",
        _ => "malformed",
    }
}

//! Password policy and Argon2id credential hashing.
//!
//! [`validate`] enforces the strength policy. [`CredentialHasher`] turns an
//! accepted password into a salted PHC string and checks candidates against
//! stored credentials.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHasher as _, PasswordVerifier as _, Version};

use crate::config::PasswordConfig;

/// Minimum password length, counted in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// The first policy rule a password failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("password must be at least 8 characters")]
    TooShort,

    #[error("password must contain an uppercase letter")]
    MissingUppercase,

    #[error("password must contain a lowercase letter")]
    MissingLowercase,

    #[error("password must contain a number")]
    MissingDigit,
}

/// Errors from [`CredentialHasher::hash`].
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("password hashing failed: {0}")]
    Backend(String),
}

/// Checks `password` against the strength policy.
///
/// Requires at least [`MIN_PASSWORD_LENGTH`] characters and one ASCII
/// uppercase letter, lowercase letter and digit. There is no upper bound.
pub fn validate(password: &str) -> Result<(), PolicyError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PolicyError::TooShort);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(PolicyError::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(PolicyError::MissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PolicyError::MissingDigit);
    }
    Ok(())
}

/// A stored password hash in PHC string format.
///
/// There is no way back to the plaintext. `Debug` does not print the hash.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a hash previously produced by [`CredentialHasher::hash`].
    pub fn from_stored(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Hashes and verifies passwords with Argon2id.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    params: Params,
}

impl CredentialHasher {
    /// Builds a hasher with the cost parameters from `config`.
    pub fn new(config: &PasswordConfig) -> Result<Self, HashError> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|e| HashError::Backend(format!("invalid argon2 parameters: {e}")))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone()),
            params,
        })
    }

    /// Validates `password` and returns a freshly salted credential.
    pub fn hash(&self, password: &str) -> Result<Credential, HashError> {
        validate(password)?;
        self.hash_unchecked(password)
    }

    /// Hashes without the policy check. Only used for the login decoy.
    pub(crate) fn hash_unchecked(&self, password: &str) -> Result<Credential, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| HashError::Backend(e.to_string()))?;
        Ok(Credential(hash.to_string()))
    }

    /// Returns `true` only if `password` matches `credential`.
    ///
    /// A malformed credential is treated like a wrong password. The cost
    /// parameters embedded in the credential are used, not the configured ones.
    pub fn verify(&self, password: &str, credential: &Credential) -> bool {
        let Ok(parsed) = PasswordHash::new(credential.as_str()) else {
            return false;
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("params", &self.params)
            .finish()
    }
}

#[cfg(test)]
pub(crate) fn test_hasher() -> CredentialHasher {
    CredentialHasher::new(&PasswordConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_password_meeting_policy() {
        assert!(validate("TestPass123").is_ok());
        assert!(validate("C0mpl3xP@ssw0rd!").is_ok());
    }

    #[test]
    fn rejects_short_password() {
        assert_eq!(validate("weak"), Err(PolicyError::TooShort));
        assert_eq!(validate("Short1"), Err(PolicyError::TooShort));
    }

    #[test]
    fn rejects_missing_uppercase() {
        assert_eq!(validate("lowercase123"), Err(PolicyError::MissingUppercase));
    }

    #[test]
    fn rejects_missing_lowercase() {
        assert_eq!(validate("UPPERCASE123"), Err(PolicyError::MissingLowercase));
    }

    #[test]
    fn rejects_missing_digit() {
        assert_eq!(validate("NoNumberPass"), Err(PolicyError::MissingDigit));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // 7 characters, 11 bytes
        assert_eq!(validate("Ab1éééé"), Err(PolicyError::TooShort));
    }

    #[test]
    fn hash_rejects_weak_password() {
        let hasher = test_hasher();
        assert!(matches!(
            hasher.hash("weak"),
            Err(HashError::Policy(PolicyError::TooShort))
        ));
    }

    #[test]
    fn hash_then_verify() {
        let hasher = test_hasher();
        let credential = hasher.hash("TestPass123").unwrap();

        assert_ne!(credential.as_str(), "TestPass123");
        assert!(credential.as_str().starts_with("$argon2id$"));
        assert!(hasher.verify("TestPass123", &credential));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let hasher = test_hasher();
        let first = hasher.hash("TestPass123").unwrap();
        let second = hasher.hash("TestPass123").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("TestPass123", &first));
        assert!(hasher.verify("TestPass123", &second));
    }

    #[test]
    fn wrong_password_does_not_verify() {
        let hasher = test_hasher();
        let credential = hasher.hash("TestPassword123").unwrap();

        assert!(!hasher.verify("WrongPassword123", &credential));
        assert!(!hasher.verify("", &credential));
    }

    #[test]
    fn malformed_credential_does_not_verify() {
        let hasher = test_hasher();
        assert!(!hasher.verify("TestPass123", &Credential::from_stored("not-a-hash")));
        assert!(!hasher.verify("TestPass123", &Credential::from_stored("")));
    }

    #[test]
    fn verify_uses_parameters_from_credential() {
        let cheap = test_hasher();
        let credential = cheap.hash("TestPass123").unwrap();

        let other = CredentialHasher::new(&PasswordConfig {
            memory_kib: 2048,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        assert!(other.verify("TestPass123", &credential));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let result = CredentialHasher::new(&PasswordConfig {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(matches!(result, Err(HashError::Backend(_))));
    }

    #[test]
    fn debug_output_hides_hash() {
        let credential = Credential::from_stored("$argon2id$secret");
        assert_eq!(format!("{credential:?}"), "Credential(<redacted>)");
    }
}

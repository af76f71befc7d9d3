//! The authentication pipeline.
//!
//! [`AuthPipeline`] owns the limiter, token service, hasher and account
//! store and exposes one method per step of request handling:
//!
//! 1. [`AuthPipeline::admit`]: rate-limit admission for every request.
//! 2. [`AuthPipeline::authenticate`]: bearer token to [`Principal`] on
//!    protected routes.
//! 3. Ownership checks inside [`AuthPipeline::update_account`] and
//!    [`AuthPipeline::delete_account`].
//! 4. The account flows: registration, login and profile CRUD.
//!
//! Password hashing and verification run on the blocking thread pool.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::config::{AuthConfig, ConfigError};
use crate::error::{AuthError, AuthResult};
use crate::password::{self, Credential, CredentialHasher};
use crate::rate_limit::{Admission, RateLimiter};
use crate::store::{Account, AccountChanges, AccountStore, NewAccount, StoreError};
use crate::token::TokenService;
use crate::validate;

const DUPLICATE_ACCOUNT: &str = "user with this email or username already exists";

/// Verified against when a login names an unknown email.
const DECOY_PASSWORD: &str = "decoy-password-for-unknown-accounts";

/// Body of a registration request.
#[derive(Clone, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Body of a login request.
#[derive(Clone, Deserialize)]
pub struct Login {
    pub email: String,
    pub password: String,
}

/// Body of a profile update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountUpdate {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Public view of an account. Never includes the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountView {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            email: account.email.clone(),
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// Token plus profile, returned by registration and login.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub expires_at: u64,
    pub user: AccountView,
}

/// Identity established from a valid bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub account_id: u64,
    pub issued_at: u64,
    pub expires_at: u64,
}

/// Extracts the token from an `Authorization: Bearer <token>` value.
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

pub struct AuthPipeline {
    store: Arc<dyn AccountStore>,
    hasher: CredentialHasher,
    tokens: TokenService,
    limiter: RateLimiter,
    clock: Arc<dyn Clock>,
    decoy: Credential,
}

impl AuthPipeline {
    /// Builds a pipeline from `config`, with a fresh rate limiter.
    pub fn new(
        config: &AuthConfig,
        store: Arc<dyn AccountStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let hasher = CredentialHasher::new(&config.password)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let decoy = hasher
            .hash_unchecked(DECOY_PASSWORD)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        Ok(Self {
            tokens: TokenService::new(&config.jwt_secret, config.token_ttl(), clock.clone()),
            limiter: RateLimiter::new(config.rate_limit.routes.clone(), clock.clone()),
            store,
            hasher,
            clock,
            decoy,
        })
    }

    /// Replaces the rate limiter.
    pub fn with_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Admission step. Fails with [`AuthError::RateLimited`] when the
    /// client's window for `route` is full.
    pub fn admit(&self, client_id: &str, route: &str) -> AuthResult<()> {
        match self.limiter.admit(client_id, route) {
            Admission::Denied { retry_after } => Err(AuthError::RateLimited { retry_after }),
            Admission::Allowed | Admission::Exempt => Ok(()),
        }
    }

    /// Authentication step. `authorization` is the raw header value.
    pub fn authenticate(&self, authorization: Option<&str>) -> AuthResult<Principal> {
        let token = authorization
            .and_then(bearer_token)
            .ok_or(AuthError::Unauthenticated)?;
        let claims = self.tokens.verify(token)?;
        let account_id = claims.sub.parse::<u64>().map_err(|_| {
            tracing::debug!(reason = "subject is not an account id", "rejected access token");
            AuthError::Unauthenticated
        })?;

        Ok(Principal {
            account_id,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }

    /// Creates an account and signs the caller in.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidInput`] for a malformed username or email.
    /// - [`AuthError::Conflict`] if the email (any case) or username is taken.
    /// - [`AuthError::PolicyViolation`] for a weak password.
    pub async fn register(&self, registration: Registration) -> AuthResult<AuthSession> {
        let username = validate::username(&registration.username).map_err(invalid_input)?;
        let email = validate::email(&registration.email).map_err(invalid_input)?;

        if self.store.find_by_email(&email).await?.is_some()
            || self.store.find_by_username(&username).await?.is_some()
        {
            return Err(AuthError::Conflict(DUPLICATE_ACCOUNT.to_string()));
        }

        let password_hash = self.hash_off_thread(registration.password).await?;
        let new_account = NewAccount {
            username,
            email,
            password_hash,
        };
        let account = self
            .store
            .insert(new_account, self.timestamp())
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => AuthError::Conflict(DUPLICATE_ACCOUNT.to_string()),
                other => other.into(),
            })?;

        tracing::info!(account_id = account.id, "registered account");
        self.session_for(&account)
    }

    /// Checks credentials and issues a token.
    ///
    /// Unknown email and wrong password both yield
    /// [`AuthError::Unauthorized`], and both cost one password verification.
    pub async fn login(&self, login: Login) -> AuthResult<AuthSession> {
        let email = validate::normalize_email(&login.email);
        let account = self.store.find_by_email(&email).await?;

        let credential = match &account {
            Some(account) => account.password_hash.clone(),
            None => self.decoy.clone(),
        };
        let matched = self.verify_off_thread(login.password, credential).await?;

        match account {
            Some(account) if matched => {
                tracing::info!(account_id = account.id, "login succeeded");
                self.session_for(&account)
            }
            _ => {
                tracing::warn!("failed login attempt");
                Err(AuthError::Unauthorized)
            }
        }
    }

    /// Profile of the authenticated caller.
    ///
    /// A token for a deleted account is treated as unauthenticated.
    pub async fn current_account(&self, principal: &Principal) -> AuthResult<AccountView> {
        self.store
            .find_by_id(principal.account_id)
            .await?
            .map(|account| AccountView::from(&account))
            .ok_or(AuthError::Unauthenticated)
    }

    /// Every account except the caller's, ordered by id.
    pub async fn list_accounts(&self, principal: &Principal) -> AuthResult<Vec<AccountView>> {
        Ok(self
            .store
            .list()
            .await?
            .iter()
            .filter(|account| account.id != principal.account_id)
            .map(AccountView::from)
            .collect())
    }

    pub async fn get_account(&self, id: u64) -> AuthResult<AccountView> {
        self.store
            .find_by_id(id)
            .await?
            .map(|account| AccountView::from(&account))
            .ok_or(AuthError::NotFound("user"))
    }

    /// Updates the caller's own profile.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NotFound`] if account `id` does not exist.
    /// - [`AuthError::Forbidden`] if it belongs to someone else.
    /// - [`AuthError::InvalidInput`] for an empty or malformed body.
    /// - [`AuthError::Conflict`] if the new username or email is taken.
    pub async fn update_account(
        &self,
        principal: &Principal,
        id: u64,
        update: AccountUpdate,
    ) -> AuthResult<AccountView> {
        let target = self.owned_account(principal, id).await?;

        let changes = AccountChanges {
            username: update
                .username
                .as_deref()
                .map(validate::username)
                .transpose()
                .map_err(invalid_input)?,
            email: update
                .email
                .as_deref()
                .map(validate::email)
                .transpose()
                .map_err(invalid_input)?,
        };
        if changes.username.is_none() && changes.email.is_none() {
            return Err(AuthError::InvalidInput("no fields to update".to_string()));
        }

        let updated = self
            .store
            .update(target.id, changes, self.timestamp())
            .await?
            .ok_or(AuthError::NotFound("user"))?;

        tracing::info!(account_id = updated.id, "updated account");
        Ok(AccountView::from(&updated))
    }

    /// Deletes the caller's own account.
    pub async fn delete_account(&self, principal: &Principal, id: u64) -> AuthResult<()> {
        let target = self.owned_account(principal, id).await?;
        if !self.store.delete(target.id).await? {
            return Err(AuthError::NotFound("user"));
        }
        tracing::info!(account_id = target.id, "deleted account");
        Ok(())
    }

    async fn owned_account(&self, principal: &Principal, id: u64) -> AuthResult<Account> {
        let account = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(AuthError::NotFound("user"))?;
        if account.id != principal.account_id {
            tracing::warn!(
                caller = principal.account_id,
                target = account.id,
                "refused to modify another account"
            );
            return Err(AuthError::Forbidden);
        }
        Ok(account)
    }

    fn session_for(&self, account: &Account) -> AuthResult<AuthSession> {
        let issued = self.tokens.issue(&account.id.to_string())?;
        Ok(AuthSession {
            token: issued.token,
            expires_at: issued.expires_at,
            user: AccountView::from(account),
        })
    }

    async fn hash_off_thread(&self, password: String) -> AuthResult<Credential> {
        password::validate(&password)?;
        let hasher = self.hasher.clone();
        let credential = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| {
                tracing::error!("hashing task failed: {e}");
                AuthError::Internal
            })??;
        Ok(credential)
    }

    async fn verify_off_thread(&self, password: String, credential: Credential) -> AuthResult<bool> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &credential))
            .await
            .map_err(|e| {
                tracing::error!("verification task failed: {e}");
                AuthError::Internal
            })
    }

    fn timestamp(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from(self.clock.system_time())
    }
}

impl std::fmt::Debug for AuthPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthPipeline")
            .field("hasher", &self.hasher)
            .field("tokens", &self.tokens)
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}

fn invalid_input(rule: &'static str) -> AuthError {
    AuthError::InvalidInput(rule.to_string())
}

//! Authentication core: credential hashing, access tokens, rate limiting
//! and the request pipeline that ties them together.
//!
//! `userauth-core` knows nothing about HTTP. The web crate maps each
//! [`AuthError`] variant to a status code and calls into
//! [`AuthPipeline`] from its handlers and middleware.
//!
//! # Modules
//!
//! - [`password`]: strength policy and Argon2id [`CredentialHasher`].
//! - [`token`]: signed, expiring access tokens ([`TokenService`]).
//! - [`rate_limit`]: per-client sliding-window [`RateLimiter`].
//! - [`pipeline`]: admission, authentication, authorization and the account flows.
//! - [`store`]: the [`AccountStore`] trait and an in-memory implementation.
//! - [`clock`]: injectable time source.
//! - [`config`]: TOML-backed [`AuthConfig`].
//! - [`error`]: caller-visible [`AuthError`] and [`AuthResult`].

pub mod clock;
pub mod config;
pub mod error;
pub mod password;
pub mod pipeline;
pub mod rate_limit;
pub mod store;
pub mod token;
pub mod validate;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AuthConfig, ConfigError, PasswordConfig, RateLimitConfig};
pub use error::{AuthError, AuthResult};
pub use password::{Credential, CredentialHasher, HashError, PolicyError};
pub use pipeline::{
    AccountUpdate, AccountView, AuthPipeline, AuthSession, Login, Principal, Registration,
};
pub use rate_limit::{Admission, RateLimiter, RouteLimit};
pub use store::{Account, AccountStore, MemoryAccountStore, StoreError};
pub use token::{Claims, IssuedToken, TokenError, TokenService};

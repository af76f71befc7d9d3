//! Authentication settings loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file) yields a
//! working configuration apart from the signing secret.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::rate_limit::RouteLimit;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("config parse error: {0}")]
    Parse(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Top-level authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,
    #[serde(default)]
    pub password: PasswordConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_hours: default_token_ttl_hours(),
            password: PasswordConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordConfig {
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_routes")]
    pub routes: Vec<RouteLimit>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            routes: default_routes(),
        }
    }
}

fn default_token_ttl_hours() -> u64 {
    24
}

fn default_memory_kib() -> u32 {
    19 * 1024
}

fn default_iterations() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}

fn default_routes() -> Vec<RouteLimit> {
    vec![
        RouteLimit::new("/api/auth/register", 3, 60),
        RouteLimit::new("/api/auth/login", 5, 60),
        RouteLimit::new("/api/users", 100, 60),
    ]
}

impl AuthConfig {
    /// Loads configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NotFound`] if the file does not exist.
    /// - [`ConfigError::PermissionDenied`] if the file is not readable.
    /// - [`ConfigError::Parse`] if the TOML is malformed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => {
                ConfigError::PermissionDenied(path.to_path_buf())
            }
            _ => ConfigError::Io(e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_hours.saturating_mul(3600))
    }

    /// Checks the invariants the services rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::Invalid("jwt_secret must not be empty".into()));
        }
        if self.token_ttl_hours == 0 {
            return Err(ConfigError::Invalid("token_ttl_hours must be positive".into()));
        }

        let mut seen = HashSet::new();
        for route in &self.rate_limit.routes {
            if !route.prefix.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "rate limit prefix must start with '/': {:?}",
                    route.prefix
                )));
            }
            if route.window_secs == 0 {
                return Err(ConfigError::Invalid(format!(
                    "rate limit window for {} must be positive",
                    route.prefix
                )));
            }
            if !seen.insert(route.prefix.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate rate limit prefix: {}",
                    route.prefix
                )));
            }
        }
        Ok(())
    }
}

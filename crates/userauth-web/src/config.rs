use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use userauth_core::AuthConfig;

const WEAK_SECRETS: &[&str] = &[
    "change-me-to-a-random-secret",
    "secret",
    "password",
    "jwt-secret",
];

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Allowed cross-origin caller. Same-origin only when unset.
    #[serde(default)]
    pub cors_origin: Option<String>,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            cors_origin: None,
            auth: AuthConfig::default(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

impl ServerConfig {
    /// Loads from the file named by `USERAUTH_CONFIG` (if any), then
    /// applies `USERAUTH_*` environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("USERAUTH_CONFIG").map(PathBuf::from).ok();
        Self::from_sources(path.as_deref(), |key| std::env::var(key).ok())
    }

    fn from_sources(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let mut config = if let Some(path) = path {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str(&contents)?
        } else {
            ServerConfig::default()
        };

        if let Some(secret) = env("USERAUTH_JWT_SECRET") {
            config.auth.jwt_secret = secret;
        }
        if let Some(addr) = env("USERAUTH_BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .with_context(|| format!("invalid USERAUTH_BIND_ADDR: {addr}"))?;
        }
        if let Some(hours) = env("USERAUTH_TOKEN_TTL_HOURS") {
            config.auth.token_ttl_hours = hours
                .parse()
                .with_context(|| format!("invalid USERAUTH_TOKEN_TTL_HOURS: {hours}"))?;
        }
        if let Some(origin) = env("USERAUTH_CORS_ORIGIN") {
            config.cors_origin = Some(origin);
        }

        if config.auth.jwt_secret.is_empty() {
            config.auth.jwt_secret = uuid::Uuid::new_v4().to_string();
            tracing::warn!(
                "No JWT secret configured. Generated random secret (tokens will not survive a restart)."
            );
        }
        if WEAK_SECRETS.contains(&config.auth.jwt_secret.as_str()) {
            anyhow::bail!(
                "JWT secret matches a known weak/placeholder value. \
                 Set a strong random secret via USERAUTH_JWT_SECRET."
            );
        }
        if config.auth.jwt_secret.len() < 32 {
            tracing::warn!(
                "JWT secret is shorter than 32 characters. \
                 Consider using a stronger secret via USERAUTH_JWT_SECRET."
            );
        }

        config.auth.validate()?;
        Ok(config)
    }
}

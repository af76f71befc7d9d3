//! Username and email rules applied at the pipeline entry points.

use once_cell::sync::Lazy;
use regex::Regex;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]{3,50}$").expect("valid username regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

pub const USERNAME_RULE: &str =
    "username must be 3-50 characters and contain only letters, numbers, and underscores";

pub const EMAIL_RULE: &str = "invalid email format";

/// Trims and lower-cases an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Returns the trimmed username if it satisfies the username rule.
pub fn username(raw: &str) -> Result<String, &'static str> {
    let trimmed = raw.trim();
    if USERNAME_RE.is_match(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(USERNAME_RULE)
    }
}

/// Returns the normalised email if it is well formed.
pub fn email(raw: &str) -> Result<String, &'static str> {
    let normalized = normalize_email(raw);
    if EMAIL_RE.is_match(&normalized) {
        Ok(normalized)
    } else {
        Err(EMAIL_RULE)
    }
}

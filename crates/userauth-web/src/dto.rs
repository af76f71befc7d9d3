use chrono::{DateTime, Utc};
use serde::Serialize;
use userauth_core::AccountView;

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<AccountView>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

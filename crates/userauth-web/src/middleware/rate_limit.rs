//! Per-client admission in front of every route.
//!
//! Clients are keyed by peer IP. Limits come from
//! `auth.rate_limit.routes` in the server config; paths matching no
//! configured prefix pass straight through.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::AppError;
use crate::state::AppState;

pub async fn admission(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    state
        .pipeline
        .admit(&peer.ip().to_string(), req.uri().path())?;
    Ok(next.run(req).await)
}

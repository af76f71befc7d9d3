mod auth_handlers;
mod users;

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::limit::RequestBodyLimitLayer;

use crate::dto::HealthResponse;
use crate::middleware::rate_limit::admission;
use crate::state::AppState;

const MAX_BODY_BYTES: usize = 64 * 1024;

pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth_handlers::register))
        .route("/auth/login", post(auth_handlers::login))
}

pub fn users_router() -> Router<AppState> {
    Router::new()
        .route("/users", get(users::list_users))
        .route("/users/me", get(users::current_user))
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
}

/// Full application router. Every request passes admission, including
/// ones that match no route.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", auth_router().merge(users_router()))
        .layer(from_fn_with_state(state.clone(), admission))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        time: chrono::Utc::now(),
    })
}

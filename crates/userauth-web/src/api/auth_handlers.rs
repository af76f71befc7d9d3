use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use userauth_core::{AuthSession, Login, Registration};

use crate::error::AppError;
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<Registration>,
) -> Result<(StatusCode, Json<AuthSession>), AppError> {
    let session = state.pipeline.register(body).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<Login>,
) -> Result<Json<AuthSession>, AppError> {
    Ok(Json(state.pipeline.login(body).await?))
}

use axum::extract::{Path, State};
use axum::Json;
use userauth_core::{AccountUpdate, AccountView};

use crate::auth::middleware::AuthUser;
use crate::dto::{MessageResponse, UsersResponse};
use crate::error::AppError;
use crate::state::AppState;

pub async fn list_users(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UsersResponse>, AppError> {
    let users = state.pipeline.list_accounts(&principal).await?;
    Ok(Json(UsersResponse {
        count: users.len(),
        users,
    }))
}

pub async fn current_user(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AccountView>, AppError> {
    Ok(Json(state.pipeline.current_account(&principal).await?))
}

pub async fn get_user(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<AccountView>, AppError> {
    Ok(Json(state.pipeline.get_account(id).await?))
}

pub async fn update_user(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<AccountUpdate>,
) -> Result<Json<AccountView>, AppError> {
    Ok(Json(state.pipeline.update_account(&principal, id, body).await?))
}

pub async fn delete_user(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<MessageResponse>, AppError> {
    state.pipeline.delete_account(&principal, id).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "User deleted successfully".to_string(),
    }))
}

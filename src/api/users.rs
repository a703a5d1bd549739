//! Users API endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{error, info};

use crate::db::{CreateUserRequest, StoreError, User, UsersOverview};
use crate::AppState;

use super::error::ApiError;
use super::extract::ApiJson;
use super::validation::{require_id, validate_create_user};

/// Number of users returned by the overview
pub const RECENT_USERS_LIMIT: i64 = 10;

/// Database failures on the overview are reported in the body with HTTP 200.
fn soft_failure(err: StoreError) -> ApiError {
    error!(error = %err, "Failed to load users overview");
    ApiError::database(err.to_string()).soft()
}

/// Total user count plus the most recently created users
///
/// GET /api/users
pub async fn users_overview(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UsersOverview>, ApiError> {
    let total_users = state.store.count_users().await.map_err(soft_failure)?;
    let recent_users = state
        .store
        .recent_users(RECENT_USERS_LIMIT)
        .await
        .map_err(soft_failure)?;

    Ok(Json(UsersOverview {
        success: true,
        total_users: total_users.max(0),
        recent_users,
    }))
}

/// GET /api/users/:id
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    require_id(&id, "user_id")?;

    let user = state
        .store
        .get_user(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(user))
}

/// POST /api/users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    validate_create_user(&req)?;

    if state.store.get_user_by_email(&req.email).await?.is_some() {
        return Err(ApiError::conflict("A user with this email already exists"));
    }

    let user = state.store.create_user(&req).await?;
    info!(user_id = %user.id, role = %user.role, "User created");

    Ok((StatusCode::CREATED, Json(user)))
}

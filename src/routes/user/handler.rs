use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};

use super::model::SearchUserRequest;
use crate::{
    AppState,
    database::{NewUser, User, UserPatch},
    error::{AppError, RepositoryError},
};

#[axum::debug_handler]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    let users = state.users.list().await?;
    Ok(Json(users))
}

/// 按邮箱查找，不存在时返回 `null`
#[axum::debug_handler]
pub async fn search_user(
    State(state): State<AppState>,
    Json(req): Json<SearchUserRequest>,
) -> Result<Json<Option<User>>, AppError> {
    let user = state.users.get_by_email(&req.email).await?;
    Ok(Json(user))
}

#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    match state.users.get_by_id(&id).await? {
        Some(user) => Ok(Json(user)),
        None => Err(RepositoryError::NotFound { id }.into()),
    }
}

#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    Json(new_user): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), AppError> {
    // 邮箱是唯一键，不能为空
    if new_user.email.trim().is_empty() {
        return Err(AppError::BadRequest("Email is required".to_string()));
    }

    let user = state.users.create(new_user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<User>, AppError> {
    if patch.email.as_deref().is_some_and(|e| e.trim().is_empty()) {
        return Err(AppError::BadRequest("Email cannot be empty".to_string()));
    }

    let user = state.users.update(&id, patch).await?;
    Ok(Json(user))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.users.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

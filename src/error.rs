use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::StorageError;

/// 用户存储库错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// 邮箱已被其他记录占用
    #[error("A user with email {email} already exists")]
    DuplicateKey { email: String },
    /// 更新不存在的记录
    #[error("User {id} not found")]
    NotFound { id: String },
    /// 存储或网络不可用
    #[error("Repository unavailable: {0}")]
    Unavailable(String),
}

impl From<StorageError> for RepositoryError {
    fn from(e: StorageError) -> Self {
        RepositoryError::Unavailable(e.to_string())
    }
}

impl From<reqwest::Error> for RepositoryError {
    fn from(e: reqwest::Error) -> Self {
        RepositoryError::Unavailable(e.to_string())
    }
}

/// HTTP 层错误
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("{0}")]
    BadRequest(String),
}

/// 错误响应体，与前端约定为 `{ "error": "..." }`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Repository(RepositoryError::DuplicateKey { .. }) => StatusCode::CONFLICT,
            AppError::Repository(RepositoryError::NotFound { .. }) => StatusCode::NOT_FOUND,
            AppError::Repository(RepositoryError::Unavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(ErrorBody {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

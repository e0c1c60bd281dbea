use serde::{Deserialize, Serialize};

/// `POST /users/search` 请求体
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchUserRequest {
    pub email: String,
}

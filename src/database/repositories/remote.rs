use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Serialize;

use crate::database::UserRepository;
use crate::database::models::{NewUser, User, UserPatch};
use crate::error::RepositoryError;

const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Serialize)]
struct EmailSearch<'a> {
    email: &'a str,
}

/// 远程用户存储库，对接 `/api/users` 接口
///
/// 不重试、不设置额外超时；失败统一返回给调用方处理
#[derive(Clone)]
pub struct RemoteUserRepository {
    client: Client,
    base_url: String,
}

impl RemoteUserRepository {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 在基础地址后追加路径段，段内的 `/`、`?` 等字符会被转义
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RepositoryError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            RepositoryError::Unavailable(format!("invalid API url {}: {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                RepositoryError::Unavailable(format!("invalid API url {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// 服务端对不存在的记录返回带 `error` 字段的 404；
    /// 没有该响应体的 404 来自路由层（例如基础地址配置错误），按不可用处理
    async fn record_missing(response: Response) -> Result<(), RepositoryError> {
        let status = response.status();
        let body = response.json::<serde_json::Value>().await.ok();
        if body.as_ref().and_then(|b| b.get("error")).is_some_and(|e| e.is_string()) {
            return Ok(());
        }
        tracing::warn!("User API route not found: {}", status);
        Err(RepositoryError::Unavailable(format!(
            "HTTP error! status: {}",
            status.as_u16()
        )))
    }

    /// 非 2xx 响应转为 `Unavailable`，消息取自响应体的 `error` 字段
    async fn failure(response: Response) -> RepositoryError {
        let status = response.status();
        let message = match response.json::<serde_json::Value>().await {
            Ok(body) => body
                .get("error")
                .and_then(|e| e.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16())),
            Err(_) => UNKNOWN_ERROR.to_string(),
        };
        tracing::warn!("User API call failed ({}): {}", status, message);
        RepositoryError::Unavailable(message)
    }
}

#[async_trait]
impl UserRepository for RemoteUserRepository {
    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let response = self.client.get(self.endpoint(&["users"])?).send().await?;
        if !response.status().is_success() {
            return Err(Self::failure(response).await);
        }
        Ok(response.json().await?)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<User>, RepositoryError> {
        let response = self
            .client
            .get(self.endpoint(&["users", id])?)
            .send()
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Self::record_missing(response).await.map(|_| None),
            s if s.is_success() => Ok(response.json().await?),
            _ => Err(Self::failure(response).await),
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let response = self
            .client
            .post(self.endpoint(&["users", "search"])?)
            .json(&EmailSearch { email })
            .send()
            .await?;
        match response.status() {
            // 未找到时服务端返回 `null`
            s if s.is_success() => Ok(response.json::<Option<User>>().await?),
            _ => Err(Self::failure(response).await),
        }
    }

    async fn create(&self, new_user: NewUser) -> Result<User, RepositoryError> {
        let response = self
            .client
            .post(self.endpoint(&["users"])?)
            .json(&new_user)
            .send()
            .await?;
        match response.status() {
            StatusCode::CONFLICT => Err(RepositoryError::DuplicateKey {
                email: new_user.email,
            }),
            s if s.is_success() => Ok(response.json().await?),
            _ => Err(Self::failure(response).await),
        }
    }

    async fn update(&self, id: &str, patch: UserPatch) -> Result<User, RepositoryError> {
        let response = self
            .client
            .put(self.endpoint(&["users", id])?)
            .json(&patch)
            .send()
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => {
                Self::record_missing(response).await?;
                Err(RepositoryError::NotFound { id: id.to_string() })
            }
            StatusCode::CONFLICT => Err(RepositoryError::DuplicateKey {
                email: patch.email.unwrap_or_default(),
            }),
            s if s.is_success() => Ok(response.json().await?),
            _ => Err(Self::failure(response).await),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let response = self
            .client
            .delete(self.endpoint(&["users", id])?)
            .send()
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Self::record_missing(response).await,
            s if s.is_success() => Ok(()),
            _ => Err(Self::failure(response).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let repo = RemoteUserRepository::new("http://localhost:5002/api/");
        assert_eq!(repo.base_url(), "http://localhost:5002/api");
        assert_eq!(
            repo.endpoint(&["users"]).unwrap().as_str(),
            "http://localhost:5002/api/users"
        );
    }

    #[test]
    fn ids_are_escaped_as_one_path_segment() {
        let repo = RemoteUserRepository::new("http://localhost:5002/api");
        let url = repo.endpoint(&["users", "a/b?c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5002/api/users/a%2Fb%3Fc");
    }

    #[test]
    fn invalid_base_url_is_unavailable() {
        let repo = RemoteUserRepository::new("not a url");
        assert!(matches!(
            repo.endpoint(&["users"]),
            Err(RepositoryError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_server_is_unavailable() {
        // 端口 9 (discard) 一般没有监听者
        let repo = RemoteUserRepository::new("http://127.0.0.1:9/api");
        let err = repo.list().await.unwrap_err();
        assert!(matches!(err, RepositoryError::Unavailable(_)));
    }
}

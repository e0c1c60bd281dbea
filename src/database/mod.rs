// 用户记录存储
// 包含记录模型、存储库接口以及本地/远程两种实现

pub mod models;
pub mod repositories;

use async_trait::async_trait;

use crate::error::RepositoryError;

pub use models::{NewUser, User, UserPatch};
pub use repositories::{LocalUserRepository, RemoteUserRepository};

/// 用户存储库接口
///
/// 查询类操作把“不存在”视为正常结果；只有 `update` 会返回 `NotFound`
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 全部用户，不保证顺序
    async fn list(&self) -> Result<Vec<User>, RepositoryError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<User>, RepositoryError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    /// 邮箱重复时返回 `DuplicateKey`，且不修改存储
    async fn create(&self, new_user: NewUser) -> Result<User, RepositoryError>;

    /// 顶层浅合并并刷新 `updated_at`
    async fn update(&self, id: &str, patch: UserPatch) -> Result<User, RepositoryError>;

    /// 删除不存在的记录也视为成功
    async fn delete(&self, id: &str) -> Result<(), RepositoryError>;
}

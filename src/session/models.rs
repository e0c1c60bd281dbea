use thiserror::Error;
use tokio::task::JoinHandle;

use crate::database::User;
use crate::error::RepositoryError;

/// 会话状态
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// 启动检查尚未完成
    Unknown,
    Anonymous,
    Authenticated(User),
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no user is logged in")]
    NotAuthenticated,
}

/// `update_user` 的结果：本地已合并的记录，以及后台持久化任务
#[derive(Debug)]
pub struct UserUpdate {
    pub user: User,
    pub sync: PendingSync,
}

/// 后台写入存储库的任务
///
/// 失败不会回滚本地会话，只用于让界面提示用户
#[derive(Debug)]
pub struct PendingSync {
    handle: JoinHandle<Result<User, RepositoryError>>,
}

impl PendingSync {
    pub(crate) fn new(handle: JoinHandle<Result<User, RepositoryError>>) -> Self {
        Self { handle }
    }

    /// 等待后台写入完成
    pub async fn outcome(self) -> Result<User, RepositoryError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(RepositoryError::Unavailable(format!(
                "background update did not complete: {}",
                e
            ))),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::{Mutex, RwLock, oneshot};

use super::models::{PendingSync, SessionError, SessionState, UserUpdate};
use crate::database::models::{AccountType, Preferences, UserType};
use crate::database::{User, UserPatch, UserRepository};
use crate::storage::{KeyValueStore, StorageError, keys, read_json, write_json};

/// 当前用户会话
///
/// 由组合根显式创建并传给使用方。会话快照保存在 `currentUser` 键下，
/// 启动时通过 [`IdentityStore::restore`] 向存储库重新确认。
pub struct IdentityStore {
    storage: Arc<dyn KeyValueStore>,
    users: Arc<dyn UserRepository>,
    state: RwLock<SessionState>,
    /// 最近一次后台写入的完成信号，后续写入排在它之后
    sync_tail: Mutex<Option<oneshot::Receiver<()>>>,
}

impl IdentityStore {
    pub fn new(storage: Arc<dyn KeyValueStore>, users: Arc<dyn UserRepository>) -> Self {
        Self {
            storage,
            users,
            state: RwLock::new(SessionState::Unknown),
            sync_tail: Mutex::new(None),
        }
    }

    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn current_user(&self) -> Option<User> {
        self.state.read().await.user().cloned()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated()
    }

    /// 启动检查：读取持久化快照并确认用户仍然存在
    pub async fn restore(&self) -> SessionState {
        let next = self.resolve_persisted().await;
        *self.state.write().await = next.clone();
        next
    }

    async fn resolve_persisted(&self) -> SessionState {
        let snapshot =
            match read_json::<User>(self.storage.as_ref(), keys::CURRENT_USER_KEY).await {
                Ok(Some(user)) => user,
                Ok(None) => return SessionState::Anonymous,
                Err(StorageError::Serialization(e)) => {
                    tracing::warn!("Discarding unreadable session snapshot: {}", e);
                    self.clear_persisted().await;
                    return SessionState::Anonymous;
                }
                Err(e) => {
                    tracing::warn!("Failed to read session snapshot: {}", e);
                    return SessionState::Anonymous;
                }
            };

        match self.users.get_by_id(&snapshot.id).await {
            Ok(Some(user)) => {
                tracing::info!("Restored session for user: {}", user.id);
                self.persist_snapshot(&user).await;
                SessionState::Authenticated(user)
            }
            Ok(None) => {
                tracing::info!("Session user {} no longer exists, clearing", snapshot.id);
                self.clear_persisted().await;
                SessionState::Anonymous
            }
            Err(e) => {
                // 快照保留，下次启动再试
                tracing::warn!("Could not verify session user {}: {}", snapshot.id, e);
                SessionState::Anonymous
            }
        }
    }

    /// 登录；调用方负责提供已查到或刚创建的记录
    pub async fn login(&self, user: User) {
        self.persist_snapshot(&user).await;
        tracing::info!("User logged in: {}", user.id);
        *self.state.write().await = SessionState::Authenticated(user);
    }

    /// 登录并保存会话令牌
    pub async fn login_with_token(&self, user: User, token: &str) {
        if let Err(e) = self.storage.set(keys::AUTH_TOKEN_KEY, token).await {
            tracing::warn!("Failed to persist auth token: {}", e);
        }
        self.login(user).await;
    }

    pub async fn auth_token(&self) -> Option<String> {
        match self.storage.get(keys::AUTH_TOKEN_KEY).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Failed to read auth token: {}", e);
                None
            }
        }
    }

    /// 登出，可重复调用
    pub async fn logout(&self) {
        *self.state.write().await = SessionState::Anonymous;
        self.clear_persisted().await;
        tracing::debug!("Session cleared");
    }

    /// 合并到当前用户并刷新快照，同时在后台写入存储库
    ///
    /// 后台写入按调用顺序逐个执行。存储库写入失败不会回滚本地修改，
    /// 可通过 [`PendingSync::outcome`] 获知结果。
    pub async fn update_user(&self, patch: UserPatch) -> Result<UserUpdate, SessionError> {
        let (merged, previous, done) = {
            let mut state = self.state.write().await;
            let SessionState::Authenticated(user) = &mut *state else {
                return Err(SessionError::NotAuthenticated);
            };
            patch.clone().apply(user);

            // 持有会话写锁时入队，写入顺序与本地合并顺序一致
            let (done, finished) = oneshot::channel();
            let previous = self.sync_tail.lock().await.replace(finished);
            (user.clone(), previous, done)
        };

        self.persist_snapshot(&merged).await;
        self.merge_user_details(&merged.id, &patch).await;

        let users = Arc::clone(&self.users);
        let id = merged.id.clone();
        let handle = tokio::spawn(async move {
            if let Some(previous) = previous {
                // 上一次写入失败或中断同样放行
                let _ = previous.await;
            }
            let result = users.update(&id, patch).await;
            if let Err(e) = &result {
                tracing::warn!("Failed to persist update for user {}: {}", id, e);
            }
            let _ = done.send(());
            result
        });

        Ok(UserUpdate {
            user: merged,
            sync: PendingSync::new(handle),
        })
    }

    /// 恢复默认设置
    ///
    /// 角色、账户等级和偏好写回默认值，`userDetails_<id>` 整体覆盖为默认详情。
    pub async fn reset_preferences(&self) -> Result<UserUpdate, SessionError> {
        let update = self
            .update_user(UserPatch {
                user_type: Some(UserType::General),
                account_type: Some(AccountType::Basic),
                preferences: Some(Preferences::default()),
                ..Default::default()
            })
            .await?;

        let user = &update.user;
        let username = if user.username.is_empty() {
            user.email.split('@').next().unwrap_or_default().to_string()
        } else {
            user.username.clone()
        };
        let details = json!({
            "name": user.name,
            "email": user.email,
            "phone": user.phone,
            "username": username,
            "userType": UserType::General,
            "accountType": AccountType::Basic,
            "preferences": Preferences::default(),
            "security": {
                "twoFactorAuth": false,
                "loginAlerts": true,
            },
        });

        let key = keys::user_details_key(&user.id);
        if let Err(e) = write_json(self.storage.as_ref(), &key, &details).await {
            tracing::warn!("Failed to reset {}: {}", key, e);
        }
        tracing::info!("Reset settings for user: {}", user.id);
        Ok(update)
    }

    async fn persist_snapshot(&self, user: &User) {
        if let Err(e) = write_json(self.storage.as_ref(), keys::CURRENT_USER_KEY, user).await {
            tracing::warn!("Failed to persist session snapshot: {}", e);
        }
    }

    async fn clear_persisted(&self) {
        for key in [keys::CURRENT_USER_KEY, keys::AUTH_TOKEN_KEY] {
            if let Err(e) = self.storage.remove(key).await {
                tracing::warn!("Failed to clear {}: {}", key, e);
            }
        }
    }

    /// 设置页保存的详情（若存在）同样合并补丁
    async fn merge_user_details(&self, user_id: &str, patch: &UserPatch) {
        let key = keys::user_details_key(user_id);
        let mut details = match read_json::<Value>(self.storage.as_ref(), &key).await {
            Ok(Some(Value::Object(details))) => details,
            Ok(_) => return,
            Err(e) => {
                tracing::warn!("Ignoring unreadable {}: {}", key, e);
                return;
            }
        };

        if let Ok(Value::Object(fields)) = serde_json::to_value(patch) {
            details.extend(fields);
        }
        if let Err(e) = write_json(self.storage.as_ref(), &key, &details).await {
            tracing::warn!("Failed to update {}: {}", key, e);
        }
    }
}

use std::sync::Arc;

use account::AccountService;
use chat::{ChatHistoryStore, MessageGate, PendingChatStore};
use config::{Config, RepositoryBackend, StorageBackend};
use database::{LocalUserRepository, RemoteUserRepository, UserRepository};
use session::{IdentityStore, SessionState};
use storage::{KeyValueStore, MemoryStore, RedisStore, StorageError};

pub mod account;
pub mod chat;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod storage;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub config: Config,
}

/// 组合根：启动时按配置选择存储与存储库实现，并创建会话等组件
pub struct App {
    pub config: Config,
    pub storage: Arc<dyn KeyValueStore>,
    pub users: Arc<dyn UserRepository>,
    pub identity: Arc<IdentityStore>,
    pub accounts: AccountService,
    pub chat_history: ChatHistoryStore,
    pub pending_chat: PendingChatStore,
}

impl App {
    pub fn build(config: Config) -> Result<Self, StorageError> {
        let storage: Arc<dyn KeyValueStore> = match config.storage_backend {
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
            StorageBackend::Redis => {
                let url = config.redis_url.as_deref().ok_or_else(|| {
                    StorageError::Backend("REDIS_URL is not configured".to_string())
                })?;
                Arc::new(RedisStore::open(url, config.storage_namespace.clone())?)
            }
        };
        Ok(Self::with_storage(config, storage))
    }

    pub fn with_storage(config: Config, storage: Arc<dyn KeyValueStore>) -> Self {
        let users: Arc<dyn UserRepository> = match config.repository_backend {
            RepositoryBackend::Local => {
                tracing::info!("Using local user repository");
                Arc::new(
                    LocalUserRepository::new(storage.clone()).with_latency(config.mock_latency()),
                )
            }
            RepositoryBackend::Remote => {
                tracing::info!("Using remote user repository at {}", config.remote_api_url);
                Arc::new(RemoteUserRepository::new(config.remote_api_url.clone()))
            }
        };

        let identity = Arc::new(IdentityStore::new(storage.clone(), users.clone()));
        let accounts = AccountService::new(users.clone(), identity.clone());

        App {
            chat_history: ChatHistoryStore::new(storage.clone()),
            pending_chat: PendingChatStore::new(storage.clone()),
            config,
            storage,
            users,
            identity,
            accounts,
        }
    }

    /// 恢复上次的会话
    pub async fn restore_session(&self) -> SessionState {
        self.identity.restore().await
    }

    pub fn message_gate(&self) -> MessageGate {
        MessageGate::new(self.config.free_message_limit)
    }

    pub fn state(&self) -> AppState {
        AppState {
            users: self.users.clone(),
            config: self.config.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::SignUpForm;
    use crate::chat::{ChatMessage, Conversation, GateDecision, Sender};

    #[tokio::test]
    async fn composition_root_wires_a_full_session() {
        let storage = MemoryStore::new();
        let app = App::with_storage(Config::default(), Arc::new(storage.clone()));
        assert_eq!(app.restore_session().await, SessionState::Anonymous);

        let user = app
            .accounts
            .sign_up(SignUpForm {
                full_name: "Ada".into(),
                email: "ada@example.com".into(),
                password: "password1".into(),
                confirm_password: "password1".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        app.chat_history
            .save_conversation(
                &user.id,
                Conversation::new("Floats", vec![ChatMessage::new(Sender::User, "hi")]),
            )
            .await
            .unwrap();

        // 同一存储上重新启动
        let reloaded = App::with_storage(Config::default(), Arc::new(storage));
        let state = reloaded.restore_session().await;
        assert_eq!(state.user().map(|u| u.id.clone()), Some(user.id.clone()));
        assert_eq!(reloaded.chat_history.load(&user.id).await.unwrap().len(), 1);
    }

    #[test]
    fn message_gate_uses_configured_limit() {
        let config = Config {
            free_message_limit: 1,
            ..Config::default()
        };
        let app = App::with_storage(config, Arc::new(MemoryStore::new()));
        let mut gate = app.message_gate();

        assert_eq!(gate.try_send(false), GateDecision::Allowed { remaining: Some(0) });
        assert_eq!(gate.try_send(false), GateDecision::LoginRequired);
    }

    #[test]
    fn build_with_memory_backend() {
        let app = App::build(Config::default()).unwrap();
        assert_eq!(app.state().config.api_base_uri, "/api");
    }
}

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::database::UserRepository;
use crate::database::models::{NewUser, User, UserPatch};
use crate::error::RepositoryError;
use crate::storage::{KeyValueStore, keys, read_json, write_json};
use crate::utils::{generate_user_id, now};

/// 本地用户存储库（模拟数据库）
///
/// 所有记录序列化为一个 JSON 数组保存在单个键下。每次写操作都会读出整个数组、
/// 修改后整体写回，没有任何锁：并发写入时后写者的快照覆盖先写者对其他记录的修改。
pub struct LocalUserRepository {
    store: Arc<dyn KeyValueStore>,
    latency: Duration,
}

impl LocalUserRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            latency: Duration::ZERO,
        }
    }

    /// 每次操作前人为延迟，模拟网络往返
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    async fn load_all(&self) -> Result<Vec<User>, RepositoryError> {
        let users = read_json::<Vec<User>>(self.store.as_ref(), keys::USERS_KEY).await?;
        Ok(users.unwrap_or_default())
    }

    async fn save_all(&self, users: &[User]) -> Result<(), RepositoryError> {
        write_json(self.store.as_ref(), keys::USERS_KEY, users).await?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for LocalUserRepository {
    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        self.simulate_latency().await;
        self.load_all().await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<User>, RepositoryError> {
        self.simulate_latency().await;
        let users = self.load_all().await?;
        Ok(users.into_iter().find(|u| u.id == id))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        self.simulate_latency().await;
        let users = self.load_all().await?;
        Ok(users.into_iter().find(|u| u.email == email))
    }

    async fn create(&self, new_user: NewUser) -> Result<User, RepositoryError> {
        self.simulate_latency().await;
        let mut users = self.load_all().await?;

        if users.iter().any(|u| u.email == new_user.email) {
            tracing::debug!("Rejected duplicate email: {}", new_user.email);
            return Err(RepositoryError::DuplicateKey {
                email: new_user.email,
            });
        }

        let user = new_user.into_user(generate_user_id(), now());
        users.push(user.clone());
        self.save_all(&users).await?;

        tracing::info!("Created user: {}", user.id);
        Ok(user)
    }

    async fn update(&self, id: &str, patch: UserPatch) -> Result<User, RepositoryError> {
        self.simulate_latency().await;
        let mut users = self.load_all().await?;

        if let Some(email) = &patch.email {
            if users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(RepositoryError::DuplicateKey {
                    email: email.clone(),
                });
            }
        }

        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| RepositoryError::NotFound { id: id.to_string() })?;
        patch.apply(user);
        user.updated_at = now();
        let updated = user.clone();

        self.save_all(&users).await?;

        tracing::debug!("Updated user: {}", id);
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        self.simulate_latency().await;
        let mut users = self.load_all().await?;

        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            tracing::debug!("Delete of unknown user {} ignored", id);
        }

        // 与其他写操作一致，整体写回
        self.save_all(&users).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Preferences, PreferencesPatch};
    use crate::storage::MemoryStore;

    fn repository() -> (MemoryStore, LocalUserRepository) {
        let store = MemoryStore::new();
        let repo = LocalUserRepository::new(Arc::new(store.clone()));
        (store, repo)
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let (_, repo) = repository();
        assert!(repo.list().await.unwrap().is_empty());
        assert!(repo.get_by_id("missing").await.unwrap().is_none());
        assert!(repo.get_by_email("a@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn signup_then_signin_lookup() {
        let (_, repo) = repository();

        let created = repo.create(NewUser::new("a@x.com", "A")).await.unwrap();
        assert!(!created.id.is_empty());

        let found = repo.get_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.name, "A");
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_without_mutation() {
        let (store, repo) = repository();
        repo.create(NewUser::new("a@x.com", "A")).await.unwrap();
        let snapshot = store.get(keys::USERS_KEY).await.unwrap();

        let err = repo.create(NewUser::new("a@x.com", "B")).await.unwrap_err();

        assert!(matches!(err, RepositoryError::DuplicateKey { ref email } if email == "a@x.com"));
        assert_eq!(store.get(keys::USERS_KEY).await.unwrap(), snapshot);
        assert_eq!(repo.get_by_email("a@x.com").await.unwrap().unwrap().name, "A");
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn updates_merge_and_keep_id() {
        let (_, repo) = repository();
        let created = repo.create(NewUser::new("a@x.com", "A")).await.unwrap();

        repo.update(
            &created.id,
            UserPatch {
                phone: Some("555".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let updated = repo
            .update(
                &created.id,
                UserPatch {
                    username: Some("alpha".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.phone, "555");
        assert_eq!(updated.username, "alpha");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);

        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn preferences_are_replaced_whole() {
        let (_, repo) = repository();
        let created = repo.create(NewUser::new("a@x.com", "A")).await.unwrap();

        let prefs = created.preferences.merged(PreferencesPatch {
            font_size: Some("large".into()),
            ..Default::default()
        });
        let updated = repo
            .update(
                &created.id,
                UserPatch {
                    preferences: Some(prefs),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.preferences.font_size, "large");
        assert_eq!(updated.preferences.theme, Preferences::default().theme);
    }

    #[tokio::test]
    async fn update_of_missing_id_is_not_found() {
        let (_, repo) = repository();
        let err = repo
            .update("nope", UserPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { ref id } if id == "nope"));
    }

    #[tokio::test]
    async fn update_cannot_steal_another_email() {
        let (_, repo) = repository();
        repo.create(NewUser::new("a@x.com", "A")).await.unwrap();
        let b = repo.create(NewUser::new("b@x.com", "B")).await.unwrap();

        let err = repo
            .update(
                &b.id,
                UserPatch {
                    email: Some("a@x.com".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::DuplicateKey { .. }));

        // 保持自己的邮箱不算冲突
        let same = repo
            .update(
                &b.id,
                UserPatch {
                    email: Some("b@x.com".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(same.email, "b@x.com");
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_, repo) = repository();
        let created = repo.create(NewUser::new("a@x.com", "A")).await.unwrap();

        repo.delete(&created.id).await.unwrap();
        assert!(repo.get_by_id(&created.id).await.unwrap().is_none());

        repo.delete(&created.id).await.unwrap();
        assert!(repo.get_by_id(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn second_repository_over_same_store_sees_writes() {
        let (store, repo) = repository();
        let created = repo.create(NewUser::new("a@x.com", "A")).await.unwrap();

        let other_tab = LocalUserRepository::new(Arc::new(store));
        assert!(other_tab.get_by_id(&created.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn corrupt_collection_reports_unavailable() {
        let (store, repo) = repository();
        store.set(keys::USERS_KEY, "not json").await.unwrap();

        let err = repo.list().await.unwrap_err();
        assert!(matches!(err, RepositoryError::Unavailable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_latency_delays_operations() {
        let store = MemoryStore::new();
        let repo = LocalUserRepository::new(Arc::new(store))
            .with_latency(Duration::from_millis(300));

        let started = tokio::time::Instant::now();
        repo.list().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(300));
    }
}

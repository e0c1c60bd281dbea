use std::sync::Arc;

use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient};

use super::{KeyValueStore, StorageError};

/// Redis 存储，所有键加命名空间前缀
#[derive(Clone)]
pub struct RedisStore {
    redis: Arc<RedisClient>,
    namespace: String,
}

impl RedisStore {
    pub fn new(redis: Arc<RedisClient>, namespace: impl Into<String>) -> Self {
        Self {
            redis,
            namespace: namespace.into(),
        }
    }

    pub fn open(redis_url: &str, namespace: impl Into<String>) -> Result<Self, StorageError> {
        let client = RedisClient::open(redis_url)?;
        Ok(Self::new(Arc::new(client), namespace))
    }

    /// 生成带命名空间的键
    pub fn namespaced(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(self.namespaced(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let _: () = conn.set(self.namespaced(key), value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let _: () = conn.del(self.namespaced(key)).await?;
        Ok(())
    }
}

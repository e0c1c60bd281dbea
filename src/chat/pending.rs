use std::sync::Arc;

use super::models::ChatMessage;
use crate::storage::{KeyValueStore, StorageError, keys, read_json, write_json};

/// 跳转登录前暂存正在进行的对话，登录后取回
#[derive(Clone)]
pub struct PendingChatStore {
    storage: Arc<dyn KeyValueStore>,
}

impl PendingChatStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    pub async fn stash(&self, messages: &[ChatMessage]) -> Result<(), StorageError> {
        write_json(self.storage.as_ref(), keys::PENDING_CHAT_KEY, messages).await
    }

    /// 取出并清除；没有暂存时返回 `None`
    pub async fn take(&self) -> Result<Option<Vec<ChatMessage>>, StorageError> {
        let pending =
            read_json::<Vec<ChatMessage>>(self.storage.as_ref(), keys::PENDING_CHAT_KEY).await?;
        if pending.is_some() {
            self.storage.remove(keys::PENDING_CHAT_KEY).await?;
        }
        Ok(pending)
    }
}

use std::sync::Arc;

use super::models::Conversation;
use crate::storage::{KeyValueStore, StorageError, keys, read_json, write_json};

/// 用户聊天记录，保存在 `chatHistory_<userId>` 下，最新的在前
#[derive(Clone)]
pub struct ChatHistoryStore {
    storage: Arc<dyn KeyValueStore>,
}

impl ChatHistoryStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    pub async fn load(&self, user_id: &str) -> Result<Vec<Conversation>, StorageError> {
        let key = keys::chat_history_key(user_id);
        let history = read_json::<Vec<Conversation>>(self.storage.as_ref(), &key).await?;
        Ok(history.unwrap_or_default())
    }

    /// 空对话不保存
    pub async fn save_conversation(
        &self,
        user_id: &str,
        conversation: Conversation,
    ) -> Result<Vec<Conversation>, StorageError> {
        let mut history = self.load(user_id).await?;
        if conversation.messages.is_empty() {
            return Ok(history);
        }

        history.insert(0, conversation);
        self.store(user_id, &history).await?;
        Ok(history)
    }

    pub async fn delete_conversation(
        &self,
        user_id: &str,
        conversation_id: i64,
    ) -> Result<Vec<Conversation>, StorageError> {
        let mut history = self.load(user_id).await?;
        history.retain(|c| c.id != conversation_id);
        self.store(user_id, &history).await?;
        Ok(history)
    }

    pub async fn clear(&self, user_id: &str) -> Result<(), StorageError> {
        self.storage.remove(&keys::chat_history_key(user_id)).await
    }

    async fn store(&self, user_id: &str, history: &[Conversation]) -> Result<(), StorageError> {
        write_json(self.storage.as_ref(), &keys::chat_history_key(user_id), history).await
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::{now, timestamp_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// 单条消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        ChatMessage {
            id: timestamp_id(),
            text: text.into(),
            sender,
            timestamp: now(),
        }
    }
}

/// 一段保存下来的对话
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub timestamp: DateTime<Utc>,
}

impl Conversation {
    pub fn new(title: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Conversation {
            id: timestamp_id(),
            title: title.into(),
            messages,
            timestamp: now(),
        }
    }
}

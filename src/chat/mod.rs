// 聊天相关的会话数据
// 按用户隔离的聊天记录、登录前暂存的对话、未登录消息计数

pub mod gate;
pub mod history;
pub mod models;
pub mod pending;

pub use gate::{GateDecision, MessageGate};
pub use history::ChatHistoryStore;
pub use models::{ChatMessage, Conversation, Sender};
pub use pending::PendingChatStore;

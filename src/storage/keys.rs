/// 全部用户记录（JSON 数组）
pub const USERS_KEY: &str = "users";

/// 当前会话用户快照
pub const CURRENT_USER_KEY: &str = "currentUser";

/// 会话令牌，与用户快照一起清除
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// 登录跳转前暂存的对话
pub const PENDING_CHAT_KEY: &str = "pendingChatState";

/// 聊天记录键前缀
const CHAT_HISTORY_PREFIX: &str = "chatHistory_";

/// 用户设置详情键前缀
const USER_DETAILS_PREFIX: &str = "userDetails_";

/// 生成用户聊天记录键
pub fn chat_history_key(user_id: &str) -> String {
    format!("{}{}", CHAT_HISTORY_PREFIX, user_id)
}

/// 生成用户设置详情键
pub fn user_details_key(user_id: &str) -> String {
    format!("{}{}", USER_DETAILS_PREFIX, user_id)
}

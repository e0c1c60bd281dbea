use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 随机后缀长度
const ID_SUFFIX_LEN: usize = 6;

/// 生成用户ID：毫秒时间戳 + 随机后缀
///
/// 不保证绝对唯一，同一毫秒内的碰撞概率可以忽略
pub fn generate_user_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}{}",
        Utc::now().timestamp_millis(),
        &suffix[..ID_SUFFIX_LEN]
    )
}

/// 当前时间
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// 毫秒时间戳，用作聊天记录等本地数据的ID
pub fn timestamp_id() -> i64 {
    Utc::now().timestamp_millis()
}

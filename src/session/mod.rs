// 会话模块
// 记录当前浏览器（客户端）正在使用的用户，并在重启后恢复

pub mod identity;
pub mod models;

pub use identity::IdentityStore;
pub use models::{PendingSync, SessionError, SessionState, UserUpdate};

/// 未登录用户可免费发送的消息数
pub const DEFAULT_FREE_MESSAGES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// 允许发送；`remaining` 为未登录时剩余的免费条数
    Allowed { remaining: Option<usize> },
    LoginRequired,
}

/// 未登录消息计数
///
/// 只在内存中计数，新建即清零，仅用于界面提示，不是配额限制。
#[derive(Debug, Clone)]
pub struct MessageGate {
    limit: usize,
    sent: usize,
}

impl Default for MessageGate {
    fn default() -> Self {
        Self::new(DEFAULT_FREE_MESSAGES)
    }
}

impl MessageGate {
    pub fn new(limit: usize) -> Self {
        Self { limit, sent: 0 }
    }

    pub fn sent(&self) -> usize {
        self.sent
    }

    /// 尝试发送一条消息
    pub fn try_send(&mut self, authenticated: bool) -> GateDecision {
        if authenticated {
            return GateDecision::Allowed { remaining: None };
        }
        if self.sent >= self.limit {
            return GateDecision::LoginRequired;
        }
        self.sent += 1;
        GateDecision::Allowed {
            remaining: Some(self.limit - self.sent),
        }
    }
}

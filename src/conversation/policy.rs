use serde::{Deserialize, Serialize};

/// 何时把会话折叠成一条记忆
///
/// 任一阈值达到即触发；两个阈值都为 `None` 时只能手动折叠。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoldPolicy {
    /// 未折叠消息数上限
    pub max_messages: Option<usize>,
    /// 最早一条未折叠消息的最大存活秒数
    pub max_age_secs: Option<i64>,
}

impl Default for FoldPolicy {
    fn default() -> Self {
        Self {
            max_messages: Some(40),
            max_age_secs: Some(30 * 60),
        }
    }
}

impl FoldPolicy {
    /// 只允许手动折叠
    pub fn manual() -> Self {
        Self {
            max_messages: None,
            max_age_secs: None,
        }
    }

    pub fn max_messages(mut self, n: usize) -> Self {
        self.max_messages = Some(n);
        self
    }

    pub fn max_age_secs(mut self, secs: i64) -> Self {
        self.max_age_secs = Some(secs);
        self
    }

    /// `pending` 条消息尚未折叠，最早一条已存在 `age_secs` 秒
    pub fn should_fold(&self, pending: usize, age_secs: i64) -> bool {
        if pending == 0 {
            return false;
        }
        self.max_messages.is_some_and(|max| pending >= max)
            || self.max_age_secs.is_some_and(|max| age_secs >= max)
    }
}

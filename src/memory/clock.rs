use std::time::{SystemTime, UNIX_EPOCH};

/// 记忆时间戳来源
pub trait Clock: Send + Sync {
    /// 当前 Unix 时间（秒）
    fn now(&self) -> i64;
}

/// 系统时钟
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }
}

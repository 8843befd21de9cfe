//! 提示词上下文裁剪
//!
//! 会话缓冲区只追加不删除，每次发给 LLM 之前由 [`ContextCompressor`]
//! 决定实际带上哪些消息。

pub mod compressor;

use crate::error::Result;
use crate::llm::types::Message;
use async_trait::async_trait;

// ──────────────────────────────────────────────
// 核心 trait 与数据结构
// ──────────────────────────────────────────────

/// 压缩管道的输入
pub struct CompressionInput {
    /// 待压缩的消息列表
    pub messages: Vec<Message>,
    /// Token 上限，超过时触发裁剪
    pub token_limit: usize,
}

/// 压缩管道的输出
pub struct CompressionOutput {
    /// 最终保留、将发送给 LLM 的消息列表
    pub messages: Vec<Message>,
    /// 本次被裁剪掉的消息
    pub evicted: Vec<Message>,
}

/// 所有压缩策略的统一接口（async，支持 `dyn` trait object）
#[async_trait]
pub trait ContextCompressor: Send + Sync {
    async fn compress(&self, input: CompressionInput) -> Result<CompressionOutput>;
}

/// 粗略估算 token 数：字符数 / 4，每条消息至少 1
pub fn estimate_tokens(messages: &[Message]) -> usize {
    messages.iter().map(|m| m.content.chars().count() / 4 + 1).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens() {
        let messages = vec![
            Message::user("12345678".to_string()),
            Message::assistant(String::new()),
        ];
        assert_eq!(estimate_tokens(&messages), 3 + 1);
        assert_eq!(estimate_tokens(&[]), 0);
    }
}

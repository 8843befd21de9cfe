use crate::compression::{CompressionInput, CompressionOutput, ContextCompressor, estimate_tokens};
use crate::error::Result;
use crate::llm::types::Role;
use async_trait::async_trait;

/// 滑动窗口压缩：保留最近 `window_size` 条非 system 消息，裁掉更早的部分。
///
/// - system 消息始终保留在列表最前面，不计入窗口计数
/// - 窗口内仍超出 `token_limit` 时继续从最旧的一条开始裁剪，但最新一条消息总会保留
pub struct SlidingWindowCompressor {
    window_size: usize,
}

impl SlidingWindowCompressor {
    pub fn new(window_size: usize) -> Self {
        Self { window_size }
    }
}

#[async_trait]
impl ContextCompressor for SlidingWindowCompressor {
    async fn compress(&self, input: CompressionInput) -> Result<CompressionOutput> {
        let (system_msgs, mut conv_msgs): (Vec<_>, Vec<_>) = input
            .messages
            .into_iter()
            .partition(|m| m.role == Role::System);

        let split_at = conv_msgs.len().saturating_sub(self.window_size);
        let mut evicted: Vec<_> = conv_msgs.drain(..split_at).collect();

        let budget = input.token_limit.saturating_sub(estimate_tokens(&system_msgs));
        while conv_msgs.len() > 1 && estimate_tokens(&conv_msgs) > budget {
            evicted.push(conv_msgs.remove(0));
        }

        let mut messages = system_msgs;
        messages.extend(conv_msgs);
        Ok(CompressionOutput { messages, evicted })
    }
}

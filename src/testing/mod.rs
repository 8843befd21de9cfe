//! 测试基础设施
//!
//! 提供在不依赖真实 LLM / 语音服务的情况下测试 banter-bot 各组件的工具集。
//!
//! | 类型 | 用途 |
//! |------|------|
//! | [`MockLlmClient`] | 替代真实 LLM，用于测试对话管理、摘要和关键词提取 |
//! | [`MockKeywordExtractor`] | 可脚本化的关键词提取器，可注入失败 |
//! | [`MockSynthesizer`] | 记录朗读文本的语音合成器 |
//! | [`MockRecognizer`] | 按脚本产生识别句子的语音识别器 |
//! | [`ManualClock`] | 手动拨动的时钟，固定记忆时间戳 |
//!
//! # 设计原则
//!
//! - **零网络请求**：所有 Mock 都完全在内存中运行
//! - **可脚本化**：通过 `with_response()` / `with_keywords()` / `with_failure()` 精确控制返回值
//! - **可观测**：通过 `call_count()` / `last_messages()` 等方法检查调用情况
//! - **线程安全**：内部使用 `Arc<Mutex<_>>`，可安全地在多任务测试中共享
//!
//! # 使用示例
//!
//! ```rust
//! use banter_bot::conversation::{ConversationConfig, ConversationManager};
//! use banter_bot::memory::MemoryStore;
//! use banter_bot::testing::{MockKeywordExtractor, MockLlmClient};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> banter_bot::error::Result<()> {
//! let llm = Arc::new(MockLlmClient::new().with_response("Hello there!"));
//! let store = Arc::new(MemoryStore::new());
//! let mut manager = ConversationManager::new(
//!     llm.clone(),
//!     Arc::new(MockKeywordExtractor::new()),
//!     store,
//!     ConversationConfig::default(),
//! );
//!
//! let reply = manager.prompt("hi", None, CancellationToken::new()).await?;
//! assert_eq!(reply, "Hello there!");
//! assert_eq!(llm.call_count(), 1);
//! # Ok(())
//! # }
//! ```

mod clock;
mod mock_keywords;
mod mock_llm;
mod mock_speech;

pub use clock::ManualClock;
pub use mock_keywords::MockKeywordExtractor;
pub use mock_llm::MockLlmClient;
pub use mock_speech::{MockRecognizer, MockSynthesizer};

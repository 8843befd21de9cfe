//! 长期对话记忆
//!
//! 把结束（或超长）的对话折叠成一条 [`Memory`]，按关键词建立倒排索引，
//! 新一轮对话开始前按关键词召回相关记忆注入提示词。
//!
//! | 组件 | 作用 |
//! |------|------|
//! | [`Memory`] | 一段归档对话：消息、摘要、影响分、时间戳、关键词 |
//! | [`MemoryIndex`] | keyword → uuid 倒排索引（派生结构，不落盘） |
//! | [`MemoryStore`] | 记忆集合 + 索引，唯一修改入口，负责持久化 |
//! | [`codec`] | 长度前缀帧格式的编解码 |

pub mod clock;
pub mod codec;
pub mod index;
pub mod model;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use index::MemoryIndex;
pub use model::{Memory, normalize_keyword, normalize_keywords};
pub use store::MemoryStore;

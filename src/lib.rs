pub mod compression;
pub mod config;
pub mod conversation;
pub mod error;
pub mod keywords;
pub mod llm;
pub mod memory;
pub mod speech;
pub mod testing;

pub mod prelude {
    pub use crate::config::AppConfig;
    pub use crate::conversation::{ConversationConfig, ConversationManager, FoldPolicy, ReplyEvent};
    pub use crate::error::Result;
    pub use crate::keywords::{KeywordExtractor, LlmKeywordExtractor, SimpleKeywordExtractor};
    pub use crate::llm::types::{Message, Role};
    pub use crate::llm::{DefaultLlmClient, LlmClient};
    pub use crate::memory::{Memory, MemoryStore};
    pub use crate::speech::{Recognizer, Synthesizer};
}

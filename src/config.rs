//! 应用配置文件（YAML）
//!
//! 所有字段都有默认值，配置文件只需写出想覆盖的部分：
//!
//! ```yaml
//! model: default
//! memory_path: ~/.banter-bot/memories.bin
//! keyword_extractor: llm
//! conversation:
//!   recall_limit: 5
//!   fold_policy:
//!     max_messages: 30
//! ```

use crate::conversation::ConversationConfig;
use crate::error::{ConfigError, Result};
use serde::Deserialize;
use serde::Serialize;

/// 关键词提取方式
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    /// 本地分词
    #[default]
    Simple,
    /// 调用 LLM
    Llm,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    /// 模型名称，对应环境变量 `BANTER_MODEL_<NAME>_*`
    pub model: String,
    /// 记忆文件路径
    pub memory_path: String,
    /// 聊天记录目录（`None` 表示不记录）
    pub transcript_dir: Option<String>,
    pub keyword_extractor: ExtractorKind,
    /// 终端朗读语速
    pub words_per_minute: u32,
    pub conversation: ConversationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: "default".to_string(),
            memory_path: "~/.banter-bot/memories.bin".to_string(),
            transcript_dir: Some("~/.banter-bot/logs".to_string()),
            keyword_extractor: ExtractorKind::default(),
            words_per_minute: 180,
            conversation: ConversationConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &str) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|_| ConfigError::FileNotFound(path.to_string()))?;
        let config: AppConfig = serde_yaml::from_reader(file)?;
        Ok(config)
    }
}

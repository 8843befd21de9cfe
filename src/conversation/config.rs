//! 对话管理配置

use crate::conversation::policy::FoldPolicy;
use serde::{Deserialize, Serialize};

const DEFAULT_PERSONA: &str = "You are a friendly, witty conversational companion. Keep your replies \
short and natural, as if chatting with a friend, and use what you remember about the user when it \
is relevant.";

/// 对话运行时配置
///
/// 可以直接从 YAML 反序列化（缺省字段取默认值），也可以通过构建器链式设置。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// 人设 system 提示词
    pub(crate) persona: String,
    /// 每轮最多召回的记忆条数
    pub(crate) recall_limit: usize,
    /// 提取召回关键词时参考的最近消息条数（含最新一条）
    pub(crate) keyword_context: usize,
    /// 设置后使用模糊检索，取值为 Jaro-Winkler 相似度下限
    pub(crate) fuzzy_threshold: Option<f64>,
    /// 提示词中最多携带的会话消息条数
    pub(crate) prompt_window: usize,
    /// 提示词 token 上限（粗略估算）
    pub(crate) token_limit: usize,
    /// 影响分无法解析时使用的默认值
    pub(crate) default_impact: i64,
    pub(crate) fold_policy: FoldPolicy,
    /// 折叠后将 store 淘汰到这个数量以内（`None` 表示不限制）
    pub(crate) store_capacity: Option<usize>,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            persona: DEFAULT_PERSONA.to_string(),
            recall_limit: 3,
            keyword_context: 3,
            fuzzy_threshold: None,
            prompt_window: 20,
            token_limit: 4096,
            default_impact: 5,
            fold_policy: FoldPolicy::default(),
            store_capacity: None,
        }
    }
}

impl ConversationConfig {
    pub fn persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    pub fn recall_limit(mut self, limit: usize) -> Self {
        self.recall_limit = limit;
        self
    }

    pub fn keyword_context(mut self, messages: usize) -> Self {
        self.keyword_context = messages.max(1);
        self
    }

    pub fn fuzzy_threshold(mut self, threshold: f64) -> Self {
        self.fuzzy_threshold = Some(threshold);
        self
    }

    pub fn prompt_window(mut self, messages: usize) -> Self {
        self.prompt_window = messages;
        self
    }

    pub fn token_limit(mut self, tokens: usize) -> Self {
        self.token_limit = tokens;
        self
    }

    pub fn default_impact(mut self, impact: i64) -> Self {
        self.default_impact = impact;
        self
    }

    pub fn fold_policy(mut self, policy: FoldPolicy) -> Self {
        self.fold_policy = policy;
        self
    }

    pub fn store_capacity(mut self, capacity: usize) -> Self {
        self.store_capacity = Some(capacity);
        self
    }

    pub fn get_persona(&self) -> &str {
        &self.persona
    }

    pub fn get_fold_policy(&self) -> FoldPolicy {
        self.fold_policy
    }
}

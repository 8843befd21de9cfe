//! 记忆记录模型

use crate::llm::types::Message;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// 一段已归档的对话：原始消息 + 摘要 + 影响分 + 描述它的关键词。
///
/// 由 [`MemoryStore::create`](crate::memory::MemoryStore::create) 一次性创建，之后不再修改。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    /// 描述这段记忆的关键词（已归一化）
    pub keywords: BTreeSet<String>,
    /// LLM 生成的摘要
    pub summary: String,
    /// 对话重要程度，用于排序和淘汰
    pub impact: i64,
    /// 创建时间（Unix 秒），同一 store 内单调不减
    pub timestamp: i64,
    /// 原始消息，按时间顺序
    pub messages: Vec<Message>,
    pub uuid: Uuid,
}

/// 归一化单个关键词：去首尾空白并转小写，空串返回 `None`
pub fn normalize_keyword(keyword: &str) -> Option<String> {
    let normalized = keyword.trim().to_lowercase();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// 归一化一组关键词并去重
pub fn normalize_keywords<I, S>(keywords: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    keywords
        .into_iter()
        .filter_map(|k| normalize_keyword(k.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_keywords() {
        let keywords = normalize_keywords(["  Weather ", "weather", "", "Travel"]);
        assert_eq!(
            keywords.into_iter().collect::<Vec<_>>(),
            vec!["travel".to_string(), "weather".to_string()]
        );
    }
}

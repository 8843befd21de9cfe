//! 对话管理用到的提示词

use crate::llm::types::Message;
use crate::memory::Memory;
use chrono::DateTime;

const IMPACT_PROMPT: &str = "Rate how memorable the conversation summarized below would be for the \
assistant, on a scale from 1 (mundane small talk) to 10 (life-changing news or a strong personal \
connection). Answer with a single integer and nothing else.";

/// 把召回的记忆渲染成一条 system 消息，按排名顺序列出
pub fn memory_context(memories: &[Memory]) -> Option<Message> {
    if memories.is_empty() {
        return None;
    }
    let lines = memories
        .iter()
        .map(|m| {
            let when = DateTime::from_timestamp(m.timestamp, 0)
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "unknown date".to_string());
            format!("- ({when}) {}", m.summary)
        })
        .collect::<Vec<_>>()
        .join("\n");
    Some(Message::system(format!(
        "Things you remember from earlier conversations with this user, most relevant first:\n{lines}"
    )))
}

/// 影响分打分请求
pub fn impact_request(summary: &str) -> Vec<Message> {
    vec![
        Message::system(IMPACT_PROMPT.to_string()),
        Message::user(summary.to_string()),
    ]
}

/// 取回复中的第一个整数，限制在 1..=10；没有整数时返回 `None`
pub fn parse_impact(text: &str) -> Option<i64> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<i64>().ok().map(|n| n.clamp(1, 10))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use uuid::Uuid;

    #[test]
    fn test_parse_impact() {
        assert_eq!(parse_impact("7"), Some(7));
        assert_eq!(parse_impact("Impact: 9/10"), Some(9));
        assert_eq!(parse_impact("42"), Some(10));
        assert_eq!(parse_impact("0"), Some(1));
        assert_eq!(parse_impact("high"), None);
    }

    #[test]
    fn test_memory_context_order() {
        let memory = |summary: &str, timestamp| Memory {
            keywords: BTreeSet::from(["k".to_string()]),
            summary: summary.to_string(),
            impact: 1,
            timestamp,
            messages: vec![Message::user("x".to_string())],
            uuid: Uuid::new_v4(),
        };
        assert!(memory_context(&[]).is_none());

        let msg = memory_context(&[memory("first", 0), memory("second", 86_400)]).unwrap();
        assert!(msg.content.contains("- (1970-01-01) first\n- (1970-01-02) second"));
    }
}

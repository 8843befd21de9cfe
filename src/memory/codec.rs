//! 记忆文件的帧格式
//!
//! 文件是一串连续的帧，每帧：
//! ```text
//! [u32 小端长度][长度字节的 UTF-8 JSON 记忆记录]
//! ```
//! 空文件表示空 store。任何截断、JSON 错误、空消息、空或重复 uuid
//! 都视为损坏，整个文件拒绝加载。

use crate::error::{MemoryError, Result};
use crate::llm::types::Message;
use crate::memory::model::{Memory, normalize_keywords};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// 单帧最大长度
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

const LEN_PREFIX: usize = 4;

/// 落盘时的记录结构，uuid 以字符串保存以便逐条校验
#[derive(Debug, Serialize, Deserialize)]
struct MemoryRecord {
    keywords: Vec<String>,
    summary: String,
    impact: i64,
    timestamp: i64,
    messages: Vec<Message>,
    uuid: String,
}

impl From<&Memory> for MemoryRecord {
    fn from(memory: &Memory) -> Self {
        Self {
            keywords: memory.keywords.iter().cloned().collect(),
            summary: memory.summary.clone(),
            impact: memory.impact,
            timestamp: memory.timestamp,
            messages: memory.messages.clone(),
            uuid: memory.uuid.to_string(),
        }
    }
}

impl MemoryRecord {
    fn into_memory(self, frame: usize) -> Result<Memory> {
        if self.uuid.is_empty() {
            return Err(corrupt(frame, "empty uuid"));
        }
        let uuid = Uuid::parse_str(&self.uuid)
            .map_err(|e| corrupt(frame, &format!("invalid uuid '{}': {e}", self.uuid)))?;
        if self.messages.is_empty() {
            return Err(corrupt(frame, "memory has no messages"));
        }
        Ok(Memory {
            keywords: normalize_keywords(self.keywords),
            summary: self.summary,
            impact: self.impact,
            timestamp: self.timestamp,
            messages: self.messages,
            uuid,
        })
    }
}

fn corrupt(frame: usize, reason: &str) -> crate::error::BanterError {
    MemoryError::Corruption(format!("frame {frame}: {reason}")).into()
}

/// 把一组记忆编码成帧序列
pub fn encode_memories<'a>(memories: impl IntoIterator<Item = &'a Memory>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    for memory in memories {
        let body = serde_json::to_vec(&MemoryRecord::from(memory))
            .map_err(|e| MemoryError::IoError(format!("serialize memory {}: {e}", memory.uuid)))?;
        if body.len() > MAX_FRAME_SIZE {
            return Err(MemoryError::Validation(format!(
                "memory {} exceeds frame size limit",
                memory.uuid
            ))
            .into());
        }
        buf.extend_from_slice(&(body.len() as u32).to_le_bytes());
        buf.extend_from_slice(&body);
    }
    Ok(buf)
}

/// 解码帧序列，全部校验通过才返回
pub fn decode_memories(bytes: &[u8]) -> Result<Vec<Memory>> {
    let mut memories = Vec::new();
    let mut seen = HashSet::new();
    let mut offset = 0;
    let mut frame = 0;

    while offset < bytes.len() {
        let remaining = bytes.len() - offset;
        if remaining < LEN_PREFIX {
            return Err(corrupt(frame, "truncated length prefix"));
        }
        let mut len_buf = [0u8; LEN_PREFIX];
        len_buf.copy_from_slice(&bytes[offset..offset + LEN_PREFIX]);
        let len = u32::from_le_bytes(len_buf) as usize;
        offset += LEN_PREFIX;

        if len > MAX_FRAME_SIZE {
            return Err(corrupt(frame, &format!("frame length {len} exceeds limit")));
        }
        if bytes.len() - offset < len {
            return Err(corrupt(
                frame,
                &format!("truncated body: expected {len} bytes, found {}", bytes.len() - offset),
            ));
        }

        let record: MemoryRecord = serde_json::from_slice(&bytes[offset..offset + len])
            .map_err(|e| corrupt(frame, &format!("invalid record: {e}")))?;
        let memory = record.into_memory(frame)?;
        if !seen.insert(memory.uuid) {
            return Err(corrupt(frame, &format!("duplicate uuid {}", memory.uuid)));
        }
        memories.push(memory);

        offset += len;
        frame += 1;
    }

    Ok(memories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BanterError;
    use std::collections::BTreeSet;

    fn memory(summary: &str) -> Memory {
        Memory {
            keywords: BTreeSet::from(["weather".to_string()]),
            summary: summary.to_string(),
            impact: 3,
            timestamp: 100,
            messages: vec![
                Message::user("Is it raining?".to_string()).with_name(Some("Ann".to_string())),
                Message::assistant("Yes.".to_string()),
            ],
            uuid: Uuid::new_v4(),
        }
    }

    fn frame(body: &[u8]) -> Vec<u8> {
        let mut buf = (body.len() as u32).to_le_bytes().to_vec();
        buf.extend_from_slice(body);
        buf
    }

    fn assert_corrupt(result: Result<Vec<Memory>>) {
        match result {
            Err(BanterError::Memory(MemoryError::Corruption(_))) => {}
            other => panic!("应返回 Corruption 错误，实际: {other:?}"),
        }
    }

    #[test]
    fn test_decode_empty_input() {
        assert!(decode_memories(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_decode_preserves_order_and_fields() {
        let a = memory("first");
        let b = memory("second");
        let bytes = encode_memories([&a, &b]).unwrap();
        let decoded = decode_memories(&bytes).unwrap();
        assert_eq!(decoded, vec![a, b]);
    }

    #[test]
    fn test_absent_name_is_omitted() {
        let m = memory("x");
        let bytes = encode_memories([&m]).unwrap();
        let body = std::str::from_utf8(&bytes[LEN_PREFIX..]).unwrap();
        assert_eq!(body.matches("\"name\"").count(), 1);
    }

    #[test]
    fn test_truncated_input() {
        let bytes = encode_memories([&memory("a"), &memory("b")]).unwrap();
        assert_corrupt(decode_memories(&bytes[..bytes.len() - 3]));
        assert_corrupt(decode_memories(&bytes[..2]));
    }

    #[test]
    fn test_garbage_body() {
        assert_corrupt(decode_memories(&frame(b"not json at all")));
    }

    #[test]
    fn test_oversized_length_prefix() {
        let bytes = (u32::MAX).to_le_bytes().to_vec();
        assert_corrupt(decode_memories(&bytes));
    }

    #[test]
    fn test_duplicate_uuid() {
        let m = memory("dup");
        let bytes = encode_memories([&m, &m]).unwrap();
        assert_corrupt(decode_memories(&bytes));
    }

    #[test]
    fn test_empty_messages_and_uuid() {
        let no_messages = serde_json::json!({
            "keywords": ["a"], "summary": "s", "impact": 1, "timestamp": 1,
            "messages": [], "uuid": Uuid::new_v4().to_string()
        });
        assert_corrupt(decode_memories(&frame(no_messages.to_string().as_bytes())));

        let no_uuid = serde_json::json!({
            "keywords": ["a"], "summary": "s", "impact": 1, "timestamp": 1,
            "messages": [{"role": "user", "content": "hi"}], "uuid": ""
        });
        assert_corrupt(decode_memories(&frame(no_uuid.to_string().as_bytes())));
    }

    #[test]
    fn test_decode_normalizes_keywords() {
        let record = serde_json::json!({
            "keywords": [" Weather", "weather", "", "TRAVEL"], "summary": "s", "impact": 1,
            "timestamp": 1, "messages": [{"role": "user", "content": "hi"}],
            "uuid": Uuid::new_v4().to_string()
        });
        let decoded = decode_memories(&frame(record.to_string().as_bytes())).unwrap();
        assert_eq!(
            decoded[0].keywords,
            BTreeSet::from(["travel".to_string(), "weather".to_string()])
        );
    }
}

//! Mock 关键词提取器
//!
//! 预设结果按顺序消费；队列耗尽后退化为"按空白切分 + 小写"，
//! 这样不关心关键词细节的测试无需逐条脚本化。

use crate::error::{BanterError, KeywordError, Result};
use crate::keywords::KeywordExtractor;
use crate::memory::normalize_keywords;
use async_trait::async_trait;
use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex};

enum MockKeywordResponse {
    Keywords(BTreeSet<String>),
    Err(BanterError),
}

pub struct MockKeywordExtractor {
    responses: Arc<Mutex<VecDeque<MockKeywordResponse>>>,
    /// 每次调用时收到的文本
    calls: Arc<Mutex<Vec<String>>>,
}

impl Default for MockKeywordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockKeywordExtractor {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// 追加一次提取结果
    pub fn with_keywords<I, S>(self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockKeywordResponse::Keywords(normalize_keywords(keywords)));
        self
    }

    /// 追加一次提取失败
    pub fn with_failure(self, msg: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockKeywordResponse::Err(
                KeywordError::Unavailable(msg.into()).into(),
            ));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl KeywordExtractor for MockKeywordExtractor {
    async fn extract(&self, text: &str) -> Result<BTreeSet<String>> {
        self.calls.lock().unwrap().push(text.to_string());
        match self.responses.lock().unwrap().pop_front() {
            Some(MockKeywordResponse::Keywords(keywords)) => Ok(keywords),
            Some(MockKeywordResponse::Err(e)) => Err(e),
            None => Ok(normalize_keywords(text.split_whitespace())),
        }
    }
}

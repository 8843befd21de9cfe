//! 关键词提取
//!
//! 记忆的索引和召回都以关键词为单位。提取器本身被视为外部能力，
//! 这里提供两种实现：
//!
//! - [`SimpleKeywordExtractor`]：本地分词 + 停用词过滤，零网络请求
//! - [`LlmKeywordExtractor`]：让 LLM 列出关键词，质量更高但有调用成本

use crate::error::{KeywordError, Result};
use crate::llm::LlmClient;
use crate::llm::types::Message;
use crate::memory::normalize_keywords;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

/// 文本 → 归一化关键词集合
#[async_trait]
pub trait KeywordExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<BTreeSet<String>>;
}

const STOPWORDS: &[&str] = &[
    "about", "above", "after", "again", "all", "also", "and", "any", "are", "because", "been",
    "before", "being", "but", "can", "could", "did", "does", "doing", "don", "down", "each", "few",
    "for", "from", "had", "has", "have", "having", "her", "here", "hers", "him", "his", "how",
    "into", "its", "just", "like", "more", "most", "not", "now", "off", "once", "only", "other",
    "our", "ours", "out", "over", "own", "same", "she", "should", "some", "such", "than", "that",
    "the", "their", "them", "then", "there", "these", "they", "this", "those", "through", "too",
    "under", "until", "very", "was", "were", "what", "when", "where", "which", "while", "who",
    "whom", "why", "will", "with", "would", "yes", "you", "your", "yours",
];

/// 本地关键词提取：按非字母数字切分、小写化、去停用词、去掉简单复数
pub struct SimpleKeywordExtractor {
    min_len: usize,
    stopwords: HashSet<&'static str>,
}

impl Default for SimpleKeywordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SimpleKeywordExtractor {
    pub fn new() -> Self {
        Self {
            min_len: 3,
            stopwords: STOPWORDS.iter().copied().collect(),
        }
    }

    pub fn min_len(mut self, min_len: usize) -> Self {
        self.min_len = min_len;
        self
    }

    pub fn tokenize(&self, text: &str) -> BTreeSet<String> {
        text.split(|c: char| !c.is_alphanumeric() && c != '\'')
            .map(|s| {
                let s = s.to_lowercase();
                s.trim_end_matches("'s").trim_matches('\'').to_string()
            })
            .filter(|s| s.chars().count() >= self.min_len)
            .filter(|s| !s.chars().all(char::is_numeric))
            .filter(|s| !self.stopwords.contains(s.as_str()))
            .map(|s| singularize(&s))
            .collect()
    }
}

fn singularize(word: &str) -> String {
    let keep = ["ss", "us", "is"].iter().any(|suffix| word.ends_with(suffix));
    if word.len() > 3 && word.ends_with('s') && !keep {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

#[async_trait]
impl KeywordExtractor for SimpleKeywordExtractor {
    async fn extract(&self, text: &str) -> Result<BTreeSet<String>> {
        Ok(self.tokenize(text))
    }
}

const KEYWORD_PROMPT: &str = "Extract the key topics, named entities and important nouns from the \
text below. Answer with a single comma-separated list of lowercase lemmatized keywords and nothing \
else. If there are none, answer with NONE.";

/// 基于 LLM 的关键词提取
pub struct LlmKeywordExtractor {
    llm: Arc<dyn LlmClient>,
    max_keywords: usize,
}

impl LlmKeywordExtractor {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            max_keywords: 12,
        }
    }

    pub fn max_keywords(mut self, max_keywords: usize) -> Self {
        self.max_keywords = max_keywords;
        self
    }

    fn parse(&self, output: &str) -> Result<BTreeSet<String>> {
        let output = output.trim();
        if output.eq_ignore_ascii_case("none") {
            return Ok(BTreeSet::new());
        }
        let keywords = normalize_keywords(
            output
                .split([',', '\n'])
                .map(|k| k.trim().trim_matches(|c: char| c == '.' || c == '"' || c == '-'))
                .take(self.max_keywords),
        );
        if keywords.is_empty() {
            return Err(KeywordError::InvalidOutput(output.to_string()).into());
        }
        Ok(keywords)
    }
}

#[async_trait]
impl KeywordExtractor for LlmKeywordExtractor {
    async fn extract(&self, text: &str) -> Result<BTreeSet<String>> {
        if text.trim().is_empty() {
            return Ok(BTreeSet::new());
        }
        let output = self
            .llm
            .chat_simple(vec![
                Message::system(KEYWORD_PROMPT.to_string()),
                Message::user(text.to_string()),
            ])
            .await?;
        self.parse(&output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockLlmClient;

    #[tokio::test]
    async fn test_simple_extractor() {
        let extractor = SimpleKeywordExtractor::new();
        let keywords = extractor
            .extract("What's the weather like for my trip to Paris? The flights are booked.")
            .await
            .unwrap();
        assert!(keywords.contains("weather"));
        assert!(keywords.contains("paris"));
        assert!(keywords.contains("flight"));
        assert!(keywords.contains("trip"));
        assert!(!keywords.contains("the"));
        assert!(!keywords.contains("my"));
    }

    #[test]
    fn test_singularize_keeps_double_s() {
        assert_eq!(singularize("glass"), "glass");
        assert_eq!(singularize("cats"), "cat");
        assert_eq!(singularize("bus"), "bus");
        assert_eq!(singularize("paris"), "paris");
    }

    #[tokio::test]
    async fn test_llm_extractor_parses_list() {
        let llm = Arc::new(MockLlmClient::new().with_response("Weather, travel,  Paris.\n"));
        let extractor = LlmKeywordExtractor::new(llm.clone());
        let keywords = extractor.extract("Rain in Paris during my trip").await.unwrap();
        assert_eq!(
            keywords,
            BTreeSet::from(["paris".to_string(), "travel".to_string(), "weather".to_string()])
        );
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_llm_extractor_none() {
        let llm = Arc::new(MockLlmClient::new().with_response("NONE"));
        let extractor = LlmKeywordExtractor::new(llm);
        assert!(extractor.extract("hmm").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_llm_extractor_blank_text_skips_call() {
        let llm = Arc::new(MockLlmClient::new());
        let extractor = LlmKeywordExtractor::new(llm.clone());
        assert!(extractor.extract("   ").await.unwrap().is_empty());
        assert_eq!(llm.call_count(), 0);
    }
}

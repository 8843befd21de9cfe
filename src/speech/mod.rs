//! 语音能力接口
//!
//! 语音合成与语音识别都是外部能力，对话核心只依赖这里的两个 trait。
//! 两者都以事件流的形式返回进度，并接受一个 [`CancellationToken`] 用于打断。

mod console;

pub use console::{ConsoleRecognizer, ConsoleSynthesizer};

use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// 合成过程中正在朗读的一个词
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    /// 相对朗读开始的偏移
    pub offset: Duration,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisEvent {
    Started,
    Word(Word),
    Completed,
    /// 被取消，之后不会再有事件
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    Started,
    /// 识别出的一句话
    Recognized(String),
    Completed,
}

pub type SynthesisStream = BoxStream<'static, Result<SynthesisEvent>>;
pub type RecognitionStream = BoxStream<'static, Result<RecognitionEvent>>;

/// 文本 → 朗读进度事件
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn speak(&self, text: &str, cancel: CancellationToken) -> Result<SynthesisStream>;
}

/// 麦克风（或其他输入）→ 识别出的句子，惰性产生
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn listen(&self, cancel: CancellationToken) -> Result<RecognitionStream>;
}

/// 按语速把文本切成带时间轴的词
pub fn split_words(text: &str, words_per_minute: u32) -> Vec<Word> {
    let per_word = Duration::from_millis(60_000 / u64::from(words_per_minute.max(1)));
    text.split_whitespace()
        .enumerate()
        .map(|(i, w)| Word {
            text: w.to_string(),
            offset: per_word * i as u32,
            duration: per_word,
        })
        .collect()
}

/// 把一段识别文本按句末标点切成句子
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        current.push(c);
        if matches!(c, '.' | '!' | '?' | '。' | '！' | '？') {
            let sentence = current.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            current.clear();
        }
    }
    let rest = current.trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words_timeline() {
        let words = split_words("hello  there world", 120);
        assert_eq!(words.len(), 3);
        assert_eq!(words[1].text, "there");
        assert_eq!(words[1].offset, Duration::from_millis(500));
        assert_eq!(words[2].offset, Duration::from_millis(1000));
        assert!(split_words("   ", 120).is_empty());
    }

    #[test]
    fn test_split_sentences() {
        assert_eq!(
            split_sentences("Hi there. How are you?  fine"),
            vec!["Hi there.", "How are you?", "fine"]
        );
        assert!(split_sentences("  ").is_empty());
    }
}

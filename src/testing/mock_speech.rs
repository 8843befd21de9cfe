//! Mock 语音合成 / 识别

use crate::error::{BanterError, Result, SpeechError};
use crate::speech::{
    RecognitionEvent, RecognitionStream, Recognizer, SynthesisEvent, SynthesisStream, Synthesizer,
    Word,
};
use async_trait::async_trait;
use futures::stream;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// 记录被朗读的文本，立即产生全部词事件（不等待）
#[derive(Default)]
pub struct MockSynthesizer {
    spoken: Arc<Mutex<Vec<String>>>,
}

impl MockSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl Synthesizer for MockSynthesizer {
    async fn speak(&self, text: &str, cancel: CancellationToken) -> Result<SynthesisStream> {
        self.spoken.lock().unwrap().push(text.to_string());

        let mut events: Vec<Result<SynthesisEvent>> = vec![Ok(SynthesisEvent::Started)];
        if cancel.is_cancelled() {
            events.push(Ok(SynthesisEvent::Interrupted));
        } else {
            events.extend(text.split_whitespace().enumerate().map(|(i, w)| {
                Ok(SynthesisEvent::Word(Word {
                    text: w.to_string(),
                    offset: Duration::from_millis(100 * i as u64),
                    duration: Duration::from_millis(100),
                }))
            }));
            events.push(Ok(SynthesisEvent::Completed));
        }
        Ok(Box::pin(stream::iter(events)))
    }
}

/// 按脚本产生识别结果
#[derive(Default)]
pub struct MockRecognizer {
    sentences: Vec<String>,
    failure: Option<String>,
}

impl MockRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sentence(mut self, sentence: impl Into<String>) -> Self {
        self.sentences.push(sentence.into());
        self
    }

    /// 识别到脚本末尾后产生一个错误，而不是 `Completed`
    pub fn with_failure(mut self, msg: impl Into<String>) -> Self {
        self.failure = Some(msg.into());
        self
    }
}

#[async_trait]
impl Recognizer for MockRecognizer {
    async fn listen(&self, cancel: CancellationToken) -> Result<RecognitionStream> {
        let mut events: Vec<Result<RecognitionEvent>> = vec![Ok(RecognitionEvent::Started)];
        if !cancel.is_cancelled() {
            events.extend(
                self.sentences
                    .iter()
                    .map(|s| Ok(RecognitionEvent::Recognized(s.clone()))),
            );
        }
        match &self.failure {
            Some(msg) => events.push(Err(BanterError::from(SpeechError::RecognitionFailed(
                msg.clone(),
            )))),
            None => events.push(Ok(RecognitionEvent::Completed)),
        }
        Ok(Box::pin(stream::iter(events)))
    }
}

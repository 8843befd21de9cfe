use std::io::Write as _;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use super::{
    RecognitionEvent, RecognitionStream, Recognizer, SynthesisEvent, SynthesisStream, Synthesizer,
    split_sentences, split_words,
};
use crate::error::{BanterError, Result, SpeechError};

/// 终端“朗读”：按语速逐词打印到 stdout，并产生对应的词事件
pub struct ConsoleSynthesizer {
    words_per_minute: u32,
    echo: bool,
}

impl Default for ConsoleSynthesizer {
    fn default() -> Self {
        Self::new(180)
    }
}

impl ConsoleSynthesizer {
    pub fn new(words_per_minute: u32) -> Self {
        Self {
            words_per_minute,
            echo: true,
        }
    }

    /// 关闭终端输出，只产生事件
    pub fn silent(mut self) -> Self {
        self.echo = false;
        self
    }
}

#[async_trait]
impl Synthesizer for ConsoleSynthesizer {
    async fn speak(&self, text: &str, cancel: CancellationToken) -> Result<SynthesisStream> {
        let words = split_words(text, self.words_per_minute);
        let echo = self.echo;

        let stream = async_stream::stream! {
            yield Ok::<_, BanterError>(SynthesisEvent::Started);
            let mut interrupted = cancel.is_cancelled();
            if !interrupted {
                for word in words {
                    if echo {
                        print!("{} ", word.text);
                        let _ = std::io::stdout().flush();
                    }
                    let duration = word.duration;
                    yield Ok(SynthesisEvent::Word(word));
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            interrupted = true;
                            break;
                        }
                        _ = tokio::time::sleep(duration) => {}
                    }
                }
            }
            if echo {
                println!();
            }
            if interrupted {
                yield Ok(SynthesisEvent::Interrupted);
            } else {
                yield Ok(SynthesisEvent::Completed);
            }
        };
        Ok(Box::pin(stream))
    }
}

/// 终端“识别”：从 stdin 读一行，把其中的句子当作识别结果
pub struct ConsoleRecognizer;

#[async_trait]
impl Recognizer for ConsoleRecognizer {
    async fn listen(&self, cancel: CancellationToken) -> Result<RecognitionStream> {
        let stream = async_stream::try_stream! {
            yield RecognitionEvent::Started;
            print!("🎤 ");
            let _ = std::io::stdout().flush();

            let mut reader = BufReader::new(tokio::io::stdin());
            let mut line = String::new();
            let read = tokio::select! {
                _ = cancel.cancelled() => None,
                r = reader.read_line(&mut line) => Some(r),
            };
            if let Some(read) = read {
                read.map_err(|e| BanterError::from(SpeechError::RecognitionFailed(e.to_string())))?;
                for sentence in split_sentences(&line) {
                    yield RecognitionEvent::Recognized(sentence);
                }
            }
            yield RecognitionEvent::Completed;
        };
        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_console_synthesizer_emits_words() {
        let synth = ConsoleSynthesizer::new(60_000).silent();
        let events: Vec<_> = synth
            .speak("one two three", CancellationToken::new())
            .await
            .unwrap()
            .map(|e| e.unwrap())
            .collect()
            .await;

        assert_eq!(events.len(), 5);
        assert_eq!(events[0], SynthesisEvent::Started);
        assert!(matches!(&events[2], SynthesisEvent::Word(w) if w.text == "two"));
        assert_eq!(events[4], SynthesisEvent::Completed);
    }

    #[tokio::test]
    async fn test_console_synthesizer_interrupted() {
        let synth = ConsoleSynthesizer::new(1).silent();
        let cancel = CancellationToken::new();
        let mut stream = synth.speak("a long sentence", cancel.clone()).await.unwrap();

        assert_eq!(stream.next().await.unwrap().unwrap(), SynthesisEvent::Started);
        assert!(matches!(
            stream.next().await.unwrap().unwrap(),
            SynthesisEvent::Word(_)
        ));
        cancel.cancel();
        assert_eq!(stream.next().await.unwrap().unwrap(), SynthesisEvent::Interrupted);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let synth = ConsoleSynthesizer::default().silent();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let events: Vec<_> = synth
            .speak("hello", cancel)
            .await
            .unwrap()
            .map(|e| e.unwrap())
            .collect()
            .await;
        assert_eq!(events, vec![SynthesisEvent::Started, SynthesisEvent::Interrupted]);
    }
}

mod client;
pub mod config;
pub mod types;

use crate::error::{BanterError, LlmError, Result};
use crate::llm::client::{post, post_stream};
use crate::llm::config::ModelConfig;
use crate::llm::types::{ChatCompletionRequest, Message};
use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use reqwest::Client;
use reqwest::header::HeaderMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub fn assemble_req_header(model: &ModelConfig) -> Result<HeaderMap> {
    let mut header_map = HeaderMap::new();

    header_map.insert(
        "Authorization",
        format!("Bearer {}", model.apikey)
            .parse()
            .map_err(|e| BanterError::Other(format!("Invalid Authorization header: {}", e)))?,
    );
    header_map.insert(
        "Content-Type",
        "application/json"
            .parse()
            .map_err(|e| BanterError::Other(format!("Invalid Content-Type header: {}", e)))?,
    );
    Ok(header_map)
}

/// 语言模型补全能力接口。
///
/// 对话管理器、摘要、关键词提取都只依赖这个 trait，便于替换成其他服务商或测试用的 Mock。
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 发起一次对话，返回模型的完整文本
    async fn chat_simple(&self, messages: Vec<Message>) -> Result<String>;

    /// 流式对话，逐段返回文本。默认实现退化为一次性返回
    async fn chat_stream(&self, messages: Vec<Message>) -> Result<BoxStream<'static, Result<String>>> {
        let text = self.chat_simple(messages).await?;
        Ok(Box::pin(stream::once(async move { Ok(text) })))
    }
}

/// 单次重试等待的上限
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// 基于 OpenAI 兼容 `/chat/completions` 接口的默认实现
pub struct DefaultLlmClient {
    client: Arc<Client>,
    model: ModelConfig,
    temperature: f32,
    max_tokens: u32,
    /// 限流 / 服务端错误时的最大重试次数
    max_retries: usize,
    retry_delay: Duration,
}

impl DefaultLlmClient {
    pub fn new(client: Arc<Client>, model: ModelConfig) -> Self {
        Self {
            client,
            model,
            temperature: 0.7,
            max_tokens: 1024,
            max_retries: 2,
            retry_delay: Duration::from_millis(250),
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn request(&self, messages: Vec<Message>, stream: bool) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.model.clone(),
            messages,
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            stream: Some(stream),
        }
    }

    /// 只有限流、服务端错误和网络错误值得重试
    fn is_retryable(err: &BanterError) -> bool {
        match err {
            BanterError::Llm(LlmError::ApiError { status, .. }) => {
                *status == 429 || *status >= 500
            }
            BanterError::Llm(LlmError::NetworkError(_)) => true,
            _ => false,
        }
    }

    /// 指数退避，封顶 [`MAX_RETRY_DELAY`]
    fn backoff_delay(&self, attempt: usize) -> Duration {
        let factor = 2u32.saturating_pow(u32::try_from(attempt).unwrap_or(u32::MAX));
        self.retry_delay.saturating_mul(factor).min(MAX_RETRY_DELAY)
    }

    async fn backoff(&self, attempt: usize, err: &BanterError) {
        let delay = self.backoff_delay(attempt);
        warn!(attempt = attempt + 1, delay_ms = delay.as_millis() as u64, "⚠️ LLM 调用失败，准备重试: {err}");
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl LlmClient for DefaultLlmClient {
    async fn chat_simple(&self, messages: Vec<Message>) -> Result<String> {
        let request = self.request(messages, false);
        let header_map = assemble_req_header(&self.model)?;

        let mut attempt = 0;
        let response = loop {
            match post(
                self.client.clone(),
                &request,
                header_map.clone(),
                &self.model.baseurl,
            )
            .await
            {
                Ok(response) => break response,
                Err(e) if attempt < self.max_retries && Self::is_retryable(&e) => {
                    self.backoff(attempt, &e).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        };

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| LlmError::EmptyResponse.into())
    }

    async fn chat_stream(&self, messages: Vec<Message>) -> Result<BoxStream<'static, Result<String>>> {
        let request = self.request(messages, true);
        let header_map = assemble_req_header(&self.model)?;

        let mut attempt = 0;
        loop {
            match post_stream(
                self.client.clone(),
                &request,
                header_map.clone(),
                &self.model.baseurl,
            )
            .await
            {
                Ok(stream) => return Ok(stream),
                Err(e) if attempt < self.max_retries && Self::is_retryable(&e) => {
                    self.backoff(attempt, &e).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        let rate_limited = BanterError::Llm(LlmError::ApiError {
            status: 429,
            message: "Too Many Requests".to_string(),
        });
        let bad_request = BanterError::Llm(LlmError::ApiError {
            status: 400,
            message: "bad".to_string(),
        });
        assert!(DefaultLlmClient::is_retryable(&rate_limited));
        assert!(!DefaultLlmClient::is_retryable(&bad_request));
        assert!(!DefaultLlmClient::is_retryable(&BanterError::Interrupted));
    }

    #[test]
    fn test_backoff_delay_is_capped() {
        let model = ModelConfig {
            model: "gpt-4o-mini".to_string(),
            baseurl: "http://localhost".to_string(),
            apikey: "sk-test".to_string(),
        };
        let client = DefaultLlmClient::new(Arc::new(Client::new()), model).max_retries(64);
        assert_eq!(client.backoff_delay(0), Duration::from_millis(250));
        assert_eq!(client.backoff_delay(2), Duration::from_millis(1000));
        assert_eq!(client.backoff_delay(40), MAX_RETRY_DELAY);
        assert_eq!(client.backoff_delay(usize::MAX), MAX_RETRY_DELAY);
    }

    #[test]
    fn test_auth_header() {
        let model = ModelConfig {
            model: "gpt-4o-mini".to_string(),
            baseurl: "http://localhost".to_string(),
            apikey: "sk-test".to_string(),
        };
        let headers = assemble_req_header(&model).unwrap();
        assert_eq!(headers["Authorization"], "Bearer sk-test");
    }
}

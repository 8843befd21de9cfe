//! 对话管理
//!
//! [`ConversationManager`] 持有当前会话缓冲区，负责：
//!
//! 1. 每轮回复前按关键词召回相关记忆，作为 system 消息注入提示词
//! 2. 在策略触发或会话结束时把未折叠的消息归纳成一条 [`Memory`]
//! 3. 把每条消息追加到纯文本聊天记录
//!
//! 所有 LLM / 关键词提取调用都在访问 store 之前完成，store 只承担一次短暂的加锁写入。
//! 外部能力失败时降级为"本轮不使用记忆"，不会中断对话；
//! 取消（[`BanterError::Interrupted`]）则不会对 store 产生任何修改。
//!
//! 会话缓冲区只追加：`folded_upto` 之前的消息已经写入记忆，
//! 之后的消息在下一次折叠时归档，折叠失败时保留原样等待重试。

mod config;
pub mod policy;
pub mod prompt;
pub mod transcript;

pub use config::ConversationConfig;
pub use policy::FoldPolicy;
pub use transcript::TranscriptLog;

use crate::compression::compressor::{
    DefaultSummaryPrompt, SlidingWindowCompressor, SummaryPromptBuilder, render_transcript,
};
use crate::compression::{CompressionInput, ContextCompressor, estimate_tokens};
use crate::error::{BanterError, LlmError, MemoryError, Result};
use crate::keywords::KeywordExtractor;
use crate::llm::LlmClient;
use crate::llm::types::{Message, Role};
use crate::memory::{Clock, Memory, MemoryStore, SystemClock};
use crate::speech::{RecognitionEvent, Recognizer};
use futures::StreamExt;
use futures::stream::BoxStream;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 流式回复事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyEvent {
    Token(String),
    /// 完整回复，已写入会话
    Final(String),
}

pub struct ConversationManager {
    llm: Arc<dyn LlmClient>,
    extractor: Arc<dyn KeywordExtractor>,
    store: Arc<MemoryStore>,
    config: ConversationConfig,
    summary_prompt: Box<dyn SummaryPromptBuilder>,
    window: SlidingWindowCompressor,
    clock: Arc<dyn Clock>,
    transcript: Option<TranscriptLog>,
    session: Vec<Message>,
    /// `session[..folded_upto]` 已经归档为记忆
    folded_upto: usize,
    /// 最早一条未折叠消息的时间
    pending_since: Option<i64>,
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(BanterError::Interrupted),
        result = fut => result,
    }
}

impl ConversationManager {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        extractor: Arc<dyn KeywordExtractor>,
        store: Arc<MemoryStore>,
        config: ConversationConfig,
    ) -> Self {
        Self {
            llm,
            extractor,
            store,
            window: SlidingWindowCompressor::new(config.prompt_window),
            config,
            summary_prompt: Box::new(DefaultSummaryPrompt),
            clock: Arc::new(SystemClock),
            transcript: None,
            session: Vec::new(),
            folded_upto: 0,
            pending_since: None,
        }
    }

    /// 折叠策略计算消息存活时间使用的时钟
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_transcript(mut self, transcript: TranscriptLog) -> Self {
        self.transcript = Some(transcript);
        self
    }

    pub fn with_summary_prompt(mut self, prompt: impl SummaryPromptBuilder + 'static) -> Self {
        self.summary_prompt = Box::new(prompt);
        self
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    pub fn config(&self) -> &ConversationConfig {
        &self.config
    }

    /// 当前会话的全部消息
    pub fn messages(&self) -> &[Message] {
        &self.session
    }

    /// 尚未归档的消息
    pub fn pending(&self) -> &[Message] {
        &self.session[self.folded_upto..]
    }

    async fn push(&mut self, message: Message) {
        if let Some(log) = &self.transcript
            && let Err(e) = log.append(&message).await
        {
            warn!(path = %log.path().display(), error = %e, "⚠️ 聊天记录写入失败");
        }
        if self.pending_since.is_none() {
            self.pending_since = Some(self.clock.now());
        }
        self.session.push(message);
    }

    /// 追加一条用户消息
    pub async fn send_message(&mut self, content: impl Into<String>, name: Option<String>) {
        let message = Message::user(content.into()).with_name(name);
        debug!(name = ?message.name, chars = message.content.len(), "💬 用户消息");
        self.push(message).await;
    }

    /// 按 `text` 中的关键词召回记忆。
    ///
    /// 关键词提取失败或为空时返回空列表，不影响对话。
    pub async fn recall(&self, text: &str) -> Vec<Memory> {
        let limit = self.config.recall_limit;
        if limit == 0 || text.trim().is_empty() {
            return Vec::new();
        }
        let keywords = match self.extractor.extract(text).await {
            Ok(keywords) => keywords,
            Err(e) => {
                warn!(error = %e, "⚠️ 关键词提取失败，本轮不使用记忆");
                return Vec::new();
            }
        };
        if keywords.is_empty() {
            return Vec::new();
        }

        let memories = match self.config.fuzzy_threshold {
            Some(threshold) => self.store.query_fuzzy(&keywords, limit, threshold).await,
            None => self.store.query(&keywords, limit).await,
        };
        if !memories.is_empty() {
            info!(keywords = ?keywords, recalled = memories.len(), "🧠 召回相关记忆");
        }
        memories
    }

    /// 最近几条消息拼成的文本，作为召回关键词的来源
    fn recent_context(&self) -> String {
        let start = self.session.len().saturating_sub(self.config.keyword_context);
        self.session[start..]
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// 组装本轮发送给 LLM 的消息：人设、召回的记忆、最近的会话窗口
    pub async fn context(&self) -> Result<Vec<Message>> {
        let recalled = self.recall(&self.recent_context()).await;

        let mut messages = vec![Message::system(self.config.persona.clone())];
        messages.extend(prompt::memory_context(&recalled));

        let output = self
            .window
            .compress(CompressionInput {
                messages: self.session.clone(),
                token_limit: self.config.token_limit.saturating_sub(estimate_tokens(&messages)),
            })
            .await?;
        if !output.evicted.is_empty() {
            debug!(evicted = output.evicted.len(), "✂️ 会话窗口裁剪");
        }
        messages.extend(output.messages);
        Ok(messages)
    }

    /// 生成一条助手回复并写入会话。取消时会话不变。
    pub async fn respond(&mut self, cancel: CancellationToken) -> Result<String> {
        let messages = cancellable(&cancel, self.context()).await?;
        let reply = cancellable(&cancel, self.llm.chat_simple(messages)).await?;
        self.push(Message::assistant(reply.clone())).await;
        Ok(reply)
    }

    /// 流式回复：逐段产生 [`ReplyEvent::Token`]，结束时写入会话并产生 [`ReplyEvent::Final`]。
    ///
    /// 中途取消或出错时已输出的片段不会写入会话。
    pub async fn respond_stream(
        &mut self,
        cancel: CancellationToken,
    ) -> Result<BoxStream<'_, Result<ReplyEvent>>> {
        let messages = cancellable(&cancel, self.context()).await?;
        let mut chunks = cancellable(&cancel, self.llm.chat_stream(messages)).await?;
        let this = self;

        let stream = async_stream::try_stream! {
            let mut reply = String::new();
            loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(BanterError::Interrupted),
                    chunk = chunks.next() => Ok(chunk),
                }?;
                match next {
                    Some(chunk) => {
                        let chunk = chunk?;
                        reply.push_str(&chunk);
                        yield ReplyEvent::Token(chunk);
                    }
                    None => break,
                }
            }

            let reply = reply.trim().to_string();
            if reply.is_empty() {
                Err::<(), BanterError>(LlmError::EmptyResponse.into())?;
            }
            this.push(Message::assistant(reply.clone())).await;
            yield ReplyEvent::Final(reply);
        };
        Ok(Box::pin(stream))
    }

    /// 追加用户消息并立即回复
    pub async fn prompt(
        &mut self,
        content: impl Into<String>,
        name: Option<String>,
        cancel: CancellationToken,
    ) -> Result<String> {
        self.send_message(content, name).await;
        self.respond(cancel).await
    }

    /// 监听一次语音输入，识别出的句子合并为一条用户消息
    pub async fn listen(
        &mut self,
        recognizer: &dyn Recognizer,
        name: Option<String>,
        cancel: CancellationToken,
    ) -> Result<Option<String>> {
        let mut events = recognizer.listen(cancel.clone()).await?;
        let mut sentences = Vec::new();
        while let Some(event) = events.next().await {
            match event? {
                RecognitionEvent::Recognized(sentence) => sentences.push(sentence),
                RecognitionEvent::Completed => break,
                RecognitionEvent::Started => {}
            }
        }
        if cancel.is_cancelled() {
            return Err(BanterError::Interrupted);
        }

        let text = sentences.join(" ").trim().to_string();
        if text.is_empty() {
            return Ok(None);
        }
        self.send_message(text.clone(), name).await;
        Ok(Some(text))
    }

    /// 把未折叠的消息归纳成一条记忆。
    ///
    /// - 没有待折叠消息时返回 `Ok(None)`
    /// - 摘要 / 关键词提取失败、关键词为空或 store 校验失败时返回 `Ok(None)`，消息保留到下次折叠
    /// - 影响分无法获得时使用配置的默认值
    /// - 取消时返回 [`BanterError::Interrupted`]，store 不变
    pub async fn fold(&mut self, cancel: CancellationToken) -> Result<Option<Memory>> {
        let upto = self.session.len();
        let pending = self.session[self.folded_upto..upto].to_vec();
        if pending.is_empty() {
            return Ok(None);
        }
        info!(messages = pending.len(), "🗂️ 开始折叠会话");

        let request = vec![Message::user(self.summary_prompt.build(&pending))];
        let summary = match cancellable(&cancel, self.llm.chat_simple(request)).await {
            Ok(summary) => summary,
            Err(BanterError::Interrupted) => return Err(BanterError::Interrupted),
            Err(e) => {
                warn!(error = %e, "⚠️ 会话摘要失败，消息保留到下次折叠");
                return Ok(None);
            }
        };

        let default_impact = self.config.default_impact;
        let impact = match cancellable(&cancel, self.llm.chat_simple(prompt::impact_request(&summary))).await {
            Ok(text) => prompt::parse_impact(&text).unwrap_or_else(|| {
                warn!(reply = %text, default_impact, "⚠️ 影响分无法解析，使用默认值");
                default_impact
            }),
            Err(BanterError::Interrupted) => return Err(BanterError::Interrupted),
            Err(e) => {
                warn!(error = %e, default_impact, "⚠️ 影响分打分失败，使用默认值");
                default_impact
            }
        };

        let transcript = render_transcript(&pending);
        let keywords = match cancellable(&cancel, self.extractor.extract(&transcript)).await {
            Ok(keywords) if !keywords.is_empty() => keywords,
            Ok(_) => {
                warn!("⚠️ 会话中没有提取到关键词，跳过本次记忆创建");
                return Ok(None);
            }
            Err(BanterError::Interrupted) => return Err(BanterError::Interrupted),
            Err(e) => {
                warn!(error = %e, "⚠️ 关键词提取失败，跳过本次记忆创建");
                return Ok(None);
            }
        };

        let memory = match self.store.create(pending, summary, impact, &keywords).await {
            Ok(memory) => memory,
            Err(BanterError::Memory(MemoryError::Validation(reason))) => {
                warn!(reason = %reason, "⚠️ 记忆校验失败，消息保留到下次折叠");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        self.folded_upto = upto;
        self.pending_since = None;

        if let Some(capacity) = self.config.store_capacity {
            let evicted = self.store.prune_keeping(capacity, memory.uuid).await;
            if !evicted.is_empty() {
                debug!(evicted = evicted.len(), capacity, "🧹 折叠后淘汰旧记忆");
            }
        }
        Ok(Some(memory))
    }

    /// 按折叠策略决定是否折叠
    pub async fn maybe_fold(&mut self, cancel: CancellationToken) -> Result<Option<Memory>> {
        let age = self
            .pending_since
            .map(|since| self.clock.now() - since)
            .unwrap_or(0);
        if self.config.fold_policy.should_fold(self.pending().len(), age) {
            debug!(pending = self.pending().len(), age, "⏱️ 折叠策略触发");
            self.fold(cancel).await
        } else {
            Ok(None)
        }
    }

    /// 结束会话：折叠剩余消息，全部归档后清空会话缓冲区
    pub async fn end_session(&mut self, cancel: CancellationToken) -> Result<Option<Memory>> {
        let memory = self.fold(cancel).await?;
        if self.pending().is_empty() {
            self.session.clear();
            self.folded_upto = 0;
            self.pending_since = None;
            info!("👋 会话已结束");
        } else {
            warn!(pending = self.pending().len(), "⚠️ 会话未能完整归档，保留未折叠的消息");
        }
        Ok(memory)
    }
}

use crate::llm::types::Message;

const SUMMARY_PROMPT: &str = "Step out of your role for a moment. Write a short, objective summary of the \
conversation below in the third person, the way a person would remember it afterwards. Keep the \
memorable topics, decisions and any personal details the user shared; skip greetings and small talk. \
Answer with the summary only.";

/// 摘要提示词构建接口，支持用户自定义摘要策略
pub trait SummaryPromptBuilder: Send + Sync {
    fn build(&self, messages: &[Message]) -> String;
}

/// 把消息渲染成 `role(name): content` 形式的逐行文本
pub fn render_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| match &m.name {
            Some(name) => format!("{}({}): {}", m.role, name, m.content),
            None => format!("{}: {}", m.role, m.content),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// 默认摘要提示词：把一段会话归纳成可长期保存的记忆摘要
pub struct DefaultSummaryPrompt;

impl SummaryPromptBuilder for DefaultSummaryPrompt {
    fn build(&self, messages: &[Message]) -> String {
        format!(
            "{SUMMARY_PROMPT}\n\n<conversation>\n{}\n</conversation>",
            render_transcript(messages)
        )
    }
}

/// 用闭包自定义提示词的便捷包装
///
/// # 示例
///
/// ```rust
/// use banter_bot::compression::compressor::FnSummaryPrompt;
///
/// let prompt = FnSummaryPrompt(|msgs: &[banter_bot::llm::types::Message]| {
///     format!("Summarize these {} messages in one sentence.", msgs.len())
/// });
/// ```
pub struct FnSummaryPrompt<F>(pub F)
where
    F: Fn(&[Message]) -> String + Send + Sync;

impl<F> SummaryPromptBuilder for FnSummaryPrompt<F>
where
    F: Fn(&[Message]) -> String + Send + Sync,
{
    fn build(&self, messages: &[Message]) -> String {
        (self.0)(messages)
    }
}

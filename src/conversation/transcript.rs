use crate::error::Result;
use crate::llm::types::Message;
use crate::memory::store::expand_tilde;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// 单次会话的纯文本聊天记录，只追加
#[derive(Debug, Clone)]
pub struct TranscriptLog {
    path: PathBuf,
}

impl TranscriptLog {
    /// 在 `dir` 下以会话开始时间命名：`chat_20240131T093000.txt`
    pub async fn create(dir: impl AsRef<Path>, started: DateTime<Local>) -> Result<Self> {
        let dir = expand_tilde(dir.as_ref());
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(format!("chat_{}.txt", started.format("%Y%m%dT%H%M%S")));
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, message: &Message) -> Result<()> {
        let line = format_line(Local::now(), message);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

fn format_line(at: DateTime<Local>, message: &Message) -> String {
    let speaker = match &message.name {
        Some(name) => format!("{}({})", message.role, name),
        None => message.role.to_string(),
    };
    format!(
        "[{}] {}: {}\n",
        at.format("%Y-%m-%d %H:%M:%S"),
        speaker,
        message.content
    )
}

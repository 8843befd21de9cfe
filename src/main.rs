use banter_bot::config::{AppConfig, ExtractorKind};
use banter_bot::conversation::{ConversationManager, ReplyEvent, TranscriptLog};
use banter_bot::error::{BanterError, Result};
use banter_bot::keywords::{KeywordExtractor, LlmKeywordExtractor, SimpleKeywordExtractor};
use banter_bot::llm::config::Config;
use banter_bot::llm::{DefaultLlmClient, LlmClient};
use banter_bot::memory::MemoryStore;
use banter_bot::speech::{ConsoleSynthesizer, SynthesisEvent, Synthesizer};
use clap::Parser;
use futures::StreamExt;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::Write as _;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// 带长期记忆的终端聊天机器人
#[derive(Parser, Debug)]
#[command(name = "banter-bot", version)]
struct Args {
    /// YAML 配置文件
    #[arg(short, long, env = "BANTER_CONFIG")]
    config: Option<String>,
    /// 模型名称（覆盖配置文件）
    #[arg(short, long)]
    model: Option<String>,
    /// 记忆文件路径（覆盖配置文件）
    #[arg(long)]
    memory: Option<String>,
    /// 你的名字，写入消息的 name 字段
    #[arg(short, long)]
    name: Option<String>,
    /// 逐词朗读回复
    #[arg(long)]
    speak: bool,
    /// 不写聊天记录
    #[arg(long)]
    no_transcript: bool,
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(args).await {
        if e.is_corruption() {
            eprintln!("❌ 记忆文件已损坏，未做任何修改: {e}");
        } else {
            eprintln!("❌ {e}");
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "banter_bot=debug" } else { "banter_bot=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_target(false)
        .init();
}

async fn run(args: Args) -> Result<()> {
    let mut app = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(model) = args.model {
        app.model = model;
    }
    if let Some(memory) = args.memory {
        app.memory_path = memory;
    }
    if args.no_transcript {
        app.transcript_dir = None;
    }

    let model = Config::from_env()?.get_model(&app.model)?;
    let llm: Arc<dyn LlmClient> = Arc::new(DefaultLlmClient::new(
        Arc::new(reqwest::Client::new()),
        model,
    ));
    let extractor: Arc<dyn KeywordExtractor> = match app.keyword_extractor {
        ExtractorKind::Simple => Arc::new(SimpleKeywordExtractor::new()),
        ExtractorKind::Llm => Arc::new(LlmKeywordExtractor::new(llm.clone())),
    };

    let store = Arc::new(MemoryStore::open(&app.memory_path).await?);
    info!(path = %app.memory_path, memories = store.len().await, "🚀 banter-bot 启动");

    let mut manager = ConversationManager::new(llm, extractor, store.clone(), app.conversation.clone());
    if let Some(dir) = &app.transcript_dir {
        match TranscriptLog::create(dir, chrono::Local::now()).await {
            Ok(log) => {
                info!(path = %log.path().display(), "📝 聊天记录");
                manager = manager.with_transcript(log);
            }
            Err(e) => warn!(dir = %dir, error = %e, "⚠️ 无法创建聊天记录，继续运行"),
        }
    }
    let synthesizer = args
        .speak
        .then(|| ConsoleSynthesizer::new(app.words_per_minute));

    let mut rl = DefaultEditor::new()
        .map_err(|e| BanterError::Other(format!("无法初始化终端输入: {e}")))?;
    println!("banter-bot  ·  /end 结束本段对话  /memories 查看记忆  /quit 退出\n");

    loop {
        match rl.readline("🙂 ") {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(input);

                match input {
                    "/quit" | "/exit" => break,
                    "/end" => {
                        end_session(&mut manager, &app.memory_path).await;
                        continue;
                    }
                    "/memories" => {
                        print_memories(&store).await;
                        continue;
                    }
                    _ => {}
                }

                manager.send_message(input, args.name.clone()).await;
                match reply(&mut manager, synthesizer.as_ref()).await {
                    Ok(()) => {}
                    Err(BanterError::Interrupted) => println!("（已打断）"),
                    Err(e) => eprintln!("❌ {e}"),
                }

                match manager.maybe_fold(CancellationToken::new()).await {
                    Ok(Some(_)) => persist(&store, &app.memory_path).await,
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "⚠️ 会话折叠失败"),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("❌ {e}");
                break;
            }
        }
    }

    end_session(&mut manager, &app.memory_path).await;
    println!("👋 再见");
    Ok(())
}

/// 生成一条回复；期间按 Ctrl+C 可以打断
async fn reply(manager: &mut ConversationManager, synthesizer: Option<&ConsoleSynthesizer>) -> Result<()> {
    let cancel = CancellationToken::new();
    let watcher = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));
    let result = stream_reply(manager, synthesizer, cancel).await;
    watcher.abort();
    result
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        cancel.cancel();
    }
}

async fn stream_reply(
    manager: &mut ConversationManager,
    synthesizer: Option<&ConsoleSynthesizer>,
    cancel: CancellationToken,
) -> Result<()> {
    let speaking = synthesizer.is_some();
    let mut answer = String::new();
    {
        let mut events = manager.respond_stream(cancel.clone()).await?;
        if !speaking {
            print!("🤖 ");
        }
        while let Some(event) = events.next().await {
            match event? {
                ReplyEvent::Token(token) if !speaking => {
                    print!("{token}");
                    let _ = std::io::stdout().flush();
                }
                ReplyEvent::Token(_) => {}
                ReplyEvent::Final(reply) => answer = reply,
            }
        }
        if !speaking {
            println!();
        }
    }

    if let Some(synthesizer) = synthesizer {
        print!("🤖 ");
        let mut events = synthesizer.speak(&answer, cancel).await?;
        while let Some(event) = events.next().await {
            if event? == SynthesisEvent::Interrupted {
                println!("……");
            }
        }
    }
    Ok(())
}

async fn end_session(manager: &mut ConversationManager, memory_path: &str) {
    match manager.end_session(CancellationToken::new()).await {
        Ok(Some(memory)) => {
            println!("🧠 已记住: {}", memory.summary);
            persist(manager.store(), memory_path).await;
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "⚠️ 会话归档失败"),
    }
}

async fn persist(store: &MemoryStore, path: &str) {
    if let Err(e) = store.persist(path).await {
        eprintln!("❌ 记忆保存失败: {e}");
    }
}

async fn print_memories(store: &MemoryStore) {
    let memories = store.all().await;
    if memories.is_empty() {
        println!("（还没有任何记忆）");
        return;
    }
    for memory in memories {
        let when = chrono::DateTime::from_timestamp(memory.timestamp, 0)
            .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let keywords = memory.keywords.iter().cloned().collect::<Vec<_>>().join(", ");
        println!("[{when}] 影响 {:>2}  {}", memory.impact, memory.summary);
        println!("    关键词: {keywords}");
    }
}

use std::fmt;
use uuid::Uuid;

/// banter_bot 的统一错误类型
#[derive(Debug)]
pub enum BanterError {
    /// LLM 相关错误
    Llm(LlmError),
    /// 记忆存储错误
    Memory(MemoryError),
    /// 关键词提取错误
    Keyword(KeywordError),
    /// 语音合成 / 识别错误
    Speech(SpeechError),
    /// 配置错误
    Config(ConfigError),
    /// 外部调用被取消
    Interrupted,
    /// IO 错误
    Io(std::io::Error),
    /// 其他错误
    Other(String),
}

/// LLM 相关错误
#[derive(Debug)]
pub enum LlmError {
    /// 网络请求失败
    NetworkError(String),
    /// API 返回错误状态码
    ApiError { status: u16, message: String },
    /// 响应格式无效
    InvalidResponse(String),
    /// 没有返回内容
    EmptyResponse,
}

/// 记忆存储错误
#[derive(Debug)]
pub enum MemoryError {
    /// 调用方提供的记忆内容无效（空消息 / 空关键词）
    Validation(String),
    /// 按 uuid 查找不到记忆
    NotFound(Uuid),
    /// 持久化数据结构校验失败
    Corruption(String),
    /// 读写文件失败
    IoError(String),
}

/// 关键词提取错误
#[derive(Debug)]
pub enum KeywordError {
    /// 提取器返回了无法解析的内容
    InvalidOutput(String),
    /// 提取器不可用
    Unavailable(String),
}

/// 语音合成 / 识别错误
#[derive(Debug)]
pub enum SpeechError {
    /// 合成失败
    SynthesisFailed(String),
    /// 识别失败
    RecognitionFailed(String),
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件未找到
    FileNotFound(String),
    /// 配置解析失败
    ParseFailed(String),
    /// 环境变量格式不符合 `BANTER_MODEL_<ID>_<KEY>`
    EnvFormatError(String),
    /// 未知的模型配置项
    UnMatchConfigError(String, String),
    /// 模型缺少必需的配置项
    MissingConfig(String, String),
    /// 未找到指定模型
    NotFindModelError(String),
}

impl fmt::Display for BanterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BanterError::Llm(e) => write!(f, "LLM Error: {}", e),
            BanterError::Memory(e) => write!(f, "Memory Error: {}", e),
            BanterError::Keyword(e) => write!(f, "Keyword Error: {}", e),
            BanterError::Speech(e) => write!(f, "Speech Error: {}", e),
            BanterError::Config(e) => write!(f, "Config Error: {}", e),
            BanterError::Interrupted => write!(f, "Operation interrupted"),
            BanterError::Io(e) => write!(f, "IO Error: {}", e),
            BanterError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            LlmError::ApiError { status, message } => {
                write!(f, "API error (status {}): {}", status, message)
            }
            LlmError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            LlmError::EmptyResponse => write!(f, "Empty response from LLM"),
        }
    }
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::Validation(msg) => write!(f, "Invalid memory: {}", msg),
            MemoryError::NotFound(uuid) => write!(f, "Memory '{}' not found", uuid),
            MemoryError::Corruption(msg) => write!(f, "Corrupted memory file: {}", msg),
            MemoryError::IoError(msg) => write!(f, "Memory IO error: {}", msg),
        }
    }
}

impl fmt::Display for KeywordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeywordError::InvalidOutput(msg) => write!(f, "Invalid extractor output: {}", msg),
            KeywordError::Unavailable(msg) => write!(f, "Extractor unavailable: {}", msg),
        }
    }
}

impl fmt::Display for SpeechError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeechError::SynthesisFailed(msg) => write!(f, "Synthesis failed: {}", msg),
            SpeechError::RecognitionFailed(msg) => write!(f, "Recognition failed: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::ParseFailed(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::EnvFormatError(key) => {
                write!(f, "Invalid env key '{}', expected BANTER_MODEL_<ID>_<KEY>", key)
            }
            ConfigError::UnMatchConfigError(config_key, key) => {
                write!(f, "Unknown model config key '{}' in '{}'", config_key, key)
            }
            ConfigError::MissingConfig(model, field) => {
                write!(f, "Model '{}' is missing config field '{}'", model, field)
            }
            ConfigError::NotFindModelError(model) => write!(f, "Model '{}' not configured", model),
        }
    }
}

impl std::error::Error for BanterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BanterError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for LlmError {}
impl std::error::Error for MemoryError {}
impl std::error::Error for KeywordError {}
impl std::error::Error for SpeechError {}
impl std::error::Error for ConfigError {}

// From 转换实现
impl From<std::io::Error> for BanterError {
    fn from(err: std::io::Error) -> Self {
        BanterError::Io(err)
    }
}

impl From<reqwest::Error> for BanterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BanterError::Llm(LlmError::NetworkError("Request timeout".to_string()))
        } else if err.is_connect() {
            BanterError::Llm(LlmError::NetworkError(format!(
                "Connection failed: {}",
                err
            )))
        } else {
            BanterError::Llm(LlmError::NetworkError(err.to_string()))
        }
    }
}

impl From<serde_json::Error> for BanterError {
    fn from(err: serde_json::Error) -> Self {
        BanterError::Llm(LlmError::InvalidResponse(err.to_string()))
    }
}

impl From<serde_yaml::Error> for BanterError {
    fn from(err: serde_yaml::Error) -> Self {
        BanterError::Config(ConfigError::ParseFailed(err.to_string()))
    }
}

impl From<LlmError> for BanterError {
    fn from(err: LlmError) -> Self {
        BanterError::Llm(err)
    }
}

impl From<MemoryError> for BanterError {
    fn from(err: MemoryError) -> Self {
        BanterError::Memory(err)
    }
}

impl From<KeywordError> for BanterError {
    fn from(err: KeywordError) -> Self {
        BanterError::Keyword(err)
    }
}

impl From<SpeechError> for BanterError {
    fn from(err: SpeechError) -> Self {
        BanterError::Speech(err)
    }
}

impl From<ConfigError> for BanterError {
    fn from(err: ConfigError) -> Self {
        BanterError::Config(err)
    }
}

impl BanterError {
    /// 是否为记忆数据损坏错误（启动时用于决定是否中止）
    pub fn is_corruption(&self) -> bool {
        matches!(self, BanterError::Memory(MemoryError::Corruption(_)))
    }
}

// 便捷的 Result 类型别名
pub type Result<T> = std::result::Result<T, BanterError>;

//! LLM 配置加载
//!
//! 从环境变量读取模型配置，格式：
//! ```text
//! BANTER_MODEL_<ID>_MODEL=gpt-4o-mini
//! BANTER_MODEL_<ID>_BASEURL=https://api.openai.com/v1/chat/completions
//! BANTER_MODEL_<ID>_APIKEY=sk-...
//! ```
//! `<ID>` 为自定义标识（如 `GPT4O`、`QWEN`），不区分大小写。

use crate::error::{ConfigError, Result};
use dotenv::dotenv;
use serde::Deserialize;
use serde::Serialize;
use std::collections::HashMap;

const PREFIX: &str = "BANTER_MODEL_";

/// 单个模型的连接配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ModelConfig {
    /// LLM 接口中使用的模型名（如 `gpt-4o-mini`）
    pub model: String,
    /// Chat Completions 接口完整 URL
    pub baseurl: String,
    pub apikey: String,
}

/// 所有已加载的模型配置表（key = 小写的 `<ID>`）
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    pub models: HashMap<String, ModelConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// 从任意键值对解析模型配置，便于测试时不依赖进程环境
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Result<Self> {
        let mut model_configs: HashMap<String, HashMap<String, String>> = HashMap::new();
        for (key, value) in vars {
            if let Some(suffix) = key.strip_prefix(PREFIX) {
                let parts: Vec<&str> = suffix.split('_').collect();
                if parts.len() != 2 {
                    return Err(ConfigError::EnvFormatError(key).into());
                }
                let model_id = parts[0].to_lowercase();
                let config_key = parts[1].to_lowercase();

                match config_key.as_str() {
                    "model" | "baseurl" | "apikey" => {}
                    _ => {
                        return Err(ConfigError::UnMatchConfigError(config_key, key).into());
                    }
                }
                model_configs
                    .entry(model_id)
                    .or_default()
                    .insert(config_key, value);
            }
        }

        let mut models = HashMap::new();
        for (model_id, config_map) in model_configs {
            let field = |name: &str| {
                config_map
                    .get(name)
                    .cloned()
                    .ok_or_else(|| ConfigError::MissingConfig(model_id.clone(), name.to_string()))
            };
            let model = field("model")?;
            let baseurl = field("baseurl")?;
            let apikey = field("apikey")?;

            models.insert(
                model_id,
                ModelConfig {
                    model,
                    baseurl,
                    apikey,
                },
            );
        }

        Ok(Self { models })
    }

    /// 按 `<ID>`（不区分大小写）查找，找不到时再按接口模型名匹配
    pub fn get_model(&self, model: &str) -> Result<ModelConfig> {
        self.models
            .get(&model.to_lowercase())
            .or_else(|| self.models.values().find(|m| m.model == model))
            .cloned()
            .ok_or_else(|| ConfigError::NotFindModelError(model.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BanterError;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_load_model_from_vars() {
        let config = Config::from_vars(vars(&[
            ("BANTER_MODEL_GPT_MODEL", "gpt-4o-mini"),
            ("BANTER_MODEL_GPT_BASEURL", "http://localhost/v1/chat/completions"),
            ("BANTER_MODEL_GPT_APIKEY", "sk-test"),
            ("UNRELATED", "x"),
        ]))
        .unwrap();

        let model = config.get_model("GPT").unwrap();
        assert_eq!(model.apikey, "sk-test");
        assert_eq!(config.get_model("gpt-4o-mini").unwrap().baseurl, model.baseurl);
        assert!(config.get_model("missing").is_err());
    }

    #[test]
    fn test_missing_field() {
        let err = Config::from_vars(vars(&[("BANTER_MODEL_GPT_MODEL", "gpt-4o-mini")]))
            .unwrap_err();
        assert!(matches!(
            err,
            BanterError::Config(ConfigError::MissingConfig(_, _))
        ));
    }

    #[test]
    fn test_bad_key_format() {
        let err = Config::from_vars(vars(&[("BANTER_MODEL_GPT_API_KEY", "x")])).unwrap_err();
        assert!(matches!(err, BanterError::Config(ConfigError::EnvFormatError(_))));
    }
}

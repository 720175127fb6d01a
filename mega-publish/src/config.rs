//! 发布者配置
//!
//! 可从 TOML 文本或进程环境变量加载；缺省时没有默认目的地，且使用文本编码。
//!
use serde::Deserialize;
use thiserror::Error;

/// 默认目的地的环境变量名
pub const ENV_DESTINATION: &str = "MEGA_QUEUE_DESTINATION";
/// 是否默认使用二进制编码的环境变量名
pub const ENV_BINARY_ENCODING: &str = "MEGA_BINARY_ENCODING";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("parse config toml: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// 未指定目的地覆盖时使用的队列地址
    pub default_destination: Option<String>,
    /// `QueuePublisher::publish` 使用的编码方式
    pub binary_encoding: bool,
}

impl PublisherConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let default_destination = lookup(ENV_DESTINATION).filter(|v| !v.trim().is_empty());
        let binary_encoding = match lookup(ENV_BINARY_ENCODING) {
            None => false,
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "" | "0" | "false" | "no" => false,
                "1" | "true" | "yes" => true,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_BINARY_ENCODING,
                        value,
                    });
                }
            },
        };

        Ok(Self {
            default_destination,
            binary_encoding,
        })
    }
}

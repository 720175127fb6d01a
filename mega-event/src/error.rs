//! MEGA 协议统一错误定义
//!
//! 校验/反序列化/序列化自检失败统一收敛为 `SchemaValidationError`，
//! 发布路径上的寻址、编码与传输失败收敛为 `PublishError`。
//!
use std::fmt;

use thiserror::Error;

/// 校验失败所在的信封分段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// 顶层信封（`event`/`object`/`extra` 的存在性与类型）
    Payload,
    /// `event` 分段
    Event,
    /// `object` 分段
    Object,
}

impl Section {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Section::Payload => "payload",
            Section::Event => "event",
            Section::Object => "object",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 信封校验错误：缺失必填字段与类型不符不做类型层面的区分
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct SchemaValidationError {
    section: Section,
    cause: String,
}

impl SchemaValidationError {
    pub fn new(section: Section, cause: impl Into<String>) -> Self {
        Self {
            section,
            cause: cause.into(),
        }
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn cause(&self) -> &str {
        &self.cause
    }
}

impl fmt::Display for SchemaValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.section {
            Section::Payload => write!(f, "Invalid MEGA payload: {}", self.cause),
            section => write!(
                f,
                "Invalid MEGA payload. There is an error in the '{section}' section: {}",
                self.cause
            ),
        }
    }
}

/// 发布错误（校验错误原样透传）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Schema(#[from] SchemaValidationError),
    #[error("address error: {reason}")]
    Address { reason: String },
    #[error("encoding error: {reason}")]
    Encoding { reason: String },
    #[error("transport error: {reason}")]
    Transport { reason: String },
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
}

impl PublishError {
    pub fn address(reason: impl Into<String>) -> Self {
        PublishError::Address {
            reason: reason.into(),
        }
    }

    pub fn encoding(reason: impl Into<String>) -> Self {
        PublishError::Encoding {
            reason: reason.into(),
        }
    }

    pub fn transport(reason: impl Into<String>) -> Self {
        PublishError::Transport {
            reason: reason.into(),
        }
    }
}

pub type SchemaResult<T> = Result<T, SchemaValidationError>;

pub type PublishResult<T> = Result<T, PublishError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failing_section() {
        let err = SchemaValidationError::new(Section::Event, "name: Missing data for required field.");
        assert_eq!(
            err.to_string(),
            "Invalid MEGA payload. There is an error in the 'event' section: name: Missing data for required field."
        );

        let err = SchemaValidationError::new(Section::Payload, "Invalid input type.");
        assert_eq!(err.to_string(), "Invalid MEGA payload: Invalid input type.");
    }

    #[test]
    fn schema_error_passes_through_publish_error() {
        let err: PublishError = SchemaValidationError::new(Section::Object, "boom").into();
        match &err {
            PublishError::Schema(inner) => assert_eq!(inner.section(), Section::Object),
            other => panic!("unexpected {other:?}"),
        }
        assert!(err.to_string().contains("'object' section"));
    }
}

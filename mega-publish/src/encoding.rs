//! 消息体编码（BodyEncoder）
//!
//! 位于序列化与传输发送之间；二进制编码格式对信封层不透明。
//!
use mega_event::{PublishError, PublishResult as Result};
use serde_json::Value;

/// 将序列化后的信封编码为传输层消息体
pub trait BodyEncoder: Send + Sync {
    fn encode(&self, body: &Value, binary: bool) -> Result<String>;
}

/// 紧凑 JSON 文本编码；不提供二进制编码
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBodyEncoder;

impl BodyEncoder for JsonBodyEncoder {
    fn encode(&self, body: &Value, binary: bool) -> Result<String> {
        if binary {
            return Err(PublishError::encoding(
                "binary encoding requires a dedicated BodyEncoder",
            ));
        }

        Ok(serde_json::to_string(body)?)
    }
}

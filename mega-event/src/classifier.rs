//! 信封分类器（Payload Classifier）
//!
//! 仅比对顶层协议标识，帮助消费者在完整反序列化前判断消息是否属于本协议。
//!
use serde_json::Value;

use crate::model::{PROTOCOL_NAME, PROTOCOL_VERSION};

/// 判断结构化数据是否带有本协议的标识；从不报错，也不校验其余内容
pub fn matches_envelope(blob: &Value) -> bool {
    let Some(data) = blob.as_object() else {
        return false;
    };
    if data.is_empty() {
        return false;
    }

    data.get("protocol").and_then(Value::as_str) == Some(PROTOCOL_NAME)
        && data.get("version").and_then(Value::as_i64) == Some(PROTOCOL_VERSION)
}

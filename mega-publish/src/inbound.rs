//! 入站消息解码
//!
//! 先用分类器判断消息是否属于本协议，再做完整反序列化；
//! 不属于本协议的消息返回 `None`，交由其它消费者处理。
//!
use mega_event::{Payload, PublishResult as Result, deserialize_payload, matches_envelope};
use serde_json::Value;
use tracing::{debug, warn};

pub fn decode_message(body: &str) -> Result<Option<Payload>> {
    let data: Value = serde_json::from_str(body)?;
    decode_value(&data)
}

pub fn decode_value(data: &Value) -> Result<Option<Payload>> {
    if !matches_envelope(data) {
        debug!("skipping message without MEGA protocol identity");
        return Ok(None);
    }

    match deserialize_payload(data) {
        Ok(payload) => Ok(Some(payload)),
        Err(err) => {
            warn!(section = %err.section(), error = %err, "rejected MEGA message");
            Err(err.into())
        }
    }
}

//! 发布者（Publisher）协议
//!
//! 只定义“发布已校验信封”与“发布原始消息”两种能力，不绑定具体传输；
//! 寻址、重试与确认由实现方（传输适配器）负责。
//!
use async_trait::async_trait;
use bon::Builder;

use crate::{error::PublishResult as Result, model::Payload};

/// 单次发送的附加选项
#[non_exhaustive]
#[derive(Builder, Default, Debug, Clone, PartialEq, Eq)]
pub struct SendOptions {
    /// 覆盖适配器默认的投递目的地
    #[builder(into)]
    destination: Option<String>,
}

impl SendOptions {
    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }
}

/// 发布者：返回传输层分配的投递标识
#[async_trait]
pub trait Publisher: Send + Sync {
    /// 序列化并发布信封；`binary_encoding` 为真时由适配器做二进制编码
    async fn publish_payload(
        &self,
        payload: &Payload,
        binary_encoding: bool,
        options: &SendOptions,
    ) -> Result<String>;

    /// 原样发布已序列化的消息体，绕过模型与校验层
    async fn publish_raw_message(&self, message: &str, options: &SendOptions) -> Result<String>;
}

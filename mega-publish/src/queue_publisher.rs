//! 队列发布者（QueuePublisher）
//!
//! `Publisher` 协议面向消息队列的实现：解析目的地、序列化并编码信封，
//! 再交给 `QueueClient` 发送。校验或编码失败时不会调用客户端。
//!
use async_trait::async_trait;
use mega_event::{
    Payload, PublishError, PublishResult as Result, Publisher, SendOptions, serialize_payload,
};
use tracing::{debug, info};

use crate::{
    config::PublisherConfig,
    encoding::{BodyEncoder, JsonBodyEncoder},
};

/// 队列客户端：把消息体投递到指定目的地，返回传输层的消息标识
#[async_trait]
pub trait QueueClient: Send + Sync {
    async fn send_message(&self, destination: &str, body: &str) -> Result<String>;
}

pub struct QueuePublisher<C, E = JsonBodyEncoder> {
    client: C,
    encoder: E,
    config: PublisherConfig,
}

impl<C> QueuePublisher<C>
where
    C: QueueClient,
{
    pub fn new(client: C, config: PublisherConfig) -> Self {
        Self::with_encoder(client, JsonBodyEncoder, config)
    }
}

impl<C, E> QueuePublisher<C, E>
where
    C: QueueClient,
    E: BodyEncoder,
{
    pub fn with_encoder(client: C, encoder: E, config: PublisherConfig) -> Self {
        Self {
            client,
            encoder,
            config,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// 覆盖值优先，其次为配置的默认目的地；两者都为空时报 `Address` 错误
    pub fn resolve_destination(&self, override_destination: Option<&str>) -> Result<String> {
        override_destination
            .filter(|d| !d.is_empty())
            .or(self.config.default_destination.as_deref())
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .ok_or_else(|| PublishError::address("missing queue destination"))
    }

    /// 按配置中的编码方式发布信封
    pub async fn publish(&self, payload: &Payload, options: &SendOptions) -> Result<String> {
        self.publish_payload(payload, self.config.binary_encoding, options)
            .await
    }
}

#[async_trait]
impl<C, E> Publisher for QueuePublisher<C, E>
where
    C: QueueClient,
    E: BodyEncoder,
{
    async fn publish_payload(
        &self,
        payload: &Payload,
        binary_encoding: bool,
        options: &SendOptions,
    ) -> Result<String> {
        let data = serialize_payload(payload)?;
        let body = self.encoder.encode(&data, binary_encoding)?;
        self.publish_raw_message(&body, options).await
    }

    async fn publish_raw_message(&self, message: &str, options: &SendOptions) -> Result<String> {
        let destination = self.resolve_destination(options.destination())?;

        let message_id = self.client.send_message(&destination, message).await?;

        info!(destination = %destination, message_id = %message_id, "sent queue message");
        debug!(destination = %destination, message_id = %message_id, body = %message);
        Ok(message_id)
    }
}

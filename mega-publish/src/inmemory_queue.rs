//! 内存版队列（InMemoryQueue）
//!
//! 基于 `DashMap` 按目的地保存消息，满足 `QueueClient` 协议：
//! - `send_message`：追加消息并分配 UUID 作为消息标识；
//! - `messages`/`drain`：读取或取走某个目的地上的消息；
//! - 典型用途：测试环境、示例与本地开发。
//!
//! 克隆得到的实例共享同一份存储。

use async_trait::async_trait;
use dashmap::DashMap;
use mega_event::PublishResult as Result;
use std::sync::Arc;
use uuid::Uuid;

use crate::queue_publisher::QueueClient;

/// 队列中的一条消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
    pub message_id: String,
    pub body: String,
}

#[derive(Clone, Default)]
pub struct InMemoryQueue {
    queues: Arc<DashMap<String, Vec<QueuedMessage>>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 某目的地上当前的全部消息（按发送顺序）
    pub fn messages(&self, destination: &str) -> Vec<QueuedMessage> {
        self.queues
            .get(destination)
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    /// 取走某目的地上的全部消息
    pub fn drain(&self, destination: &str) -> Vec<QueuedMessage> {
        self.queues
            .remove(destination)
            .map(|(_, messages)| messages)
            .unwrap_or_default()
    }

    /// 某目的地上的消息数
    pub fn len_of(&self, destination: &str) -> usize {
        self.queues.get(destination).map_or(0, |messages| messages.len())
    }

    /// 所有目的地上都没有消息
    pub fn is_empty_everywhere(&self) -> bool {
        self.queues.iter().all(|entry| entry.value().is_empty())
    }
}

#[async_trait]
impl QueueClient for InMemoryQueue {
    async fn send_message(&self, destination: &str, body: &str) -> Result<String> {
        let message_id = Uuid::new_v4().to_string();
        self.queues
            .entry(destination.to_string())
            .or_default()
            .push(QueuedMessage {
                message_id: message_id.clone(),
                body: body.to_string(),
            });
        Ok(message_id)
    }
}

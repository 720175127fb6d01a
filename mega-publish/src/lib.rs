//! MEGA 信封发布适配（mega-publish）
//!
//! 为 `mega_event::Publisher` 提供面向消息队列的实现，以及入站方向的解码工具：
//! - `QueuePublisher`：目的地解析、序列化、编码与发送；
//! - `QueueClient`/`BodyEncoder`：传输与编码协作方的协议；
//! - `InMemoryQueue`：内存队列，用于测试与本地开发；
//! - `decode_message`：分类后再反序列化的入站解码；
//! - `PublisherConfig`：从 TOML 或环境变量加载的发布配置。
//!
pub mod config;
pub mod encoding;
pub mod inbound;
pub mod inmemory_queue;
pub mod queue_publisher;

pub use config::{ConfigError, PublisherConfig};
pub use encoding::{BodyEncoder, JsonBodyEncoder};
pub use inbound::{decode_message, decode_value};
pub use inmemory_queue::{InMemoryQueue, QueuedMessage};
pub use queue_publisher::{QueueClient, QueuePublisher};

//! MEGA 事件信封基础库（mega-event）
//!
//! 定义带版本的消息信封（协议载荷）及其校验与（反）序列化约定：
//! - 信封模型（`model`）：`Event`、`ObjectSnapshot`、`Payload` 值对象与协议标识常量；
//! - 校验器（`schema`）：默认值填充、未知字段忽略、输出空值剪除与分段错误报告；
//! - 分类器（`classifier`）：仅凭协议标识判断一段结构化数据是否属于本协议；
//! - 发布者（`publisher`）：与具体传输解耦的发布能力协议。
//!
//! 本 crate 不做任何 I/O，校验与序列化均为纯函数，可在多线程间直接并发调用。
//!
pub mod classifier;
pub mod error;
pub mod model;
pub mod publisher;
pub mod schema;

pub use classifier::matches_envelope;
pub use error::{PublishError, PublishResult, SchemaResult, SchemaValidationError, Section};
pub use model::{Event, ObjectSnapshot, PROTOCOL_NAME, PROTOCOL_VERSION, Payload};
pub use publisher::{Publisher, SendOptions};
pub use schema::{deserialize_payload, prune_empty, serialize_payload};

//! 信封模型（Envelope Model）
//!
//! `Event`、`ObjectSnapshot` 与 `Payload` 均为构造后不可变的值对象，
//! 仅通过构建器创建；缺省值只包含协议声明的默认值（`version = 1`、空映射）。
//!
use bon::Builder;
use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};

/// 协议名称
pub const PROTOCOL_NAME: &str = "mega";

/// 协议版本
pub const PROTOCOL_VERSION: i64 = 1;

/// 条目默认版本（`Event` 与 `ObjectSnapshot` 共用）
pub const DEFAULT_VERSION: i64 = 1;

/// 领域事件：描述“发生了什么”
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Event {
    /// 事件名，例如 `order.created`
    #[builder(into)]
    name: String,
    /// 事件发生时刻（带时区）
    #[builder(into)]
    timestamp: DateTime<FixedOffset>,
    /// 事件结构版本
    #[builder(default = DEFAULT_VERSION)]
    version: i64,
    /// 所属限界上下文
    #[builder(into)]
    domain: Option<String>,
    /// 事件关注的实体标识
    #[builder(into)]
    subject: Option<String>,
    /// 发出事件的服务名
    #[builder(into)]
    publisher: Option<String>,
    /// 自由扩展数据
    #[builder(default)]
    attributes: Map<String, Value>,
}

impl Event {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timestamp(&self) -> &DateTime<FixedOffset> {
        &self.timestamp
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn publisher(&self) -> Option<&str> {
        self.publisher.as_deref()
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }
}

/// 领域对象快照：事件发出时的对象状态，及可选的变更前状态
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct ObjectSnapshot {
    /// 对象类型（线上字段名为 `type`）
    #[builder(into)]
    object_type: Option<String>,
    #[builder(into)]
    id: Option<String>,
    #[builder(default = DEFAULT_VERSION)]
    version: i64,
    current: Map<String, Value>,
    /// 缺失表示“未记录变更前状态”，而非“未变化”
    previous: Option<Map<String, Value>>,
}

impl ObjectSnapshot {
    pub fn object_type(&self) -> Option<&str> {
        self.object_type.as_deref()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn current(&self) -> &Map<String, Value> {
        &self.current
    }

    pub fn previous(&self) -> Option<&Map<String, Value>> {
        self.previous.as_ref()
    }
}

/// 协议信封：恰好一个事件，可选一个对象快照
///
/// 协议标识（`PROTOCOL_NAME`/`PROTOCOL_VERSION`）不是可设置的字段，
/// 由序列化器在输出时注入。
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Payload {
    event: Event,
    object: Option<ObjectSnapshot>,
    #[builder(default)]
    extra: Map<String, Value>,
}

impl Payload {
    pub fn protocol(&self) -> &'static str {
        PROTOCOL_NAME
    }

    pub fn protocol_version(&self) -> i64 {
        PROTOCOL_VERSION
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn object(&self) -> Option<&ObjectSnapshot> {
        self.object.as_ref()
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }
}

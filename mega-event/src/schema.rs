//! 信封校验与（反）序列化（Schema/Validator）
//!
//! 每个分段一个校验函数，自底向上组合：`deserialize_payload` 依次调用
//! `event`、`object` 分段的校验，分段内的字段错误全部收集后一次性返回，
//! 错误信息标明出错分段。未声明字段一律忽略，以保持前向兼容。
//!
//! 序列化时每个分段（顶层、`event`、`object`）的直接字段经过 `prune_empty`
//! 去除空值，并在返回前用同一套规则重新校验自身输出。
//!
use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde_json::{Map, Value};

use crate::{
    error::{SchemaResult, SchemaValidationError, Section},
    model::{DEFAULT_VERSION, Event, ObjectSnapshot, PROTOCOL_NAME, PROTOCOL_VERSION, Payload},
};

const MISSING: &str = "Missing data for required field.";
const NULL: &str = "Field may not be null.";
const INVALID_INPUT: &str = "Invalid input type.";
const INVALID_STRING: &str = "Not a valid string.";
const INVALID_INTEGER: &str = "Not a valid integer.";
const INVALID_DATETIME: &str = "Not a valid datetime.";
const INVALID_MAPPING: &str = "Not a valid mapping type.";
const TOO_SHORT: &str = "Shorter than minimum length 1.";

/// 将结构化数据反序列化为 `Payload`
///
/// 全有或全无：任何分段失败都不会返回部分构造的信封。
/// 顶层的 `protocol`/`version` 只供分类器识别，这里与其它未知字段一样被忽略。
pub fn deserialize_payload(blob: &Value) -> SchemaResult<Payload> {
    let data = blob
        .as_object()
        .ok_or_else(|| SchemaValidationError::new(Section::Payload, INVALID_INPUT))?;
    let mut fields = Fields::new(data);

    let event = fields
        .required_section("event")
        .map(deserialize_event)
        .transpose()?;
    let object = fields
        .optional_section("object")
        .map(deserialize_object)
        .transpose()?;
    let extra = fields.optional_mapping("extra");
    fields.finish(Section::Payload)?;

    let event = event.ok_or_else(|| missing(Section::Payload, "event"))?;

    Ok(Payload::builder()
        .event(event)
        .maybe_object(object)
        .extra(extra.unwrap_or_default())
        .build())
}

/// 校验并构造 `event` 分段
pub fn deserialize_event(section: &Value) -> SchemaResult<Event> {
    let data = section
        .as_object()
        .ok_or_else(|| SchemaValidationError::new(Section::Event, INVALID_INPUT))?;
    let mut fields = Fields::new(data);

    let name = fields.required_non_empty_string("name");
    let timestamp = fields.required_datetime("timestamp");
    let version = fields.integer_or("version", DEFAULT_VERSION);
    let domain = fields.optional_string("domain");
    let subject = fields.optional_string("subject");
    let publisher = fields.optional_string("publisher");
    let attributes = fields.optional_mapping("attributes");
    fields.finish(Section::Event)?;

    let name = name.ok_or_else(|| missing(Section::Event, "name"))?;
    let timestamp = timestamp.ok_or_else(|| missing(Section::Event, "timestamp"))?;

    Ok(Event::builder()
        .name(name)
        .timestamp(timestamp)
        .version(version)
        .maybe_domain(domain)
        .maybe_subject(subject)
        .maybe_publisher(publisher)
        .attributes(attributes.unwrap_or_default())
        .build())
}

/// 校验并构造 `object` 分段
pub fn deserialize_object(section: &Value) -> SchemaResult<ObjectSnapshot> {
    let data = section
        .as_object()
        .ok_or_else(|| SchemaValidationError::new(Section::Object, INVALID_INPUT))?;
    let mut fields = Fields::new(data);

    let object_type = fields.optional_string("type");
    let id = fields.optional_string("id");
    let version = fields.integer_or("version", DEFAULT_VERSION);
    let current = fields.required_mapping("current");
    let previous = fields.optional_mapping("previous");
    fields.finish(Section::Object)?;

    let current = current.ok_or_else(|| missing(Section::Object, "current"))?;

    Ok(ObjectSnapshot::builder()
        .maybe_object_type(object_type)
        .maybe_id(id)
        .version(version)
        .current(current)
        .maybe_previous(previous)
        .build())
}

/// 将 `Payload` 序列化为结构化数据
///
/// 注入协议标识，剪除空值后对输出做一次完整的反序列化自检，
/// 自检失败时返回与反序列化相同的 `SchemaValidationError`。
pub fn serialize_payload(payload: &Payload) -> SchemaResult<Value> {
    let mut data = Map::new();
    data.insert("protocol".into(), Value::from(PROTOCOL_NAME));
    data.insert("version".into(), Value::from(PROTOCOL_VERSION));
    data.insert("event".into(), serialize_event(payload.event()));
    data.insert(
        "object".into(),
        payload.object().map_or(Value::Null, serialize_object),
    );
    data.insert("extra".into(), Value::Object(payload.extra().clone()));

    let data = Value::Object(prune_empty(data));
    deserialize_payload(&data)?;
    Ok(data)
}

fn serialize_event(event: &Event) -> Value {
    let mut data = Map::new();
    data.insert("name".into(), Value::from(event.name()));
    data.insert("timestamp".into(), Value::from(event.timestamp().to_rfc3339()));
    data.insert("version".into(), Value::from(event.version()));
    data.insert("domain".into(), optional_string(event.domain()));
    data.insert("subject".into(), optional_string(event.subject()));
    data.insert("publisher".into(), optional_string(event.publisher()));
    data.insert("attributes".into(), Value::Object(event.attributes().clone()));
    Value::Object(prune_empty(data))
}

fn serialize_object(object: &ObjectSnapshot) -> Value {
    let mut data = Map::new();
    data.insert("type".into(), optional_string(object.object_type()));
    data.insert("id".into(), optional_string(object.id()));
    data.insert("version".into(), Value::from(object.version()));
    data.insert("current".into(), Value::Object(object.current().clone()));
    data.insert(
        "previous".into(),
        object
            .previous()
            .map_or(Value::Null, |previous| Value::Object(previous.clone())),
    );
    Value::Object(prune_empty(data))
}

fn optional_string(value: Option<&str>) -> Value {
    value.map_or(Value::Null, Value::from)
}

/// 剪除分段输出中值为 `null` 或空映射的键
///
/// 只处理分段自身的直接字段；`attributes`、`extra`、`current`、`previous`
/// 等自由映射的内容原样保留。
pub fn prune_empty(section: Map<String, Value>) -> Map<String, Value> {
    section
        .into_iter()
        .filter(|(_, value)| !is_empty(value))
        .collect()
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn missing(section: Section, field: &str) -> SchemaValidationError {
    SchemaValidationError::new(section, format!("{field}: {MISSING}"))
}

/// 单个分段的字段读取器，按字段名收集错误
struct Fields<'a> {
    data: &'a Map<String, Value>,
    errors: BTreeMap<&'static str, &'static str>,
}

impl<'a> Fields<'a> {
    fn new(data: &'a Map<String, Value>) -> Self {
        Self {
            data,
            errors: BTreeMap::new(),
        }
    }

    /// 读取字段；缺失与显式 `null` 分开返回，交给调用方决定是否允许
    fn lookup(&self, key: &str) -> Lookup<'a> {
        match self.data.get(key) {
            None => Lookup::Missing,
            Some(Value::Null) => Lookup::Null,
            Some(value) => Lookup::Present(value),
        }
    }

    fn reject<T>(&mut self, key: &'static str, message: &'static str) -> Option<T> {
        self.errors.insert(key, message);
        None
    }

    fn required(&mut self, key: &'static str) -> Option<&'a Value> {
        match self.lookup(key) {
            Lookup::Present(value) => Some(value),
            Lookup::Missing => self.reject(key, MISSING),
            Lookup::Null => self.reject(key, NULL),
        }
    }

    fn optional(&self, key: &str) -> Option<&'a Value> {
        match self.lookup(key) {
            Lookup::Present(value) => Some(value),
            Lookup::Missing | Lookup::Null => None,
        }
    }

    /// 嵌套分段只检查存在性，内容由对应分段的校验函数负责
    fn required_section(&mut self, key: &'static str) -> Option<&'a Value> {
        self.required(key)
    }

    fn optional_section(&self, key: &str) -> Option<&'a Value> {
        self.optional(key)
    }

    fn required_non_empty_string(&mut self, key: &'static str) -> Option<String> {
        match self.required(key)? {
            Value::String(s) if s.is_empty() => self.reject(key, TOO_SHORT),
            Value::String(s) => Some(s.clone()),
            _ => self.reject(key, INVALID_STRING),
        }
    }

    fn optional_string(&mut self, key: &'static str) -> Option<String> {
        match self.optional(key)? {
            Value::String(s) => Some(s.clone()),
            _ => self.reject(key, INVALID_STRING),
        }
    }

    fn integer_or(&mut self, key: &'static str, default: i64) -> i64 {
        match self.optional(key) {
            None => default,
            Some(value) => match as_integer(value) {
                Some(n) => n,
                None => {
                    self.errors.insert(key, INVALID_INTEGER);
                    default
                }
            },
        }
    }

    fn required_datetime(&mut self, key: &'static str) -> Option<DateTime<FixedOffset>> {
        match self.required(key)? {
            Value::String(s) => match parse_datetime(s) {
                Some(timestamp) => Some(timestamp),
                None => self.reject(key, INVALID_DATETIME),
            },
            _ => self.reject(key, INVALID_DATETIME),
        }
    }

    fn required_mapping(&mut self, key: &'static str) -> Option<Map<String, Value>> {
        match self.required(key)? {
            Value::Object(map) => Some(map.clone()),
            _ => self.reject(key, INVALID_MAPPING),
        }
    }

    fn optional_mapping(&mut self, key: &'static str) -> Option<Map<String, Value>> {
        match self.optional(key)? {
            Value::Object(map) => Some(map.clone()),
            _ => self.reject(key, INVALID_MAPPING),
        }
    }

    fn finish(self, section: Section) -> SchemaResult<()> {
        if self.errors.is_empty() {
            return Ok(());
        }

        let cause = self
            .errors
            .iter()
            .map(|(key, message)| format!("{key}: {message}"))
            .collect::<Vec<_>>()
            .join("; ");
        Err(SchemaValidationError::new(section, cause))
    }
}

enum Lookup<'a> {
    Missing,
    Null,
    Present(&'a Value),
}

/// 整数字段接受 JSON 整数或整数字符串；布尔与非整数数值一律拒绝
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// 带时区偏移的 ISO-8601 格式（秒可省略）
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M%:z"];

/// 不带时区偏移的 ISO-8601 格式（秒可省略）
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// 解析 ISO-8601 时间
///
/// 日期与时间之间可用 `T` 或空格分隔，`Z` 等同于 `+00:00`；
/// 不带时区偏移的时间按 UTC 处理。
fn parse_datetime(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(s) {
        return Some(timestamp);
    }

    let normalized = normalize_iso(s);
    OFFSET_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(&normalized, format).ok())
        .or_else(|| {
            NAIVE_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(&normalized, format).ok())
                .map(|naive| naive.and_utc().fixed_offset())
        })
}

fn normalize_iso(s: &str) -> String {
    let mut normalized = s.trim().to_string();
    if normalized.get(10..11) == Some(" ") {
        normalized.replace_range(10..11, "T");
    }
    if normalized.ends_with(['Z', 'z']) {
        normalized.pop();
        normalized.push_str("+00:00");
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn order_created() -> Event {
        let mut attributes = Map::new();
        attributes.insert("k".into(), json!("v"));
        Event::builder()
            .name("order.created")
            .timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
            .attributes(attributes)
            .build()
    }

    #[test]
    fn serialize_emits_only_present_fields() {
        let payload = Payload::builder().event(order_created()).build();

        let data = serialize_payload(&payload).unwrap();

        assert_eq!(
            data,
            json!({
                "protocol": PROTOCOL_NAME,
                "version": PROTOCOL_VERSION,
                "event": {
                    "name": "order.created",
                    "timestamp": "2024-01-01T00:00:00+00:00",
                    "version": 1,
                    "attributes": {"k": "v"}
                }
            })
        );
    }

    #[test]
    fn missing_event_version_defaults_to_one() {
        let event = deserialize_event(&json!({
            "name": "order.created",
            "timestamp": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(event.version(), 1);
        assert!(event.attributes().is_empty());
        assert_eq!(event.publisher(), None);
    }

    #[test]
    fn null_optionals_are_treated_as_absent() {
        let event = deserialize_event(&json!({
            "name": "order.created",
            "timestamp": "2024-01-01T00:00:00Z",
            "version": null,
            "domain": null,
            "attributes": null
        }))
        .unwrap();

        assert_eq!(event.version(), 1);
        assert_eq!(event.domain(), None);
        assert!(event.attributes().is_empty());
    }

    #[test]
    fn missing_name_is_attributed_to_event_section() {
        let err = deserialize_payload(&json!({"event": {"timestamp": "2024-01-01T00:00:00Z"}}))
            .unwrap_err();

        assert_eq!(err.section(), Section::Event);
        assert_eq!(err.cause(), "name: Missing data for required field.");
    }

    #[test]
    fn every_field_error_of_a_section_is_reported() {
        let err = deserialize_event(&json!({
            "name": "",
            "timestamp": "yesterday",
            "version": true,
            "subject": 7,
            "attributes": []
        }))
        .unwrap_err();

        assert_eq!(err.section(), Section::Event);
        assert_eq!(
            err.cause(),
            "attributes: Not a valid mapping type.; name: Shorter than minimum length 1.; \
             subject: Not a valid string.; timestamp: Not a valid datetime.; \
             version: Not a valid integer."
        );
    }

    #[test]
    fn missing_current_is_attributed_to_object_section() {
        let err = deserialize_payload(&json!({
            "event": {"name": "order.created", "timestamp": "2024-01-01T00:00:00Z"},
            "object": {"type": "order", "id": "o-1"}
        }))
        .unwrap_err();

        assert_eq!(err.section(), Section::Object);
        assert_eq!(err.cause(), "current: Missing data for required field.");
    }

    #[test]
    fn top_level_errors_are_attributed_to_payload() {
        let err = deserialize_payload(&json!({"extra": {}})).unwrap_err();
        assert_eq!(err.section(), Section::Payload);
        assert_eq!(err.cause(), "event: Missing data for required field.");

        let err = deserialize_payload(&json!({"event": null})).unwrap_err();
        assert_eq!(err.section(), Section::Payload);
        assert_eq!(err.cause(), "event: Field may not be null.");

        let err = deserialize_payload(&json!([1, 2])).unwrap_err();
        assert_eq!(err.section(), Section::Payload);
        assert_eq!(err.cause(), "Invalid input type.");
    }

    #[test]
    fn non_object_event_section_is_attributed_to_event() {
        let err = deserialize_payload(&json!({"event": "order.created"})).unwrap_err();
        assert_eq!(err.section(), Section::Event);
        assert_eq!(err.cause(), "Invalid input type.");
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let payload = deserialize_payload(&json!({
            "protocol": "something-else",
            "trace": "abc",
            "event": {
                "name": "order.created",
                "timestamp": "2024-01-01T00:00:00Z",
                "foo": 1
            }
        }))
        .unwrap();

        assert_eq!(payload.event().name(), "order.created");
        assert!(payload.event().attributes().get("foo").is_none());
        assert!(payload.extra().get("trace").is_none());
    }

    #[test]
    fn integer_strings_are_accepted_and_floats_rejected() {
        let object = deserialize_object(&json!({"version": "3", "current": {"a": 1}})).unwrap();
        assert_eq!(object.version(), 3);

        let err = deserialize_object(&json!({"version": 1.5, "current": {"a": 1}})).unwrap_err();
        assert_eq!(err.cause(), "version: Not a valid integer.");
    }

    #[test]
    fn naive_timestamps_are_read_as_utc() {
        let event = deserialize_event(&json!({
            "name": "order.created",
            "timestamp": "2024-01-01T12:30:00.250"
        }))
        .unwrap();

        assert_eq!(
            event.timestamp().to_rfc3339(),
            "2024-01-01T12:30:00.250+00:00"
        );
    }

    #[test]
    fn shortened_iso_timestamps_are_accepted() {
        let cases = [
            ("2024-01-01T10:15Z", "2024-01-01T10:15:00+00:00"),
            ("2024-01-01T10:15+02:00", "2024-01-01T10:15:00+02:00"),
            ("2024-01-01 10:15:30", "2024-01-01T10:15:30+00:00"),
            ("2024-01-01 10:15:30+08:00", "2024-01-01T10:15:30+08:00"),
            ("2024-01-01T10:15", "2024-01-01T10:15:00+00:00"),
        ];

        for (input, expected) in cases {
            let timestamp = parse_datetime(input).unwrap_or_else(|| panic!("rejected {input}"));
            assert_eq!(timestamp.to_rfc3339(), expected, "{input}");
        }
        assert!(parse_datetime("2024-01-01").is_none());
        assert!(parse_datetime("yesterday").is_none());
    }

    #[test]
    fn offsets_survive_serialization() {
        let timestamp = DateTime::parse_from_rfc3339("2024-03-10T08:00:00+08:00").unwrap();
        let event = Event::builder()
            .name("order.paid")
            .timestamp(timestamp)
            .build();

        let data = serialize_payload(&Payload::builder().event(event).build()).unwrap();
        assert_eq!(data["event"]["timestamp"], json!("2024-03-10T08:00:00+08:00"));
    }

    #[test]
    fn prune_empty_only_touches_direct_keys() {
        let Value::Object(section) = json!({
            "a": null,
            "b": {},
            "c": {"d": null, "e": {}},
            "f": [null, {"g": null}],
            "i": 0,
            "j": "",
            "k": []
        }) else {
            unreachable!()
        };

        assert_eq!(
            Value::Object(prune_empty(section)),
            json!({
                "c": {"d": null, "e": {}},
                "f": [null, {"g": null}],
                "i": 0,
                "j": "",
                "k": []
            })
        );
    }

    #[test]
    fn cleared_fields_in_current_round_trip() {
        let mut current = Map::new();
        current.insert("shipped_at".into(), Value::Null);
        let mut previous = Map::new();
        previous.insert("shipped_at".into(), json!("2024-01-01"));
        let object = ObjectSnapshot::builder()
            .object_type("order")
            .current(current)
            .previous(previous)
            .build();
        let payload = Payload::builder()
            .event(order_created())
            .object(object)
            .build();

        let data = serialize_payload(&payload).unwrap();
        assert_eq!(data["object"]["current"], json!({"shipped_at": null}));
        assert_eq!(deserialize_payload(&data).unwrap(), payload);
    }

    #[test]
    fn nulls_inside_attributes_round_trip() {
        let Value::Object(attributes) = json!({"k": null, "t": [{"x": null}], "e": {}}) else {
            unreachable!()
        };
        let event = Event::builder()
            .name("order.created")
            .timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
            .attributes(attributes)
            .build();
        let payload = Payload::builder().event(event).build();

        let data = serialize_payload(&payload).unwrap();
        assert_eq!(
            data["event"]["attributes"],
            json!({"k": null, "t": [{"x": null}], "e": {}})
        );
        assert_eq!(deserialize_payload(&data).unwrap(), payload);
    }

    #[test]
    fn self_check_rejects_payloads_that_cannot_round_trip() {
        let invalid_name = Event::builder()
            .name("")
            .timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
            .build();
        let err = serialize_payload(&Payload::builder().event(invalid_name).build()).unwrap_err();
        assert_eq!(err.section(), Section::Event);

        // 空的 current 会被剪除，随后自检发现必填字段缺失
        let empty_current = ObjectSnapshot::builder().current(Map::new()).build();
        let payload = Payload::builder()
            .event(order_created())
            .object(empty_current)
            .build();
        let err = serialize_payload(&payload).unwrap_err();
        assert_eq!(err.section(), Section::Object);
        assert_eq!(err.cause(), "current: Missing data for required field.");
    }
}

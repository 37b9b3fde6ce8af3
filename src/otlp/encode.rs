//! Mapping records onto the OTLP logs schema

use crate::config::ExportSettings;
use crate::core::{format_timestamp, FieldValue, Level, LogRecord};
use opentelemetry_proto::tonic::collector::logs::v1::ExportLogsServiceRequest;
use opentelemetry_proto::tonic::common::v1::{any_value, AnyValue, InstrumentationScope, KeyValue};
use opentelemetry_proto::tonic::logs::v1::{
    LogRecord as OtlpLogRecord, ResourceLogs, ScopeLogs, SeverityNumber,
};
use opentelemetry_proto::tonic::resource::v1::Resource;

/// Reserved record attributes, always written before user fields
pub const LEVEL_ATTRIBUTE: &str = "level";
pub const TIMESTAMP_ATTRIBUTE: &str = "@timestamp";
pub const MESSAGE_ATTRIBUTE: &str = "_msg";

pub const SERVICE_NAME_ATTRIBUTE: &str = "service.name";
pub const SERVICE_VERSION_ATTRIBUTE: &str = "service.version";
pub const JOB_ATTRIBUTE: &str = "job";
pub const INSTANCE_ATTRIBUTE: &str = "instance";

pub const SCOPE_NAME: &str = env!("CARGO_PKG_NAME");
pub const SCOPE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Resource describing this process, fixed for the provider's lifetime
///
/// `job` repeats the service name and `instance` is the host name, the two
/// stream fields log stores such as VictoriaLogs group by.
pub fn build_resource(settings: &ExportSettings) -> Resource {
    Resource {
        attributes: vec![
            string_attribute(SERVICE_NAME_ATTRIBUTE, &settings.service_name),
            string_attribute(SERVICE_VERSION_ATTRIBUTE, &settings.service_version),
            string_attribute(JOB_ATTRIBUTE, &settings.service_name),
            string_attribute(INSTANCE_ATTRIBUTE, &instance_name()),
        ],
        ..Default::default()
    }
}

/// One request carrying one record
pub fn encode_request(resource: &Resource, record: &LogRecord) -> ExportLogsServiceRequest {
    ExportLogsServiceRequest {
        resource_logs: vec![ResourceLogs {
            resource: Some(resource.clone()),
            scope_logs: vec![ScopeLogs {
                scope: Some(InstrumentationScope {
                    name: SCOPE_NAME.to_string(),
                    version: SCOPE_VERSION.to_string(),
                    ..Default::default()
                }),
                log_records: vec![encode_record(record)],
                ..Default::default()
            }],
            ..Default::default()
        }],
    }
}

pub fn encode_record(record: &LogRecord) -> OtlpLogRecord {
    let nanos = record
        .timestamp
        .timestamp_nanos_opt()
        .and_then(|n| u64::try_from(n).ok())
        .unwrap_or_default();

    let mut attributes = Vec::with_capacity(3 + record.fields.len());
    attributes.push(string_attribute(LEVEL_ATTRIBUTE, record.level.as_str()));
    attributes.push(string_attribute(
        TIMESTAMP_ATTRIBUTE,
        &format_timestamp(&record.timestamp),
    ));
    attributes.push(string_attribute(MESSAGE_ATTRIBUTE, &record.message));
    attributes.extend(record.fields.iter().map(|(key, value)| KeyValue {
        key: key.clone(),
        value: Some(any_value(value)),
    }));

    OtlpLogRecord {
        time_unix_nano: nanos,
        observed_time_unix_nano: nanos,
        severity_number: severity_number(record.level) as i32,
        severity_text: record.level.as_upper_str().to_string(),
        body: Some(AnyValue {
            value: Some(any_value::Value::StringValue(record.message.clone())),
        }),
        attributes,
        ..Default::default()
    }
}

pub fn severity_number(level: Level) -> SeverityNumber {
    match level {
        Level::Debug => SeverityNumber::Debug,
        Level::Info => SeverityNumber::Info,
        Level::Warn => SeverityNumber::Warn,
        Level::Error => SeverityNumber::Error,
        Level::Fatal => SeverityNumber::Fatal,
    }
}

/// Null maps to an empty `AnyValue`; non-finite floats are sent as-is
pub fn any_value(value: &FieldValue) -> AnyValue {
    let value = match value {
        FieldValue::String(s) => Some(any_value::Value::StringValue(s.clone())),
        FieldValue::Int(i) => Some(any_value::Value::IntValue(*i)),
        FieldValue::Float(f) => Some(any_value::Value::DoubleValue(*f)),
        FieldValue::Bool(b) => Some(any_value::Value::BoolValue(*b)),
        FieldValue::Null => None,
    };
    AnyValue { value }
}

fn string_attribute(key: &str, value: &str) -> KeyValue {
    KeyValue {
        key: key.to_string(),
        value: Some(AnyValue {
            value: Some(any_value::Value::StringValue(value.to_string())),
        }),
    }
}

fn instance_name() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogConfig;
    use chrono::{TimeZone, Utc};

    fn attribute<'a>(attrs: &'a [KeyValue], key: &str) -> Option<&'a any_value::Value> {
        attrs
            .iter()
            .find(|kv| kv.key == key)
            .and_then(|kv| kv.value.as_ref())
            .and_then(|v| v.value.as_ref())
    }

    fn sample() -> LogRecord {
        let ts = Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap();
        LogRecord::new(Level::Warn, "cache miss", ts).with_fields(vec![
            ("key".to_string(), FieldValue::from("user:42")),
            ("attempt".to_string(), FieldValue::Int(3)),
            ("missing".to_string(), FieldValue::Null),
        ])
    }

    #[test]
    fn test_reserved_attributes_come_first() {
        let encoded = encode_record(&sample());
        let keys: Vec<&str> = encoded.attributes.iter().map(|kv| kv.key.as_str()).collect();
        assert_eq!(keys, ["level", "@timestamp", "_msg", "key", "attempt", "missing"]);

        assert_eq!(
            attribute(&encoded.attributes, "level"),
            Some(&any_value::Value::StringValue("warn".to_string()))
        );
        assert_eq!(
            attribute(&encoded.attributes, "@timestamp"),
            Some(&any_value::Value::StringValue(
                "2025-01-08T10:30:45.000000000Z".to_string()
            ))
        );
        assert_eq!(
            attribute(&encoded.attributes, "attempt"),
            Some(&any_value::Value::IntValue(3))
        );
        assert_eq!(attribute(&encoded.attributes, "missing"), None);
    }

    #[test]
    fn test_severity() {
        let encoded = encode_record(&sample());
        assert_eq!(encoded.severity_text, "WARN");
        assert_eq!(encoded.severity_number, SeverityNumber::Warn as i32);
        assert_eq!(encoded.time_unix_nano, 1_736_332_245_000_000_000);
        assert_eq!(severity_number(Level::Fatal), SeverityNumber::Fatal);
    }

    #[test]
    fn test_request_shape() {
        let resource = build_resource(&LogConfig::default().export);
        let request = encode_request(&resource, &sample());

        assert_eq!(request.resource_logs.len(), 1);
        let resource_logs = &request.resource_logs[0];
        let attrs = &resource_logs.resource.as_ref().unwrap().attributes;
        let keys: Vec<&str> = attrs.iter().map(|kv| kv.key.as_str()).collect();
        assert_eq!(keys, ["service.name", "service.version", "job", "instance"]);

        let scope_logs = &resource_logs.scope_logs[0];
        assert_eq!(scope_logs.scope.as_ref().unwrap().name, SCOPE_NAME);
        assert_eq!(scope_logs.log_records.len(), 1);
    }
}

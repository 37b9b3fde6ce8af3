//! Standard engine
//!
//! Each record is assembled into a `serde_json::Map` by a
//! [`StandardizedHandler`], which applies the canonical field names, and is
//! then serialized by a format [`Handler`].

use super::EngineKind;
use crate::config::LogConfig;
use crate::core::fields::{
    CALLER_FIELD, ENGINE_FIELD, LEVEL_FIELD, MESSAGE_FIELD, STACKTRACE_FIELD, TIMESTAMP_FIELD,
};
use crate::core::output_format::{escape_logfmt_key, escape_logfmt_value};
use crate::core::{sanitize_message, FieldMapper, FieldValue, LogRecord, OutputFormat, Result};
use crate::sinks::{SharedWriter, SinkSet};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Serializes one assembled entry
pub trait Handler: Send + Sync + fmt::Debug {
    /// Append the encoded entry, trailing newline included
    fn handle(&self, entry: &Map<String, Value>, out: &mut Vec<u8>) -> Result<()>;
}

/// One JSON object per line
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonHandler;

impl Handler for JsonHandler {
    fn handle(&self, entry: &Map<String, Value>, out: &mut Vec<u8>) -> Result<()> {
        serde_json::to_writer(&mut *out, entry)?;
        out.push(b'\n');
        Ok(())
    }
}

/// logfmt: `key=value` pairs separated by spaces
#[derive(Debug, Default, Clone, Copy)]
pub struct TextHandler;

impl Handler for TextHandler {
    fn handle(&self, entry: &Map<String, Value>, out: &mut Vec<u8>) -> Result<()> {
        let mut line = String::with_capacity(256);
        for (idx, (key, value)) in entry.iter().enumerate() {
            if idx > 0 {
                line.push(' ');
            }
            line.push_str(&escape_logfmt_key(key));
            line.push('=');
            let rendered = match value {
                Value::String(s) => escape_logfmt_value(&sanitize_message(s)),
                other => escape_logfmt_value(&other.to_string()),
            };
            line.push_str(&rendered);
        }
        line.push('\n');
        out.extend_from_slice(line.as_bytes());
        Ok(())
    }
}

/// First stage of the chain
///
/// Builds the canonical entry from a record and the persistent attributes,
/// renaming every key through the field mapper, then hands it to the inner
/// handler.
#[derive(Debug, Clone)]
pub struct StandardizedHandler {
    mapper: &'static FieldMapper,
    attrs: Arc<Vec<(String, Value)>>,
    inner: Arc<dyn Handler>,
}

impl StandardizedHandler {
    pub fn new(inner: Arc<dyn Handler>) -> Self {
        Self {
            mapper: FieldMapper::global(),
            attrs: Arc::new(Vec::new()),
            inner,
        }
    }

    /// Handler that writes `attrs` on every entry in place of the current ones
    pub fn with_attrs(&self, attrs: &[(String, FieldValue)]) -> Self {
        let attrs = attrs
            .iter()
            .map(|(k, v)| (self.mapper.record_key(k), v.to_json_value()))
            .collect();

        Self {
            mapper: self.mapper,
            attrs: Arc::new(attrs),
            inner: Arc::clone(&self.inner),
        }
    }

    /// Canonical entry for `record`
    pub fn entry(&self, record: &LogRecord) -> Map<String, Value> {
        let mut entry = Map::with_capacity(6 + self.attrs.len() + record.fields.len());
        entry.insert(
            TIMESTAMP_FIELD.to_string(),
            Value::String(record.formatted_timestamp()),
        );
        entry.insert(
            LEVEL_FIELD.to_string(),
            Value::String(record.level.as_str().to_string()),
        );
        entry.insert(MESSAGE_FIELD.to_string(), Value::String(record.message.clone()));

        if let Some(caller) = &record.caller {
            entry.insert(CALLER_FIELD.to_string(), Value::String(caller.clone()));
        }
        if let Some(stacktrace) = &record.stacktrace {
            entry.insert(STACKTRACE_FIELD.to_string(), Value::String(stacktrace.clone()));
        }

        for (key, value) in self.attrs.iter() {
            entry.insert(key.clone(), value.clone());
        }
        for (key, value) in &record.fields {
            entry.insert(self.mapper.record_key(key), value.to_json_value());
        }

        entry.insert(
            ENGINE_FIELD.to_string(),
            Value::String(EngineKind::Standard.as_str().to_string()),
        );
        entry
    }

    pub fn handle(&self, record: &LogRecord, out: &mut Vec<u8>) -> Result<()> {
        self.inner.handle(&self.entry(record), out)
    }
}

#[derive(Debug, Clone)]
pub struct StandardEngine {
    sinks: SinkSet,
    handler: StandardizedHandler,
}

impl StandardEngine {
    /// Open the configured sinks; files are shared with other writers
    pub fn new(config: &LogConfig, writers: &[(String, SharedWriter)]) -> Result<Self> {
        let sinks = SinkSet::open(&config.outputs, writers, false)?;
        let inner: Arc<dyn Handler> = match config.format {
            OutputFormat::Json => Arc::new(JsonHandler),
            OutputFormat::Console => Arc::new(TextHandler),
        };

        Ok(Self {
            sinks,
            handler: StandardizedHandler::new(inner),
        })
    }

    /// Engine writing `fields` as the persistent fields of every record
    pub fn with_context(&self, fields: &[(String, FieldValue)]) -> Self {
        Self {
            sinks: self.sinks.clone(),
            handler: self.handler.with_attrs(fields),
        }
    }

    pub fn emit(&self, record: &LogRecord) -> Result<()> {
        let mut buf = Vec::with_capacity(256);
        self.handler.handle(record, &mut buf)?;
        self.sinks.write(&buf)
    }

    pub fn sync(&self) -> Result<()> {
        self.sinks.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Level;
    use crate::sinks::SharedBuffer;
    use chrono::{TimeZone, Utc};
    use parking_lot::Mutex;

    fn engine(format: OutputFormat) -> (StandardEngine, SharedBuffer) {
        let buffer = SharedBuffer::new();
        let config = LogConfig {
            format,
            outputs: Vec::new(),
            ..LogConfig::default()
        };
        let writer: SharedWriter = Arc::new(Mutex::new(buffer.clone()));
        let engine = StandardEngine::new(&config, &[("memory".to_string(), writer)]).unwrap();
        (engine, buffer)
    }

    fn record() -> LogRecord {
        let ts = Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap();
        LogRecord::new(Level::Warn, "disk almost full", ts)
            .with_caller(Some("src/disk.rs:7".to_string()))
            .with_fields(vec![
                ("traceId".to_string(), FieldValue::from("abc")),
                ("free_pct".to_string(), FieldValue::Float(4.5)),
            ])
    }

    #[test]
    fn test_json_entry_layout() {
        let (engine, buffer) = engine(OutputFormat::Json);
        engine.emit(&record()).unwrap();

        let line = buffer.contents();
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["level"], "warn");
        assert_eq!(value["message"], "disk almost full");
        assert_eq!(value["trace_id"], "abc");
        assert_eq!(value["free_pct"], 4.5);
        assert_eq!(value["engine"], "standard");

        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys[..3], ["timestamp", "level", "message"]);
        assert_eq!(keys.last(), Some(&"engine"));
    }

    #[test]
    fn test_attrs_are_standardized() {
        let (engine, buffer) = engine(OutputFormat::Json);
        let child = engine.with_context(&[("requestId".to_string(), FieldValue::from("r-1"))]);
        child.emit(&record()).unwrap();

        let value: serde_json::Value = serde_json::from_str(buffer.contents().trim_end()).unwrap();
        assert_eq!(value["request_id"], "r-1");
        assert!(value.get("requestId").is_none());
    }

    #[test]
    fn test_raw_reserved_keys_never_overwrite_the_record() {
        let (engine, buffer) = engine(OutputFormat::Json);
        let ts = record().timestamp;
        let record = LogRecord::new(Level::Info, "real", ts)
            .with_fields(vec![("msg".to_string(), FieldValue::from("user value"))]);
        engine.emit(&record).unwrap();

        let value: serde_json::Value = serde_json::from_str(buffer.contents().trim_end()).unwrap();
        assert_eq!(value["message"], "real");
        assert_eq!(value["fields.message"], "user value");
    }

    #[test]
    fn test_text_handler() {
        let (engine, buffer) = engine(OutputFormat::Console);
        engine.emit(&record()).unwrap();

        let line = buffer.contents();
        assert!(line.starts_with("timestamp=2025-01-08T10:30:45.000000000Z level=warn "));
        assert!(line.contains("message=\"disk almost full\""));
        assert!(line.contains("trace_id=abc"));
        assert!(line.trim_end().ends_with("engine=standard"));
    }

    #[test]
    fn test_text_handler_escapes_line_breaks() {
        let (engine, buffer) = engine(OutputFormat::Console);
        let ts = record().timestamp;
        engine
            .emit(&LogRecord::new(Level::Info, "a\nforged=entry", ts))
            .unwrap();

        assert_eq!(buffer.lines().len(), 1);
        assert!(buffer.contents().contains("message=\"a\\\\nforged=entry\""));
    }
}

//! Performance engine
//!
//! Records are encoded by hand into a per-thread byte buffer and written with
//! one call per sink. Persistent fields are encoded once, when the child
//! engine is created, and copied verbatim into every record.

use super::EngineKind;
use crate::config::LogConfig;
use crate::core::fields::{
    CALLER_FIELD, ENGINE_FIELD, LEVEL_FIELD, MESSAGE_FIELD, STACKTRACE_FIELD, TIMESTAMP_FIELD,
};
use crate::core::{sanitize_message, FieldValue, LogRecord, OutputFormat, Result};
use crate::sinks::{SharedWriter, SinkSet};
use colored::Colorize;
use std::cell::RefCell;
use std::io::Write;
use std::sync::Arc;

const INITIAL_BUFFER_CAPACITY: usize = 512;

thread_local! {
    static ENCODE_BUFFER: RefCell<Vec<u8>> = RefCell::new(Vec::with_capacity(INITIAL_BUFFER_CAPACITY));
}

#[derive(Debug, Clone)]
pub struct PerformanceEngine {
    sinks: SinkSet,
    format: OutputFormat,
    colorize: bool,
    /// `,"key":value` for every persistent field
    context: Arc<Vec<u8>>,
}

impl PerformanceEngine {
    /// Open the configured sinks, each file under an exclusive lock
    pub fn new(config: &LogConfig, writers: &[(String, SharedWriter)]) -> Result<Self> {
        let sinks = SinkSet::open(&config.outputs, writers, true)?;
        let colorize =
            config.development && config.format == OutputFormat::Console && sinks.all_terminals();

        Ok(Self {
            sinks,
            format: config.format,
            colorize,
            context: Arc::new(Vec::new()),
        })
    }

    /// Engine writing `fields` as the persistent fields of every record
    pub fn with_context(&self, fields: &[(String, FieldValue)]) -> Self {
        let mut context = Vec::with_capacity(fields.len() * 24);
        for (key, value) in fields {
            context.push(b',');
            write_field(&mut context, key, value);
        }

        Self {
            sinks: self.sinks.clone(),
            format: self.format,
            colorize: self.colorize,
            context: Arc::new(context),
        }
    }

    pub fn emit(&self, record: &LogRecord) -> Result<()> {
        ENCODE_BUFFER.with(|cell| match cell.try_borrow_mut() {
            Ok(mut buf) => {
                buf.clear();
                self.encode(record, &mut buf);
                let result = self.sinks.write(&buf);
                if buf.capacity() > INITIAL_BUFFER_CAPACITY * 64 {
                    buf.shrink_to(INITIAL_BUFFER_CAPACITY);
                }
                result
            }
            // Re-entered from inside an encode; use a throwaway buffer
            Err(_) => {
                let mut buf = Vec::with_capacity(INITIAL_BUFFER_CAPACITY);
                self.encode(record, &mut buf);
                self.sinks.write(&buf)
            }
        })
    }

    pub fn sync(&self) -> Result<()> {
        self.sinks.flush()
    }

    fn encode(&self, record: &LogRecord, buf: &mut Vec<u8>) {
        match self.format {
            OutputFormat::Json => self.encode_json(record, buf),
            OutputFormat::Console => self.encode_console(record, buf),
        }
    }

    fn encode_json(&self, record: &LogRecord, buf: &mut Vec<u8>) {
        buf.push(b'{');
        write_key(buf, TIMESTAMP_FIELD);
        write_str(buf, &record.formatted_timestamp());
        buf.push(b',');
        write_key(buf, LEVEL_FIELD);
        write_str(buf, record.level.as_str());
        buf.push(b',');
        write_key(buf, MESSAGE_FIELD);
        write_str(buf, &record.message);

        if let Some(caller) = &record.caller {
            buf.push(b',');
            write_key(buf, CALLER_FIELD);
            write_str(buf, caller);
        }
        if let Some(stacktrace) = &record.stacktrace {
            buf.push(b',');
            write_key(buf, STACKTRACE_FIELD);
            write_str(buf, stacktrace);
        }

        buf.extend_from_slice(&self.context);
        for (key, value) in &record.fields {
            buf.push(b',');
            write_field(buf, key, value);
        }

        buf.push(b',');
        write_key(buf, ENGINE_FIELD);
        write_str(buf, EngineKind::Performance.as_str());
        buf.extend_from_slice(b"}\n");
    }

    /// `timestamp<TAB>LEVEL<TAB>caller<TAB>message<TAB>{fields}`, stack trace on
    /// the following lines
    fn encode_console(&self, record: &LogRecord, buf: &mut Vec<u8>) {
        buf.extend_from_slice(record.formatted_timestamp().as_bytes());
        buf.push(b'\t');

        let level = record.level.as_upper_str();
        if self.colorize {
            let _ = write!(buf, "{}", level.color(record.level.color_code()));
        } else {
            buf.extend_from_slice(level.as_bytes());
        }
        buf.push(b'\t');

        if let Some(caller) = &record.caller {
            buf.extend_from_slice(caller.as_bytes());
            buf.push(b'\t');
        }

        buf.extend_from_slice(sanitize_message(&record.message).as_bytes());
        buf.push(b'\t');

        buf.push(b'{');
        write_key(buf, ENGINE_FIELD);
        write_str(buf, EngineKind::Performance.as_str());
        buf.extend_from_slice(&self.context);
        for (key, value) in &record.fields {
            buf.push(b',');
            write_field(buf, key, value);
        }
        buf.push(b'}');
        buf.push(b'\n');

        if let Some(stacktrace) = &record.stacktrace {
            buf.extend_from_slice(stacktrace.as_bytes());
            buf.push(b'\n');
        }
    }
}

fn write_key(buf: &mut Vec<u8>, key: &str) {
    write_str(buf, key);
    buf.push(b':');
}

fn write_str(buf: &mut Vec<u8>, value: &str) {
    // Serializing a str into a Vec cannot fail
    let _ = serde_json::to_writer(&mut *buf, value);
}

fn write_field(buf: &mut Vec<u8>, key: &str, value: &FieldValue) {
    write_key(buf, key);
    match value {
        FieldValue::String(s) => write_str(buf, s),
        FieldValue::Int(i) => {
            let _ = write!(buf, "{}", i);
        }
        FieldValue::Float(f) if f.is_finite() => {
            let _ = serde_json::to_writer(&mut *buf, f);
        }
        FieldValue::Float(_) | FieldValue::Null => buf.extend_from_slice(b"null"),
        FieldValue::Bool(b) => buf.extend_from_slice(if *b { b"true" } else { b"false" }),
    }
}

//! Log record structure

use super::field_value::{FieldValue, Fields};
use super::level::Level;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;

/// One log call, after the calling conventions have converged
///
/// Created fresh for every emitted call and dropped once written and exported.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    pub caller: Option<String>,
    pub stacktrace: Option<String>,
    /// Call-site fields, already standardized
    pub fields: Fields,
}

impl LogRecord {
    pub fn new(level: Level, message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            level,
            message: message.into(),
            caller: None,
            stacktrace: None,
            fields: Vec::new(),
        }
    }

    pub fn with_caller(mut self, caller: Option<String>) -> Self {
        self.caller = caller;
        self
    }

    pub fn with_stacktrace(mut self, stacktrace: Option<String>) -> Self {
        self.stacktrace = stacktrace;
        self
    }

    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.fields = fields;
        self
    }

    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn formatted_timestamp(&self) -> String {
        format_timestamp(&self.timestamp)
    }
}

/// RFC 3339 with nanoseconds and a `Z` suffix
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Join simple values with single spaces into one message
pub fn concat_args(args: &[&dyn fmt::Display]) -> String {
    let mut message = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            message.push(' ');
        }
        fmt::write(&mut message, format_args!("{}", arg)).ok();
    }
    message
}

/// Escape line breaks and tabs so one record stays on one text line
///
/// Prevents forged entries in human-readable output. JSON output escapes
/// these on its own.
pub fn sanitize_message(message: &str) -> String {
    message
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

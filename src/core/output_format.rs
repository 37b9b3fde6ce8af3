//! Output format selection for local sinks
//!
//! - Json: one object per line, keyed by the canonical field names
//! - Console: human-readable line, layout chosen by the engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Output format for log records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON format for machine processing (default)
    ///
    /// Example: `{"timestamp":"2025-01-08T10:30:45.000000000Z","level":"info","message":"Request processed","engine":"standard"}`
    #[default]
    Json,

    /// Human-readable format
    ///
    /// Example (standard engine): `timestamp=2025-01-08T10:30:45.000000000Z level=info message="Request processed"`
    Console,
}

impl OutputFormat {
    /// Lenient parse: `console`/`text` select Console, anything else Json
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "console" | "text" => OutputFormat::Console,
            _ => OutputFormat::Json,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Console => "console",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Escape a logfmt key (remove spaces and special chars)
pub(crate) fn escape_logfmt_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || *c == '.' || *c == '@')
        .collect()
}

/// Escape a logfmt value (quote if contains spaces)
pub(crate) fn escape_logfmt_value(value: &str) -> String {
    if value.is_empty() || value.contains(' ') || value.contains('"') || value.contains('=') {
        quote_logfmt_value(value)
    } else {
        value.to_string()
    }
}

/// Quote a logfmt value
pub(crate) fn quote_logfmt_value(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

//! Engine variants behind the [`Logger`](crate::Logger) capability
//!
//! Both variants take the same [`LogRecord`] and write the same canonical
//! shape; only the `engine` attribute tells them apart.
//!
//! - [`PerformanceEngine`]: encodes straight into a reusable byte buffer
//! - [`StandardEngine`]: builds a JSON map through a [`Handler`] chain

pub mod performance;
pub mod standard;

pub use performance::PerformanceEngine;
pub use standard::{Handler, JsonHandler, StandardEngine, StandardizedHandler, TextHandler};

use crate::config::LogConfig;
use crate::core::{FieldValue, LogRecord, LoggerError, Result};
use crate::sinks::SharedWriter;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which engine variant produces the records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Pre-encoded fields, direct byte output, exclusive file sinks
    Performance,
    /// Handler chain over a JSON map (default)
    #[default]
    Standard,
}

impl EngineKind {
    pub const ALL: [EngineKind; 2] = [EngineKind::Performance, EngineKind::Standard];

    /// Case-insensitive match against the two engine names
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "performance" => Some(EngineKind::Performance),
            "standard" => Some(EngineKind::Standard),
            _ => None,
        }
    }

    /// Unknown names select the standard engine
    pub fn parse_or_default(value: &str) -> Self {
        Self::parse(value).unwrap_or_default()
    }

    /// Value of the `engine` attribute on every record
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Performance => "performance",
            EngineKind::Standard => "standard",
        }
    }

    /// The variant tried when this one fails to build
    pub fn alternate(self) -> Self {
        match self {
            EngineKind::Performance => EngineKind::Standard,
            EngineKind::Standard => EngineKind::Performance,
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
            .ok_or_else(|| LoggerError::config("engine", format!("unknown engine '{}'", s)))
    }
}

/// A built engine
///
/// Cloning is cheap: sinks are shared, persistent fields are copied.
#[derive(Debug, Clone)]
pub enum Engine {
    Performance(PerformanceEngine),
    Standard(StandardEngine),
}

impl Engine {
    /// Build the `kind` variant for `config`, opening its sinks
    ///
    /// `writers` are extra named sinks added after the configured outputs.
    pub fn build(
        kind: EngineKind,
        config: &LogConfig,
        writers: &[(String, SharedWriter)],
    ) -> Result<Self> {
        match kind {
            EngineKind::Performance => {
                PerformanceEngine::new(config, writers).map(Engine::Performance)
            }
            EngineKind::Standard => StandardEngine::new(config, writers).map(Engine::Standard),
        }
    }

    pub fn kind(&self) -> EngineKind {
        match self {
            Engine::Performance(_) => EngineKind::Performance,
            Engine::Standard(_) => EngineKind::Standard,
        }
    }

    /// Encode `record` and write it to every sink
    pub fn emit(&self, record: &LogRecord) -> Result<()> {
        match self {
            Engine::Performance(engine) => engine.emit(record),
            Engine::Standard(engine) => engine.emit(record),
        }
    }

    /// Engine sharing these sinks that writes `fields` as the persistent
    /// fields of every record, replacing the current ones
    ///
    /// `fields` must already be standardized and free of repeated keys.
    pub fn with_context(&self, fields: &[(String, FieldValue)]) -> Self {
        match self {
            Engine::Performance(engine) => Engine::Performance(engine.with_context(fields)),
            Engine::Standard(engine) => Engine::Standard(engine.with_context(fields)),
        }
    }

    pub fn sync(&self) -> Result<()> {
        match self {
            Engine::Performance(engine) => engine.sync(),
            Engine::Standard(engine) => engine.sync(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(EngineKind::parse("performance"), Some(EngineKind::Performance));
        assert_eq!(EngineKind::parse(" Standard "), Some(EngineKind::Standard));
        assert_eq!(EngineKind::parse("zap"), None);
        assert_eq!(EngineKind::parse_or_default("zap"), EngineKind::Standard);
        assert!("turbo".parse::<EngineKind>().is_err());
    }

    #[test]
    fn test_alternate() {
        for kind in EngineKind::ALL {
            assert_ne!(kind.alternate(), kind);
            assert_eq!(kind.alternate().alternate(), kind);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(EngineKind::Performance.to_string(), "performance");
        assert_eq!(EngineKind::Standard.to_string(), "standard");
    }
}

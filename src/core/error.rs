//! Error types for the logger system

use crate::engines::EngineKind;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Level string that matches none of the recognized severities
    #[error("Invalid log level: '{value}'")]
    InvalidLevel { value: String },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Both the requested engine and its fallback failed to build
    #[error("Failed to construct logger: {primary} engine ({primary_error}); {fallback} engine ({fallback_error})")]
    EngineConstruction {
        primary: EngineKind,
        primary_error: String,
        fallback: EngineKind,
        fallback_error: String,
    },

    /// Output sink could not be opened
    #[error("Failed to open output sink '{path}': {source}")]
    SinkOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Output sink is held by another writer
    #[error("Output sink '{path}' is locked by another writer")]
    SinkLocked { path: String },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Remote export failure
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an invalid level error
    pub fn invalid_level(value: impl Into<String>) -> Self {
        LoggerError::InvalidLevel {
            value: value.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a sink open error
    pub fn sink_open(path: impl Into<String>, source: std::io::Error) -> Self {
        LoggerError::SinkOpen {
            path: path.into(),
            source,
        }
    }

    /// Create a sink locked error
    pub fn sink_locked(path: impl Into<String>) -> Self {
        LoggerError::SinkLocked { path: path.into() }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// True for defects in the supplied configuration rather than the environment
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            LoggerError::InvalidLevel { .. } | LoggerError::InvalidConfiguration { .. }
        )
    }
}

/// Failures on the OTLP export path
///
/// These never reach the caller of a log method; the logger reports them
/// on stderr and counts them in its metrics.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Transport could not be set up
    #[error("failed to connect to '{endpoint}': {message}")]
    Connect { endpoint: String, message: String },

    /// Request was sent but the transport failed
    #[error("transport error for '{endpoint}': {message}")]
    Transport { endpoint: String, message: String },

    /// Collector answered with a non-2xx status
    #[error("HTTP export to '{url}' failed with status {status}")]
    HttpStatus { url: String, status: u16 },

    /// gRPC call returned an error status
    #[error("gRPC export failed: {0}")]
    Rpc(String),

    /// Export did not finish within the per-call timeout
    #[error("export timed out after {0:?}")]
    Timeout(Duration),

    /// Async runtime backing the gRPC channel is unavailable
    #[error("export runtime error: {0}")]
    Runtime(String),
}

impl ExportError {
    pub fn connect(endpoint: impl Into<String>, message: impl ToString) -> Self {
        ExportError::Connect {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    pub fn transport(endpoint: impl Into<String>, message: impl ToString) -> Self {
        ExportError::Transport {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::invalid_level("verbose");
        assert!(matches!(err, LoggerError::InvalidLevel { .. }));
        assert!(err.is_configuration_error());

        let err = LoggerError::config("otlp", "bad header");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
        assert!(err.is_configuration_error());

        let err = LoggerError::sink_locked("/var/log/app.log");
        assert!(!err.is_configuration_error());
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::invalid_level("verbose");
        assert_eq!(err.to_string(), "Invalid log level: 'verbose'");

        let err = LoggerError::EngineConstruction {
            primary: EngineKind::Performance,
            primary_error: "locked".to_string(),
            fallback: EngineKind::Standard,
            fallback_error: "no such file".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to construct logger: performance engine (locked); standard engine (no such file)"
        );

        let err: LoggerError = ExportError::HttpStatus {
            url: "http://localhost:4318/v1/logs".to_string(),
            status: 503,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Export error: HTTP export to 'http://localhost:4318/v1/logs' failed with status 503"
        );
    }

    #[test]
    fn test_export_error_display() {
        assert_eq!(
            ExportError::connect("collector:4317", "refused").to_string(),
            "failed to connect to 'collector:4317': refused"
        );
        assert_eq!(
            ExportError::transport("collector:4318", "reset").to_string(),
            "transport error for 'collector:4318': reset"
        );
        assert_eq!(
            ExportError::Timeout(Duration::from_millis(500)).to_string(),
            "export timed out after 500ms"
        );
        assert!(ExportError::Rpc("unavailable".to_string())
            .to_string()
            .contains("unavailable"));
    }

    #[test]
    fn test_sink_open_error_keeps_source() {
        use std::error::Error as _;

        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = LoggerError::sink_open("/root/app.log", io_err);

        assert!(err.to_string().contains("/root/app.log"));
        assert!(err.source().is_some());
    }
}

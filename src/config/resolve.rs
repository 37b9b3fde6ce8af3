//! Reconciling a raw [`LogOption`] into one unambiguous [`LogConfig`]

use super::option::{
    LogOption, OtlpOption, DEFAULT_PROTOCOL, DEFAULT_SERVICE_NAME, DEFAULT_SERVICE_VERSION,
    DEFAULT_TIMEOUT,
};
use crate::core::{Level, LoggerError, OutputFormat, Result};
use crate::engines::EngineKind;
use crate::sinks::SinkTarget;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Wire transport for export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Protocol {
    #[default]
    Grpc,
    Http,
}

impl Protocol {
    /// `http` and `http/protobuf` select HTTP; everything else gRPC
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" | "http/protobuf" => Protocol::Http,
            _ => Protocol::Grpc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Grpc => "grpc",
            Protocol::Http => "http",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved export settings
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub enabled: Option<bool>,
    pub endpoint: String,
    pub protocol: Protocol,
    pub timeout: Duration,
    pub headers: BTreeMap<String, String>,
    pub service_name: String,
    pub service_version: String,
}

impl ExportSettings {
    /// The one predicate that gates export
    pub fn is_enabled(&self) -> bool {
        self.enabled == Some(true) && !self.endpoint.is_empty()
    }
}

/// Fully resolved logger configuration
///
/// Immutable once built; the factory owns it and engines read from it.
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    pub engine: EngineKind,
    pub level: Level,
    pub format: OutputFormat,
    pub outputs: Vec<SinkTarget>,
    pub development: bool,
    pub disable_caller: bool,
    pub disable_stacktrace: bool,
    pub export: ExportSettings,
}

impl LogConfig {
    pub fn is_export_enabled(&self) -> bool {
        self.export.is_enabled()
    }

    /// Whether records at `level` carry a stack trace
    pub fn wants_stacktrace(&self, level: Level) -> bool {
        if self.disable_stacktrace {
            return false;
        }
        let threshold = if self.development { Level::Warn } else { Level::Error };
        level >= threshold
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            level: Level::default(),
            format: OutputFormat::default(),
            outputs: vec![SinkTarget::Stdout],
            development: false,
            disable_caller: false,
            disable_stacktrace: false,
            export: ExportSettings {
                enabled: None,
                endpoint: String::new(),
                protocol: Protocol::Grpc,
                timeout: DEFAULT_TIMEOUT,
                headers: BTreeMap::new(),
                service_name: DEFAULT_SERVICE_NAME.to_string(),
                service_version: DEFAULT_SERVICE_VERSION.to_string(),
            },
        }
    }
}

impl LogOption {
    /// Normalize this option in place
    ///
    /// Reconciles the flattened and nested export settings, falls back to the
    /// standard engine for unknown engine names and canonicalizes the level.
    /// An unparseable level is the only error.
    pub fn validate(&mut self) -> Result<()> {
        let level: Level = self.level.parse()?;
        self.level = level.as_str().to_string();

        self.reconcile_export();

        self.engine = EngineKind::parse_or_default(&self.engine).as_str().to_string();
        Ok(())
    }

    /// Export switch after [`validate`](Self::validate)
    pub fn is_export_enabled(&self) -> bool {
        self.otlp.as_ref().map(OtlpOption::is_enabled).unwrap_or(false)
    }

    /// Validate and convert into the typed configuration
    pub fn resolve(mut self) -> Result<LogConfig> {
        self.validate()?;

        let level: Level = self.level.parse()?;
        let engine = EngineKind::parse_or_default(&self.engine);
        let format = OutputFormat::parse_lenient(&self.format);

        let outputs: Vec<SinkTarget> = self
            .output_paths
            .iter()
            .map(|p| SinkTarget::parse(p))
            .collect();

        let otlp = self.otlp.unwrap_or_default();
        for key in otlp.headers.keys() {
            if key.trim().is_empty() {
                return Err(LoggerError::config("otlp", "header names must not be empty"));
            }
        }

        let export = ExportSettings {
            enabled: otlp.enabled,
            endpoint: otlp.endpoint.trim().to_string(),
            protocol: Protocol::parse_lenient(&otlp.protocol),
            timeout: otlp.timeout,
            headers: otlp.headers,
            service_name: non_empty_or(otlp.service_name, DEFAULT_SERVICE_NAME),
            service_version: non_empty_or(otlp.service_version, DEFAULT_SERVICE_VERSION),
        };

        Ok(LogConfig {
            engine,
            level,
            format,
            outputs,
            development: self.development,
            disable_caller: self.disable_caller,
            disable_stacktrace: self.disable_stacktrace,
            export,
        })
    }

    fn reconcile_export(&mut self) {
        let flattened = self.otlp_endpoint.trim().to_string();
        let otlp = self.otlp_mut();

        if otlp.enabled == Some(false) {
            return;
        }

        if !flattened.is_empty() {
            otlp.enabled.get_or_insert(true);
            otlp.endpoint = flattened;
        } else if otlp.enabled.is_none() && !otlp.endpoint.trim().is_empty() {
            otlp.enabled = Some(true);
        }

        // Enabled with nowhere to send is switched off
        if otlp.enabled == Some(true) && otlp.endpoint.trim().is_empty() {
            otlp.enabled = Some(false);
        }

        if otlp.enabled == Some(true) {
            if otlp.protocol.trim().is_empty() {
                otlp.protocol = DEFAULT_PROTOCOL.to_string();
            }
            if otlp.timeout.is_zero() {
                otlp.timeout = DEFAULT_TIMEOUT;
            }
        }
    }
}

fn non_empty_or(value: String, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_explicit_disable_wins() {
        let opt = LogOption::default()
            .with_otlp_endpoint("collector:4317")
            .with_otlp(OtlpOption::default().with_enabled(false).with_endpoint("other:4317"));

        let config = opt.resolve().unwrap();
        assert!(!config.is_export_enabled());
        assert_eq!(config.export.enabled, Some(false));
        assert_eq!(config.export.endpoint, "other:4317");
    }

    #[test]
    fn test_flattened_endpoint_enables_and_overrides() {
        let opt = LogOption::default()
            .with_otlp_endpoint("flat:4317")
            .with_otlp(OtlpOption::default().with_endpoint("nested:4317"));

        let config = opt.resolve().unwrap();
        assert!(config.is_export_enabled());
        assert_eq!(config.export.endpoint, "flat:4317");
        assert_eq!(config.export.protocol, Protocol::Grpc);
        assert_eq!(config.export.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_flattened_only_without_nested_block() {
        let mut opt = LogOption::empty().with_level("info").with_otlp_endpoint("flat:4317");
        assert!(opt.otlp.is_none());

        opt.validate().unwrap();
        assert!(opt.is_export_enabled());
        let otlp = opt.otlp.as_ref().unwrap();
        assert_eq!(otlp.protocol, "grpc");
        assert_eq!(otlp.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_nested_endpoint_enables() {
        let opt = LogOption::default().with_otlp(
            OtlpOption::default()
                .with_endpoint("nested:4318")
                .with_protocol("http")
                .with_timeout(Duration::from_secs(3)),
        );

        let config = opt.resolve().unwrap();
        assert!(config.is_export_enabled());
        assert_eq!(config.export.protocol, Protocol::Http);
        assert_eq!(config.export.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_enabled_without_endpoint_is_switched_off() {
        let mut opt = LogOption::default()
            .with_otlp(OtlpOption::default().with_enabled(true).with_endpoint("   "));
        opt.validate().unwrap();
        assert_eq!(opt.otlp.as_ref().unwrap().enabled, Some(false));

        let config = opt.resolve().unwrap();
        assert_eq!(config.export.enabled, Some(false));
        assert!(!config.is_export_enabled());
    }

    #[test]
    fn test_no_endpoints_means_no_export() {
        let config = LogOption::default().resolve().unwrap();
        assert!(!config.is_export_enabled());
        assert_eq!(config.export.enabled, None);
    }

    #[test]
    fn test_unknown_engine_falls_back() {
        let mut opt = LogOption::default().with_engine("turbo");
        opt.validate().unwrap();
        assert_eq!(opt.engine, "standard");

        let config = LogOption::default().with_engine("performance").resolve().unwrap();
        assert_eq!(config.engine, EngineKind::Performance);
    }

    #[test]
    fn test_invalid_level_is_error() {
        for bad in ["verbose", "", "warning", "INF0"] {
            let err = LogOption::default().with_level(bad).resolve().unwrap_err();
            assert!(matches!(err, LoggerError::InvalidLevel { .. }), "level {:?}", bad);
        }
    }

    #[test]
    fn test_level_canonicalized() {
        let mut opt = LogOption::default().with_level("WARN");
        opt.validate().unwrap();
        assert_eq!(opt.level, "warn");
    }

    #[test]
    fn test_outputs_and_format() {
        let config = LogOption::default()
            .with_format("console")
            .with_output_paths(["stderr", "/tmp/app.log"])
            .resolve()
            .unwrap();

        assert_eq!(config.format, OutputFormat::Console);
        assert_eq!(
            config.outputs,
            vec![SinkTarget::Stderr, SinkTarget::File(PathBuf::from("/tmp/app.log"))]
        );

        let config = LogOption::default()
            .with_output_paths(Vec::<String>::new())
            .resolve()
            .unwrap();
        assert!(config.outputs.is_empty());
    }

    #[test]
    fn test_stacktrace_threshold() {
        let mut config = LogConfig::default();
        assert!(!config.wants_stacktrace(Level::Warn));
        assert!(config.wants_stacktrace(Level::Error));
        assert!(config.wants_stacktrace(Level::Fatal));

        config.development = true;
        assert!(config.wants_stacktrace(Level::Warn));
        assert!(!config.wants_stacktrace(Level::Info));

        config.disable_stacktrace = true;
        assert!(!config.wants_stacktrace(Level::Fatal));
    }

    #[test]
    fn test_service_defaults() {
        let config = LogOption::default().resolve().unwrap();
        assert_eq!(config.export.service_name, DEFAULT_SERVICE_NAME);
        assert_eq!(config.export.service_version, DEFAULT_SERVICE_VERSION);
    }
}

//! Raw logger configuration as supplied by code, files or the environment

use super::duration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_ENGINE: &str = "standard";
pub const DEFAULT_LEVEL: &str = "info";
pub const DEFAULT_FORMAT: &str = "json";
pub const DEFAULT_OUTPUT: &str = "stdout";
pub const DEFAULT_PROTOCOL: &str = "grpc";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_SERVICE_NAME: &str = "unified-logger";
pub const DEFAULT_SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Complete logger configuration before resolution
///
/// Export settings may arrive flattened (`otlp_endpoint`) or nested (`otlp`);
/// [`LogOption::resolve`](super::LogOption::resolve) reconciles the two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogOption {
    /// `performance` or `standard`
    pub engine: String,

    /// Minimum level: debug, info, warn, error or fatal
    pub level: String,

    /// `json` or `console`
    pub format: String,

    /// `stdout`, `stderr` or file paths
    pub output_paths: Vec<String>,

    /// Flattened export endpoint
    pub otlp_endpoint: String,

    /// Nested export settings
    pub otlp: Option<OtlpOption>,

    /// Colorized console output and stack traces from warn upward
    pub development: bool,

    pub disable_caller: bool,

    pub disable_stacktrace: bool,
}

/// Nested export settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OtlpOption {
    /// Unset is distinct from `false`: unset lets an endpoint switch export on
    pub enabled: Option<bool>,

    pub endpoint: String,

    /// `grpc` or `http`
    pub protocol: String,

    #[serde(with = "duration")]
    pub timeout: Duration,

    pub headers: BTreeMap<String, String>,

    /// `service.name` resource attribute; empty selects the default
    pub service_name: String,

    /// `service.version` resource attribute; empty selects the default
    pub service_version: String,
}

impl Default for LogOption {
    fn default() -> Self {
        Self {
            engine: DEFAULT_ENGINE.to_string(),
            level: DEFAULT_LEVEL.to_string(),
            format: DEFAULT_FORMAT.to_string(),
            output_paths: vec![DEFAULT_OUTPUT.to_string()],
            otlp_endpoint: String::new(),
            otlp: Some(OtlpOption {
                protocol: DEFAULT_PROTOCOL.to_string(),
                timeout: DEFAULT_TIMEOUT,
                ..OtlpOption::default()
            }),
            development: false,
            disable_caller: false,
            disable_stacktrace: false,
        }
    }
}

impl LogOption {
    /// All fields empty, no nested export settings
    ///
    /// Useful for building a configuration field by field; `default()` is the
    /// ready-to-use baseline.
    pub fn empty() -> Self {
        Self {
            engine: String::new(),
            level: String::new(),
            format: String::new(),
            output_paths: Vec::new(),
            otlp_endpoint: String::new(),
            otlp: None,
            development: false,
            disable_caller: false,
            disable_stacktrace: false,
        }
    }

    #[must_use]
    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    #[must_use]
    pub fn with_output_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_otlp_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn with_otlp(mut self, otlp: OtlpOption) -> Self {
        self.otlp = Some(otlp);
        self
    }

    #[must_use]
    pub fn with_development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    #[must_use]
    pub fn with_disable_caller(mut self, disable: bool) -> Self {
        self.disable_caller = disable;
        self
    }

    #[must_use]
    pub fn with_disable_stacktrace(mut self, disable: bool) -> Self {
        self.disable_stacktrace = disable;
        self
    }

    /// Nested settings, created empty on first access
    pub fn otlp_mut(&mut self) -> &mut OtlpOption {
        self.otlp.get_or_insert_with(OtlpOption::default)
    }
}

impl OtlpOption {
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_service(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.service_name = name.into();
        self.service_version = version.into();
        self
    }

    /// Enabled and pointed at an endpoint
    pub fn is_enabled(&self) -> bool {
        self.enabled == Some(true) && !self.endpoint.is_empty()
    }
}

//! Environment variable overrides
//!
//! Variables are read once, when [`LogOption::apply_env`] runs, and win over
//! values set in code or loaded from a file.

use super::duration::parse_duration;
use super::option::LogOption;

pub const ENV_ENGINE: &str = "LOG_ENGINE";
pub const ENV_LEVEL: &str = "LOG_LEVEL";
pub const ENV_FORMAT: &str = "LOG_FORMAT";
pub const ENV_OUTPUT_PATHS: &str = "LOG_OUTPUT_PATHS";
pub const ENV_OTLP_ENDPOINT: &str = "LOG_OTLP_ENDPOINT";
pub const ENV_OTLP_ENABLED: &str = "LOG_OTLP_ENABLED";
pub const ENV_OTLP_PROTOCOL: &str = "LOG_OTLP_PROTOCOL";
pub const ENV_OTLP_TIMEOUT: &str = "LOG_OTLP_TIMEOUT";
pub const ENV_OTLP_HEADERS: &str = "LOG_OTLP_HEADERS";
pub const ENV_SERVICE_NAME: &str = "LOG_SERVICE_NAME";
pub const ENV_SERVICE_VERSION: &str = "LOG_SERVICE_VERSION";
pub const ENV_DEVELOPMENT: &str = "LOG_DEVELOPMENT";
pub const ENV_DISABLE_CALLER: &str = "LOG_DISABLE_CALLER";
pub const ENV_DISABLE_STACKTRACE: &str = "LOG_DISABLE_STACKTRACE";

impl LogOption {
    /// Defaults overlaid with the process environment
    pub fn from_env() -> Self {
        let mut opt = Self::default();
        opt.apply_env();
        opt
    }

    /// Overlay the process environment onto this option
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Overlay values produced by `lookup`
    ///
    /// Values that cannot be parsed are reported and skipped; the existing
    /// setting stays in place.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(engine) = get(ENV_ENGINE) {
            self.engine = engine;
        }
        if let Some(level) = get(ENV_LEVEL) {
            self.level = level;
        }
        if let Some(format) = get(ENV_FORMAT) {
            self.format = format;
        }
        if let Some(paths) = get(ENV_OUTPUT_PATHS) {
            self.output_paths = split_list(&paths);
        }
        if let Some(endpoint) = get(ENV_OTLP_ENDPOINT) {
            self.otlp_endpoint = endpoint;
        }

        if let Some(value) = get(ENV_DEVELOPMENT) {
            if let Some(flag) = parse_flag(ENV_DEVELOPMENT, &value) {
                self.development = flag;
            }
        }
        if let Some(value) = get(ENV_DISABLE_CALLER) {
            if let Some(flag) = parse_flag(ENV_DISABLE_CALLER, &value) {
                self.disable_caller = flag;
            }
        }
        if let Some(value) = get(ENV_DISABLE_STACKTRACE) {
            if let Some(flag) = parse_flag(ENV_DISABLE_STACKTRACE, &value) {
                self.disable_stacktrace = flag;
            }
        }

        if let Some(value) = get(ENV_OTLP_ENABLED) {
            if let Some(flag) = parse_flag(ENV_OTLP_ENABLED, &value) {
                self.otlp_mut().enabled = Some(flag);
            }
        }
        if let Some(protocol) = get(ENV_OTLP_PROTOCOL) {
            self.otlp_mut().protocol = protocol;
        }
        if let Some(value) = get(ENV_OTLP_TIMEOUT) {
            match parse_duration(&value) {
                Some(timeout) => self.otlp_mut().timeout = timeout,
                None => eprintln!(
                    "[LOGGER WARNING] Ignoring {}='{}': not a duration",
                    ENV_OTLP_TIMEOUT, value
                ),
            }
        }
        if let Some(value) = get(ENV_OTLP_HEADERS) {
            let otlp = self.otlp_mut();
            for item in split_list(&value) {
                match item.split_once('=') {
                    Some((key, val)) if !key.trim().is_empty() => {
                        otlp.headers.insert(key.trim().to_string(), val.trim().to_string());
                    }
                    _ => eprintln!(
                        "[LOGGER WARNING] Ignoring {} entry '{}': expected key=value",
                        ENV_OTLP_HEADERS, item
                    ),
                }
            }
        }
        if let Some(name) = get(ENV_SERVICE_NAME) {
            self.otlp_mut().service_name = name;
        }
        if let Some(version) = get(ENV_SERVICE_VERSION) {
            self.otlp_mut().service_version = version;
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(key: &str, value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            eprintln!("[LOGGER WARNING] Ignoring {}='{}': not a boolean", key, value);
            None
        }
    }
}

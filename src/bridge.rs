//! Route records from the `log` facade into a [`Logger`]
//!
//! Third-party crates that log through `log::info!` and friends end up in the
//! same sinks and export pipeline as direct calls. `Trace` maps to `Debug`;
//! structured key/values become fields.

use crate::core::{FieldValue, Fields, Level, Logger, LoggerError, Result};
use log::kv::{self, VisitSource};
use log::{LevelFilter, Metadata, Record};

/// `log::Log` implementation backed by a [`Logger`]
#[derive(Debug, Clone)]
pub struct LogBridge {
    logger: Logger,
}

impl LogBridge {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Install as the process-wide `log` backend
    ///
    /// The `log` max level is set from the logger's current level. Fails if
    /// another backend is already installed.
    pub fn install(self) -> Result<()> {
        let max = level_filter(self.logger.level());
        log::set_boxed_logger(Box::new(self))
            .map_err(|e| LoggerError::other(format!("log bridge: {}", e)))?;
        log::set_max_level(max);
        Ok(())
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.logger.enabled(map_level(metadata.level()))
    }

    fn log(&self, record: &Record<'_>) {
        let level = map_level(record.level());
        if !self.logger.enabled(level) {
            return;
        }

        let caller = match (record.file(), record.line()) {
            (Some(file), Some(line)) => Some(format!("{}:{}", file, line)),
            _ => None,
        };

        let mut visitor = FieldCollector::default();
        if let Err(e) = record.key_values().visit(&mut visitor) {
            eprintln!("[LOGGER WARNING] Dropping unreadable log key/values: {}", e);
        }
        let mut fields = visitor.fields;
        if !record.target().is_empty() {
            fields.insert(0, ("logger".to_string(), FieldValue::from(record.target())));
        }

        self.logger
            .emit_located(level, caller, record.args().to_string(), fields);
    }

    fn flush(&self) {
        let _ = self.logger.sync();
    }
}

/// Route the `log` facade into `logger`
pub fn install(logger: Logger) -> Result<()> {
    LogBridge::new(logger).install()
}

pub fn map_level(level: log::Level) -> Level {
    match level {
        log::Level::Error => Level::Error,
        log::Level::Warn => Level::Warn,
        log::Level::Info => Level::Info,
        log::Level::Debug | log::Level::Trace => Level::Debug,
    }
}

fn level_filter(level: Level) -> LevelFilter {
    match level {
        Level::Debug => LevelFilter::Trace,
        Level::Info => LevelFilter::Info,
        Level::Warn => LevelFilter::Warn,
        Level::Error | Level::Fatal => LevelFilter::Error,
    }
}

#[derive(Default)]
struct FieldCollector {
    fields: Fields,
}

impl<'kvs> VisitSource<'kvs> for FieldCollector {
    fn visit_pair(
        &mut self,
        key: kv::Key<'kvs>,
        value: kv::Value<'kvs>,
    ) -> std::result::Result<(), kv::Error> {
        self.fields
            .push((key.as_str().to_string(), field_value(&value)));
        Ok(())
    }
}

fn field_value(value: &kv::Value<'_>) -> FieldValue {
    if let Some(i) = value.to_i64() {
        FieldValue::Int(i)
    } else if let Some(u) = value.to_u64() {
        FieldValue::from(u)
    } else if let Some(f) = value.to_f64() {
        FieldValue::Float(f)
    } else if let Some(b) = value.to_bool() {
        FieldValue::Bool(b)
    } else if let Some(s) = value.to_borrowed_str() {
        FieldValue::from(s)
    } else {
        FieldValue::String(value.to_string())
    }
}

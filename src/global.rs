//! Process-wide logger
//!
//! The global slot starts empty. The first call to [`global`] without a prior
//! [`init`] builds a logger from [`LogOption::default`]; if that fails a
//! no-op logger takes its place. Libraries should take an explicit
//! [`Logger`] instead of reaching for this module.

use crate::config::LogOption;
use crate::core::{FieldValue, Logger, Result};
use crate::factory::LoggerFactory;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::fmt;

static GLOBAL: Lazy<RwLock<Option<Logger>>> = Lazy::new(|| RwLock::new(None));

/// Install `logger` as the global logger, returning the one it replaces
pub fn init(logger: Logger) -> Option<Logger> {
    GLOBAL.write().replace(logger)
}

/// The global logger, built with defaults on first use
pub fn global() -> Logger {
    if let Some(logger) = GLOBAL.read().as_ref() {
        return logger.clone();
    }

    let mut slot = GLOBAL.write();
    slot.get_or_insert_with(|| LoggerFactory::new(LogOption::default()).create_logger_or_noop())
        .clone()
}

/// Whether a global logger has been installed or built
pub fn is_initialized() -> bool {
    GLOBAL.read().is_some()
}

/// Clear the global slot, flushing and shutting down the logger it held
///
/// The next [`global`] call builds a fresh default logger.
pub fn shutdown() -> Result<()> {
    let previous = GLOBAL.write().take();
    match previous {
        Some(logger) => logger.shutdown(),
        None => Ok(()),
    }
}

/// Child of the global logger carrying `keys_and_values`
pub fn with(keys_and_values: &[FieldValue]) -> Logger {
    global().with(keys_and_values)
}

#[track_caller]
pub fn debug(args: &[&dyn fmt::Display]) {
    global().debug(args);
}

#[track_caller]
pub fn info(args: &[&dyn fmt::Display]) {
    global().info(args);
}

#[track_caller]
pub fn warn(args: &[&dyn fmt::Display]) {
    global().warn(args);
}

#[track_caller]
pub fn error(args: &[&dyn fmt::Display]) {
    global().error(args);
}

#[track_caller]
pub fn fatal(args: &[&dyn fmt::Display]) {
    global().fatal(args);
}

#[track_caller]
pub fn debugf(args: fmt::Arguments<'_>) {
    global().debugf(args);
}

#[track_caller]
pub fn infof(args: fmt::Arguments<'_>) {
    global().infof(args);
}

#[track_caller]
pub fn warnf(args: fmt::Arguments<'_>) {
    global().warnf(args);
}

#[track_caller]
pub fn errorf(args: fmt::Arguments<'_>) {
    global().errorf(args);
}

#[track_caller]
pub fn fatalf(args: fmt::Arguments<'_>) {
    global().fatalf(args);
}

#[track_caller]
pub fn debugw(msg: impl Into<String>, keys_and_values: &[FieldValue]) {
    global().debugw(msg, keys_and_values);
}

#[track_caller]
pub fn infow(msg: impl Into<String>, keys_and_values: &[FieldValue]) {
    global().infow(msg, keys_and_values);
}

#[track_caller]
pub fn warnw(msg: impl Into<String>, keys_and_values: &[FieldValue]) {
    global().warnw(msg, keys_and_values);
}

#[track_caller]
pub fn errorw(msg: impl Into<String>, keys_and_values: &[FieldValue]) {
    global().errorw(msg, keys_and_values);
}

#[track_caller]
pub fn fatalw(msg: impl Into<String>, keys_and_values: &[FieldValue]) {
    global().fatalw(msg, keys_and_values);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::SharedBuffer;
    use parking_lot::Mutex;

    // The global slot is process-wide; tests touching it run one at a time
    static SERIAL: Mutex<()> = parking_lot::const_mutex(());

    fn memory_logger(buffer: &SharedBuffer) -> Logger {
        LoggerFactory::new(LogOption::default().with_output_paths(Vec::<String>::new()))
            .with_writer("memory", buffer.clone())
            .create_logger()
            .unwrap()
    }

    #[test]
    fn test_init_and_convenience_calls() {
        let _guard = SERIAL.lock();
        let buffer = SharedBuffer::new();
        init(memory_logger(&buffer));

        info(&[&"via", &"global"]);
        infow("structured", &["requestId".into(), 7.into()]);

        let lines = buffer.lines();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first["message"], "via global");
        assert!(first["caller"].as_str().unwrap().contains("global.rs:"));
        let second: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(second["request_id"], 7);

        shutdown().unwrap();
        assert!(!is_initialized());
    }

    #[test]
    fn test_init_returns_previous() {
        let _guard = SERIAL.lock();
        let first = SharedBuffer::new();
        let second = SharedBuffer::new();

        init(memory_logger(&first));
        let previous = init(memory_logger(&second));
        assert!(previous.is_some());

        with(&["component".into(), "api".into()]).warn(&[&"routed"]);
        assert!(first.contents().is_empty());
        assert!(second.contents().contains("\"component\":\"api\""));

        shutdown().unwrap();
    }

    #[test]
    fn test_lazy_default() {
        let _guard = SERIAL.lock();
        shutdown().unwrap();
        let logger = global();
        assert!(is_initialized());
        assert!(!logger.is_export_enabled());
        shutdown().unwrap();
    }
}

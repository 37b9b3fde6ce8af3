//! Logger construction with engine fallback
//!
//! A factory moves through three states on every
//! [`create_logger`](LoggerFactory::create_logger) call: it validates its
//! option, selects and builds an engine (falling back to the alternate one
//! if the requested engine fails), and is then ready.

use crate::config::{LogConfig, LogOption};
use crate::core::{
    system_clock, Clock, Logger, LoggerError, ProcessExit, Result, Terminator,
};
use crate::engines::{Engine, EngineKind};
use crate::otlp::LoggerProvider;
use crate::sinks::SharedWriter;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactoryState {
    /// Resolving the held option; errors here are terminal
    Validating,
    /// Building the requested engine or its alternate
    Selecting,
    /// The last call produced a logger
    Ready,
}

pub struct LoggerFactory {
    option: LogOption,
    state: FactoryState,
    terminator: Arc<dyn Terminator>,
    clock: Clock,
    writers: Vec<(String, SharedWriter)>,
}

impl LoggerFactory {
    pub fn new(option: LogOption) -> Self {
        Self {
            option,
            state: FactoryState::Validating,
            terminator: Arc::new(ProcessExit),
            clock: system_clock(),
            writers: Vec::new(),
        }
    }

    /// What fatal calls invoke after writing; process exit by default
    #[must_use]
    pub fn with_terminator(mut self, terminator: Arc<dyn Terminator>) -> Self {
        self.terminator = terminator;
        self
    }

    /// Timestamp source for every record
    #[must_use]
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Extra sink written after the configured outputs
    #[must_use]
    pub fn with_writer<W>(self, name: impl Into<String>, writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        self.with_shared_writer(name, Arc::new(Mutex::new(writer)))
    }

    #[must_use]
    pub fn with_shared_writer(mut self, name: impl Into<String>, writer: SharedWriter) -> Self {
        self.writers.push((name.into(), writer));
        self
    }

    pub fn option(&self) -> &LogOption {
        &self.option
    }

    pub fn state(&self) -> FactoryState {
        self.state
    }

    /// Build a logger from the held option
    ///
    /// Configuration errors are returned as they are. Otherwise the requested
    /// engine is built, then the alternate one if that fails; only when both
    /// fail is [`LoggerError::EngineConstruction`] returned.
    pub fn create_logger(&mut self) -> Result<Logger> {
        self.state = FactoryState::Validating;
        let mut option = self.option.clone();
        option.validate()?;
        let config = Arc::new(option.clone().resolve()?);
        self.option = option;

        self.state = FactoryState::Selecting;
        let primary = config.engine;
        let primary_error = match self.build(primary, &config) {
            Ok(logger) => {
                self.state = FactoryState::Ready;
                return Ok(logger);
            }
            Err(e) => e,
        };

        let fallback = primary.alternate();
        eprintln!(
            "[LOGGER WARNING] {} engine failed to build ({}), falling back to {} engine",
            primary, primary_error, fallback
        );

        match self.build(fallback, &config) {
            Ok(logger) => {
                self.state = FactoryState::Ready;
                Ok(logger)
            }
            Err(fallback_error) => {
                self.state = FactoryState::Validating;
                Err(LoggerError::EngineConstruction {
                    primary,
                    primary_error: primary_error.to_string(),
                    fallback,
                    fallback_error: fallback_error.to_string(),
                })
            }
        }
    }

    /// [`create_logger`](Self::create_logger), or an inert logger if that fails
    ///
    /// The failure is reported on stderr. Fatal calls on the inert logger
    /// still reach the terminator.
    pub fn create_logger_or_noop(&mut self) -> Logger {
        match self.create_logger() {
            Ok(logger) => logger,
            Err(e) => {
                eprintln!("[LOGGER ERROR] {}; using a no-op logger", e);
                Logger::noop_with_terminator(Arc::clone(&self.terminator))
            }
        }
    }

    /// Replace the held option if it validates; keep the old one otherwise
    pub fn update_option(&mut self, option: LogOption) -> Result<()> {
        let mut candidate = option;
        candidate.validate()?;
        candidate.clone().resolve()?;
        self.option = candidate;
        Ok(())
    }

    fn build(&self, kind: EngineKind, config: &Arc<LogConfig>) -> Result<Logger> {
        let engine = Engine::build(kind, config, &self.writers)?;
        let exporter = if config.is_export_enabled() {
            Some(Arc::new(LoggerProvider::new(&config.export)?))
        } else {
            None
        };

        Ok(Logger::from_parts(
            engine,
            Arc::clone(config),
            exporter,
            Arc::clone(&self.terminator),
            Arc::clone(&self.clock),
        ))
    }
}

impl fmt::Debug for LoggerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let writers: Vec<&str> = self.writers.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("LoggerFactory")
            .field("option", &self.option)
            .field("state", &self.state)
            .field("writers", &writers)
            .finish()
    }
}

/// Build a logger for `option`
pub fn new_logger(option: LogOption) -> Result<Logger> {
    LoggerFactory::new(option).create_logger()
}

/// Build a logger from [`LogOption::default`]
pub fn new_with_defaults() -> Result<Logger> {
    new_logger(LogOption::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RecordingTerminator;
    use crate::sinks::SharedBuffer;
    use fs2::FileExt;
    use std::fs::OpenOptions;
    use tempfile::tempdir;

    #[test]
    fn test_creates_requested_engine() {
        for kind in EngineKind::ALL {
            let buffer = SharedBuffer::new();
            let mut factory = LoggerFactory::new(
                LogOption::default()
                    .with_engine(kind.as_str())
                    .with_output_paths(Vec::<String>::new()),
            )
            .with_writer("memory", buffer.clone());

            assert_eq!(factory.state(), FactoryState::Validating);
            let logger = factory.create_logger().unwrap();
            assert_eq!(factory.state(), FactoryState::Ready);
            assert_eq!(logger.engine_kind(), Some(kind));
        }
    }

    #[test]
    fn test_invalid_level_is_terminal() {
        let mut factory = LoggerFactory::new(LogOption::default().with_level("loud"));
        let err = factory.create_logger().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidLevel { .. }));
        assert_eq!(factory.state(), FactoryState::Validating);
    }

    #[test]
    fn test_falls_back_when_file_is_locked() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("locked.log");
        let holder = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .unwrap();
        holder.try_lock_exclusive().unwrap();

        let mut factory = LoggerFactory::new(
            LogOption::default()
                .with_engine("performance")
                .with_output_paths([path.to_string_lossy().to_string()]),
        );
        let logger = factory.create_logger().unwrap();
        assert_eq!(logger.engine_kind(), Some(EngineKind::Standard));
        assert_eq!(factory.state(), FactoryState::Ready);

        FileExt::unlock(&holder).unwrap();
    }

    #[test]
    fn test_both_engines_fail() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("app.log");
        let mut factory = LoggerFactory::new(
            LogOption::default().with_output_paths([path.to_string_lossy().to_string()]),
        );

        let err = factory.create_logger().unwrap_err();
        match err {
            LoggerError::EngineConstruction {
                primary, fallback, ..
            } => {
                assert_eq!(primary, EngineKind::Standard);
                assert_eq!(fallback, EngineKind::Performance);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_noop_when_both_fail() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("app.log");
        let terminator = Arc::new(RecordingTerminator::new());
        let mut factory = LoggerFactory::new(
            LogOption::default().with_output_paths([path.to_string_lossy().to_string()]),
        )
        .with_terminator(terminator.clone());

        let logger = factory.create_logger_or_noop();
        assert!(logger.is_noop());
        logger.fatal(&[&"bye"]);
        assert!(terminator.terminated());
    }

    #[test]
    fn test_update_option_is_transactional() {
        let mut factory = LoggerFactory::new(LogOption::default().with_level("warn"));

        let err = factory.update_option(LogOption::default().with_level("nope"));
        assert!(err.is_err());
        assert_eq!(factory.option().level, "warn");

        factory
            .update_option(LogOption::default().with_level("DEBUG").with_engine("other"))
            .unwrap();
        assert_eq!(factory.option().level, "debug");
        assert_eq!(factory.option().engine, "standard");
    }

    #[test]
    fn test_option_is_normalized_after_create() {
        let mut factory = LoggerFactory::new(
            LogOption::default()
                .with_otlp_endpoint("127.0.0.1:9")
                .with_output_paths(Vec::<String>::new()),
        )
        .with_writer("memory", SharedBuffer::new());

        let logger = factory.create_logger().unwrap();
        assert!(logger.is_export_enabled());
        assert!(factory.option().is_export_enabled());
        assert_eq!(factory.option().otlp.as_ref().unwrap().endpoint, "127.0.0.1:9");
    }
}

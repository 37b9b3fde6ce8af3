//! The logger capability
//!
//! Every call goes through the same path: level gate, message and caller
//! capture, field standardization, local write through the engine and, when
//! export is active, a synchronous hand-off to the export client.

use super::{
    caller,
    error::Result,
    field_value::{FieldValue, Fields},
    fields::{merge_fields, FieldMapper},
    level::Level,
    metrics::LoggerMetrics,
    record::{concat_args, LogRecord},
    terminator::{ProcessExit, Terminator, FATAL_EXIT_CODE},
};
use crate::config::LogConfig;
use crate::engines::{Engine, EngineKind};
use crate::otlp::LoggerProvider;
use chrono::{DateTime, Utc};
use std::fmt;
use std::panic::Location;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Source of record timestamps
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Wall clock in UTC
pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Structured logger
///
/// Cheap to clone; clones are handles to the same logger. Child loggers made
/// with [`with`](Logger::with) or [`with_caller_skip`](Logger::with_caller_skip)
/// share the parent's sinks, export client and metrics, and start from the
/// parent's current level. Changing a child's level leaves the parent alone.
///
/// Each level has three calling conventions:
///
/// ```no_run
/// use unified_logger::{fields, LogOption, LoggerFactory};
///
/// let logger = LoggerFactory::new(LogOption::default()).create_logger().unwrap();
///
/// logger.info(&[&"listening on", &8080]);
/// logger.infof(format_args!("listening on {}", 8080));
/// logger.infow("listening", fields!["port", 8080]);
/// ```
#[derive(Clone)]
pub struct Logger {
    engine: Option<Engine>,
    config: Arc<LogConfig>,
    level: Arc<AtomicU8>,
    mapper: &'static FieldMapper,
    /// Persistent fields, mirrored into exported records
    context: Arc<Fields>,
    caller_skip: usize,
    exporter: Option<Arc<LoggerProvider>>,
    terminator: Arc<dyn Terminator>,
    clock: Clock,
    metrics: Arc<LoggerMetrics>,
}

impl Logger {
    pub(crate) fn from_parts(
        engine: Engine,
        config: Arc<LogConfig>,
        exporter: Option<Arc<LoggerProvider>>,
        terminator: Arc<dyn Terminator>,
        clock: Clock,
    ) -> Self {
        Self {
            engine: Some(engine),
            level: Arc::new(AtomicU8::new(config.level as u8)),
            config,
            mapper: FieldMapper::global(),
            context: Arc::new(Vec::new()),
            caller_skip: 0,
            exporter,
            terminator,
            clock,
            metrics: Arc::new(LoggerMetrics::new()),
        }
    }

    /// Logger that writes nothing and exports nothing
    ///
    /// Fatal calls still terminate the process.
    pub fn noop() -> Self {
        Self::noop_with_terminator(Arc::new(ProcessExit))
    }

    pub(crate) fn noop_with_terminator(terminator: Arc<dyn Terminator>) -> Self {
        Self {
            engine: None,
            config: Arc::new(LogConfig::default()),
            level: Arc::new(AtomicU8::new(Level::Fatal as u8)),
            mapper: FieldMapper::global(),
            context: Arc::new(Vec::new()),
            caller_skip: 0,
            exporter: None,
            terminator,
            clock: system_clock(),
            metrics: Arc::new(LoggerMetrics::new()),
        }
    }

    /// `None` for the noop logger
    pub fn engine_kind(&self) -> Option<EngineKind> {
        self.engine.as_ref().map(Engine::kind)
    }

    pub fn is_noop(&self) -> bool {
        self.engine.is_none()
    }

    pub fn is_export_enabled(&self) -> bool {
        self.exporter.is_some()
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed))
    }

    /// Change the minimum level for this logger and its clones
    pub fn set_level(&self, level: Level) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    #[inline]
    pub fn enabled(&self, level: Level) -> bool {
        level.enabled_at(self.level())
    }

    pub fn caller_skip(&self) -> usize {
        self.caller_skip
    }

    /// Persistent fields attached so far, standardized
    pub fn context_fields(&self) -> &[(String, FieldValue)] {
        &self.context
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    /// Child logger that adds `keys_and_values` to every record
    ///
    /// Keys go through the field mapper now; a trailing key without a value
    /// is paired with null. A key the parent already carries keeps its place
    /// and takes the new value.
    #[must_use]
    pub fn with(&self, keys_and_values: &[FieldValue]) -> Logger {
        let mut child = self.child();
        if keys_and_values.is_empty() {
            return child;
        }

        let mut context = Fields::clone(&self.context);
        merge_fields(&mut context, self.mapper.standardize(keys_and_values));
        child.engine = self.engine.as_ref().map(|e| e.with_context(&context));
        child.context = Arc::new(context);
        child
    }

    /// Same as [`with`](Logger::with); the context value is accepted so
    /// request-scoped call sites read naturally, nothing is extracted from it
    #[must_use]
    pub fn with_ctx<C: ?Sized>(&self, _ctx: &C, keys_and_values: &[FieldValue]) -> Logger {
        self.with(keys_and_values)
    }

    /// Child logger whose reported caller is `delta` frames further out
    ///
    /// Skips add up across chained children. Wrappers around the logger call
    /// this once with the number of frames they add.
    #[must_use]
    pub fn with_caller_skip(&self, delta: usize) -> Logger {
        Logger {
            caller_skip: self.caller_skip + delta,
            ..self.child()
        }
    }

    /// Copy with its own level, starting from the current one
    fn child(&self) -> Logger {
        Logger {
            level: Arc::new(AtomicU8::new(self.level.load(Ordering::Relaxed))),
            ..self.clone()
        }
    }

    /// Flush every sink
    pub fn sync(&self) -> Result<()> {
        match &self.engine {
            Some(engine) => engine.sync(),
            None => Ok(()),
        }
    }

    /// Flush, then stop exporting
    ///
    /// The export client is shared, so every logger derived from the same
    /// factory call stops exporting too.
    pub fn shutdown(&self) -> Result<()> {
        if let Some(exporter) = &self.exporter {
            exporter.shutdown();
        }
        self.sync()
    }

    #[track_caller]
    pub fn log(&self, level: Level, args: &[&dyn fmt::Display]) {
        self.emit(level, Location::caller(), || concat_args(args), &[]);
    }

    #[track_caller]
    pub fn logf(&self, level: Level, args: fmt::Arguments<'_>) {
        self.emit(level, Location::caller(), || fmt::format(args), &[]);
    }

    #[track_caller]
    pub fn logw(&self, level: Level, msg: impl Into<String>, keys_and_values: &[FieldValue]) {
        self.emit(level, Location::caller(), || msg.into(), keys_and_values);
    }

    #[track_caller]
    #[inline]
    pub fn debug(&self, args: &[&dyn fmt::Display]) {
        self.emit(Level::Debug, Location::caller(), || concat_args(args), &[]);
    }

    #[track_caller]
    #[inline]
    pub fn info(&self, args: &[&dyn fmt::Display]) {
        self.emit(Level::Info, Location::caller(), || concat_args(args), &[]);
    }

    #[track_caller]
    #[inline]
    pub fn warn(&self, args: &[&dyn fmt::Display]) {
        self.emit(Level::Warn, Location::caller(), || concat_args(args), &[]);
    }

    #[track_caller]
    #[inline]
    pub fn error(&self, args: &[&dyn fmt::Display]) {
        self.emit(Level::Error, Location::caller(), || concat_args(args), &[]);
    }

    /// Write, export, then terminate the process
    #[track_caller]
    #[inline]
    pub fn fatal(&self, args: &[&dyn fmt::Display]) {
        self.emit(Level::Fatal, Location::caller(), || concat_args(args), &[]);
    }

    #[track_caller]
    #[inline]
    pub fn debugf(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Debug, Location::caller(), || fmt::format(args), &[]);
    }

    #[track_caller]
    #[inline]
    pub fn infof(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Info, Location::caller(), || fmt::format(args), &[]);
    }

    #[track_caller]
    #[inline]
    pub fn warnf(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Warn, Location::caller(), || fmt::format(args), &[]);
    }

    #[track_caller]
    #[inline]
    pub fn errorf(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Error, Location::caller(), || fmt::format(args), &[]);
    }

    #[track_caller]
    #[inline]
    pub fn fatalf(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Fatal, Location::caller(), || fmt::format(args), &[]);
    }

    #[track_caller]
    #[inline]
    pub fn debugw(&self, msg: impl Into<String>, keys_and_values: &[FieldValue]) {
        self.emit(Level::Debug, Location::caller(), || msg.into(), keys_and_values);
    }

    #[track_caller]
    #[inline]
    pub fn infow(&self, msg: impl Into<String>, keys_and_values: &[FieldValue]) {
        self.emit(Level::Info, Location::caller(), || msg.into(), keys_and_values);
    }

    #[track_caller]
    #[inline]
    pub fn warnw(&self, msg: impl Into<String>, keys_and_values: &[FieldValue]) {
        self.emit(Level::Warn, Location::caller(), || msg.into(), keys_and_values);
    }

    #[track_caller]
    #[inline]
    pub fn errorw(&self, msg: impl Into<String>, keys_and_values: &[FieldValue]) {
        self.emit(Level::Error, Location::caller(), || msg.into(), keys_and_values);
    }

    #[track_caller]
    #[inline]
    pub fn fatalw(&self, msg: impl Into<String>, keys_and_values: &[FieldValue]) {
        self.emit(Level::Fatal, Location::caller(), || msg.into(), keys_and_values);
    }

    fn emit<F>(
        &self,
        level: Level,
        location: &'static Location<'static>,
        message: F,
        keys_and_values: &[FieldValue],
    ) where
        F: FnOnce() -> String,
    {
        if !self.enabled(level) {
            return;
        }

        let Some(engine) = &self.engine else {
            if level == Level::Fatal {
                self.terminator.terminate(FATAL_EXIT_CODE);
            }
            return;
        };

        let site = caller::capture(
            location,
            self.caller_skip,
            !self.config.disable_caller,
            self.config.wants_stacktrace(level),
        );
        let record = LogRecord::new(level, message(), (self.clock)())
            .with_caller(site.caller)
            .with_stacktrace(site.stacktrace)
            .with_fields(self.mapper.standardize(keys_and_values));

        self.dispatch(engine, record);
    }

    /// Entry point for records whose call site is already known, such as
    /// those forwarded from the `log` facade
    pub(crate) fn emit_located(
        &self,
        level: Level,
        caller: Option<String>,
        message: String,
        fields: Fields,
    ) {
        if !self.enabled(level) {
            return;
        }
        let Some(engine) = &self.engine else {
            return;
        };

        let caller = caller.filter(|_| !self.config.disable_caller);
        let stacktrace = self
            .config
            .wants_stacktrace(level)
            .then(caller::stacktrace);
        let record = LogRecord::new(level, message, (self.clock)())
            .with_caller(caller)
            .with_stacktrace(stacktrace)
            .with_fields(self.mapper.standardize_pairs(fields));

        self.dispatch(engine, record);
    }

    fn dispatch(&self, engine: &Engine, record: LogRecord) {
        let level = record.level;
        match self.write(engine, &record) {
            Ok(()) => {
                self.metrics.record_logged();
            }
            Err(_) => {
                // The sink set already reported which sink failed
                self.metrics.record_write_failure();
            }
        }

        if let Some(exporter) = &self.exporter {
            self.export(exporter, record);
        }

        if level == Level::Fatal {
            let _ = engine.sync();
            self.terminator.terminate(FATAL_EXIT_CODE);
        }
    }

    /// Local write
    ///
    /// A call field whose key is also a persistent field replaces the
    /// persistent value in place, so both engines see one merged field list
    /// and every key is written once.
    fn write(&self, engine: &Engine, record: &LogRecord) -> Result<()> {
        let overrides = record
            .fields
            .iter()
            .any(|(key, _)| self.context.iter().any(|(existing, _)| existing == key));
        if !overrides {
            return engine.emit(record);
        }

        let mut merged = Fields::clone(&self.context);
        merge_fields(&mut merged, record.fields.iter().cloned());
        let bare = LogRecord {
            fields: Vec::new(),
            ..record.clone()
        };
        engine.with_context(&merged).emit(&bare)
    }

    fn export(&self, exporter: &LoggerProvider, record: LogRecord) {
        if exporter.is_shut_down() {
            return;
        }

        let record = if self.context.is_empty() {
            record
        } else {
            let mut fields = Fields::clone(&self.context);
            merge_fields(&mut fields, record.fields.iter().cloned());
            record.with_fields(fields)
        };

        match exporter.emit(&record) {
            Ok(()) => {
                self.metrics.record_exported();
            }
            Err(e) => {
                let failures = self.metrics.record_export_failure();
                eprintln!(
                    "[LOGGER ERROR] OTLP export to '{}' failed ({} so far): {}",
                    exporter.endpoint(),
                    failures + 1,
                    e
                );
            }
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("engine", &self.engine_kind())
            .field("level", &self.level())
            .field("caller_skip", &self.caller_skip)
            .field("context", &self.context)
            .field("export", &self.is_export_enabled())
            .finish()
    }
}

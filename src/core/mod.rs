//! Core logger types and traits

pub mod caller;
pub mod error;
pub mod field_value;
pub mod fields;
pub mod level;
pub mod logger;
pub mod metrics;
pub mod output_format;
pub mod record;
pub mod terminator;

pub use error::{ExportError, LoggerError, Result};
pub use field_value::{FieldValue, Fields};
pub use fields::FieldMapper;
pub use level::Level;
pub use logger::{system_clock, Clock, Logger};
pub use metrics::LoggerMetrics;
pub use output_format::OutputFormat;
pub use record::{concat_args, format_timestamp, sanitize_message, LogRecord};
pub use terminator::{ProcessExit, RecordingTerminator, Terminator, FATAL_EXIT_CODE};

//! # Unified Logger
//!
//! A structured logging facade with two interchangeable engines, canonical
//! field names and optional OTLP export.
//!
//! ## Features
//!
//! - **One capability, two engines**: a byte-oriented performance engine and
//!   a handler-chain standard engine write the same record shape
//! - **Three calling conventions**: sugared operands, format strings and
//!   message plus key/value pairs
//! - **Field standardization**: `traceId`, `msg`, `err` and friends are
//!   written under one canonical name
//! - **Fallback**: if the requested engine cannot be built the other one is
//!   tried before giving up
//! - **OTLP export**: every record can also go to a collector over gRPC or
//!   HTTP; export failures never reach the caller
//!
//! ## Example
//!
//! ```no_run
//! use unified_logger::prelude::*;
//!
//! let option = LogOption::default()
//!     .with_level("debug")
//!     .with_engine("performance");
//! let logger = LoggerFactory::new(option).create_logger()?;
//!
//! let request = logger.with(fields!["requestId", "r-42"]);
//! request.infow("handled", fields!["status", 200, "elapsed_ms", 12.5]);
//! # Ok::<(), unified_logger::LoggerError>(())
//! ```

pub mod bridge;
pub mod config;
pub mod core;
pub mod engines;
pub mod factory;
pub mod global;
pub mod macros;
pub mod otlp;
pub mod sinks;

pub mod prelude {
    pub use crate::config::{LogOption, OtlpOption};
    pub use crate::core::{FieldValue, Level, Logger, LoggerError, OutputFormat, Result};
    pub use crate::engines::EngineKind;
    pub use crate::factory::LoggerFactory;
    pub use crate::fields;
}

pub use config::{LogConfig, LogOption, OtlpOption, Protocol};
pub use core::{
    ExportError, FieldMapper, FieldValue, Fields, Level, LogRecord, Logger, LoggerError,
    LoggerMetrics, OutputFormat, ProcessExit, RecordingTerminator, Result, Terminator,
};
pub use engines::EngineKind;
pub use factory::{new_logger, new_with_defaults, FactoryState, LoggerFactory};
pub use otlp::LoggerProvider;
pub use sinks::{SharedBuffer, SharedWriter};

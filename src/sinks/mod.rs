//! Output sinks for encoded records
//!
//! Engines encode a record once and hand the bytes to a [`SinkSet`], which
//! writes them to every configured destination.

pub mod console;
pub mod file;
pub mod writer;

pub use console::ConsoleSink;
pub use file::FileSink;
pub use writer::{SharedBuffer, SharedWriter, WriterSink};

use crate::core::Result;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Destination for encoded records
pub trait Sink: Send {
    /// Write one complete record, trailing newline included
    fn write_record(&mut self, bytes: &[u8]) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;

    fn is_terminal(&self) -> bool {
        false
    }
}

/// Where a configured output path points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SinkTarget {
    Stdout,
    Stderr,
    File(PathBuf),
}

impl SinkTarget {
    /// `stdout`/empty and `stderr` (any case) name the console streams;
    /// everything else is a file path
    pub fn parse(path: &str) -> Self {
        match path.trim().to_ascii_lowercase().as_str() {
            "stdout" | "" => SinkTarget::Stdout,
            "stderr" => SinkTarget::Stderr,
            _ => SinkTarget::File(PathBuf::from(path.trim())),
        }
    }
}

impl fmt::Display for SinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkTarget::Stdout => f.write_str("stdout"),
            SinkTarget::Stderr => f.write_str("stderr"),
            SinkTarget::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Every sink one engine writes to, opened once at construction
#[derive(Clone, Default)]
pub struct SinkSet {
    sinks: Arc<Vec<Mutex<Box<dyn Sink>>>>,
}

impl SinkSet {
    /// Open the configured targets plus any extra writers
    ///
    /// `exclusive` takes an exclusive lock on file targets and fails when
    /// another writer already holds one. With nothing configured at all the
    /// set writes to stdout.
    pub fn open(
        targets: &[SinkTarget],
        extra: &[(String, SharedWriter)],
        exclusive: bool,
    ) -> Result<Self> {
        let mut sinks: Vec<Mutex<Box<dyn Sink>>> = Vec::with_capacity(targets.len() + extra.len());
        let fallback = [SinkTarget::Stdout];
        let targets = if targets.is_empty() && extra.is_empty() {
            &fallback[..]
        } else {
            targets
        };

        for target in targets {
            let sink: Box<dyn Sink> = match target {
                SinkTarget::Stdout => Box::new(ConsoleSink::stdout()),
                SinkTarget::Stderr => Box::new(ConsoleSink::stderr()),
                SinkTarget::File(path) => Box::new(FileSink::open(path, exclusive)?),
            };
            sinks.push(Mutex::new(sink));
        }

        for (name, writer) in extra {
            sinks.push(Mutex::new(Box::new(WriterSink::new(name.clone(), Arc::clone(writer)))));
        }

        Ok(Self {
            sinks: Arc::new(sinks),
        })
    }

    /// Write to every sink; one failing sink does not stop the others
    ///
    /// Returns the first error encountered.
    pub fn write(&self, bytes: &[u8]) -> Result<()> {
        let mut first_error = None;

        for (idx, sink) in self.sinks.iter().enumerate() {
            let mut sink = sink.lock();
            if let Err(e) = sink.write_record(bytes) {
                eprintln!("[LOGGER ERROR] Sink #{} ({}) failed: {}", idx, sink.name(), e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn flush(&self) -> Result<()> {
        let mut first_error = None;
        for sink in self.sinks.iter() {
            if let Err(e) = sink.lock().flush() {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// True when there is at least one sink and all of them are terminals
    pub fn all_terminals(&self) -> bool {
        !self.sinks.is_empty() && self.sinks.iter().all(|s| s.lock().is_terminal())
    }

    pub fn names(&self) -> Vec<String> {
        self.sinks.iter().map(|s| s.lock().name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl fmt::Debug for SinkSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkSet").field("sinks", &self.names()).finish()
    }
}

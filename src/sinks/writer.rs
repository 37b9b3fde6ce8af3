//! Sinks over caller-provided writers

use super::Sink;
use crate::core::Result;
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

/// Writer shared between a factory and the engines it builds
pub type SharedWriter = Arc<Mutex<dyn Write + Send>>;

pub struct WriterSink {
    name: String,
    writer: SharedWriter,
}

impl WriterSink {
    pub fn new(name: impl Into<String>, writer: SharedWriter) -> Self {
        Self {
            name: name.into(),
            writer,
        }
    }
}

impl Sink for WriterSink {
    fn write_record(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.lock().write_all(bytes)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.lock().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Clonable in-memory writer; every clone appends to the same buffer
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

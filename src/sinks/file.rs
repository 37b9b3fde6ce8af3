//! File sink implementation

use super::Sink;
use crate::core::{LoggerError, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only file sink
///
/// Each record goes out in a single `write_all`, so lines from concurrent
/// writers never interleave within a record.
pub struct FileSink {
    file: File,
    path: PathBuf,
    name: String,
    locked: bool,
}

impl FileSink {
    /// Open `path` for appending, creating it if needed
    ///
    /// With `exclusive`, the file is locked for the lifetime of the sink and
    /// opening fails if another writer holds the lock.
    pub fn open(path: impl AsRef<Path>, exclusive: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let name = path.display().to_string();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| LoggerError::sink_open(name.clone(), e))?;

        if exclusive && file.try_lock_exclusive().is_err() {
            return Err(LoggerError::sink_locked(name));
        }

        Ok(Self {
            file,
            path,
            name,
            locked: exclusive,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

impl Sink for FileSink {
    fn write_record(&mut self, bytes: &[u8]) -> Result<()> {
        self.file.write_all(bytes)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        let _ = self.file.flush();
        if self.locked {
            let _ = FileExt::unlock(&self.file);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_appends_records() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("app.log");

        let mut sink = FileSink::open(&path, false)?;
        sink.write_record(b"first\n")?;
        sink.write_record(b"second\n")?;
        sink.flush()?;

        assert_eq!(fs::read_to_string(&path)?, "first\nsecond\n");
        Ok(())
    }

    #[test]
    fn test_exclusive_lock_rejects_second_writer() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("locked.log");

        let first = FileSink::open(&path, true)?;
        assert!(first.is_locked());

        let second = FileSink::open(&path, true);
        assert!(matches!(second, Err(LoggerError::SinkLocked { .. })));

        drop(first);
        assert!(FileSink::open(&path, true).is_ok());
        Ok(())
    }

    #[test]
    fn test_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("app.log");
        assert!(matches!(
            FileSink::open(&path, false),
            Err(LoggerError::SinkOpen { .. })
        ));
    }
}

//! Durable append-only storage.
//!
//! [`LogSink`] is the storage seam; [`CsvAppender`] is the production
//! implementation writing CSV files into a well-known directory. Each call
//! opens the named file in append mode, writes the whole batch, flushes, and
//! closes on every exit path, so a crash mid-batch leaves a well-formed
//! prefix of the batch on disk.

use crate::error::AcqResult;
use async_trait::async_trait;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Destination for drained batches of log lines.
#[async_trait]
pub trait LogSink: Send {
    /// Append `lines` to the file named `file_name`, creating it if absent.
    ///
    /// All lines are written within one scoped acquisition of the file.
    async fn append_lines(&mut self, file_name: &str, lines: &[String]) -> AcqResult<()>;
}

/// Appends batches to CSV files under a fixed output directory.
pub struct CsvAppender {
    dir: PathBuf,
}

impl CsvAppender {
    /// A sink writing into `dir` (created on first append if missing).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl LogSink for CsvAppender {
    async fn append_lines(&mut self, file_name: &str, lines: &[String]) -> AcqResult<()> {
        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir)?;
        }
        let path = self.dir.join(file_name);

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = BufWriter::new(file);
        for line in lines {
            writer.write_all(line.as_bytes())?;
        }
        writer.flush()?;
        Ok(())
    }
}

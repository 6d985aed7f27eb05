//! File agent appending records as JSON lines, one file per UTC day.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use parking_lot::Mutex;

use super::LogAgent;
use crate::record::LogRecord;

struct OpenLog {
    date: NaiveDate,
    writer: BufWriter<File>,
}

/// Appends every record to `<folder>/<YYYY-MM-DD>.log` as a JSON line.
///
/// The folder is created on first write. Output is buffered until `flush()`
/// or until the record date rolls over to a new file.
pub struct FileAgent {
    agent_id: String,
    folder: PathBuf,
    current: Mutex<Option<OpenLog>>,
}

impl FileAgent {
    #[must_use]
    pub fn new(agent_id: impl Into<String>, folder: impl Into<PathBuf>) -> Self {
        Self {
            agent_id: agent_id.into(),
            folder: folder.into(),
            current: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// File that records dated `date` are written to.
    #[must_use]
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.folder.join(format!("{}.log", date.format("%Y-%m-%d")))
    }

    fn open(&self, date: NaiveDate) -> anyhow::Result<OpenLog> {
        fs::create_dir_all(&self.folder)
            .with_context(|| format!("failed to create log folder {}", self.folder.display()))?;
        let path = self.path_for(date);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        Ok(OpenLog {
            date,
            writer: BufWriter::new(file),
        })
    }
}

impl LogAgent for FileAgent {
    fn agent_id(&self) -> &str {
        &self.agent_id
    }

    fn record(&self, record: &LogRecord) -> anyhow::Result<()> {
        let date = record.timestamp.date_naive();
        let mut current = self.current.lock();

        if current.as_ref().is_some_and(|log| log.date != date) {
            if let Some(mut previous) = current.take() {
                previous.writer.flush()?;
            }
        }
        if current.is_none() {
            *current = Some(self.open(date)?);
        }

        if let Some(log) = current.as_mut() {
            serde_json::to_writer(&mut log.writer, record)?;
            log.writer.write_all(b"\n")?;
        }
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        if let Some(log) = self.current.lock().as_mut() {
            log.writer.flush()?;
        }
        Ok(())
    }
}

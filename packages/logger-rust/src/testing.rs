//! Test doubles shared by the unit tests of this crate.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::agent::LogAgent;
use crate::record::LogRecord;

/// Agent that keeps every record in memory.
pub struct MemoryAgent {
    id: String,
    records: Mutex<Vec<LogRecord>>,
    flushes: AtomicU32,
}

impl MemoryAgent {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            records: Mutex::new(Vec::new()),
            flushes: AtomicU32::new(0),
        }
    }

    pub fn contents(&self) -> Vec<String> {
        self.records.lock().iter().map(|r| r.content.clone()).collect()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    pub fn flush_count(&self) -> u32 {
        self.flushes.load(Ordering::SeqCst)
    }
}

impl LogAgent for MemoryAgent {
    fn agent_id(&self) -> &str {
        &self.id
    }

    fn record(&self, record: &LogRecord) -> anyhow::Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Agent that rejects every record.
pub struct FailingAgent {
    id: String,
}

impl FailingAgent {
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string() }
    }
}

impl LogAgent for FailingAgent {
    fn agent_id(&self) -> &str {
        &self.id
    }

    fn record(&self, _record: &LogRecord) -> anyhow::Result<()> {
        anyhow::bail!("{} is offline", self.id)
    }
}

/// Cloneable in-memory writer.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

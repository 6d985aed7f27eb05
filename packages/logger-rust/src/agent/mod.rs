//! Output agents that receive dispatched log records.
//!
//! An agent is registered with a [`LogModule`](crate::LogModule) under its
//! `agent_id` and is called on the module's worker thread for every record.

pub mod console;
pub mod file;

pub use console::ConsoleAgent;
pub use file::FileAgent;

use crate::record::LogRecord;

/// Destination for log records.
///
/// Used as `Arc<dyn LogAgent>`. Calls come from the log module's worker
/// thread, one record at a time, but an agent may also be unregistered
/// concurrently from another thread.
pub trait LogAgent: Send + Sync {
    /// Identifier the agent is registered under.
    fn agent_id(&self) -> &str;

    /// Write one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record could not be written. Other agents
    /// still receive the record.
    fn record(&self, record: &LogRecord) -> anyhow::Result<()>;

    /// Push buffered output to its destination. Default is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if buffered output could not be written.
    fn flush(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn log_agent_is_object_safe() {
        fn _assert_object_safe(_: &Arc<dyn LogAgent>) {}
    }
}

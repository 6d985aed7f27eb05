//! `asynclog` logger: a fire-and-forget log module built on the core worker.
//!
//! Records appended to a [`LogModule`] are queued and delivered on a
//! background thread to every registered [`LogAgent`], such as the
//! [`ConsoleAgent`] and [`FileAgent`] shipped here.

pub mod agent;
pub mod config;
pub mod error;
pub mod module;
pub mod record;
pub mod registry;

#[cfg(test)]
mod testing;

pub use agent::{ConsoleAgent, FileAgent, LogAgent};
pub use asynclog_core::{StopMode, StopReport, WorkerState};
pub use config::LogModuleConfig;
pub use error::LogError;
pub use module::{LogDispatcher, LogModule, LogOperation};
pub use record::{LogCategory, LogLevel, LogRecord, RecordTemplate, RecordType};
pub use registry::AgentRegistry;

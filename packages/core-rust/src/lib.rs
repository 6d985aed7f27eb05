//! `asynclog` core: a thread-safe command queue and a single-consumer
//! background worker that dispatches commands to a module-supplied handler.

pub mod command;
pub mod config;
pub mod error;
pub mod fault;
pub mod queue;
pub mod stats;
pub mod worker;

pub use command::{Command, OpaqueOperation};
pub use config::WorkerConfig;
pub use error::{SubmitError, WorkerError};
pub use fault::{CommandFault, FaultKind, FaultObserver};
pub use queue::{CloseMode, CommandQueue, QueueClosed};
pub use stats::{StatsSnapshot, WorkerStats};
pub use worker::{AsyncWorker, CommandHandler, StopMode, StopReport, WorkerState};

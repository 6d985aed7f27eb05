//! Per-command fault reporting.
//!
//! When a handler returns an error or panics while processing a command,
//! or panics in a lifecycle hook, the worker builds a [`CommandFault`], logs
//! it, and hands it to the configured [`FaultObserver`] before moving on.

use std::any::Any;
use std::fmt;

/// How a single dispatch failed.
#[derive(Debug)]
pub enum FaultKind {
    /// The handler returned an error.
    Failed(anyhow::Error),
    /// The handler panicked; holds the panic message when one was available.
    Panicked(String),
    /// A lifecycle hook (`before_start` or `on_stop`) panicked.
    HookPanicked { hook: &'static str, message: String },
}

impl FaultKind {
    /// Builds a `Panicked` fault from a caught panic payload.
    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        Self::Panicked(panic_message(payload))
    }

    pub(crate) fn from_hook_panic(hook: &'static str, payload: &(dyn Any + Send)) -> Self {
        Self::HookPanicked {
            hook,
            message: panic_message(payload),
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(err) => write!(f, "handler failed: {err:#}"),
            Self::Panicked(msg) => write!(f, "handler panicked: {msg}"),
            Self::HookPanicked { hook, message } => write!(f, "{hook} hook panicked: {message}"),
        }
    }
}

/// A failed dispatch, reported out-of-band from the submitter.
#[derive(Debug)]
pub struct CommandFault {
    /// Name of the worker that dispatched the command.
    pub worker: String,
    /// Identifier of the failed command. Empty for command-less and hook faults.
    pub command_id: String,
    /// What went wrong.
    pub kind: FaultKind,
}

impl fmt::Display for CommandFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "worker {} command {:?}: {}",
            self.worker, self.command_id, self.kind
        )
    }
}

/// Receives faults raised while dispatching commands.
///
/// Called on the worker thread, so implementations should return quickly.
/// Used as `Arc<dyn FaultObserver>`.
pub trait FaultObserver: Send + Sync {
    fn on_fault(&self, fault: &CommandFault);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

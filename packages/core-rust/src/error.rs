use crate::command::Command;

/// Lifecycle errors returned by [`AsyncWorker`](crate::AsyncWorker).
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("worker is not initialized")]
    NotInitialized,
    #[error("worker is already initialized")]
    AlreadyInitialized,
    #[error("worker has been stopped")]
    Stopped,
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("worker thread panicked outside the fault boundary")]
    WorkerPanicked,
}

/// Error returned by [`AsyncWorker::submit`](crate::AsyncWorker::submit).
///
/// Hands the rejected command back so the caller can retry or inspect it.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError<T: std::fmt::Debug> {
    #[error("worker is not initialized")]
    NotInitialized(Command<T>),
    #[error("worker has been stopped")]
    Stopped(Command<T>),
}

impl<T: std::fmt::Debug> SubmitError<T> {
    /// Returns the command that was not accepted.
    pub fn into_command(self) -> Command<T> {
        match self {
            Self::NotInitialized(command) | Self::Stopped(command) => command,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_error_messages() {
        assert_eq!(WorkerError::NotInitialized.to_string(), "worker is not initialized");
        assert_eq!(WorkerError::Stopped.to_string(), "worker has been stopped");
        let io = std::io::Error::other("no threads left");
        assert_eq!(
            WorkerError::from(io).to_string(),
            "failed to spawn worker thread: no threads left"
        );
    }

    #[test]
    fn submit_error_returns_command() {
        let err = SubmitError::Stopped(Command::with_id("c1", 5u8));
        assert_eq!(err.to_string(), "worker has been stopped");
        let command = err.into_command();
        assert_eq!(command.id, "c1");
        assert_eq!(command.operation, 5);
    }
}

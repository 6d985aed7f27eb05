use asynclog_core::{SubmitError, WorkerError};

use crate::module::LogOperation;

/// Errors returned by [`LogModule`](crate::LogModule).
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("log agent already registered: {agent_id}")]
    DuplicateAgent { agent_id: String },
    #[error(transparent)]
    Worker(#[from] WorkerError),
}

impl From<SubmitError<LogOperation>> for LogError {
    fn from(err: SubmitError<LogOperation>) -> Self {
        match err {
            SubmitError::NotInitialized(_) => Self::Worker(WorkerError::NotInitialized),
            SubmitError::Stopped(_) => Self::Worker(WorkerError::Stopped),
        }
    }
}

#[cfg(test)]
mod tests {
    use asynclog_core::Command;

    use super::*;

    #[test]
    fn duplicate_agent_message() {
        let err = LogError::DuplicateAgent {
            agent_id: "console".to_string(),
        };
        assert_eq!(err.to_string(), "log agent already registered: console");
    }

    #[test]
    fn submit_errors_map_to_worker_errors() {
        let err = LogError::from(SubmitError::Stopped(Command::new(LogOperation::Flush)));
        assert!(matches!(err, LogError::Worker(WorkerError::Stopped)));
        assert_eq!(err.to_string(), "worker has been stopped");
    }
}

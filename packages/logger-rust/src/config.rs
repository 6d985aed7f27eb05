use asynclog_core::WorkerConfig;

use crate::record::RecordType;

/// Configuration for a [`LogModule`](crate::LogModule).
#[derive(Debug, Clone)]
pub struct LogModuleConfig {
    /// Application name stamped on every record.
    pub source: String,
    /// Record type stamped on every record. Defaults to the build profile.
    pub record_type: RecordType,
    /// Settings for the module's background worker.
    pub worker: WorkerConfig,
}

impl LogModuleConfig {
    /// Default configuration for the given source.
    #[must_use]
    pub fn with_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }
}

impl Default for LogModuleConfig {
    fn default() -> Self {
        Self {
            source: String::new(),
            record_type: RecordType::for_build(),
            worker: WorkerConfig::named("log-module"),
        }
    }
}

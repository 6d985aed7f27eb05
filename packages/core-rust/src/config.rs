/// Configuration for a single [`AsyncWorker`](crate::AsyncWorker).
///
/// Controls the name of the dedicated consumer thread and whether handler
/// panics are contained at the per-command fault boundary.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Worker name. Used as the OS thread name and as the metrics label.
    pub name: String,
    /// Catch panics raised by the handler and keep the loop alive.
    /// When `false`, a panicking handler ends the consumer thread.
    pub catch_panics: bool,
}

impl WorkerConfig {
    /// Default configuration with the given worker name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: "async-worker".to_string(),
            catch_panics: true,
        }
    }
}

//! Asynchronous log module.
//!
//! [`LogModule`] turns `append_log` calls into [`LogOperation`] commands and
//! submits them to its [`AsyncWorker`]. On the worker thread,
//! [`LogDispatcher`] fans each record out to every registered agent. Callers
//! never wait for an agent to finish writing.
//!
//! The module is an ordinary value: build one with [`LogModule::new`] and
//! share it as `Arc<LogModule>` where several components need it.

use std::sync::Arc;

use anyhow::anyhow;
use asynclog_core::{
    AsyncWorker, Command, CommandHandler, FaultObserver, StatsSnapshot, StopMode, StopReport,
    WorkerState,
};
use tracing::{debug, warn};

use crate::agent::LogAgent;
use crate::config::LogModuleConfig;
use crate::error::LogError;
use crate::record::{LogCategory, LogLevel, LogRecord, RecordTemplate};
use crate::registry::AgentRegistry;

// ---------------------------------------------------------------------------
// LogOperation
// ---------------------------------------------------------------------------

/// Operations handled by the log module's worker.
#[derive(Debug)]
pub enum LogOperation {
    /// Deliver a record to every registered agent.
    SaveRecord(LogRecord),
    /// Flush every registered agent.
    Flush,
}

// ---------------------------------------------------------------------------
// LogDispatcher
// ---------------------------------------------------------------------------

/// Worker-side handler delivering operations to the registered agents.
pub struct LogDispatcher {
    registry: Arc<AgentRegistry>,
}

impl LogDispatcher {
    #[must_use]
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self { registry }
    }

    /// Runs `action` against every agent. One agent failing does not keep
    /// the others from running; the combined result names every failure.
    fn fan_out(
        &self,
        action: &str,
        f: impl Fn(&dyn LogAgent) -> anyhow::Result<()>,
    ) -> anyhow::Result<()> {
        let mut failed = Vec::new();
        for agent in self.registry.snapshot() {
            if let Err(err) = f(agent.as_ref()) {
                warn!(agent_id = agent.agent_id(), error = %err, "log agent {action} failed");
                failed.push(agent.agent_id().to_string());
            }
        }
        if failed.is_empty() {
            Ok(())
        } else {
            Err(anyhow!(
                "{} log agent(s) failed to {action}: {}",
                failed.len(),
                failed.join(", ")
            ))
        }
    }
}

impl CommandHandler for LogDispatcher {
    type Operation = LogOperation;

    fn before_start(&mut self) {
        debug!(agents = self.registry.len(), "log dispatcher starting");
    }

    fn on_command(&mut self, command: Command<LogOperation>) -> anyhow::Result<()> {
        match command.operation {
            LogOperation::SaveRecord(record) => {
                self.fan_out("record", |agent| agent.record(&record))
            }
            LogOperation::Flush => self.fan_out("flush", |agent| agent.flush()),
        }
    }

    fn on_stop(&mut self) {
        if let Err(err) = self.fan_out("flush", |agent| agent.flush()) {
            warn!(error = %err, "final flush incomplete");
        }
    }
}

// ---------------------------------------------------------------------------
// LogModule
// ---------------------------------------------------------------------------

/// Fire-and-forget logging front end backed by a background worker.
///
/// Lifecycle:
/// 1. `new()` -- creates the registry and initializes the worker
/// 2. `register_agent()` -- any time, from any thread
/// 3. `start()` -- spawns the worker thread; records appended earlier wait
/// 4. `stop()` -- drains or discards pending records and flushes agents
pub struct LogModule {
    template: RecordTemplate,
    registry: Arc<AgentRegistry>,
    worker: AsyncWorker<LogDispatcher>,
}

impl LogModule {
    /// Creates an initialized, not yet started, log module.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker cannot be initialized.
    pub fn new(config: LogModuleConfig) -> Result<Self, LogError> {
        Self::build(config, None)
    }

    /// Like [`new`](Self::new), with an observer for records that could not
    /// be delivered to every agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker cannot be initialized.
    pub fn with_fault_observer(
        config: LogModuleConfig,
        observer: Arc<dyn FaultObserver>,
    ) -> Result<Self, LogError> {
        Self::build(config, Some(observer))
    }

    fn build(
        config: LogModuleConfig,
        observer: Option<Arc<dyn FaultObserver>>,
    ) -> Result<Self, LogError> {
        let registry = Arc::new(AgentRegistry::new());
        let mut worker = AsyncWorker::new(config.worker);
        if let Some(observer) = observer {
            worker = worker.with_fault_observer(observer);
        }
        worker.initialize(LogDispatcher::new(Arc::clone(&registry)))?;

        Ok(Self {
            template: RecordTemplate::new(config.source, config.record_type),
            registry,
            worker,
        })
    }

    /// Registers an output agent.
    ///
    /// # Errors
    ///
    /// Returns `LogError::DuplicateAgent` if an agent with the same id is
    /// already registered.
    pub fn register_agent(&self, agent: Arc<dyn LogAgent>) -> Result<(), LogError> {
        let agent_id = agent.agent_id().to_string();
        self.registry.register(agent)?;
        debug!(agent_id = %agent_id, "log agent registered");
        Ok(())
    }

    /// Removes an agent. Records already dispatched are unaffected.
    pub fn unregister_agent(&self, agent_id: &str) -> Option<Arc<dyn LogAgent>> {
        let removed = self.registry.unregister(agent_id);
        if removed.is_some() {
            debug!(agent_id = %agent_id, "log agent unregistered");
        }
        removed
    }

    /// Starts the background worker. Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the module was stopped or the thread could not
    /// be spawned.
    pub fn start(&self) -> Result<(), LogError> {
        Ok(self.worker.start()?)
    }

    /// Queues a record built from the module's source and the given fields.
    ///
    /// Returns as soon as the record is queued.
    ///
    /// # Errors
    ///
    /// Returns `LogError::Worker(WorkerError::Stopped)` after `stop()`.
    pub fn append_log(
        &self,
        category: LogCategory,
        level: LogLevel,
        sub_modules: &str,
        content: &str,
        custom_type: i32,
    ) -> Result<(), LogError> {
        let record = self
            .template
            .record(category, level, sub_modules, content, custom_type);
        self.append(record)
    }

    /// Queues a pre-built record as is.
    ///
    /// # Errors
    ///
    /// Returns `LogError::Worker(WorkerError::Stopped)` after `stop()`.
    pub fn append(&self, record: LogRecord) -> Result<(), LogError> {
        self.worker
            .submit(Command::new(LogOperation::SaveRecord(record)))?;
        Ok(())
    }

    /// Queues a flush of every agent behind the records already queued.
    ///
    /// # Errors
    ///
    /// Returns `LogError::Worker(WorkerError::Stopped)` after `stop()`.
    pub fn flush(&self) -> Result<(), LogError> {
        self.worker.submit(Command::new(LogOperation::Flush))?;
        Ok(())
    }

    /// Stops the worker and flushes every agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread died outside the fault boundary.
    pub fn stop(&self, mode: StopMode) -> Result<StopReport, LogError> {
        Ok(self.worker.stop(mode)?)
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.template.source
    }

    #[must_use]
    pub fn state(&self) -> WorkerState {
        self.worker.state()
    }

    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.worker.stats()
    }

    /// Ids of the registered agents, sorted.
    #[must_use]
    pub fn agents(&self) -> Vec<String> {
        self.registry.ids()
    }
}

impl Drop for LogModule {
    /// Drains records still queued so a module dropped without `stop()`
    /// does not lose them.
    fn drop(&mut self) {
        if self.worker.state() != WorkerState::Running {
            return;
        }
        if let Err(err) = self.worker.stop(StopMode::Drain) {
            warn!(source = %self.template.source, error = %err, "log module dropped with a failed worker");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::thread;

    use asynclog_core::{CommandFault, WorkerError};
    use parking_lot::Mutex;

    use super::*;
    use crate::record::RecordType;
    use crate::testing::{FailingAgent, MemoryAgent};

    fn module(source: &str) -> LogModule {
        LogModule::new(LogModuleConfig::with_source(source)).unwrap()
    }

    #[derive(Default)]
    struct FaultLog(Mutex<Vec<String>>);

    impl FaultObserver for FaultLog {
        fn on_fault(&self, fault: &CommandFault) {
            self.0.lock().push(fault.kind.to_string());
        }
    }

    #[test]
    fn records_reach_agent_in_order() {
        let module = module("sample");
        let agent = Arc::new(MemoryAgent::new("memory"));
        module.register_agent(Arc::clone(&agent) as Arc<dyn LogAgent>).unwrap();
        module.start().unwrap();

        for content in ["A", "B", "C"] {
            module
                .append_log(LogCategory::Business, LogLevel::Information, "Tests", content, 0)
                .unwrap();
        }
        module.stop(StopMode::Drain).unwrap();

        assert_eq!(agent.contents(), vec!["A", "B", "C"]);
        let record = &agent.records()[0];
        assert_eq!(record.source, "sample");
        assert_eq!(record.record_type, RecordType::for_build());
        assert_eq!(record.sub_modules, "Tests");
    }

    #[test]
    fn every_agent_receives_every_record() {
        let module = module("fan-out");
        let first = Arc::new(MemoryAgent::new("first"));
        let second = Arc::new(MemoryAgent::new("second"));
        module.register_agent(Arc::clone(&first) as Arc<dyn LogAgent>).unwrap();
        module.register_agent(Arc::clone(&second) as Arc<dyn LogAgent>).unwrap();
        module.start().unwrap();

        module
            .append_log(LogCategory::Tool, LogLevel::Critical, "Tests", "both", 3)
            .unwrap();
        module.stop(StopMode::Drain).unwrap();

        assert_eq!(first.contents(), vec!["both"]);
        assert_eq!(second.contents(), vec!["both"]);
        assert_eq!(module.agents(), vec!["first", "second"]);
    }

    #[test]
    fn duplicate_agent_registration_fails() {
        let module = module("dupes");
        module.register_agent(Arc::new(MemoryAgent::new("console"))).unwrap();
        let err = module
            .register_agent(Arc::new(MemoryAgent::new("console")))
            .unwrap_err();
        assert!(matches!(err, LogError::DuplicateAgent { .. }));
    }

    #[test]
    fn unregistered_agent_stops_receiving() {
        let module = module("unregister");
        let agent = Arc::new(MemoryAgent::new("memory"));
        module.register_agent(Arc::clone(&agent) as Arc<dyn LogAgent>).unwrap();
        module.start().unwrap();

        module
            .append_log(LogCategory::System, LogLevel::Warning, "Tests", "kept", 0)
            .unwrap();
        module.flush().unwrap();
        // The flush is dispatched after "kept", so once it lands "kept" has too.
        while agent.flush_count() == 0 {
            thread::yield_now();
        }
        assert!(module.unregister_agent("memory").is_some());
        assert!(module.unregister_agent("memory").is_none());

        module
            .append_log(LogCategory::System, LogLevel::Warning, "Tests", "missed", 0)
            .unwrap();
        module.stop(StopMode::Drain).unwrap();

        assert_eq!(agent.contents(), vec!["kept"]);
    }

    #[test]
    fn failing_agent_does_not_block_others() {
        let faults = Arc::new(FaultLog::default());
        let module = LogModule::with_fault_observer(
            LogModuleConfig::with_source("faults"),
            Arc::clone(&faults) as Arc<dyn FaultObserver>,
        )
        .unwrap();
        let healthy = Arc::new(MemoryAgent::new("healthy"));
        module.register_agent(Arc::new(FailingAgent::new("broken"))).unwrap();
        module.register_agent(Arc::clone(&healthy) as Arc<dyn LogAgent>).unwrap();
        module.start().unwrap();

        module
            .append_log(LogCategory::Business, LogLevel::Error, "Tests", "one", 0)
            .unwrap();
        module
            .append_log(LogCategory::Business, LogLevel::Error, "Tests", "two", 0)
            .unwrap();
        let report = module.stop(StopMode::Drain).unwrap();

        assert_eq!(healthy.contents(), vec!["one", "two"]);
        assert_eq!(report.dispatched, 2);
        assert_eq!(report.failed, 2);
        assert_eq!(
            faults.0.lock()[0],
            "handler failed: 1 log agent(s) failed to record: broken"
        );
    }

    #[test]
    fn stop_flushes_agents_and_rejects_new_records() {
        let module = module("stop");
        let agent = Arc::new(MemoryAgent::new("memory"));
        module.register_agent(Arc::clone(&agent) as Arc<dyn LogAgent>).unwrap();
        module.start().unwrap();
        module.stop(StopMode::Drain).unwrap();

        assert_eq!(agent.flush_count(), 1);
        assert_eq!(module.state(), WorkerState::Stopped);
        let err = module
            .append_log(LogCategory::Tool, LogLevel::Illegal, "Tests", "late", 0)
            .unwrap_err();
        assert!(matches!(err, LogError::Worker(WorkerError::Stopped)));
        assert!(matches!(module.start(), Err(LogError::Worker(WorkerError::Stopped))));
    }

    #[test]
    fn records_appended_before_start_are_delivered() {
        let module = module("early");
        let agent = Arc::new(MemoryAgent::new("memory"));
        module
            .append_log(LogCategory::System, LogLevel::Information, "Tests", "early", 0)
            .unwrap();
        module.register_agent(Arc::clone(&agent) as Arc<dyn LogAgent>).unwrap();
        assert_eq!(module.state(), WorkerState::Initialized);

        module.start().unwrap();
        module.start().unwrap();
        module.stop(StopMode::Drain).unwrap();
        assert_eq!(agent.contents(), vec!["early"]);
    }

    #[test]
    fn shared_module_accepts_concurrent_producers() {
        let module = Arc::new(module("shared"));
        let agent = Arc::new(MemoryAgent::new("memory"));
        module.register_agent(Arc::clone(&agent) as Arc<dyn LogAgent>).unwrap();
        module.start().unwrap();

        let producers: Vec<_> = (0..4)
            .map(|p| {
                let module = Arc::clone(&module);
                thread::spawn(move || {
                    for i in 0..100 {
                        module
                            .append_log(
                                LogCategory::Business,
                                LogLevel::Information,
                                &format!("Producer{p}"),
                                &i.to_string(),
                                p,
                            )
                            .unwrap();
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }
        module.stop(StopMode::Drain).unwrap();

        let records = agent.records();
        assert_eq!(records.len(), 400);
        for p in 0..4 {
            let order: Vec<i32> = records
                .iter()
                .filter(|r| r.custom_type == p)
                .map(|r| r.content.parse().unwrap())
                .collect();
            assert_eq!(order, (0..100).collect::<Vec<_>>());
        }
    }

    #[test]
    fn dropping_running_module_delivers_queued_records() {
        let agent = Arc::new(MemoryAgent::new("memory"));
        {
            let module = module("dropped");
            module.register_agent(Arc::clone(&agent) as Arc<dyn LogAgent>).unwrap();
            module.start().unwrap();
            for content in ["A", "B", "C"] {
                module
                    .append_log(LogCategory::System, LogLevel::Information, "Tests", content, 0)
                    .unwrap();
            }
        }
        assert_eq!(agent.contents(), vec!["A", "B", "C"]);
        assert_eq!(agent.flush_count(), 1);
    }

    #[test]
    fn exposes_source_and_stats() {
        let module = module("stats");
        module
            .append_log(LogCategory::Tool, LogLevel::Failed, "Tests", "queued", 0)
            .unwrap();
        assert_eq!(module.source(), "stats");
        assert_eq!(module.stats().submitted, 1);
        assert_eq!(module.stats().pending(), 1);
    }
}

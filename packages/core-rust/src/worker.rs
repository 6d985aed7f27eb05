//! Single-consumer background worker.
//!
//! An [`AsyncWorker`] owns one [`CommandQueue`] and one dedicated OS thread.
//! Producers call [`AsyncWorker::submit`] from any thread; the worker thread
//! pops commands in submission order and hands each one to a
//! [`CommandHandler`] supplied by the owning module.
//!
//! Lifecycle: `Uninitialized -> Initialized -> Running -> Stopping -> Stopped`.
//! `initialize()` installs the handler and creates the queue, `start()` spawns
//! the consumer thread (once), and `stop()` closes the queue and joins the
//! thread.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::{error, info, trace, warn};

use crate::command::Command;
use crate::config::WorkerConfig;
use crate::error::{SubmitError, WorkerError};
use crate::fault::{CommandFault, FaultKind, FaultObserver};
use crate::queue::{CloseMode, CommandQueue};
use crate::stats::{StatsSnapshot, WorkerStats};

// ---------------------------------------------------------------------------
// CommandHandler trait
// ---------------------------------------------------------------------------

/// Module-specific command interpretation, run on the worker thread.
///
/// Commands arrive one at a time, in submission order, on a single thread,
/// so `&mut self` state needs no locking among dispatched commands. State
/// also reached from other threads (e.g. a registry shared with the module's
/// public API) still needs its own synchronization.
pub trait CommandHandler: Send + 'static {
    /// The operation type carried by this handler's commands.
    type Operation: Send + fmt::Debug + 'static;

    /// Called once on the worker thread before the first dispatch.
    ///
    /// With `catch_panics` set, a panic here is reported as a fault and the
    /// worker still goes on to dispatch commands. The same holds for
    /// `on_stop`.
    fn before_start(&mut self) {}

    /// Process a single command.
    ///
    /// # Errors
    ///
    /// An error is reported through the worker's fault boundary; it never
    /// reaches the submitter and does not stop the loop.
    fn on_command(&mut self, command: Command<Self::Operation>) -> anyhow::Result<()>;

    /// Called once after the loop has exited.
    fn on_stop(&mut self) {}
}

// ---------------------------------------------------------------------------
// WorkerState / StopReport
// ---------------------------------------------------------------------------

/// Observable lifecycle state of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Constructed; no handler or queue yet.
    Uninitialized,
    /// Handler installed and queue created; commands may be submitted.
    Initialized,
    /// Consumer thread is running.
    Running,
    /// Queue closed; waiting for the consumer thread to exit.
    Stopping,
    /// Consumer thread has exited. Terminal.
    Stopped,
}

/// What to do with queued commands when stopping.
pub type StopMode = CloseMode;

/// Summary returned by [`AsyncWorker::stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StopReport {
    /// Commands dispatched over the worker's lifetime.
    pub dispatched: u64,
    /// Faults reported over the worker's lifetime, panicked hooks included.
    pub failed: u64,
    /// Commands dropped from the queue without being dispatched.
    pub discarded: usize,
}

enum Lifecycle<H> {
    Uninitialized,
    Initialized(H),
    Running(JoinHandle<()>),
    Stopped,
}

// ---------------------------------------------------------------------------
// AsyncWorker
// ---------------------------------------------------------------------------

/// Generic background worker draining a command queue on a dedicated thread.
pub struct AsyncWorker<H: CommandHandler> {
    config: WorkerConfig,
    queue: Option<Arc<CommandQueue<Command<H::Operation>>>>,
    lifecycle: Mutex<Lifecycle<H>>,
    state: ArcSwap<WorkerState>,
    stats: Arc<WorkerStats>,
    fault_observer: Option<Arc<dyn FaultObserver>>,
}

impl<H: CommandHandler> AsyncWorker<H> {
    /// Creates an uninitialized worker.
    #[must_use]
    pub fn new(config: WorkerConfig) -> Self {
        let stats = Arc::new(WorkerStats::new(&config.name));
        Self {
            config,
            queue: None,
            lifecycle: Mutex::new(Lifecycle::Uninitialized),
            state: ArcSwap::from_pointee(WorkerState::Uninitialized),
            stats,
            fault_observer: None,
        }
    }

    /// Installs an observer that receives every dispatch fault.
    ///
    /// Takes effect for threads started after this call.
    #[must_use]
    pub fn with_fault_observer(mut self, observer: Arc<dyn FaultObserver>) -> Self {
        self.fault_observer = Some(observer);
        self
    }

    /// Installs the handler and creates the command queue.
    ///
    /// # Errors
    ///
    /// Returns `WorkerError::AlreadyInitialized` on any call after the first.
    pub fn initialize(&mut self, handler: H) -> Result<(), WorkerError> {
        let lifecycle = self.lifecycle.get_mut();
        if !matches!(lifecycle, Lifecycle::Uninitialized) {
            return Err(WorkerError::AlreadyInitialized);
        }
        *lifecycle = Lifecycle::Initialized(handler);
        self.queue = Some(Arc::new(CommandQueue::new()));
        self.state.store(Arc::new(WorkerState::Initialized));
        Ok(())
    }

    /// Enqueues a command for asynchronous processing and returns at once.
    ///
    /// Safe to call from any thread, before or after `start()`.
    ///
    /// # Errors
    ///
    /// Hands the command back inside `SubmitError::NotInitialized` before
    /// `initialize()`, and inside `SubmitError::Stopped` once `stop()` has
    /// closed the queue.
    pub fn submit(&self, command: Command<H::Operation>) -> Result<(), SubmitError<H::Operation>> {
        let Some(queue) = &self.queue else {
            return Err(SubmitError::NotInitialized(command));
        };
        queue
            .push(command)
            .map_err(|closed| SubmitError::Stopped(closed.0))?;
        self.stats.record_submitted();
        Ok(())
    }

    /// Spawns the consumer thread. Calling it again while running is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `WorkerError::NotInitialized` before `initialize()`,
    /// `WorkerError::Stopped` after `stop()`, and `WorkerError::Spawn` if the
    /// OS refused the thread (the worker is then stopped).
    pub fn start(&self) -> Result<(), WorkerError> {
        let mut lifecycle = self.lifecycle.lock();
        match std::mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
            Lifecycle::Uninitialized => {
                *lifecycle = Lifecycle::Uninitialized;
                Err(WorkerError::NotInitialized)
            }
            Lifecycle::Running(thread) => {
                *lifecycle = Lifecycle::Running(thread);
                Ok(())
            }
            Lifecycle::Stopped => Err(WorkerError::Stopped),
            Lifecycle::Initialized(handler) => {
                let queue = self.queue.as_ref().ok_or(WorkerError::NotInitialized)?;
                match self.spawn(handler, Arc::clone(queue)) {
                    Ok(thread) => {
                        *lifecycle = Lifecycle::Running(thread);
                        self.state.store(Arc::new(WorkerState::Running));
                        info!(worker = %self.config.name, "worker started");
                        Ok(())
                    }
                    Err(err) => {
                        queue.close(CloseMode::Discard);
                        self.state.store(Arc::new(WorkerState::Stopped));
                        error!(worker = %self.config.name, error = %err, "failed to spawn worker thread");
                        Err(WorkerError::Spawn(err))
                    }
                }
            }
        }
    }

    /// Closes the queue, waits for the consumer thread to exit, and reports.
    ///
    /// With `StopMode::Drain` every command submitted before this call is
    /// dispatched first; with `StopMode::Discard` queued commands are dropped
    /// and only the command in flight completes. A worker that was never
    /// started has no consumer, so its queued commands are always discarded.
    /// Later calls return an empty report.
    ///
    /// # Errors
    ///
    /// Returns `WorkerError::NotInitialized` before `initialize()` and
    /// `WorkerError::WorkerPanicked` if the consumer thread died from a
    /// panic that was not contained.
    pub fn stop(&self, mode: StopMode) -> Result<StopReport, WorkerError> {
        let mut lifecycle = self.lifecycle.lock();
        match std::mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
            Lifecycle::Uninitialized => {
                *lifecycle = Lifecycle::Uninitialized;
                Err(WorkerError::NotInitialized)
            }
            Lifecycle::Stopped => Ok(StopReport::default()),
            Lifecycle::Initialized(mut handler) => {
                let discarded = self.close_queue(CloseMode::Discard);
                handler.on_stop();
                self.state.store(Arc::new(WorkerState::Stopped));
                Ok(self.report(discarded))
            }
            Lifecycle::Running(thread) => {
                self.state.store(Arc::new(WorkerState::Stopping));
                let discarded = self.close_queue(mode);
                let joined = thread.join();
                self.state.store(Arc::new(WorkerState::Stopped));
                joined.map_err(|_| WorkerError::WorkerPanicked)?;

                let report = self.report(discarded);
                info!(
                    worker = %self.config.name,
                    dispatched = report.dispatched,
                    failed = report.failed,
                    discarded = report.discarded,
                    "worker stopped"
                );
                Ok(report)
            }
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> WorkerState {
        **self.state.load()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Current dispatch counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Number of commands waiting in the queue.
    #[must_use]
    pub fn queue_depth(&self) -> usize {
        self.queue.as_ref().map_or(0, |queue| queue.len())
    }

    fn close_queue(&self, mode: CloseMode) -> usize {
        self.queue.as_ref().map_or(0, |queue| queue.close(mode))
    }

    fn report(&self, discarded: usize) -> StopReport {
        let snapshot = self.stats.snapshot();
        StopReport {
            dispatched: snapshot.dispatched,
            failed: snapshot.failed,
            discarded,
        }
    }

    fn spawn(
        &self,
        handler: H,
        queue: Arc<CommandQueue<Command<H::Operation>>>,
    ) -> std::io::Result<JoinHandle<()>> {
        let consumer = Consumer {
            handler,
            queue,
            stats: Arc::clone(&self.stats),
            fault_observer: self.fault_observer.clone(),
            name: self.config.name.clone(),
            catch_panics: self.config.catch_panics,
        };
        thread::Builder::new()
            .name(self.config.name.clone())
            .spawn(move || consumer.run())
    }
}

impl<H: CommandHandler> Drop for AsyncWorker<H> {
    fn drop(&mut self) {
        if !matches!(*self.lifecycle.get_mut(), Lifecycle::Running(_)) {
            return;
        }
        match self.stop(StopMode::Discard) {
            Ok(report) if report.discarded > 0 => warn!(
                worker = %self.config.name,
                discarded = report.discarded,
                "worker dropped while running, queued commands discarded"
            ),
            Ok(_) => {}
            Err(err) => warn!(worker = %self.config.name, error = %err, "worker dropped while running"),
        }
    }
}

impl<H: CommandHandler> fmt::Debug for AsyncWorker<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncWorker")
            .field("name", &self.config.name)
            .field("state", &self.state())
            .field("queue_depth", &self.queue_depth())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Consumer loop
// ---------------------------------------------------------------------------

/// Everything the worker thread owns.
struct Consumer<H: CommandHandler> {
    handler: H,
    queue: Arc<CommandQueue<Command<H::Operation>>>,
    stats: Arc<WorkerStats>,
    fault_observer: Option<Arc<dyn FaultObserver>>,
    name: String,
    catch_panics: bool,
}

impl<H: CommandHandler> Consumer<H> {
    fn run(mut self) {
        self.run_hook("before_start", H::before_start);

        // `pop` only returns `None` once the queue is closed and drained.
        while let Some(command) = self.queue.pop() {
            let command_id = command.id.clone();
            trace!(worker = %self.name, command_id = %command_id, "dispatching command");

            let fault = self.dispatch(command);
            self.stats.record_dispatched(self.queue.len());

            if let Some(kind) = fault {
                self.report_fault(CommandFault {
                    worker: self.name.clone(),
                    command_id,
                    kind,
                });
            }
        }

        self.run_hook("on_stop", H::on_stop);
    }

    /// Runs a lifecycle hook inside the same boundary as `on_command`. A
    /// caught panic is reported and the consumer carries on.
    fn run_hook(&mut self, hook: &'static str, f: fn(&mut H)) {
        if !self.catch_panics {
            f(&mut self.handler);
            return;
        }
        let handler = &mut self.handler;
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| f(handler))) {
            self.report_fault(CommandFault {
                worker: self.name.clone(),
                command_id: String::new(),
                kind: FaultKind::from_hook_panic(hook, payload.as_ref()),
            });
        }
    }

    fn dispatch(&mut self, command: Command<H::Operation>) -> Option<FaultKind> {
        if !self.catch_panics {
            return self.handler.on_command(command).err().map(FaultKind::Failed);
        }
        let handler = &mut self.handler;
        match panic::catch_unwind(AssertUnwindSafe(|| handler.on_command(command))) {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(FaultKind::Failed(err)),
            Err(payload) => Some(FaultKind::from_panic(payload.as_ref())),
        }
    }

    fn report_fault(&self, fault: CommandFault) {
        self.stats.record_fault();
        error!(
            worker = %fault.worker,
            command_id = %fault.command_id,
            fault = %fault.kind,
            "worker handler fault"
        );
        if let Some(observer) = &self.fault_observer {
            observer.on_fault(&fault);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Thread-safe FIFO with a blocking pop for a single consumer.
//!
//! The container and the "closed" flag live under one mutex, and consumers
//! wait on a condition variable tied to that mutex. Checking for emptiness
//! and going to sleep therefore happen atomically with respect to `push`:
//! a push between the check and the wait cannot be missed.

use std::collections::VecDeque;
use std::fmt;

use parking_lot::{Condvar, Mutex};

/// What happens to queued items when the queue is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloseMode {
    /// Keep queued items; the consumer pops them before seeing the end.
    #[default]
    Drain,
    /// Drop queued items immediately.
    Discard,
}

/// Returned by [`CommandQueue::push`] after the queue has been closed.
///
/// Carries the rejected item back to the caller.
#[derive(Debug, PartialEq, Eq)]
pub struct QueueClosed<T>(pub T);

impl<T> fmt::Display for QueueClosed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("command queue is closed")
    }
}

impl<T: fmt::Debug> std::error::Error for QueueClosed<T> {}

#[derive(Debug)]
struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Unbounded multi-producer, single-consumer FIFO.
///
/// `push` never blocks on consumer progress. `pop` suspends the caller while
/// the queue is empty and open, and returns `None` only after the queue has
/// been closed and everything queued before the close has been taken.
#[derive(Debug)]
pub struct CommandQueue<T> {
    state: Mutex<QueueState<T>>,
    available: Condvar,
}

impl<T> CommandQueue<T> {
    /// Creates an empty, open queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Appends `item` to the tail and wakes one waiting consumer.
    ///
    /// # Errors
    ///
    /// Returns [`QueueClosed`] holding `item` if the queue has been closed.
    pub fn push(&self, item: T) -> Result<(), QueueClosed<T>> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(QueueClosed(item));
        }
        state.items.push_back(item);
        drop(state);
        self.available.notify_one();
        Ok(())
    }

    /// Removes and returns the head, blocking while the queue is empty.
    ///
    /// Returns `None` once the queue is closed and empty.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }
            if state.closed {
                return None;
            }
            self.available.wait(&mut state);
        }
    }

    /// Removes and returns the head without blocking.
    pub fn try_pop(&self) -> Option<T> {
        self.state.lock().items.pop_front()
    }

    /// Closes the queue and wakes every waiter. Later pushes are rejected.
    ///
    /// Returns the number of items dropped, which is always zero for
    /// [`CloseMode::Drain`]. Closing twice is harmless.
    pub fn close(&self, mode: CloseMode) -> usize {
        let mut state = self.state.lock();
        state.closed = true;
        let discarded = match mode {
            CloseMode::Drain => 0,
            CloseMode::Discard => {
                let n = state.items.len();
                state.items.clear();
                n
            }
        };
        drop(state);
        self.available.notify_all();
        discarded
    }

    /// Number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl<T> Default for CommandQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

//! Deferred execution of store hydration
//!
//! A store must be usable as soon as it is constructed, so its one-time
//! read from storage is handed to a `Scheduler` instead of running inline.

use parking_lot::Mutex;
use stashline_core::{StashlineError, StashlineResult};
use std::collections::VecDeque;
use tokio::runtime::Handle;

/// Unit of deferred work
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs tasks some time after they are scheduled
pub trait Scheduler {
    fn schedule(&self, task: Task);
}

/// Cooperative FIFO queue drained explicitly by its owner
#[derive(Default)]
pub struct DeferredQueue {
    tasks: Mutex<VecDeque<Task>>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run queued tasks in order, including ones queued while draining.
    /// Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            // Lock is released before the task runs so it may schedule more work
            let next = self.tasks.lock().pop_front();
            match next {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.tasks.lock().len()
    }
}

impl Scheduler for DeferredQueue {
    fn schedule(&self, task: Task) {
        self.tasks.lock().push_back(task);
    }
}

/// Spawns tasks onto a tokio runtime
#[derive(Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime the caller is running on
    pub fn current() -> StashlineResult<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| StashlineError::ConfigError(format!("no tokio runtime: {}", e)))
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, task: Task) {
        self.handle.spawn(async move { task() });
    }
}

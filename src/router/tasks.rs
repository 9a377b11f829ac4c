//! Internal timers owned by a module.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

/// Named background tasks, aborted together on teardown.
///
/// Spawning under a name that is already running aborts the previous task
/// first, so at most one instance of each named timer is outstanding.
///
/// `abort()` only takes effect at the task's next await point, and on a
/// multi-thread runtime the task may be mid-way through a side effect on
/// another worker. Tasks therefore hold a [`TaskGate`] across every side
/// effect; [`TaskSet::cancel_all`] closes the gate under the same lock, so
/// once it returns no task of this set can render or write again.
#[derive(Debug, Default)]
pub struct TaskSet {
    tasks: HashMap<&'static str, JoinHandle<()>>,
    epoch: Arc<Mutex<u64>>,
}

/// Permission for a spawned task to touch shared state, valid until the
/// owning [`TaskSet`] is cancelled.
#[derive(Debug, Clone)]
pub struct TaskGate {
    epoch: Arc<Mutex<u64>>,
    issued: u64,
}

impl TaskGate {
    /// Hold the returned guard for the duration of the side effect; `None`
    /// once the owning set has been cancelled. Never hold it across an await.
    pub fn enter(&self) -> Option<MutexGuard<'_, u64>> {
        let current = self.epoch.lock().unwrap_or_else(PoisonError::into_inner);
        (*current == self.issued).then_some(current)
    }
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate for tasks spawned from now until the next `cancel_all`.
    pub fn gate(&self) -> TaskGate {
        let issued = *self.epoch.lock().unwrap_or_else(PoisonError::into_inner);
        TaskGate {
            epoch: Arc::clone(&self.epoch),
            issued,
        }
    }

    pub fn spawn<F>(&mut self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Some(previous) = self.tasks.insert(name, tokio::spawn(task)) {
            previous.abort();
        }
    }

    pub fn cancel(&mut self, name: &str) -> bool {
        match self.tasks.remove(name) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Close every outstanding gate, then abort all tasks. Blocks while a
    /// task is inside its gate.
    pub fn cancel_all(&mut self) {
        *self.epoch.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.tasks.get(name).is_some_and(|h| !h.is_finished())
    }
}

impl Drop for TaskSet {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

//! A single OS-thread worker: runs its own pinned FIFO to exhaustion
//! before reaching into the shared global priority queue, then idles.

use crate::queue::{GlobalQueue, Task};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Signalled whenever a task lands anywhere a worker might be waiting on —
/// its own pinned queue or the shared global queue — so an idling worker
/// wakes promptly instead of riding out its poll timeout.
#[derive(Default)]
pub struct WakeSignal {
    mutex: Mutex<()>,
    condvar: Condvar,
}

impl WakeSignal {
    pub fn new() -> Self {
        WakeSignal::default()
    }

    pub fn notify_one(&self) {
        self.condvar.notify_one();
    }

    pub fn notify_all(&self) {
        self.condvar.notify_all();
    }

    fn wait_briefly(&self) {
        let mut guard = self.mutex.lock();
        self.condvar.wait_for(&mut guard, Duration::from_millis(20));
    }
}

pub struct PinnedQueue {
    tasks: Mutex<VecDeque<Task>>,
}

impl PinnedQueue {
    pub fn new() -> Self {
        PinnedQueue { tasks: Mutex::new(VecDeque::new()) }
    }

    pub fn push(&self, task: Task) {
        self.tasks.lock().push_back(task);
    }

    pub fn pop(&self) -> Option<Task> {
        self.tasks.lock().pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }
}

impl Default for PinnedQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the three-step scheduling algorithm until `done` is set and both
/// queues are drained: pinned-ready first, then the global priority queue,
/// then idle-wait.
pub fn run_worker(
    pinned: Arc<PinnedQueue>,
    global: Arc<GlobalQueue>,
    wake: Arc<WakeSignal>,
    done: Arc<AtomicBool>,
) {
    loop {
        if let Some(task) = pinned.pop() {
            task();
            continue;
        }
        if let Some(ready) = global.pop() {
            (ready.task)();
            continue;
        }
        if done.load(Ordering::Relaxed) {
            return;
        }
        wake.wait_briefly();
    }
}

//! `PriorityPool`: the fiber runtime's public entry point. Owns `N`
//! worker threads; submission happens through a bounded channel so a
//! burst of work never grows without limit ahead of the workers draining
//! it, matching the spec's "channel capacities bound queuing but never
//! block the committing worker" rule as long as the caller doesn't try to
//! submit past the configured depth from the same thread it expects to
//! drain on.

use crate::context::{Context, Priority};
use crate::queue::{GlobalQueue, ReadyTask, Task};
use crate::worker::{run_worker, PinnedQueue, WakeSignal};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

pub struct PoolConfig {
    pub worker_count: usize,
    pub submission_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            worker_count: num_cpus::get().max(1),
            submission_capacity: 4096,
        }
    }
}

enum Submission {
    Migratable(Priority, Task),
    Pinned(usize, Task),
    Shutdown,
}

pub struct PriorityPool {
    workers: Vec<JoinHandle<()>>,
    feeder: Option<JoinHandle<()>>,
    submit_tx: Sender<Submission>,
    pub(crate) done: Arc<AtomicBool>,
    pub(crate) wake: Arc<WakeSignal>,
}

impl PriorityPool {
    pub fn new(config: PoolConfig) -> Self {
        let global = Arc::new(GlobalQueue::new());
        let wake = Arc::new(WakeSignal::new());
        let done = Arc::new(AtomicBool::new(false));
        let pinned: Vec<Arc<PinnedQueue>> =
            (0..config.worker_count).map(|_| Arc::new(PinnedQueue::new())).collect();

        let workers = pinned
            .iter()
            .cloned()
            .map(|pinned_queue| {
                let global = global.clone();
                let wake = wake.clone();
                let done = done.clone();
                std::thread::spawn(move || run_worker(pinned_queue, global, wake, done))
            })
            .collect();

        let (submit_tx, submit_rx): (Sender<Submission>, Receiver<Submission>) =
            bounded(config.submission_capacity);
        let feeder = {
            let global = global.clone();
            let wake = wake.clone();
            let pinned = pinned.clone();
            let seq = AtomicU64::new(0);
            Some(std::thread::spawn(move || {
                for submission in submit_rx {
                    match submission {
                        Submission::Migratable(priority, task) => {
                            let seq = seq.fetch_add(1, Ordering::Relaxed);
                            global.push(ReadyTask { priority, seq, task });
                            wake.notify_one();
                        }
                        Submission::Pinned(worker, task) => {
                            if let Some(queue) = pinned.get(worker) {
                                queue.push(task);
                                wake.notify_all();
                            }
                        }
                        Submission::Shutdown => break,
                    }
                }
            }))
        };

        PriorityPool { workers, feeder, submit_tx, done, wake }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Submit a migratable task at the given priority. Lower priority runs
    /// first; callers submitting per-transaction execution should pass the
    /// transaction index directly.
    pub fn submit(&self, priority: Priority, task: impl FnOnce() + Send + 'static) {
        let _ = self.submit_tx.send(Submission::Migratable(priority, Box::new(task)));
    }

    /// Submit a task pinned to a specific worker (used for the per-worker
    /// I/O completion-servicing fiber).
    pub fn submit_pinned(&self, worker: usize, task: impl FnOnce() + Send + 'static) {
        let _ = self.submit_tx.send(Submission::Pinned(worker, Box::new(task)));
    }

    pub fn submit_to(&self, context: Context, priority: Priority, task: impl FnOnce() + Send + 'static) {
        match context {
            Context::Migratable => self.submit(priority, task),
            Context::Pinned(worker) => self.submit_pinned(worker, task),
        }
    }

    /// Cooperative cancellation: sets the shared `done` flag. Already
    /// in-flight tasks finish their current atomic step, observe `done` at
    /// their next suspension point, and exit without merging.
    pub fn cancel(&self) {
        self.done.store(true, Ordering::SeqCst);
        self.wake.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.done.load(Ordering::Relaxed)
    }

    pub fn done_flag(&self) -> Arc<AtomicBool> {
        self.done.clone()
    }

    /// Cooperative yield point: relinquishes the OS thread briefly and
    /// reports whether the caller should keep going.
    pub fn yield_now(&self) -> bool {
        std::thread::yield_now();
        !self.is_cancelled()
    }

    /// Signals shutdown and waits for every worker and the feeder thread to
    /// drain their queues and exit.
    pub fn shutdown(mut self) {
        self.done.store(true, Ordering::SeqCst);
        let _ = self.submit_tx.send(Submission::Shutdown);
        self.wake.notify_all();
        if let Some(feeder) = self.feeder.take() {
            let _ = feeder.join();
        }
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn submitted_tasks_all_run() {
        let pool = PriorityPool::new(PoolConfig { worker_count: 2, submission_capacity: 64 });
        let counter = Arc::new(AtomicUsize::new(0));
        for i in 0..50u64 {
            let counter = counter.clone();
            pool.submit(Priority(i), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        std::thread::sleep(Duration::from_millis(200));
        assert_eq!(counter.load(Ordering::SeqCst), 50);
        pool.shutdown();
    }

    #[test]
    fn pinned_task_runs_on_its_worker() {
        let pool = PriorityPool::new(PoolConfig { worker_count: 3, submission_capacity: 16 });
        let flag = Arc::new(AtomicBool::new(false));
        let flag2 = flag.clone();
        pool.submit_pinned(1, move || flag2.store(true, Ordering::SeqCst));
        std::thread::sleep(Duration::from_millis(100));
        assert!(flag.load(Ordering::SeqCst));
        pool.shutdown();
    }

    #[test]
    fn cancel_stops_new_progress_observed_cooperatively() {
        let pool = PriorityPool::new(PoolConfig { worker_count: 1, submission_capacity: 16 });
        pool.cancel();
        assert!(pool.is_cancelled());
        pool.shutdown();
    }
}

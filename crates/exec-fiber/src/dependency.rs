//! A one-shot `prev -> this` ordering future: the block executor uses one
//! of these per transaction index so each fiber's merge step waits for the
//! previous index's merge to finish, without serializing execution itself.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;

struct Inner {
    ready: Mutex<bool>,
    condvar: Condvar,
}

/// The completing side: exactly one `fulfill` call is expected per
/// `Dependency`.
pub struct Completer {
    inner: Arc<Inner>,
}

/// The waiting side. `wait` is a cooperative suspension point: it polls the
/// shared `done` flag between timed condvar waits so a cancelled block
/// doesn't leave fibers parked forever.
pub struct Dependency {
    inner: Arc<Inner>,
}

pub fn pair() -> (Completer, Dependency) {
    let inner = Arc::new(Inner {
        ready: Mutex::new(false),
        condvar: Condvar::new(),
    });
    (
        Completer { inner: inner.clone() },
        Dependency { inner },
    )
}

impl Completer {
    pub fn fulfill(self) {
        *self.inner.ready.lock() = true;
        self.inner.condvar.notify_all();
    }
}

impl Dependency {
    /// Blocks until fulfilled, returning `false` early if `done` flips to
    /// true first (cooperative cancellation).
    pub fn wait(&self, done: &AtomicBool) -> bool {
        let mut guard = self.inner.ready.lock();
        loop {
            if *guard {
                return true;
            }
            if done.load(AtomicOrdering::Relaxed) {
                return false;
            }
            self.inner
                .condvar
                .wait_for(&mut guard, Duration::from_millis(20));
        }
    }

    /// Non-blocking, used by tests and by fibers deciding whether to yield
    /// rather than suspend outright.
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn wait_returns_true_once_fulfilled() {
        let (completer, dependency) = pair();
        let done = AtomicBool::new(false);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            completer.fulfill();
        });
        assert!(dependency.wait(&done));
        handle.join().unwrap();
    }

    #[test]
    fn wait_returns_false_when_cancelled_first() {
        let (_completer, dependency) = pair();
        let done = AtomicBool::new(true);
        assert!(!dependency.wait(&done));
    }
}

//! Join-once/detach-once wrapper over a spawned worker thread.

use crate::sync::Gate;
use std::panic;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A bounded join gave up before the worker finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("timed out waiting for the worker thread to finish")]
pub struct JoinTimedOut;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandleState {
    Running,
    Joined,
    Detached,
}

// Sets the completion latch when the worker returns, unwinding included.
struct CompletionLatch(Arc<Gate<bool>>);

impl Drop for CompletionLatch {
    fn drop(&mut self) {
        self.0.update(|done| *done = true);
    }
}

/// Spawn `work` on a new named OS thread.
///
/// The returned handle must be resolved: exactly one of
/// [`join`](ThreadHandle::join) or [`detach`](ThreadHandle::detach) before
/// it goes out of scope.
pub fn spawn<F>(work: F) -> ThreadHandle
where
    F: FnOnce() + Send + 'static,
{
    static NEXT_ID: AtomicU64 = AtomicU64::new(0);

    let done = Arc::new(Gate::new(false));
    let latch = CompletionLatch(done.clone());
    let name = format!("tandem-worker-{}", NEXT_ID.fetch_add(1, Ordering::Relaxed));
    let inner = thread::Builder::new()
        .name(name)
        .spawn(move || {
            let _latch = latch;
            work();
        })
        .expect("failed to spawn worker thread");

    ThreadHandle {
        inner: Some(inner),
        done,
        state: HandleState::Running,
    }
}

/// Lifecycle handle for one spawned unit of work.
///
/// State machine: running, then exactly one of joined or detached. Joining
/// or detaching twice, mixing the two, or dropping the handle while still
/// joinable are usage errors and panic.
pub struct ThreadHandle {
    inner: Option<JoinHandle<()>>,
    done: Arc<Gate<bool>>,
    state: HandleState,
}

impl ThreadHandle {
    /// True while the handle has been neither joined nor detached.
    pub fn joinable(&self) -> bool {
        self.state == HandleState::Running
    }

    /// True once the worker's work function has returned, whether or not
    /// the handle has been joined yet.
    pub fn is_finished(&self) -> bool {
        *self.done.lock()
    }

    /// Block until the worker finishes, then mark the handle joined. A
    /// panic on the worker thread resumes on the joining thread.
    ///
    /// # Panics
    ///
    /// Panics if the handle is not joinable.
    pub fn join(&mut self) {
        if !self.joinable() {
            panic!("join on a thread handle that is not joinable");
        }
        self.state = HandleState::Joined;
        if let Some(inner) = self.inner.take() {
            if let Err(payload) = inner.join() {
                panic::resume_unwind(payload);
            }
        }
    }

    /// [`join`](Self::join) with a bound: gives up after `timeout` and
    /// leaves the handle joinable so the caller can retry, detach, or
    /// escalate.
    pub fn try_join_for(&mut self, timeout: Duration) -> Result<(), JoinTimedOut> {
        if !self.joinable() {
            panic!("join on a thread handle that is not joinable");
        }
        if self.done.wait_until_for(|done| *done, timeout).is_err() {
            return Err(JoinTimedOut);
        }
        // The work function has returned; the remaining join is bounded by
        // thread teardown.
        self.join();
        Ok(())
    }

    /// Release the worker to finish on its own and mark the handle
    /// detached.
    ///
    /// # Panics
    ///
    /// Panics if the handle is not joinable.
    pub fn detach(&mut self) {
        if !self.joinable() {
            panic!("detach on a thread handle that is not joinable");
        }
        self.state = HandleState::Detached;
        drop(self.inner.take());
    }
}

impl Drop for ThreadHandle {
    fn drop(&mut self) {
        // Forgetting to resolve a handle is a usage error, but a second
        // panic while already unwinding would abort and mask the first.
        if self.joinable() && !thread::panicking() {
            panic!("thread handle dropped while still joinable; join or detach it first");
        }
    }
}

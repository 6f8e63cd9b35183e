//! Owner-tracked exclusive lock with an explicit lock/unlock surface.

use crate::sync::waiter::WaitQueue;
use crossbeam::atomic::AtomicCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

/// Exclusive lock over a critical section.
///
/// At most one thread holds the lock at any instant, and only the holder may
/// unlock it; unlocking from any other thread is a usage error and panics.
/// Contended lockers park on a FIFO queue and the unlocker hands the lock
/// directly to the queue head, so the lock is never observably free while
/// waiters exist.
///
/// The lock is not re-entrant: a thread that calls [`lock`](Self::lock)
/// while already holding it joins its own wait queue and deadlocks itself.
pub struct RawMutex {
    locked: AtomicBool,
    owner: AtomicCell<Option<ThreadId>>,
    queue: WaitQueue,
}

impl RawMutex {
    /// Create an unlocked mutex.
    pub fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
            owner: AtomicCell::new(None),
            queue: WaitQueue::new(),
        }
    }

    fn try_acquire(&self, me: ThreadId) -> bool {
        if self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            self.owner.store(Some(me));
            true
        } else {
            false
        }
    }

    /// Block until the lock is acquired.
    pub fn lock(&self) {
        let me = thread::current().id();
        if self.try_acquire(me) {
            return;
        }
        let node = match self.queue.enqueue_unless(|| self.try_acquire(me)) {
            None => return,
            Some(node) => node,
        };
        node.park();
        debug_assert_eq!(self.owner.load(), Some(me));
    }

    /// Acquire the lock without blocking. Returns false if another thread
    /// holds it.
    pub fn try_lock(&self) -> bool {
        self.try_acquire(thread::current().id())
    }

    /// Block until the lock is acquired or `timeout` elapses. Returns true
    /// if the lock was acquired.
    pub fn try_lock_for(&self, timeout: Duration) -> bool {
        let me = thread::current().id();
        if self.try_acquire(me) {
            return true;
        }
        let deadline = Instant::now() + timeout;
        let node = match self.queue.enqueue_unless(|| self.try_acquire(me)) {
            None => return true,
            Some(node) => node,
        };
        if node.park_until(deadline) {
            return true;
        }
        if self.queue.cancel(&node) {
            false
        } else {
            // The unlocker popped us concurrently with the timeout; the
            // handoff is in flight and the lock is ours.
            node.park();
            true
        }
    }

    /// Release the lock, handing it to the longest-waiting thread if any.
    ///
    /// # Panics
    ///
    /// Panics if the calling thread does not hold the lock.
    pub fn unlock(&self) {
        let me = thread::current().id();
        if self.owner.load() != Some(me) {
            panic!("RawMutex::unlock called by a thread that does not hold the lock");
        }
        self.queue.with_locked(|queue| match queue.pop_front() {
            Some(next) => {
                self.owner.store(Some(next.thread_id()));
                next.notify();
            }
            None => {
                self.owner.store(None);
                self.locked.store(false, Ordering::Release);
            }
        });
    }

    /// Whether any thread currently holds the lock.
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    /// The thread currently holding the lock, if any.
    pub fn holder(&self) -> Option<ThreadId> {
        self.owner.load()
    }

    pub(crate) fn held_by_current(&self) -> bool {
        self.owner.load() == Some(thread::current().id())
    }

    /// Number of threads parked waiting for the lock.
    pub fn waiting_count(&self) -> usize {
        self.queue.len()
    }
}

impl Default for RawMutex {
    fn default() -> Self {
        Self::new()
    }
}

//! Parked-thread wait queues shared by the locking primitives.
//!
//! A blocked thread enqueues a [`WaitNode`] and parks on it; whoever makes
//! progress possible pops the node and unparks the thread. Nodes carry a
//! notified flag so spurious unparks never count as a wakeup.

use parking_lot::Mutex as ParkingLotMutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, Thread, ThreadId};
use std::time::Instant;

/// One parked thread.
pub(crate) struct WaitNode {
    thread: Thread,
    notified: AtomicBool,
}

impl WaitNode {
    pub(crate) fn for_current() -> Arc<Self> {
        Arc::new(Self {
            thread: thread::current(),
            notified: AtomicBool::new(false),
        })
    }

    pub(crate) fn thread_id(&self) -> ThreadId {
        self.thread.id()
    }

    /// Mark the node notified and unpark its thread.
    pub(crate) fn notify(&self) {
        self.notified.store(true, Ordering::Release);
        self.thread.unpark();
    }

    fn is_notified(&self) -> bool {
        self.notified.load(Ordering::Acquire)
    }

    /// Park until notified.
    pub(crate) fn park(&self) {
        while !self.is_notified() {
            thread::park();
        }
    }

    /// Park until notified or the deadline passes. Returns true if notified.
    pub(crate) fn park_until(&self, deadline: Instant) -> bool {
        while !self.is_notified() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::park_timeout(deadline - now);
        }
        true
    }
}

/// FIFO queue of parked threads.
pub(crate) struct WaitQueue {
    queue: ParkingLotMutex<VecDeque<Arc<WaitNode>>>,
}

impl WaitQueue {
    pub(crate) fn new() -> Self {
        Self {
            queue: ParkingLotMutex::new(VecDeque::new()),
        }
    }

    /// Enqueue the current thread unless `try_fast` succeeds while the queue
    /// lock is held. Returns `None` when `try_fast` won and there is nothing
    /// to wait for. Holding the queue lock across the retry is what closes
    /// the window between a failed fast path and the enqueue.
    pub(crate) fn enqueue_unless(&self, try_fast: impl FnOnce() -> bool) -> Option<Arc<WaitNode>> {
        let mut queue = self.queue.lock();
        if try_fast() {
            return None;
        }
        let node = WaitNode::for_current();
        queue.push_back(node.clone());
        Some(node)
    }

    /// Run `f` with the queue locked.
    pub(crate) fn with_locked<R>(&self, f: impl FnOnce(&mut VecDeque<Arc<WaitNode>>) -> R) -> R {
        f(&mut self.queue.lock())
    }

    /// Pop and wake the longest-waiting thread. Returns false if the queue
    /// was empty.
    pub(crate) fn wake_one(&self) -> bool {
        let node = self.queue.lock().pop_front();
        match node {
            Some(node) => {
                node.notify();
                true
            }
            None => false,
        }
    }

    /// Wake every queued thread. Returns how many were woken.
    pub(crate) fn wake_all(&self) -> usize {
        let drained: Vec<_> = {
            let mut queue = self.queue.lock();
            queue.drain(..).collect()
        };
        for node in &drained {
            node.notify();
        }
        drained.len()
    }

    /// Remove a timed-out waiter. Returns false if the node was already
    /// popped by a wake, in which case that notification belongs to the
    /// caller and must be consumed.
    pub(crate) fn cancel(&self, node: &Arc<WaitNode>) -> bool {
        let mut queue = self.queue.lock();
        match queue.iter().position(|queued| Arc::ptr_eq(queued, node)) {
            Some(position) => {
                let _ = queue.remove(position);
                true
            }
            None => false,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.lock().len()
    }
}

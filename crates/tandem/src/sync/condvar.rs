//! Thread park/wake coordination tied to a mutex.

use crate::sync::guard::MutexGuard;
use crate::sync::raw::RawMutex;
use crate::sync::waiter::{WaitNode, WaitQueue};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Outcome of a bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitTimeoutResult {
    timed_out: bool,
}

impl WaitTimeoutResult {
    /// True if the wait ended because the timeout elapsed.
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }
}

/// Condition variable for one mutex at a time.
///
/// A waiter must hold the mutex when the wait begins; the wait atomically
/// releases it and parks, and reacquires it before returning. Holding the
/// mutex across the predicate check and the park is what rules out the
/// lost-wakeup race: any notifier has to take the same mutex to change the
/// state the predicate reads, so its notification cannot land between the
/// check and the park. Wakeups can still be spurious, which is why
/// [`wait_while`](Self::wait_while) re-checks in a loop; bare
/// [`wait`](Self::wait) callers must re-check themselves.
pub struct Condvar {
    waiters: WaitQueue,
    // Address of the mutex this condvar is currently bound to (0 = none).
    // Only read and written under the waiters queue lock.
    bound: AtomicUsize,
}

impl Condvar {
    /// Create a condition variable bound to no mutex.
    pub fn new() -> Self {
        Self {
            waiters: WaitQueue::new(),
            bound: AtomicUsize::new(0),
        }
    }

    /// Park until notified. Returns with the mutex reacquired.
    ///
    /// # Panics
    ///
    /// Panics if the calling thread does not hold the guard's mutex, or if
    /// the condvar is already in use with a different mutex.
    pub fn wait<T>(&self, guard: &mut MutexGuard<'_, T>) {
        self.wait_inner(guard.raw(), None);
    }

    /// Park until notified or `timeout` elapses. Returns with the mutex
    /// reacquired either way.
    pub fn wait_for<T>(&self, guard: &mut MutexGuard<'_, T>, timeout: Duration) -> WaitTimeoutResult {
        let deadline = Instant::now() + timeout;
        WaitTimeoutResult {
            timed_out: !self.wait_inner(guard.raw(), Some(deadline)),
        }
    }

    /// Park until `condition` stops holding. The condition is re-evaluated
    /// under the mutex after every wakeup, so spurious wakeups and lost
    /// notifications cannot cause an early return.
    pub fn wait_while<T, F>(&self, guard: &mut MutexGuard<'_, T>, mut condition: F)
    where
        F: FnMut(&mut T) -> bool,
    {
        while condition(&mut **guard) {
            self.wait(guard);
        }
    }

    /// [`wait_while`](Self::wait_while) with a bound: gives up once
    /// `timeout` elapses with the condition still holding.
    pub fn wait_while_for<T, F>(
        &self,
        guard: &mut MutexGuard<'_, T>,
        mut condition: F,
        timeout: Duration,
    ) -> WaitTimeoutResult
    where
        F: FnMut(&mut T) -> bool,
    {
        let deadline = Instant::now() + timeout;
        while condition(&mut **guard) {
            if !self.wait_inner(guard.raw(), Some(deadline)) {
                return WaitTimeoutResult {
                    timed_out: condition(&mut **guard),
                };
            }
        }
        WaitTimeoutResult { timed_out: false }
    }

    /// Wake the longest-waiting thread, if any. No ordering guarantee is
    /// made about which of several waiters observes the state change first.
    pub fn notify_one(&self) -> bool {
        self.waiters.wake_one()
    }

    /// Wake every currently parked waiter. Returns how many were woken.
    pub fn notify_all(&self) -> usize {
        self.waiters.wake_all()
    }

    /// Number of threads currently parked on this condvar.
    pub fn waiting_count(&self) -> usize {
        self.waiters.len()
    }

    // Returns true if the wait ended by notification, false on timeout.
    fn wait_inner(&self, raw: &RawMutex, deadline: Option<Instant>) -> bool {
        if !raw.held_by_current() {
            panic!("Condvar::wait requires the calling thread to hold the mutex");
        }

        let node = self.waiters.with_locked(|queue| {
            let addr = raw as *const RawMutex as usize;
            let bound = self.bound.load(Ordering::Relaxed);
            if bound != 0 && bound != addr {
                panic!("Condvar::wait used with two different mutexes");
            }
            self.bound.store(addr, Ordering::Relaxed);
            let node = WaitNode::for_current();
            queue.push_back(node.clone());
            node
        });

        // Enqueued while still holding the mutex; a notify that chases any
        // state change made after this point will find us in the queue.
        raw.unlock();

        let notified = match deadline {
            None => {
                node.park();
                true
            }
            Some(deadline) => {
                if node.park_until(deadline) {
                    true
                } else if self.waiters.cancel(&node) {
                    false
                } else {
                    // A notify popped us concurrently with the timeout;
                    // consume it.
                    node.park();
                    true
                }
            }
        };

        self.waiters.with_locked(|queue| {
            if queue.is_empty() {
                self.bound.store(0, Ordering::Relaxed);
            }
        });

        raw.lock();
        notified
    }
}

impl Default for Condvar {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::Mutex;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_notify_one_wakes_waiter() {
        let pair = Arc::new((Mutex::new(false), Condvar::new()));

        let waiter = {
            let pair = pair.clone();
            thread::spawn(move || {
                let (flag, cond) = &*pair;
                let mut ready = flag.lock();
                cond.wait_while(&mut ready, |ready| !*ready);
                assert!(*ready);
            })
        };

        let (flag, cond) = &*pair;
        while cond.waiting_count() == 0 {
            thread::yield_now();
        }
        *flag.lock() = true;
        assert!(cond.notify_one());
        waiter.join().unwrap();
    }

    #[test]
    fn test_notify_all_wakes_every_waiter() {
        let pair = Arc::new((Mutex::new(false), Condvar::new()));
        let mut waiters = Vec::new();
        for _ in 0..3 {
            let pair = pair.clone();
            waiters.push(thread::spawn(move || {
                let (flag, cond) = &*pair;
                let mut ready = flag.lock();
                cond.wait_while(&mut ready, |ready| !*ready);
            }));
        }

        let (flag, cond) = &*pair;
        while cond.waiting_count() < 3 {
            thread::yield_now();
        }
        *flag.lock() = true;
        assert_eq!(cond.notify_all(), 3);
        for waiter in waiters {
            waiter.join().unwrap();
        }
    }

    #[test]
    fn test_wait_while_returns_immediately_when_condition_false() {
        let flag = Mutex::new(true);
        let cond = Condvar::new();
        let mut ready = flag.lock();
        cond.wait_while(&mut ready, |ready| !*ready);
        assert!(*ready);
    }

    #[test]
    fn test_wait_for_times_out() {
        let flag = Mutex::new(());
        let cond = Condvar::new();
        let mut guard = flag.lock();
        let result = cond.wait_for(&mut guard, Duration::from_millis(20));
        assert!(result.timed_out());
        assert!(flag.is_locked());
    }

    #[test]
    fn test_wait_while_for_reports_satisfied_condition() {
        let flag = Mutex::new(true);
        let cond = Condvar::new();
        let mut ready = flag.lock();
        let result = cond.wait_while_for(&mut ready, |ready| !*ready, Duration::from_millis(20));
        assert!(!result.timed_out());
    }

    #[test]
    fn test_wait_while_for_times_out_with_condition_held() {
        let flag = Mutex::new(false);
        let cond = Condvar::new();
        let mut ready = flag.lock();
        let result = cond.wait_while_for(&mut ready, |ready| !*ready, Duration::from_millis(20));
        assert!(result.timed_out());
    }

    #[test]
    #[should_panic(expected = "hold the mutex")]
    fn test_wait_without_lock_panics() {
        let raw = RawMutex::new();
        let cond = Condvar::new();
        cond.wait_inner(&raw, None);
    }

    #[test]
    #[should_panic(expected = "two different mutexes")]
    fn test_wait_with_second_mutex_panics() {
        let first = Arc::new((Mutex::new(false), Condvar::new()));

        {
            let first = first.clone();
            thread::spawn(move || {
                let (flag, cond) = &*first;
                let mut ready = flag.lock();
                cond.wait_while(&mut ready, |ready| !*ready);
            });
        }

        let (_, cond) = &*first;
        while cond.waiting_count() == 0 {
            thread::yield_now();
        }

        let other = Mutex::new(());
        let mut guard = other.lock();
        cond.wait(&mut guard);
    }
}

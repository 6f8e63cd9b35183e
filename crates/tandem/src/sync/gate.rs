//! Predicate gate over guarded shared state.

use crate::sync::condvar::Condvar;
use crate::sync::guard::MutexGuard;
use crate::sync::mutex::Mutex;
use std::time::Duration;

/// A bounded wait gave up before its condition held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("timed out before the condition held")]
pub struct TimedOut;

/// Shared state plus "wait until a predicate over it holds".
///
/// Producers mutate the state through [`update`](Self::update), which
/// notifies every waiter; consumers block in
/// [`wait_until`](Self::wait_until) and re-check their predicate on every
/// wakeup. The canonical protocol: a withdrawal thread waits until the
/// balance is nonzero while a deposit thread adds funds and signals.
///
/// ```
/// use std::sync::Arc;
/// use tandem::sync::Gate;
///
/// let account = Arc::new(Gate::new(0i64));
/// let mut teller = {
///     let account = account.clone();
///     tandem::thread::spawn(move || {
///         let mut balance = account.wait_until(|balance| *balance != 0);
///         *balance -= 500;
///     })
/// };
/// account.update(|balance| *balance += 1000);
/// teller.join();
/// assert_eq!(*account.lock(), 500);
/// ```
pub struct Gate<T> {
    state: Mutex<T>,
    cond: Condvar,
}

impl<T> Gate<T> {
    /// Create a gate around `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            state: Mutex::new(initial),
            cond: Condvar::new(),
        }
    }

    /// Block until `pred` holds, then return the guard. Returns without
    /// blocking when the predicate is already true, so a producer that runs
    /// first never strands the consumer.
    pub fn wait_until<F>(&self, mut pred: F) -> MutexGuard<'_, T>
    where
        F: FnMut(&T) -> bool,
    {
        let mut guard = self.state.lock();
        self.cond.wait_while(&mut guard, |state| !pred(state));
        guard
    }

    /// [`wait_until`](Self::wait_until) with a bound on how long to wait.
    pub fn wait_until_for<F>(&self, mut pred: F, timeout: Duration) -> Result<MutexGuard<'_, T>, TimedOut>
    where
        F: FnMut(&T) -> bool,
    {
        let mut guard = self.state.lock();
        let result = self
            .cond
            .wait_while_for(&mut guard, |state| !pred(state), timeout);
        if result.timed_out() {
            Err(TimedOut)
        } else {
            Ok(guard)
        }
    }

    /// Mutate the state under the lock, then wake every waiter so each can
    /// re-check its predicate. Returns whatever `f` returns.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.state.lock();
        let result = f(&mut guard);
        drop(guard);
        self.cond.notify_all();
        result
    }

    /// Lock the state without waiting on any condition.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.state.lock()
    }

    /// Consume the gate and return the guarded state.
    pub fn into_inner(self) -> T {
        self.state.into_inner()
    }
}

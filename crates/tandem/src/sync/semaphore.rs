//! Binary semaphore built from one mutex, one condvar, and one flag.

use crate::sync::condvar::Condvar;
use crate::sync::mutex::Mutex;
use std::time::Duration;

/// Errors that can occur when using a [`BinarySemaphore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SemaphoreError {
    /// Release called while the semaphore was already available.
    #[error("release on a semaphore that is already available")]
    NotHeld,
}

/// A counting gate with count restricted to {0, 1}.
///
/// Unlike a mutex there is no ownership: any thread may
/// [`release`](Self::release) regardless of which thread
/// [`acquire`](Self::acquire)d, which is what makes it a signaling primitive
/// rather than a lock. Acquire and release sites can live in different
/// threads entirely.
pub struct BinarySemaphore {
    available: Mutex<bool>,
    cond: Condvar,
}

impl BinarySemaphore {
    /// Create a semaphore in the available state.
    pub fn new() -> Self {
        Self {
            available: Mutex::new(true),
            cond: Condvar::new(),
        }
    }

    /// Create a semaphore in the held state, to be released by some other
    /// call site first.
    pub fn new_held() -> Self {
        Self {
            available: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    /// Block until the semaphore is available, then take it. Blocks
    /// indefinitely in the absence of a matching release; use
    /// [`try_acquire_for`](Self::try_acquire_for) when liveness must be
    /// bounded.
    pub fn acquire(&self) {
        let mut available = self.available.lock();
        self.cond.wait_while(&mut available, |available| !*available);
        *available = false;
    }

    /// Take the semaphore if it is available right now.
    pub fn try_acquire(&self) -> bool {
        let mut available = self.available.lock();
        if *available {
            *available = false;
            true
        } else {
            false
        }
    }

    /// [`acquire`](Self::acquire) with a bound: returns false if `timeout`
    /// elapses first.
    pub fn try_acquire_for(&self, timeout: Duration) -> bool {
        let mut available = self.available.lock();
        let result = self
            .cond
            .wait_while_for(&mut available, |available| !*available, timeout);
        if result.timed_out() {
            false
        } else {
            *available = false;
            true
        }
    }

    /// Make the semaphore available and wake one waiter.
    ///
    /// Releasing a semaphore that is already available is rejected with
    /// [`SemaphoreError::NotHeld`] rather than treated as a no-op, so a
    /// mismatched acquire/release pairing surfaces at the offending call
    /// site.
    pub fn release(&self) -> Result<(), SemaphoreError> {
        {
            let mut available = self.available.lock();
            if *available {
                return Err(SemaphoreError::NotHeld);
            }
            *available = true;
        }
        self.cond.notify_one();
        Ok(())
    }

    /// Whether the semaphore can currently be acquired without blocking.
    pub fn is_available(&self) -> bool {
        *self.available.lock()
    }
}

impl Default for BinarySemaphore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_acquire_release_cycle() {
        let sem = BinarySemaphore::new();
        assert!(sem.is_available());

        sem.acquire();
        assert!(!sem.is_available());

        sem.release().unwrap();
        assert!(sem.is_available());
    }

    #[test]
    fn test_try_acquire_fails_while_held() {
        let sem = BinarySemaphore::new();
        assert!(sem.try_acquire());
        assert!(!sem.try_acquire());
        assert!(!sem.try_acquire_for(Duration::from_millis(20)));

        sem.release().unwrap();
        assert!(sem.try_acquire());
    }

    #[test]
    fn test_double_release_is_rejected() {
        let sem = BinarySemaphore::new_held();
        sem.release().unwrap();
        assert_eq!(sem.release(), Err(SemaphoreError::NotHeld));
    }

    #[test]
    fn test_release_on_fresh_semaphore_is_rejected() {
        let sem = BinarySemaphore::new();
        assert_eq!(sem.release(), Err(SemaphoreError::NotHeld));
    }

    #[test]
    fn test_release_from_another_thread() {
        let sem = Arc::new(BinarySemaphore::new_held());

        let releaser = {
            let sem = sem.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                sem.release().unwrap();
            })
        };

        // Blocks until the other thread releases; no ownership involved.
        sem.acquire();
        releaser.join().unwrap();
        assert!(!sem.is_available());
    }

    #[test]
    fn test_timed_acquire_succeeds_once_released() {
        let sem = Arc::new(BinarySemaphore::new_held());

        let acquirer = {
            let sem = sem.clone();
            thread::spawn(move || sem.try_acquire_for(Duration::from_secs(5)))
        };

        thread::sleep(Duration::from_millis(20));
        sem.release().unwrap();
        assert!(acquirer.join().unwrap());
    }
}

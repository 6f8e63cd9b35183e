//! RAII guard for automatic mutex unlock.

use crate::sync::mutex::Mutex;
use crate::sync::raw::RawMutex;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

/// Proof that the current thread holds a [`Mutex`], with access to the
/// guarded value. The lock is released when the guard drops, panics
/// included, so a critical section can never be left locked by accident.
pub struct MutexGuard<'a, T> {
    lock: &'a Mutex<T>,
    // Unlock must happen on the locking thread, so the guard stays there.
    _not_send: PhantomData<*mut ()>,
}

impl<'a, T> MutexGuard<'a, T> {
    /// # Safety
    ///
    /// The calling thread must hold `lock`'s raw mutex.
    pub(crate) unsafe fn new(lock: &'a Mutex<T>) -> Self {
        Self {
            lock,
            _not_send: PhantomData,
        }
    }

    pub(crate) fn raw(&self) -> &RawMutex {
        self.lock.raw()
    }

    /// Release the lock early, before the end of scope.
    pub fn unlock(self) {
        drop(self);
    }
}

impl<T> Deref for MutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.lock.data_ptr() }
    }
}

impl<T> DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data_ptr() }
    }
}

impl<T> Drop for MutexGuard<'_, T> {
    fn drop(&mut self) {
        // The guard is proof of ownership, so this cannot be a
        // non-holder unlock.
        self.lock.raw().unlock();
    }
}

impl<T: fmt::Debug> fmt::Debug for MutexGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

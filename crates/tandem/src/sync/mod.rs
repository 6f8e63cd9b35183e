//! Synchronization primitives for coordinating OS threads.
//!
//! Everything here blocks by parking on a wait queue and is woken by an
//! explicit unpark; nothing spins or polls. Shared state is only ever
//! touched while the mutex guarding it is held, and every blocking
//! operation has a bounded-wait variant.

mod condvar;
mod gate;
mod guard;
mod mutex;
mod raw;
mod semaphore;
mod waiter;

pub mod oneshot;

pub use condvar::{Condvar, WaitTimeoutResult};
pub use gate::{Gate, TimedOut};
pub use guard::MutexGuard;
pub use mutex::Mutex;
pub use raw::RawMutex;
pub use semaphore::{BinarySemaphore, SemaphoreError};

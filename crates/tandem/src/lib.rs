//! Tandem: a thread synchronization toolkit.
//!
//! This crate provides the coordination primitives multithreaded code is
//! built from:
//! - Owner-tracked mutual exclusion ([`RawMutex`], [`Mutex`])
//! - Condition-variable signaling with mandatory predicate re-checks
//!   ([`Condvar`])
//! - A predicate gate over guarded shared state ([`Gate`])
//! - A binary semaphore with no unlock-ownership restriction
//!   ([`BinarySemaphore`])
//! - A one-shot future/promise handoff ([`sync::oneshot`])
//! - Join-once/detach-once thread lifecycle handles ([`thread::spawn`])
//!
//! Usage errors (unlocking a mutex you don't hold, joining twice, dropping
//! a joinable handle) panic at the offending call site; recoverable
//! conditions (timeouts, an abandoned channel) come back as values.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod sync;
pub mod thread;

pub use sync::{BinarySemaphore, Condvar, Gate, Mutex, MutexGuard, RawMutex};
pub use thread::{spawn, ThreadHandle};

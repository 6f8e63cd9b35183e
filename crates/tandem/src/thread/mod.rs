//! Thread lifecycle management.
//!
//! A unit of work is an opaque `FnOnce() + Send + 'static`; [`spawn`] hands
//! it to the OS and returns a [`ThreadHandle`] that must be explicitly
//! joined or detached.

mod handle;

pub use handle::{spawn, JoinTimedOut, ThreadHandle};

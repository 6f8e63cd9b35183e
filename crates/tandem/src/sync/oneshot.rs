//! Single-value handoff between a producer and its consumers.
//!
//! [`channel`] produces a [`Sender`] (promise side) and a [`Receiver`]
//! (future side) sharing one guarded slot. The slot is filled exactly once;
//! every retrieval after that observes the same value. A sender dropped
//! without sending marks the channel abandoned so receivers fail instead of
//! blocking forever.

use crate::sync::condvar::Condvar;
use crate::sync::mutex::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Errors surfaced on the receiving side of a one-shot channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RecvError {
    /// The sender was dropped before sending a value.
    #[error("one-shot sender dropped without sending a value")]
    Abandoned,

    /// A bounded retrieval gave up before a value arrived.
    #[error("timed out waiting for the one-shot value")]
    TimedOut,
}

enum Slot<T> {
    Empty,
    Filled(T),
    Abandoned,
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
    cond: Condvar,
}

/// Create a connected one-shot sender/receiver pair.
pub fn channel<T>() -> (Sender<T>, Receiver<T>) {
    let shared = Arc::new(Shared {
        slot: Mutex::new(Slot::Empty),
        cond: Condvar::new(),
    });
    (
        Sender {
            shared: shared.clone(),
            sent: false,
        },
        Receiver { shared },
    )
}

/// The producing half. Move-only: sending consumes it, so the slot can only
/// ever be filled once.
pub struct Sender<T> {
    shared: Arc<Shared<T>>,
    sent: bool,
}

impl<T> Sender<T> {
    /// Store the value and wake every waiting receiver.
    pub fn send(mut self, value: T) {
        {
            let mut slot = self.shared.slot.lock();
            match *slot {
                Slot::Empty => *slot = Slot::Filled(value),
                // send consumes the only sender, so a non-empty slot here
                // means the shared state was corrupted.
                _ => panic!("one-shot value already set"),
            }
        }
        self.sent = true;
        self.shared.cond.notify_all();
    }
}

impl<T> Drop for Sender<T> {
    fn drop(&mut self) {
        if self.sent {
            return;
        }
        {
            let mut slot = self.shared.slot.lock();
            if matches!(*slot, Slot::Empty) {
                *slot = Slot::Abandoned;
            }
        }
        self.shared.cond.notify_all();
    }
}

/// The consuming half. Cloneable so several observers can wait on the same
/// value; every successful retrieval yields a clone of the one value.
pub struct Receiver<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Receiver<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: Clone> Receiver<T> {
    /// Block until the value arrives. Idempotent: later calls return the
    /// same value again. Fails with [`RecvError::Abandoned`] if the sender
    /// was dropped unsent.
    pub fn get(&self) -> Result<T, RecvError> {
        let mut slot = self.shared.slot.lock();
        self.shared
            .cond
            .wait_while(&mut slot, |slot| matches!(*slot, Slot::Empty));
        match &*slot {
            Slot::Filled(value) => Ok(value.clone()),
            Slot::Abandoned => Err(RecvError::Abandoned),
            Slot::Empty => unreachable!("woken from a one-shot wait with an empty slot"),
        }
    }

    /// [`get`](Self::get) with a bound: fails with [`RecvError::TimedOut`]
    /// if `timeout` elapses while the slot is still empty.
    pub fn get_for(&self, timeout: Duration) -> Result<T, RecvError> {
        let mut slot = self.shared.slot.lock();
        let result = self
            .shared
            .cond
            .wait_while_for(&mut slot, |slot| matches!(*slot, Slot::Empty), timeout);
        if result.timed_out() {
            return Err(RecvError::TimedOut);
        }
        match &*slot {
            Slot::Filled(value) => Ok(value.clone()),
            Slot::Abandoned => Err(RecvError::Abandoned),
            Slot::Empty => unreachable!("woken from a one-shot wait with an empty slot"),
        }
    }

    /// Probe the slot without blocking. `Ok(None)` means no value yet.
    pub fn try_get(&self) -> Result<Option<T>, RecvError> {
        match &*self.shared.slot.lock() {
            Slot::Empty => Ok(None),
            Slot::Filled(value) => Ok(Some(value.clone())),
            Slot::Abandoned => Err(RecvError::Abandoned),
        }
    }
}

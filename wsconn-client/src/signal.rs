//! One-shot open signal
//!
//! Resolved by whichever of the `open` and `close` handlers fires first. The
//! sender sits in a shared slot; the first resolver takes it, every later
//! resolve finds the slot empty and does nothing.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use wsconn_core::CloseEvent;

/// How connection establishment ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    Opened,
    Closed(CloseEvent),
}

/// Why waiting for the signal stopped without an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitError {
    /// The timeout elapsed first
    TimedOut,
    /// Every resolver went away without resolving
    Abandoned,
}

#[derive(Clone)]
pub(crate) struct Resolver {
    slot: Arc<Mutex<Option<oneshot::Sender<Outcome>>>>,
}

impl Resolver {
    /// Resolve the signal. Returns false if it had already been resolved.
    pub(crate) fn resolve(&self, outcome: Outcome) -> bool {
        let sender = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match sender {
            Some(sender) => sender.send(outcome).is_ok(),
            None => false,
        }
    }
}

pub(crate) struct Waiter {
    receiver: oneshot::Receiver<Outcome>,
}

impl Waiter {
    /// Block until resolved, or until `timeout` elapses
    pub(crate) fn wait(self, timeout: Option<Duration>) -> Result<Outcome, WaitError> {
        match timeout {
            None => self.receiver.recv().map_err(|_| WaitError::Abandoned),
            Some(timeout) => self.receiver.recv_timeout(timeout).map_err(|e| match e {
                oneshot::RecvTimeoutError::Timeout => WaitError::TimedOut,
                oneshot::RecvTimeoutError::Disconnected => WaitError::Abandoned,
            }),
        }
    }
}

pub(crate) fn open_signal() -> (Resolver, Waiter) {
    let (sender, receiver) = oneshot::channel();
    (
        Resolver {
            slot: Arc::new(Mutex::new(Some(sender))),
        },
        Waiter { receiver },
    )
}

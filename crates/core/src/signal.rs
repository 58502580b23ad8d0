//! Wait primitives shared by the driver and the peripherals.
//!
//! An [`Event`] is a level-triggered "something is pending" cell: setting it
//! twice before anyone waits still leaves a single pending signal, and a
//! successful wait consumes it. Every wait can be cut short by a
//! [`CancelToken`] and, optionally, by a timeout.

use crate::{HarnessError, HarnessResult};
use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Event {
    name: &'static str,
    tx: Sender<()>,
    rx: Receiver<()>,
}

impl Event {
    pub fn new(name: &'static str) -> Self {
        let (tx, rx) = bounded(1);
        Self { name, tx, rx }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Marks the event pending. Safe to call from any thread.
    pub fn set(&self) {
        // Full means already pending.
        let _ = self.tx.try_send(());
    }

    /// Drops a pending signal, if any.
    pub fn clear(&self) {
        while self.rx.try_recv().is_ok() {}
    }

    pub fn is_set(&self) -> bool {
        !self.rx.is_empty()
    }

    /// Blocks until the event is set, consuming the signal.
    pub fn wait(&self, cancel: &CancelToken, timeout: Option<Duration>) -> HarnessResult<()> {
        if cancel.is_cancelled() {
            return Err(HarnessError::WaitCancelled(self.name));
        }
        match timeout {
            Some(limit) => select! {
                recv(self.rx) -> _ => Ok(()),
                recv(cancel.rx) -> _ => Err(HarnessError::WaitCancelled(self.name)),
                default(limit) => Err(HarnessError::WaitTimedOut(self.name, limit)),
            },
            None => select! {
                recv(self.rx) -> _ => Ok(()),
                recv(cancel.rx) -> _ => Err(HarnessError::WaitCancelled(self.name)),
            },
        }
    }
}

/// Cancels every wait that was handed a clone of this token.
///
/// Cancellation is a disconnect: the sender is dropped and all receivers
/// become ready at once, now and for every later wait.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<Mutex<Option<Sender<()>>>>,
    rx: Receiver<()>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            tx: Arc::new(Mutex::new(Some(tx))),
            rx,
        }
    }

    pub fn cancel(&self) {
        let mut guard = match self.tx.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        if guard.take().is_some() {
            tracing::debug!("Cancellation requested");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        match self.tx.lock() {
            Ok(g) => g.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }
}

//! Sample-ready gate: a binary "who owns the engine" token.
//!
//! Not a counting semaphore.  Releasing an already available gate is a
//! no-op, so at most one holder can ever exist.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use super::{Timeout, wait_within};
use crate::error::{Error, Result};

/// Exclusivity token for one in-flight sampling request.
pub struct SampleGate {
    token: Signal<CriticalSectionRawMutex, ()>,
}

impl SampleGate {
    /// A gate that starts out taken.
    pub const fn new() -> Self {
        Self {
            token: Signal::new(),
        }
    }

    /// Take the token, waiting up to `timeout`.
    pub fn acquire(&self, timeout: Timeout) -> Result<()> {
        if self.try_acquire() {
            return Ok(());
        }
        wait_within(self.token.wait(), timeout).ok_or(Error::Timeout)
    }

    /// Take the token only if it is available right now.
    pub fn try_acquire(&self) -> bool {
        self.token.try_take().is_some()
    }

    /// Hand the token back, waking one waiter.
    pub fn release(&self) {
        self.token.signal(());
    }

    /// Discard the token whether or not anyone holds it.
    ///
    /// A parked waiter keeps its registration and simply sees no token.
    pub fn force_unavailable(&self) {
        let _ = self.token.try_take();
    }

    pub fn is_available(&self) -> bool {
        self.token.signaled()
    }
}

impl Default for SampleGate {
    fn default() -> Self {
        Self::new()
    }
}

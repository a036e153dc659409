//! Latest-value mailbox between interrupt context and a waiting caller.
//!
//! Capacity is exactly one.  `push` never blocks and replaces whatever was
//! not yet read; `pop` empties the slot.  Losing a stale value is part of
//! the contract: only the newest window matters for white-balance
//! convergence.

use core::sync::atomic::{AtomicUsize, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use super::{Timeout, wait_within};
use crate::error::{Error, Result};

/// Single-slot, overwrite-on-push channel.
pub struct LatestMailbox<T> {
    slot: Signal<CriticalSectionRawMutex, T>,
    /// Callers currently parked in [`pop`](Self::pop).
    waiters: AtomicUsize,
}

impl<T: Send> LatestMailbox<T> {
    pub const fn new() -> Self {
        Self {
            slot: Signal::new(),
            waiters: AtomicUsize::new(0),
        }
    }

    /// Store `value`, overwriting any unread one.  ISR-safe.
    ///
    /// Returns `true` if a caller was parked waiting for it, i.e. a task
    /// became runnable.
    pub fn push(&self, value: T) -> bool {
        self.slot.signal(value);
        self.waiters.load(Ordering::Acquire) > 0
    }

    /// Take the stored value, waiting up to `timeout` for one to arrive.
    pub fn pop(&self, timeout: Timeout) -> Result<T> {
        if let Some(v) = self.try_pop() {
            return Ok(v);
        }
        self.waiters.fetch_add(1, Ordering::AcqRel);
        let got = wait_within(self.slot.wait(), timeout);
        self.waiters.fetch_sub(1, Ordering::AcqRel);
        got.ok_or(Error::Timeout)
    }

    pub fn try_pop(&self) -> Option<T> {
        self.slot.try_take()
    }

    /// Drop any unread value.
    pub fn clear(&self) {
        let _ = self.slot.try_take();
    }

    pub fn is_empty(&self) -> bool {
        !self.slot.signaled()
    }

    pub fn has_waiter(&self) -> bool {
        self.waiters.load(Ordering::Acquire) > 0
    }
}

impl<T: Send> Default for LatestMailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

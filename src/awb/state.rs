//! Controller lifecycle states.
//!
//! ```text
//!   create ──▶ Init ──enable──▶ Enabled ──oneshot / start──▶ Started
//!               ▲                │  ▲                          │
//!               └────disable─────┘  └───done / stop────────────┘
//!   delete ◀── Init
//! ```
//!
//! The state is shared with the interrupt bottom half, so it lives in an
//! atomic and every transition is a compare-and-swap: of two racing
//! callers exactly one observes success.

use core::sync::atomic::{AtomicU8, Ordering};

use crate::error::{Error, Result};

/// Enumeration of all controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AwbState {
    /// Configured but inert.
    Init = 0,
    /// Interrupt armed, gate available, engine idle.
    Enabled = 1,
    /// Engine sampling: one-shot waiter or continuous session.
    Started = 2,
}

impl AwbState {
    /// Convert a `u8` index back to `AwbState`.  Out-of-range values are a
    /// bug; release builds fall back to `Init`.
    pub fn from_index(idx: u8) -> Self {
        match idx {
            0 => Self::Init,
            1 => Self::Enabled,
            2 => Self::Started,
            _ => {
                debug_assert!(false, "invalid awb state index: {idx}");
                Self::Init
            }
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Enabled => "enable",
            Self::Started => "start",
        }
    }
}

/// Atomic holder for [`AwbState`].
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) const fn new(state: AwbState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub(crate) fn get(&self) -> AwbState {
        AwbState::from_index(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, state: AwbState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Move `from → to`, or return the state actually found.
    pub(crate) fn transition(
        &self,
        from: AwbState,
        to: AwbState,
    ) -> core::result::Result<(), AwbState> {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(AwbState::from_index)
    }

    /// Fail with `InvalidState(reason)` unless the state is `expected`.
    pub(crate) fn expect(&self, expected: AwbState, reason: &'static str) -> Result<()> {
        if self.get() == expected {
            Ok(())
        } else {
            Err(Error::InvalidState(reason))
        }
    }
}

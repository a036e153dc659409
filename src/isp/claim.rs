//! Single-slot ownership record for a processor sub-engine.
//!
//! The slot stores a [`Weak`] handle so the processor never keeps a
//! controller alive.  Every access happens inside a short critical section,
//! which makes [`ClaimSlot::current`] safe to call from interrupt context.

use core::cell::RefCell;

use std::sync::{Arc, Weak};

use critical_section::Mutex;

use crate::error::{Error, Result};

/// At most one owner at a time.
pub struct ClaimSlot<T> {
    owner: Mutex<RefCell<Option<Weak<T>>>>,
}

impl<T> ClaimSlot<T> {
    pub const fn new() -> Self {
        Self {
            owner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Record `candidate` as owner if the slot is free.
    ///
    /// A slot whose previous owner has been dropped counts as free.
    pub fn claim(&self, candidate: &Arc<T>) -> Result<()> {
        critical_section::with(|cs| {
            let mut owner = self.owner.borrow_ref_mut(cs);
            if owner.as_ref().is_some_and(|w| w.strong_count() > 0) {
                return Err(Error::NotFound("no available controller"));
            }
            *owner = Some(Arc::downgrade(candidate));
            Ok(())
        })
    }

    /// Clear the slot if `candidate` owns it.  Returns whether it did.
    pub fn declaim(&self, candidate: &Arc<T>) -> bool {
        critical_section::with(|cs| {
            let mut owner = self.owner.borrow_ref_mut(cs);
            if owner.as_ref().is_some_and(|w| same_owner(w, candidate)) {
                *owner = None;
                true
            } else {
                false
            }
        })
    }

    /// The live owner, if any.
    pub fn current(&self) -> Option<Arc<T>> {
        critical_section::with(|cs| self.owner.borrow_ref(cs).as_ref().and_then(Weak::upgrade))
    }

    pub fn is_claimed_by(&self, candidate: &Arc<T>) -> bool {
        critical_section::with(|cs| {
            self.owner
                .borrow_ref(cs)
                .as_ref()
                .is_some_and(|w| same_owner(w, candidate))
        })
    }

    pub fn is_claimed(&self) -> bool {
        critical_section::with(|cs| {
            self.owner
                .borrow_ref(cs)
                .as_ref()
                .is_some_and(|w| w.strong_count() > 0)
        })
    }
}

impl<T> Default for ClaimSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn same_owner<T>(w: &Weak<T>, candidate: &Arc<T>) -> bool {
    core::ptr::eq(w.as_ptr(), Arc::as_ptr(candidate))
}

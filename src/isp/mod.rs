//! ISP processor: the owner of the AWB engine registers and its claim slot.
//!
//! Only the pieces the AWB controller depends on live here.  The processor
//! serialises register access through [`IspProcessor::with_hal`] and routes
//! the AWB interrupt to whichever controller currently holds the slot.

pub mod claim;

use core::cell::RefCell;

use critical_section::Mutex;

use crate::awb::ControllerCore;
use crate::hal::{AWB_EVENT_FDONE, AWB_EVENT_MASK, AwbHal};
use claim::ClaimSlot;

/// One ISP instance.
pub struct IspProcessor<H: AwbHal> {
    proc_id: u8,
    hal: Mutex<RefCell<H>>,
    awb: ClaimSlot<ControllerCore<H>>,
}

impl<H: AwbHal> IspProcessor<H> {
    pub fn new(proc_id: u8, hal: H) -> Self {
        Self {
            proc_id,
            hal: Mutex::new(RefCell::new(hal)),
            awb: ClaimSlot::new(),
        }
    }

    pub fn id(&self) -> u8 {
        self.proc_id
    }

    /// Run `f` with exclusive register access inside a critical section.
    ///
    /// `f` must not block.
    pub fn with_hal<R>(&self, f: impl FnOnce(&mut H) -> R) -> R {
        critical_section::with(|cs| f(&mut *self.hal.borrow_ref_mut(cs)))
    }

    /// Whether an AWB controller is attached.
    pub fn awb_claimed(&self) -> bool {
        self.awb.is_claimed()
    }

    pub(crate) fn awb_slot(&self) -> &ClaimSlot<ControllerCore<H>> {
        &self.awb
    }

    /// Interrupt entry for the AWB sources.
    ///
    /// Always acknowledges the pending events.  Returns `true` when the
    /// bottom half made a higher-priority task runnable and the vector
    /// should yield on exit.
    pub fn dispatch_interrupt(&self) -> bool {
        let events = self.with_hal(|hal| hal.check_clear_intr_event(AWB_EVENT_MASK));
        if events & AWB_EVENT_FDONE == 0 {
            return false;
        }
        self.awb
            .current()
            .is_some_and(|ctlr| ctlr.on_statistics_done())
    }
}

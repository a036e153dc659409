//! Completion callback registration.

use core::any::Any;
use core::cell::RefCell;

use std::sync::Arc;

use critical_section::Mutex;

use super::AwbEventData;
use crate::error::{Error, Result};
use crate::hal::AwbHal;

/// Opaque context handed back to the callback.
pub type UserData = Arc<dyn Any + Send + Sync>;

/// Runs in interrupt context once per finished window.  Must not block.
/// Return `true` if it woke a higher-priority task.
pub type StatisticsDoneFn = fn(&AwbEventData, Option<&UserData>) -> bool;

/// Event callbacks of one controller.
#[derive(Debug, Clone, Copy, Default)]
pub struct AwbCallbacks {
    pub on_statistics_done: Option<StatisticsDoneFn>,
}

#[derive(Clone, Default)]
struct Registered {
    callbacks: AwbCallbacks,
    user_data: Option<UserData>,
}

/// Storage shared between registration and the bottom half.
pub(crate) struct CallbackSlot {
    inner: Mutex<RefCell<Registered>>,
}

impl CallbackSlot {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Registered::default())),
        }
    }

    pub(crate) fn store(&self, callbacks: AwbCallbacks, user_data: Option<UserData>) {
        critical_section::with(|cs| {
            *self.inner.borrow_ref_mut(cs) = Registered {
                callbacks,
                user_data,
            };
        });
    }

    /// Copy out the completion callback and its context.
    pub(crate) fn statistics_done(&self) -> Option<(StatisticsDoneFn, Option<UserData>)> {
        critical_section::with(|cs| {
            let reg = self.inner.borrow_ref(cs);
            reg.callbacks
                .on_statistics_done
                .map(|f| (f, reg.user_data.clone()))
        })
    }
}

/// Reject callbacks that could fault when run from interrupt context.
///
/// A no-op unless the HAL reports that ISR residency is required.
pub(crate) fn check_residency<H: AwbHal>(
    hal: &H,
    callbacks: &AwbCallbacks,
    user_data: Option<&UserData>,
) -> Result<()> {
    if !hal.isr_residency_required() {
        return Ok(());
    }
    if let Some(f) = callbacks.on_statistics_done {
        if !hal.in_isr_safe_code(f as usize) {
            return Err(Error::InvalidArgument(
                "on_statistics_done callback not in IRAM",
            ));
        }
    }
    if let Some(data) = user_data {
        if !hal.in_internal_ram(Arc::as_ptr(data).cast::<()>().addr()) {
            return Err(Error::InvalidArgument("user context not in internal RAM"));
        }
    }
    Ok(())
}

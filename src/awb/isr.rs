//! Interrupt bottom half for a finished AWB window.
//!
//! Runs with the vector's priority and must never block or log.  Anomalies
//! degrade silently: a missing callback is skipped, a result nobody waits
//! for simply sits in the mailbox until overwritten.

use core::sync::atomic::Ordering;

use super::state::AwbState;
use super::{AwbEventData, AwbStatResult, ControllerCore};
use crate::hal::AwbHal;

impl<H: AwbHal> ControllerCore<H> {
    /// Latch the accumulators, notify the callback and any waiter, and
    /// re-arm the engine when a continuous session is running.
    ///
    /// Returns `true` if a context yield is warranted.
    pub(crate) fn on_statistics_done(&self) -> bool {
        let awb_result = self.proc.with_hal(|hal| AwbStatResult {
            white_patch_num: hal.awb_white_patch_count(),
            sum_r: hal.awb_accumulated_r(),
            sum_g: hal.awb_accumulated_g(),
            sum_b: hal.awb_accumulated_b(),
        });
        let edata = AwbEventData { awb_result };

        let mut need_yield = false;
        if let Some((on_done, user_data)) = self.callbacks.statistics_done() {
            need_yield |= on_done(&edata, user_data.as_ref());
        }

        // Overwrites an unread result from an earlier window.
        need_yield |= self.relay.push(awb_result);

        // Checked under the register lock so a concurrent stop cannot leave
        // the engine running after it returns.
        self.proc.with_hal(|hal| {
            if self.state.get() == AwbState::Started && self.continuous.load(Ordering::Acquire) {
                hal.awb_enable(true);
            }
        });

        need_yield
    }
}

//! AWB statistics controller.
//!
//! ```text
//!                   ┌──────────────── AwbController ────────────────┐
//!  get_oneshot ───▶ │ SampleGate ──▶ trigger ──▶ LatestMailbox::pop │
//!  start/stop  ───▶ │ SampleGate (held for the session)             │
//!                   └──────────────────────────────▲────────────────┘
//!  AWB vector ──▶ IspProcessor::dispatch_interrupt ─┘ push / re-arm
//! ```
//!
//! The controller owns no registers.  It claims the processor's AWB slot
//! on creation and reaches the hardware through
//! [`IspProcessor::with_hal`].  Two blocking points exist: acquiring the
//! gate and popping the mailbox.  Every other step is a short critical
//! section.

pub mod callbacks;
mod isr;
pub mod state;

use core::sync::atomic::{AtomicBool, Ordering};

use std::sync::Arc;

use log::{debug, info, warn};

use crate::config::AwbConfig;
use crate::error::{Error, HalError, Result};
use crate::hal::{AWB_EVENT_MASK, AwbHal};
use crate::isp::IspProcessor;
use crate::sync::Timeout;
use crate::sync::gate::SampleGate;
use crate::sync::mailbox::LatestMailbox;
use callbacks::{AwbCallbacks, CallbackSlot, UserData, check_residency};
use state::{AwbState, StateCell};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Accumulated values of one sampling window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AwbStatResult {
    /// Pixels that matched the white-patch criteria.
    pub white_patch_num: u32,
    pub sum_r: u32,
    pub sum_g: u32,
    pub sum_b: u32,
}

/// Payload handed to [`AwbCallbacks::on_statistics_done`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AwbEventData {
    pub awb_result: AwbStatResult,
}

// ---------------------------------------------------------------------------
// Shared core
// ---------------------------------------------------------------------------

/// State shared between the public handle and the interrupt bottom half.
pub(crate) struct ControllerCore<H: AwbHal> {
    proc: Arc<IspProcessor<H>>,
    state: StateCell,
    /// Set for the lifetime of a continuous session only.
    continuous: AtomicBool,
    gate: SampleGate,
    relay: LatestMailbox<AwbStatResult>,
    callbacks: CallbackSlot,
}

// ---------------------------------------------------------------------------
// Public handle
// ---------------------------------------------------------------------------

/// Handle to the AWB controller attached to one [`IspProcessor`].
///
/// Dropping a handle that was never [`delete`](Self::delete)d tears the
/// hardware down and frees the processor slot.
pub struct AwbController<H: AwbHal> {
    core: Arc<ControllerCore<H>>,
}

impl<H: AwbHal> AwbController<H> {
    /// Claim the processor's AWB engine and configure it.
    ///
    /// Resources are taken in the order slot → interrupt → registers; any
    /// failure releases what was taken in reverse order.
    pub fn new(proc: &Arc<IspProcessor<H>>, config: &AwbConfig) -> Result<Self> {
        let core = Arc::new(ControllerCore {
            proc: Arc::clone(proc),
            state: StateCell::new(AwbState::Init),
            continuous: AtomicBool::new(false),
            gate: SampleGate::new(),
            relay: LatestMailbox::new(),
            callbacks: CallbackSlot::new(),
        });

        if let Err(e) = proc.awb_slot().claim(&core) {
            warn!("awb: isp{} has no available controller", proc.id());
            return Err(e);
        }

        if let Err(e) = proc.with_hal(|hal| hal.alloc_awb_intr(config.intr_priority())) {
            warn!("awb: isp{} interrupt allocation failed: {}", proc.id(), e);
            proc.awb_slot().declaim(&core);
            return Err(e.into());
        }

        if let Err(e) = configure(proc, config) {
            warn!("awb: isp{} configuration rejected: {}", proc.id(), e);
            proc.with_hal(|hal| hal.free_awb_intr());
            proc.awb_slot().declaim(&core);
            return Err(e);
        }

        info!(
            "awb: controller created on isp{} (sample_point={:?}, priority={:?})",
            proc.id(),
            config.sample_point,
            config.intr_priority()
        );
        Ok(Self { core })
    }

    /// Release the processor slot and the interrupt.  Only legal in `Init`.
    pub fn delete(&self) -> Result<()> {
        self.ensure_in_use()?;
        self.core
            .state
            .expect(AwbState::Init, "controller isn't in init state")?;

        let proc = &self.core.proc;
        proc.awb_slot().declaim(&self.core);
        proc.with_hal(|hal| {
            hal.awb_enable_algorithm_mode(false);
            hal.free_awb_intr();
        });
        info!("awb: controller on isp{} deleted", proc.id());
        Ok(())
    }

    /// `Init → Enabled`: arm the interrupt and make the gate available.
    pub fn enable(&self) -> Result<()> {
        self.ensure_in_use()?;
        let core = &self.core;
        // Transition, register writes and gate change form one critical
        // section so a racing disable sees either none or all of them.
        core.proc.with_hal(|hal| -> Result<()> {
            core.state
                .transition(AwbState::Init, AwbState::Enabled)
                .map_err(|_| Error::InvalidState("controller isn't in init state"))?;
            hal.awb_intr_enable(true);
            hal.awb_clk_enable(true);
            hal.enable_intr(AWB_EVENT_MASK, true);
            core.gate.release();
            Ok(())
        })?;
        debug!("awb: enabled");
        Ok(())
    }

    /// `Enabled → Init`: disarm the interrupt and discard the gate token.
    ///
    /// A running continuous session must be stopped first.
    pub fn disable(&self) -> Result<()> {
        self.ensure_in_use()?;
        let core = &self.core;
        core.proc.with_hal(|hal| -> Result<()> {
            core.state
                .transition(AwbState::Enabled, AwbState::Init)
                .map_err(|_| Error::InvalidState("controller isn't in enable state"))?;
            hal.enable_intr(AWB_EVENT_MASK, false);
            hal.awb_clk_enable(false);
            hal.awb_intr_enable(false);
            core.gate.force_unavailable();
            Ok(())
        })?;
        debug!("awb: disabled");
        Ok(())
    }

    /// Sample one window and wait for its result.
    ///
    /// `timeout` bounds the gate wait and the result wait separately.  On a
    /// result timeout the engine is stopped and the controller returns to
    /// `Enabled` before [`Error::Timeout`] is reported.
    pub fn get_oneshot_statistics(&self, timeout: Timeout) -> Result<AwbStatResult> {
        self.ensure_in_use()?;
        let core = &self.core;
        core.state
            .expect(AwbState::Enabled, "controller isn't in enable state")?;

        core.gate.acquire(timeout)?;
        if core
            .state
            .transition(AwbState::Enabled, AwbState::Started)
            .is_err()
        {
            // Disabled while we waited; disable already discarded the token.
            return Err(Error::InvalidState("controller isn't in enable state"));
        }

        // A result left over from an earlier window must not satisfy this request.
        core.relay.clear();
        core.proc.with_hal(|hal| hal.awb_enable(true));

        let res = core.relay.pop(timeout);

        core.proc.with_hal(|hal| hal.awb_enable(false));
        core.state.set(AwbState::Enabled);
        core.gate.release();

        if res.is_err() {
            warn!("awb: oneshot statistics timed out ({:?})", timeout);
        }
        res
    }

    /// Begin re-triggered sampling.  Results flow to the callback and the
    /// mailbox until [`stop_continuous_statistics`](Self::stop_continuous_statistics).
    pub fn start_continuous_statistics(&self) -> Result<()> {
        self.ensure_in_use()?;
        let core = &self.core;
        core.state
            .expect(AwbState::Enabled, "controller isn't in enable state")?;

        if !core.gate.try_acquire() {
            warn!("awb: statistics gate not acquired, controller is busy");
            return Err(Error::InvalidState("controller is busy"));
        }
        if core
            .state
            .transition(AwbState::Enabled, AwbState::Started)
            .is_err()
        {
            return Err(Error::InvalidState("controller isn't in enable state"));
        }

        core.continuous.store(true, Ordering::Release);
        core.proc.with_hal(|hal| hal.awb_enable(true));
        info!("awb: continuous statistics started");
        Ok(())
    }

    /// End a continuous session and release the gate.
    pub fn stop_continuous_statistics(&self) -> Result<()> {
        self.ensure_in_use()?;
        let core = &self.core;
        core.state
            .expect(AwbState::Started, "controller isn't in continuous state")?;
        if core
            .continuous
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::InvalidState("controller isn't in continuous state"));
        }

        core.proc.with_hal(|hal| hal.awb_enable(false));
        core.state.set(AwbState::Enabled);
        core.gate.release();
        info!("awb: continuous statistics stopped");
        Ok(())
    }

    /// Install the completion callback.  Only legal in `Init`; a rejected
    /// registration leaves the previous callbacks in place.
    pub fn register_event_callbacks(
        &self,
        callbacks: AwbCallbacks,
        user_data: Option<UserData>,
    ) -> Result<()> {
        self.ensure_in_use()?;
        let core = &self.core;
        core.state
            .expect(AwbState::Init, "controller isn't in the init state")?;
        core.proc
            .with_hal(|hal| check_residency(hal, &callbacks, user_data.as_ref()))?;

        core.callbacks.store(callbacks, user_data);
        debug!(
            "awb: callbacks registered (on_statistics_done={})",
            callbacks.on_statistics_done.is_some()
        );
        Ok(())
    }

    pub fn state(&self) -> AwbState {
        self.core.state.get()
    }

    /// Whether a sampling request or session currently holds the gate.
    /// Also `true` while the controller is not enabled.
    pub fn is_busy(&self) -> bool {
        !self.core.gate.is_available()
    }

    pub fn processor(&self) -> &Arc<IspProcessor<H>> {
        &self.core.proc
    }

    fn ensure_in_use(&self) -> Result<()> {
        if self.core.proc.awb_slot().is_claimed_by(&self.core) {
            Ok(())
        } else {
            Err(Error::InvalidArgument("controller isn't in use"))
        }
    }
}

impl<H: AwbHal> Drop for AwbController<H> {
    fn drop(&mut self) {
        let core = &self.core;
        if !core.proc.awb_slot().is_claimed_by(core) {
            return;
        }
        warn!(
            "awb: controller on isp{} dropped in {} state without delete",
            core.proc.id(),
            core.state.get().name()
        );

        core.continuous.store(false, Ordering::Release);
        core.proc.with_hal(|hal| {
            hal.awb_enable(false);
            hal.enable_intr(AWB_EVENT_MASK, false);
            hal.awb_clk_enable(false);
            hal.awb_intr_enable(false);
            hal.awb_enable_algorithm_mode(false);
            hal.free_awb_intr();
        });
        core.state.set(AwbState::Init);
        core.gate.force_unavailable();
        core.proc.awb_slot().declaim(core);
    }
}

/// Program the engine registers.  Ranges are validated before the first
/// register write.
fn configure<H: AwbHal>(proc: &IspProcessor<H>, config: &AwbConfig) -> Result<()> {
    config.validate()?;
    let wp = &config.white_patch;
    proc.with_hal(|hal| -> core::result::Result<(), HalError> {
        hal.awb_enable(false);
        hal.awb_set_sample_point(config.sample_point);
        hal.awb_enable_algorithm_mode(true);
        hal.awb_set_window(&config.window)?;
        hal.awb_set_luminance_range(wp.luminance.min, wp.luminance.max)?;
        hal.awb_set_rg_ratio_range(wp.red_green_ratio.min, wp.red_green_ratio.max)?;
        hal.awb_set_bg_ratio_range(wp.blue_green_ratio.min, wp.blue_green_ratio.max)?;
        Ok(())
    })?;
    Ok(())
}

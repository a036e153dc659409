//! Hardware boundary of the AWB statistics engine.
//!
//! ```text
//!   AwbController ──▶ IspProcessor ──▶ AwbHal (register access)
//!                          ▲
//!   interrupt vector ──────┘ dispatch_interrupt()
//! ```
//!
//! [`AwbHal`] is the only place that touches AWB registers.  The controller
//! reaches it through [`IspProcessor::with_hal`](crate::isp::IspProcessor::with_hal),
//! which wraps every access in a short critical section, so implementations
//! never need their own locking.  [`sim::SimIsp`] is the register-level host
//! model used by the tests and the demo binary.

pub mod sim;

use crate::config::{IntrPriority, SamplePoint, Window};
use crate::error::HalError;

/// Interrupt status bit: one sampling window has finished.
pub const AWB_EVENT_FDONE: u32 = 1 << 4;

/// Every interrupt source owned by the AWB engine.
pub const AWB_EVENT_MASK: u32 = AWB_EVENT_FDONE;

/// Capability interface of one hardware AWB statistics engine.
///
/// Setters returning `Result` reject values the registers cannot encode.
/// All methods are called from inside a critical section and may also be
/// called from interrupt context, so none of them may block.
pub trait AwbHal: Send {
    // ── Sampling ──────────────────────────────────────────────

    /// Start (`true`) or stop (`false`) one sampling window.
    fn awb_enable(&mut self, en: bool);

    /// Select the pipeline tap point.
    fn awb_set_sample_point(&mut self, point: SamplePoint);

    /// Program the sampling window.
    fn awb_set_window(&mut self, window: &Window) -> Result<(), HalError>;

    /// Program the white-patch luminance bounds.
    fn awb_set_luminance_range(&mut self, min: u32, max: u32) -> Result<(), HalError>;

    /// Program the white-patch red/green ratio bounds.
    fn awb_set_rg_ratio_range(&mut self, min: f32, max: f32) -> Result<(), HalError>;

    /// Program the white-patch blue/green ratio bounds.
    fn awb_set_bg_ratio_range(&mut self, min: f32, max: f32) -> Result<(), HalError>;

    /// Switch white-patch algorithm mode on or off.
    fn awb_enable_algorithm_mode(&mut self, en: bool);

    /// Gate the engine clock.
    fn awb_clk_enable(&mut self, en: bool);

    // ── Interrupt status ──────────────────────────────────────

    /// Unmask or mask the given interrupt sources.
    fn enable_intr(&mut self, mask: u32, en: bool);

    /// Return the pending sources within `mask` and clear them.
    fn check_clear_intr_event(&mut self, mask: u32) -> u32;

    // ── Accumulators ──────────────────────────────────────────

    fn awb_white_patch_count(&self) -> u32;
    fn awb_accumulated_r(&self) -> u32;
    fn awb_accumulated_g(&self) -> u32;
    fn awb_accumulated_b(&self) -> u32;

    // ── Interrupt line ────────────────────────────────────────

    /// Reserve the interrupt vector for the AWB sources.
    fn alloc_awb_intr(&mut self, priority: IntrPriority) -> Result<(), HalError>;

    /// Release the vector reserved by [`alloc_awb_intr`](Self::alloc_awb_intr).
    fn free_awb_intr(&mut self);

    /// Enable or disable delivery on the reserved vector.
    fn awb_intr_enable(&mut self, en: bool);

    // ── Memory residency ──────────────────────────────────────

    /// Whether callbacks run from a context that requires ISR-safe memory
    /// (instruction RAM for code, internal RAM for data).
    fn isr_residency_required(&self) -> bool {
        false
    }

    /// Whether `addr` is executable from interrupt context.
    fn in_isr_safe_code(&self, _addr: usize) -> bool {
        true
    }

    /// Whether `addr` lies in internal RAM.
    fn in_internal_ram(&self, _addr: usize) -> bool {
        true
    }
}

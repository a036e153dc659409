//! Register-level simulation of the AWB engine for host builds.
//!
//! Behaves like the silicon where the controller can observe it:
//!
//! - a sampling window only completes while the engine is enabled and
//!   clocked, and the enable bit self-clears when it does;
//! - completion latches the accumulators and raises `AWB_EVENT_FDONE`,
//!   which stays pending until read-and-cleared;
//! - the interrupt line asserts only when the vector is allocated and
//!   enabled and the source is unmasked.
//!
//! Register writes are kept in a short fixed-capacity trace so tests can
//! check what the controller touched.

use std::sync::Arc;

use heapless::{Deque, Vec};

use super::{AWB_EVENT_FDONE, AwbHal};
use crate::awb::AwbStatResult;
use crate::config::{IntrPriority, SamplePoint, Window};
use crate::error::HalError;
use crate::isp::IspProcessor;

/// Number of register writes remembered by [`SimIsp::trace`].
pub const TRACE_DEPTH: usize = 32;

/// Largest luminance sum (three 8-bit channels).
const LUMINANCE_MAX: u32 = 255 * 3;

/// Ratio registers are unsigned 2.8 fixed point.
const RATIO_LIMIT: f32 = 4.0;

/// One recorded register write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HalOp {
    AwbEnable(bool),
    SamplePoint(SamplePoint),
    Window(Window),
    Luminance(u32, u32),
    RedGreenRatio(f32, f32),
    BlueGreenRatio(f32, f32),
    AlgorithmMode(bool),
    Clock(bool),
    IntrMask(u32, bool),
    IntrAlloc(IntrPriority),
    IntrFree,
    IntrLine(bool),
}

/// Simulated AWB engine.
pub struct SimIsp {
    frame_width: u32,
    frame_height: u32,

    running: bool,
    clock: bool,
    algorithm_mode: bool,
    sample_point: SamplePoint,
    window: Option<Window>,
    luminance: (u32, u32),
    rg_ratio: (f32, f32),
    bg_ratio: (f32, f32),

    intr_raw: u32,
    intr_ena: u32,
    intr_vector: Option<IntrPriority>,
    intr_line: bool,

    acc: AwbStatResult,
    triggers: u32,
    trace: Deque<HalOp, TRACE_DEPTH>,

    fail_intr_alloc: bool,
    isr_residency: bool,
    isr_code: Vec<usize, 8>,
    internal_data: Vec<usize, 8>,
}

impl SimIsp {
    /// Engine attached to a 1920x1080 sensor.
    pub fn new() -> Self {
        Self::with_frame(1920, 1080)
    }

    pub fn with_frame(frame_width: u32, frame_height: u32) -> Self {
        Self {
            frame_width,
            frame_height,
            running: false,
            clock: false,
            algorithm_mode: false,
            sample_point: SamplePoint::default(),
            window: None,
            luminance: (0, 0),
            rg_ratio: (0.0, 0.0),
            bg_ratio: (0.0, 0.0),
            intr_raw: 0,
            intr_ena: 0,
            intr_vector: None,
            intr_line: false,
            acc: AwbStatResult::default(),
            triggers: 0,
            trace: Deque::new(),
            fail_intr_alloc: false,
            isr_residency: false,
            isr_code: Vec::new(),
            internal_data: Vec::new(),
        }
    }

    /// Finish the current window with `stats`.
    ///
    /// Returns `true` if the interrupt line is now asserted.
    pub fn finish_window(&mut self, stats: AwbStatResult) -> bool {
        if !self.running || !self.clock {
            return false;
        }
        self.running = false;
        self.acc = stats;
        self.intr_raw |= AWB_EVENT_FDONE;
        self.interrupt_asserted()
    }

    pub fn interrupt_asserted(&self) -> bool {
        self.intr_line && self.intr_vector.is_some() && self.intr_raw & self.intr_ena != 0
    }

    /// Whether a window is in progress.
    pub fn is_sampling(&self) -> bool {
        self.running
    }

    pub fn clock_enabled(&self) -> bool {
        self.clock
    }

    pub fn algorithm_mode(&self) -> bool {
        self.algorithm_mode
    }

    pub fn intr_allocated(&self) -> bool {
        self.intr_vector.is_some()
    }

    pub fn intr_line_enabled(&self) -> bool {
        self.intr_line
    }

    /// Number of `awb_enable(true)` writes since reset.
    pub fn trigger_count(&self) -> u32 {
        self.triggers
    }

    /// Most recent register writes, oldest first.
    pub fn trace(&self) -> impl Iterator<Item = &HalOp> {
        self.trace.iter()
    }

    /// Total writes still held in the trace.
    pub fn trace_len(&self) -> usize {
        self.trace.len()
    }

    /// Make the next interrupt allocation fail.
    pub fn fail_next_intr_alloc(&mut self) {
        self.fail_intr_alloc = true;
    }

    /// Enforce ISR memory residency; only addresses passed to
    /// [`mark_isr_code`](Self::mark_isr_code) and
    /// [`mark_internal_data`](Self::mark_internal_data) qualify.
    pub fn require_isr_residency(&mut self) {
        self.isr_residency = true;
    }

    pub fn mark_isr_code(&mut self, addr: usize) {
        let _ = self.isr_code.push(addr);
    }

    pub fn mark_internal_data(&mut self, addr: usize) {
        let _ = self.internal_data.push(addr);
    }

    fn record(&mut self, op: HalOp) {
        if self.trace.is_full() {
            self.trace.pop_front();
        }
        let _ = self.trace.push_back(op);
    }
}

impl Default for SimIsp {
    fn default() -> Self {
        Self::new()
    }
}

fn ratio_ok(min: f32, max: f32) -> bool {
    min >= 0.0 && max < RATIO_LIMIT && min < max
}

impl AwbHal for SimIsp {
    fn awb_enable(&mut self, en: bool) {
        self.record(HalOp::AwbEnable(en));
        if en {
            self.triggers += 1;
        }
        self.running = en;
    }

    fn awb_set_sample_point(&mut self, point: SamplePoint) {
        self.record(HalOp::SamplePoint(point));
        self.sample_point = point;
    }

    fn awb_set_window(&mut self, window: &Window) -> Result<(), HalError> {
        let tl = window.top_left;
        let br = window.btm_right;
        if tl.x >= br.x || tl.y >= br.y || br.x > self.frame_width || br.y > self.frame_height {
            return Err(HalError::WindowOutOfBounds);
        }
        self.record(HalOp::Window(*window));
        self.window = Some(*window);
        Ok(())
    }

    fn awb_set_luminance_range(&mut self, min: u32, max: u32) -> Result<(), HalError> {
        if min >= max || max > LUMINANCE_MAX {
            return Err(HalError::LuminanceOutOfRange);
        }
        self.record(HalOp::Luminance(min, max));
        self.luminance = (min, max);
        Ok(())
    }

    fn awb_set_rg_ratio_range(&mut self, min: f32, max: f32) -> Result<(), HalError> {
        if !ratio_ok(min, max) {
            return Err(HalError::RedGreenRatioOutOfRange);
        }
        self.record(HalOp::RedGreenRatio(min, max));
        self.rg_ratio = (min, max);
        Ok(())
    }

    fn awb_set_bg_ratio_range(&mut self, min: f32, max: f32) -> Result<(), HalError> {
        if !ratio_ok(min, max) {
            return Err(HalError::BlueGreenRatioOutOfRange);
        }
        self.record(HalOp::BlueGreenRatio(min, max));
        self.bg_ratio = (min, max);
        Ok(())
    }

    fn awb_enable_algorithm_mode(&mut self, en: bool) {
        self.record(HalOp::AlgorithmMode(en));
        self.algorithm_mode = en;
    }

    fn awb_clk_enable(&mut self, en: bool) {
        self.record(HalOp::Clock(en));
        self.clock = en;
    }

    fn enable_intr(&mut self, mask: u32, en: bool) {
        self.record(HalOp::IntrMask(mask, en));
        if en {
            self.intr_ena |= mask;
        } else {
            self.intr_ena &= !mask;
        }
    }

    fn check_clear_intr_event(&mut self, mask: u32) -> u32 {
        let events = self.intr_raw & self.intr_ena & mask;
        self.intr_raw &= !events;
        events
    }

    fn awb_white_patch_count(&self) -> u32 {
        self.acc.white_patch_num
    }

    fn awb_accumulated_r(&self) -> u32 {
        self.acc.sum_r
    }

    fn awb_accumulated_g(&self) -> u32 {
        self.acc.sum_g
    }

    fn awb_accumulated_b(&self) -> u32 {
        self.acc.sum_b
    }

    fn alloc_awb_intr(&mut self, priority: IntrPriority) -> Result<(), HalError> {
        if core::mem::take(&mut self.fail_intr_alloc) || self.intr_vector.is_some() {
            return Err(HalError::InterruptUnavailable);
        }
        self.record(HalOp::IntrAlloc(priority));
        self.intr_vector = Some(priority);
        Ok(())
    }

    fn free_awb_intr(&mut self) {
        self.record(HalOp::IntrFree);
        self.intr_vector = None;
        self.intr_line = false;
    }

    fn awb_intr_enable(&mut self, en: bool) {
        self.record(HalOp::IntrLine(en));
        self.intr_line = en;
    }

    fn isr_residency_required(&self) -> bool {
        self.isr_residency
    }

    fn in_isr_safe_code(&self, addr: usize) -> bool {
        self.isr_code.contains(&addr)
    }

    fn in_internal_ram(&self, addr: usize) -> bool {
        self.internal_data.contains(&addr)
    }
}

impl IspProcessor<SimIsp> {
    /// Complete the running window with `stats` and, if the line asserts,
    /// run the interrupt.
    ///
    /// Returns `None` when no interrupt fired, otherwise the vector's
    /// yield request.
    pub fn simulate_frame(&self, stats: AwbStatResult) -> Option<bool> {
        if self.with_hal(|hal| hal.finish_window(stats)) {
            Some(self.dispatch_interrupt())
        } else {
            None
        }
    }

    /// Whether the simulated engine is sampling.
    pub fn sampling(&self) -> bool {
        self.with_hal(|hal| hal.is_sampling())
    }
}

/// Shared handle type used by the demo binary and the tests.
pub type SimProcessor = Arc<IspProcessor<SimIsp>>;

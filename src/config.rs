//! AWB controller configuration.
//!
//! Supplied once to [`AwbController::new`](crate::awb::AwbController::new)
//! and immutable afterwards.  The defaults describe a full-HD frame with the
//! widest white-patch bounds the hardware accepts.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Where in the colour pipeline the engine taps pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SamplePoint {
    /// Before the colour correction matrix.
    #[default]
    BeforeCcm,
    /// After the colour correction matrix.
    AfterCcm,
}

/// Pixel coordinate inside the sensor frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: u32,
    pub y: u32,
}

/// Rectangular sampling window, `top_left` inclusive, `btm_right` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub top_left: Coordinate,
    pub btm_right: Coordinate,
}

impl Default for Window {
    fn default() -> Self {
        Self {
            top_left: Coordinate { x: 0, y: 0 },
            btm_right: Coordinate { x: 1920, y: 1080 },
        }
    }
}

/// Admissible `[min, max]` interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange<T> {
    pub min: T,
    pub max: T,
}

/// Criteria a pixel must meet to count as a white patch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WhitePatchConfig {
    /// Luminance bounds (R + G + B).
    pub luminance: ValueRange<u32>,
    /// Red to green ratio bounds.
    pub red_green_ratio: ValueRange<f32>,
    /// Blue to green ratio bounds.
    pub blue_green_ratio: ValueRange<f32>,
}

impl Default for WhitePatchConfig {
    fn default() -> Self {
        Self {
            luminance: ValueRange { min: 0, max: 220 * 3 },
            red_green_ratio: ValueRange { min: 0.0, max: 3.999 },
            blue_green_ratio: ValueRange { min: 0.0, max: 3.999 },
        }
    }
}

/// Full controller configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AwbConfig {
    pub sample_point: SamplePoint,
    pub window: Window,
    pub white_patch: WhitePatchConfig,
    /// Interrupt priority level 1..=7.  Any other value selects the default
    /// low/medium level.
    pub intr_priority: u8,
}

/// Interrupt priority resolved from [`AwbConfig::intr_priority`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntrPriority {
    /// Allocator picks a low or medium level.
    LowMed,
    /// Explicit level in 1..=7.
    Level(u8),
}

impl AwbConfig {
    /// Resolve the configured interrupt priority.
    pub fn intr_priority(&self) -> IntrPriority {
        match self.intr_priority {
            p @ 1..=7 => IntrPriority::Level(p),
            _ => IntrPriority::LowMed,
        }
    }

    /// Check every range, returning the first violation in
    /// window → luminance → red/green → blue/green order.
    pub fn validate(&self) -> Result<()> {
        let w = &self.window;
        if w.top_left.x >= w.btm_right.x || w.top_left.y >= w.btm_right.y {
            return Err(Error::InvalidArgument("invalid window"));
        }

        let lum = &self.white_patch.luminance;
        if lum.min >= lum.max {
            return Err(Error::InvalidArgument("invalid luminance range"));
        }

        if !ratio_range_ok(&self.white_patch.red_green_ratio) {
            return Err(Error::InvalidArgument("invalid range of red green ratio"));
        }
        if !ratio_range_ok(&self.white_patch.blue_green_ratio) {
            return Err(Error::InvalidArgument("invalid range of blue green ratio"));
        }
        Ok(())
    }
}

// NaN fails both comparisons.
fn ratio_range_ok(r: &ValueRange<f32>) -> bool {
    r.min < r.max && r.min >= 0.0
}

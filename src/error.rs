//! Unified error types for the AWB statistics controller.
//!
//! Every public operation returns [`Result`].  Variants are `Copy` and carry
//! a static reason string so they can be produced on any path, including
//! rollback during controller creation, without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Controller error
// ---------------------------------------------------------------------------

/// Every fallible controller operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Malformed configuration, a handle that is no longer attached, or a
    /// callback that violates the ISR residency constraint.
    InvalidArgument(&'static str),
    /// The operation is not permitted from the controller's current state.
    InvalidState(&'static str),
    /// An interrupt line or another hardware resource could not be obtained.
    ResourceExhausted(&'static str),
    /// The gate or the result wait exceeded the caller's deadline.
    Timeout,
    /// The processor's AWB slot is already claimed by another controller.
    NotFound(&'static str),
}

impl Error {
    /// Short machine-friendly name of the error class.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::InvalidState(_) => "invalid_state",
            Self::ResourceExhausted(_) => "resource_exhausted",
            Self::Timeout => "timeout",
            Self::NotFound(_) => "not_found",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::InvalidState(msg) => write!(f, "invalid state: {msg}"),
            Self::ResourceExhausted(msg) => write!(f, "resource exhausted: {msg}"),
            Self::Timeout => write!(f, "timed out"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Hardware layer errors
// ---------------------------------------------------------------------------

/// Rejections reported by an [`AwbHal`](crate::hal::AwbHal) implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// No free interrupt vector at the requested priority.
    InterruptUnavailable,
    /// Sampling window lies outside the sensor frame.
    WindowOutOfBounds,
    /// Luminance bounds exceed the accumulator width.
    LuminanceOutOfRange,
    /// Red/green ratio cannot be encoded in the fixed-point register.
    RedGreenRatioOutOfRange,
    /// Blue/green ratio cannot be encoded in the fixed-point register.
    BlueGreenRatioOutOfRange,
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InterruptUnavailable => write!(f, "interrupt unavailable"),
            Self::WindowOutOfBounds => write!(f, "window out of bounds"),
            Self::LuminanceOutOfRange => write!(f, "luminance out of range"),
            Self::RedGreenRatioOutOfRange => write!(f, "red/green ratio out of range"),
            Self::BlueGreenRatioOutOfRange => write!(f, "blue/green ratio out of range"),
        }
    }
}

impl From<HalError> for Error {
    fn from(e: HalError) -> Self {
        match e {
            HalError::InterruptUnavailable => Self::ResourceExhausted("allocate interrupt failed"),
            HalError::WindowOutOfBounds => Self::InvalidArgument("invalid window"),
            HalError::LuminanceOutOfRange => Self::InvalidArgument("invalid luminance range"),
            HalError::RedGreenRatioOutOfRange => {
                Self::InvalidArgument("invalid range of red green ratio")
            }
            HalError::BlueGreenRatioOutOfRange => {
                Self::InvalidArgument("invalid range of blue green ratio")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

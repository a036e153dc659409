//! Auto-white-balance statistics controller for the ISP.
//!
//! Exposes the controller, its configuration and the hardware boundary.
//! Register access is behind the [`hal::AwbHal`] trait; host builds and
//! tests drive the controller through the [`hal::sim::SimIsp`] model.

#![deny(unused_must_use)]

pub mod awb;
pub mod config;
pub mod error;
pub mod hal;
pub mod isp;
pub mod sync;

pub use awb::callbacks::{AwbCallbacks, StatisticsDoneFn, UserData};
pub use awb::state::AwbState;
pub use awb::{AwbController, AwbEventData, AwbStatResult};
pub use config::AwbConfig;
pub use error::{Error, Result};
pub use isp::IspProcessor;
pub use sync::Timeout;

//! AWB demo: main entry point
//!
//! Drives one controller through a one-shot sample and a short continuous
//! session against the simulated engine.
//!
//! ```text
//! ┌──────────────┐  simulate_frame()  ┌──────────────┐  pop()   ┌──────────┐
//! │ frame thread │───────────────────▶│ IspProcessor │────────▶│  main    │
//! │ (30 fps)     │   ISR bottom half  │  + AWB ctlr  │ callback │  task    │
//! └──────────────┘                    └──────────────┘          └──────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use log::info;

use isp_awb::hal::sim::SimIsp;
use isp_awb::{
    AwbCallbacks, AwbConfig, AwbController, AwbEventData, AwbStatResult, IspProcessor, Timeout,
    UserData,
};

/// One sensor frame at 30 fps.
const FRAME_PERIOD: Duration = Duration::from_millis(33);

/// Counts finished windows; runs in interrupt context.
fn on_statistics_done(_edata: &AwbEventData, user_data: Option<&UserData>) -> bool {
    if let Some(frames) = user_data.and_then(|d| d.downcast_ref::<AtomicU32>()) {
        frames.fetch_add(1, Ordering::Relaxed);
    }
    false
}

/// Synthetic scene with a slowly drifting colour cast.
fn scene(frame: u32) -> AwbStatResult {
    let drift = frame % 64;
    AwbStatResult {
        white_patch_num: 12_000 + drift * 10,
        sum_r: 1_400_000 + drift * 2_000,
        sum_g: 1_600_000,
        sum_b: 1_200_000 - drift * 1_500,
    }
}

fn main() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("=== AWB demo starting ===");

    let proc = Arc::new(IspProcessor::new(0, SimIsp::new()));

    let frames_proc = Arc::clone(&proc);
    thread::Builder::new()
        .name("frames".into())
        .stack_size(4 * 1024)
        .spawn(move || {
            let mut frame = 0u32;
            loop {
                thread::sleep(FRAME_PERIOD);
                if frames_proc.simulate_frame(scene(frame)).is_some() {
                    frame = frame.wrapping_add(1);
                }
            }
        })?;

    let ctlr = AwbController::new(&proc, &AwbConfig::default())?;
    let frames = Arc::new(AtomicU32::new(0));
    ctlr.register_event_callbacks(
        AwbCallbacks {
            on_statistics_done: Some(on_statistics_done),
        },
        Some(frames.clone() as UserData),
    )?;
    ctlr.enable()?;

    let res = ctlr.get_oneshot_statistics(Timeout::from_millis(500))?;
    info!(
        "oneshot: white_patch={} r={} g={} b={}",
        res.white_patch_num, res.sum_r, res.sum_g, res.sum_b
    );

    ctlr.start_continuous_statistics()?;
    thread::sleep(Duration::from_secs(1));
    ctlr.stop_continuous_statistics()?;
    info!(
        "continuous: {} windows delivered to callback",
        frames.load(Ordering::Relaxed)
    );

    ctlr.disable()?;
    ctlr.delete()?;

    info!("=== AWB demo done ===");
    Ok(())
}

//! One-shot sampling: gate, mailbox wait, timeout and state restoration.

use std::sync::{Arc, Barrier};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use isp_awb::{AwbCallbacks, AwbEventData, AwbState, Error, Timeout, UserData};

use crate::harness::{
    FrameDriver, frame_stats, new_controller, new_processor, request_yield, wait_until,
};

const LONG: Timeout = Timeout::After(Duration::from_secs(5));

fn store_sum_g(edata: &AwbEventData, user_data: Option<&UserData>) -> bool {
    if let Some(slot) = user_data.and_then(|d| d.downcast_ref::<AtomicU32>()) {
        slot.store(edata.awb_result.sum_g, Ordering::SeqCst);
    }
    false
}

#[test]
fn oneshot_returns_result_and_restores_enabled() {
    let proc = new_processor();
    let ctlr = new_controller(&proc);
    ctlr.enable().unwrap();
    let _frames = FrameDriver::start(&proc, Duration::from_millis(2));

    let res = ctlr.get_oneshot_statistics(LONG).unwrap();
    assert!(res.white_patch_num >= 1);
    assert_eq!(res, frame_stats(res.white_patch_num));

    assert_eq!(ctlr.state(), AwbState::Enabled);
    assert!(!ctlr.is_busy());
    proc.with_hal(|hal| {
        assert!(!hal.is_sampling());
        assert_eq!(hal.trigger_count(), 1, "one-shot must not re-arm");
    });
}

#[test]
fn poll_on_idle_controller_times_out_without_blocking() {
    let proc = new_processor();
    let ctlr = new_controller(&proc);
    ctlr.enable().unwrap();

    let started = Instant::now();
    assert_eq!(ctlr.get_oneshot_statistics(Timeout::NoWait), Err(Error::Timeout));
    assert!(started.elapsed() < Duration::from_secs(1));

    assert_eq!(ctlr.state(), AwbState::Enabled);
    assert!(!ctlr.is_busy());
    assert!(!proc.sampling(), "engine stopped before the error is returned");
}

#[test]
fn bounded_wait_times_out_and_stops_engine() {
    let proc = new_processor();
    let ctlr = new_controller(&proc);
    ctlr.enable().unwrap();

    let started = Instant::now();
    let res = ctlr.get_oneshot_statistics(Timeout::After(Duration::from_millis(30)));
    let elapsed = started.elapsed();

    assert_eq!(res, Err(Error::Timeout));
    assert!(elapsed >= Duration::from_millis(25), "returned early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "overran the bound: {elapsed:?}");
    assert!(!proc.sampling());
    assert_eq!(ctlr.state(), AwbState::Enabled);

    // Still usable afterwards.
    let _frames = FrameDriver::start(&proc, Duration::from_millis(2));
    assert!(ctlr.get_oneshot_statistics(LONG).is_ok());
}

#[test]
fn stale_result_is_never_delivered() {
    let proc = new_processor();
    let ctlr = new_controller(&proc);
    ctlr.enable().unwrap();

    // Leave an unread result from a continuous window in the mailbox.
    ctlr.start_continuous_statistics().unwrap();
    assert!(proc.simulate_frame(frame_stats(1)).is_some());
    ctlr.stop_continuous_statistics().unwrap();

    let p = proc.clone();
    let feeder = std::thread::spawn(move || {
        assert!(wait_until(Duration::from_secs(5), || p.sampling()));
        p.simulate_frame(frame_stats(2))
    });

    let res = ctlr.get_oneshot_statistics(LONG).unwrap();
    assert_eq!(res, frame_stats(2));
    assert!(feeder.join().unwrap().is_some());
}

#[test]
fn callback_sees_same_result_as_waiter() {
    let proc = new_processor();
    let ctlr = new_controller(&proc);
    let seen = Arc::new(AtomicU32::new(0));
    ctlr.register_event_callbacks(
        AwbCallbacks {
            on_statistics_done: Some(store_sum_g),
        },
        Some(seen.clone() as UserData),
    )
    .unwrap();
    ctlr.enable().unwrap();
    let _frames = FrameDriver::start(&proc, Duration::from_millis(2));

    let res = ctlr.get_oneshot_statistics(LONG).unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), res.sum_g);
}

#[test]
fn callback_can_request_yield() {
    let proc = new_processor();
    let ctlr = new_controller(&proc);
    ctlr.register_event_callbacks(
        AwbCallbacks {
            on_statistics_done: Some(request_yield),
        },
        None,
    )
    .unwrap();
    ctlr.enable().unwrap();
    ctlr.start_continuous_statistics().unwrap();

    assert_eq!(proc.simulate_frame(frame_stats(1)), Some(true));
    ctlr.stop_continuous_statistics().unwrap();
}

#[test]
fn disable_enable_cycle_behaves_like_fresh_controller() {
    let proc = new_processor();
    let ctlr = new_controller(&proc);
    let _frames = FrameDriver::start(&proc, Duration::from_millis(2));

    for _ in 0..2 {
        assert!(ctlr.is_busy());
        ctlr.enable().unwrap();
        assert!(!ctlr.is_busy());
        assert!(ctlr.get_oneshot_statistics(LONG).is_ok());
        assert_eq!(ctlr.state(), AwbState::Enabled);
        ctlr.disable().unwrap();
        assert_eq!(ctlr.state(), AwbState::Init);
    }
}

#[test]
fn racing_oneshots_never_overlap() {
    let proc = new_processor();
    let ctlr = Arc::new(new_controller(&proc));
    ctlr.enable().unwrap();
    let barrier = Arc::new(Barrier::new(2));

    let racers: Vec<_> = (0..2)
        .map(|_| {
            let (c, b) = (ctlr.clone(), barrier.clone());
            std::thread::spawn(move || {
                b.wait();
                c.get_oneshot_statistics(LONG)
            })
        })
        .collect();

    // A racer that passed the state check before the winner started waits
    // on the gate and samples its own window afterwards; a later one is
    // turned away.  Complete windows one at a time until both return.
    let mut frame = 0;
    while !racers.iter().all(|r| r.is_finished()) {
        if proc.sampling() {
            frame += 1;
            assert!(proc.simulate_frame(frame_stats(frame)).is_some());
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    let results: Vec<_> = racers.into_iter().map(|r| r.join().unwrap()).collect();

    let ok = results.iter().filter(|r| r.is_ok()).count() as u32;
    assert!(ok >= 1);
    assert!(
        results
            .iter()
            .all(|r| r.is_ok() || matches!(r, Err(Error::InvalidState(_)))),
        "{results:?}"
    );
    assert_eq!(proc.with_hal(|hal| hal.trigger_count()), ok);
    assert_eq!(frame, ok, "one window per successful request");
    assert_eq!(ctlr.state(), AwbState::Enabled);
    assert!(!ctlr.is_busy());
}

#[test]
fn in_flight_oneshot_rejects_other_requests() {
    let proc = new_processor();
    let ctlr = Arc::new(new_controller(&proc));
    ctlr.enable().unwrap();

    let c = ctlr.clone();
    let waiter = std::thread::spawn(move || c.get_oneshot_statistics(Timeout::Forever));
    assert!(wait_until(Duration::from_secs(5), || proc.sampling()));
    assert_eq!(ctlr.state(), AwbState::Started);

    assert!(matches!(
        ctlr.stop_continuous_statistics(),
        Err(Error::InvalidState(_))
    ));
    assert!(matches!(ctlr.disable(), Err(Error::InvalidState(_))));
    assert!(matches!(
        ctlr.start_continuous_statistics(),
        Err(Error::InvalidState(_))
    ));
    assert_eq!(
        ctlr.get_oneshot_statistics(Timeout::Forever),
        Err(Error::InvalidState("controller isn't in enable state"))
    );

    assert!(proc.simulate_frame(frame_stats(7)).is_some());
    assert_eq!(waiter.join().unwrap(), Ok(frame_stats(7)));
    assert_eq!(ctlr.state(), AwbState::Enabled);
    assert_eq!(proc.with_hal(|hal| hal.trigger_count()), 1);
}

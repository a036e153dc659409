//! Blocking hand-off primitives shared by ordinary callers and the ISR.
//!
//! ```text
//!  caller ──acquire──▶ SampleGate ◀──release── caller
//!  ISR ────push─────▶ LatestMailbox ──pop───▶ caller
//! ```
//!
//! Both primitives store their value in an `embassy-sync` [`Signal`] guarded
//! by a critical section, so the ISR side is a short non-blocking call.  The
//! caller side parks the thread in `futures_lite::future::block_on`, bounded
//! by an `async-io-mini` reactor timer.
//!
//! [`Signal`]: embassy_sync::signal::Signal

pub mod gate;
pub mod mailbox;

use core::future::Future;
use core::time::Duration;

use async_io_mini::Timer;
use futures_lite::future;

/// How long a blocking call may wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Wait until the event arrives.
    Forever,
    /// Poll once and return immediately.
    NoWait,
    /// Wait at most this long.
    After(Duration),
}

impl Timeout {
    /// Millisecond convention: negative blocks forever, zero polls.
    pub fn from_millis(ms: i32) -> Self {
        match ms {
            ms if ms < 0 => Self::Forever,
            0 => Self::NoWait,
            ms => Self::After(Duration::from_millis(ms as u64)),
        }
    }
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        if d.is_zero() { Self::NoWait } else { Self::After(d) }
    }
}

/// Drive `fut` on the calling thread until it completes or `timeout` expires.
pub(crate) fn wait_within<F: Future>(fut: F, timeout: Timeout) -> Option<F::Output> {
    match timeout {
        Timeout::Forever => Some(future::block_on(fut)),
        Timeout::NoWait => future::block_on(future::poll_once(fut)),
        Timeout::After(limit) => future::block_on(future::or(
            async move { Some(fut.await) },
            async move {
                Timer::after(limit).await;
                None
            },
        )),
    }
}

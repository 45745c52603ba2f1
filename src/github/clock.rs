//! Wall clock and sleeping, injectable so rate-limit waits can be tested.

use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of the current time and the only place the harvester blocks on
/// purpose.
#[cfg_attr(test, mockall::automock)]
pub trait Clock {
    /// Seconds since the Unix epoch.
    fn now_unix(&self) -> u64;

    /// Blocks the current thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Real clock backed by [`SystemTime`] and [`thread::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_secs())
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

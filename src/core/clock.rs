//! Time source for polling and pauses.
//!
//! Both suspension points of a sequence (the poll interval and the pause
//! between steps) go through [`Clock`] so tests can run on virtual time.

use std::thread;
use std::time::{Duration, Instant};

use crate::interrupt::CancelToken;

/// Granularity at which a real sleep notices cancellation.
const SLEEP_SLICE: Duration = Duration::from_millis(200);

pub trait Clock {
    /// Monotonic time since an arbitrary fixed origin.
    fn now(&self) -> Duration;

    /// Sleep up to `duration`, returning early once `cancel` is set.
    fn sleep(&self, duration: Duration, cancel: &CancelToken);
}

pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration, cancel: &CancelToken) {
        let deadline = Instant::now() + duration;
        while !cancel.is_cancelled() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep(SLEEP_SLICE.min(deadline - now));
        }
    }
}

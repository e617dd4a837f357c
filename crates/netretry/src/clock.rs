//! Host clock backend.

use netretry_core::clock::Clock;
use std::time::{Duration, Instant};

/// Millisecond tick clock backed by [`Instant`].
///
/// Counts from construction and truncates to 32 bits, so it wraps after
/// roughly 49.7 days the way a device tick counter does.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Start a clock reading zero.
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
    fn now_ms(&self) -> u32 {
        // truncation is the wrap
        self.origin.elapsed().as_millis() as u32
    }

    fn sleep_ms(&self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}

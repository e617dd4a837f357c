//! Time collaborators: a millisecond tick clock and async waiting.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

/// A millisecond clock.
///
/// `now_ms` is a 32-bit tick count and is allowed to wrap. `sleep_ms` blocks
/// the calling thread for at least `ms` milliseconds and is only used by the
/// blocking jitter backoff.
pub trait Clock: Send + Sync {
    /// Current tick count in milliseconds.
    fn now_ms(&self) -> u32;

    /// Block the calling thread for at least `ms` milliseconds.
    fn sleep_ms(&self, ms: u64);
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }

    fn sleep_ms(&self, ms: u64) {
        (**self).sleep_ms(ms)
    }
}

/// Non-blocking wait used by
/// [`JitterBackoff::backoff_and_wait`](crate::retry::JitterBackoff::backoff_and_wait).
///
/// Dropping the returned future cancels the wait.
#[async_trait]
pub trait AsyncSleep: Send + Sync {
    /// Wait for `ms` milliseconds.
    async fn sleep_ms(&self, ms: u64);
}

/// [`AsyncSleep`] backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleep;

#[async_trait]
impl AsyncSleep for TokioSleep {
    async fn sleep_ms(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// A clock that only moves when told to.
///
/// Sleeping advances the clock instead of blocking, so simulated retry
/// campaigns run instantly. Clones share the same time line.
///
/// # Examples
///
/// ```rust
/// use netretry_core::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::new(u32::MAX - 5);
/// let observer = clock.clone();
///
/// clock.sleep_ms(10);
/// assert_eq!(observer.now_ms(), 4);
/// assert_eq!(observer.slept_ms(), 10);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    inner: Arc<ManualClockInner>,
}

#[derive(Debug, Default)]
struct ManualClockInner {
    now: AtomicU32,
    slept: AtomicU64,
    sleeps: AtomicU32,
}

impl ManualClock {
    /// Create a clock reading `start_ms`.
    pub fn new(start_ms: u32) -> Self {
        let clock = Self::default();
        clock.set(start_ms);
        clock
    }

    /// Jump to an absolute tick value.
    pub fn set(&self, now_ms: u32) {
        self.inner.now.store(now_ms, Ordering::SeqCst);
    }

    /// Move the clock forward, wrapping at `u32::MAX`.
    pub fn advance(&self, ms: u32) {
        // fetch_add on atomics wraps
        self.inner.now.fetch_add(ms, Ordering::SeqCst);
    }

    /// Total milliseconds requested through `sleep_ms`.
    pub fn slept_ms(&self) -> u64 {
        self.inner.slept.load(Ordering::SeqCst)
    }

    /// Number of `sleep_ms` calls.
    pub fn sleep_count(&self) -> u32 {
        self.inner.sleeps.load(Ordering::SeqCst)
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.inner.now.load(Ordering::SeqCst)
    }

    fn sleep_ms(&self, ms: u64) {
        self.inner.slept.fetch_add(ms, Ordering::SeqCst);
        self.inner.sleeps.fetch_add(1, Ordering::SeqCst);
        // truncation is the tick counter wrapping
        self.advance(ms as u32);
    }
}

//! Non-blocking backoff that records a resume deadline instead of sleeping.

use super::{BackoffStatus, ExponentialGenerator, NextBackoff};
use crate::clock::Clock;
use crate::entropy::{RandomSource, bounded_random};
use crate::error::Result;
use crate::log::debug;
use crate::policy::DeadlineParams;
use std::fmt;
use std::sync::Arc;

/// Deadline-based exponential backoff for cooperative callers.
///
/// [`advance_backoff`](Self::advance_backoff) picks the next delay and stores
/// `now + delay` as the earliest time the protected operation may run again;
/// callers poll [`is_in_backoff`](Self::is_in_backoff) from their own loop
/// and proceed once it reports `false`. Nothing here ever blocks.
///
/// Deadlines are 32-bit tick values and follow the clock across wraparound.
/// A deadline further away than `max_backoff_ms` cannot have been armed by
/// this context, so it is treated as a clock rollover and collapsed to the
/// current tick.
///
/// # Examples
///
/// ```rust
/// use netretry_core::clock::ManualClock;
/// use netretry_core::entropy::RandomSource;
/// use netretry_core::error::EntropyError;
/// use netretry_core::policy::DeadlineParams;
/// use netretry_core::retry::{BackoffContext, BackoffStatus};
///
/// struct Fixed;
///
/// impl RandomSource for Fixed {
///     fn fill(&self, buf: &mut [u8]) -> Result<usize, EntropyError> {
///         buf.copy_from_slice(&[0xE8, 0x03, 1, 0]); // 1000 * 1
///         Ok(buf.len())
///     }
/// }
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let clock = ManualClock::new(5_000);
/// let mut context = BackoffContext::new(DeadlineParams::default(), Fixed, clock.clone())?;
/// assert!(!context.is_in_backoff());
///
/// assert_eq!(context.advance_backoff()?, BackoffStatus::Armed { delay_ms: 1_000 });
/// assert!(context.is_in_backoff());
///
/// clock.advance(1_000);
/// assert!(!context.is_in_backoff());
/// # Ok(())
/// # }
/// ```
pub struct BackoffContext {
    generator: ExponentialGenerator,
    next_allowed_ms: u32,
    armed: bool,
    random: Arc<dyn RandomSource>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for BackoffContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackoffContext")
            .field("generator", &self.generator)
            .field("next_allowed_ms", &self.next_allowed_ms)
            .field("armed", &self.armed)
            .finish_non_exhaustive()
    }
}

impl BackoffContext {
    /// Create a context for a new campaign.
    ///
    /// # Errors
    ///
    /// [`RetryError::InvalidArgument`](crate::error::RetryError::InvalidArgument)
    /// if `params` fail validation.
    pub fn new(
        params: DeadlineParams,
        random: impl RandomSource + 'static,
        clock: impl Clock + 'static,
    ) -> Result<Self> {
        Self::with_shared(params, Arc::new(random), Arc::new(clock))
    }

    /// Create a context using process-wide collaborators.
    pub fn with_shared(
        params: DeadlineParams,
        random: Arc<dyn RandomSource>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            generator: ExponentialGenerator::new(
                params.base_ms,
                params.max_backoff_ms,
                params.max_attempts,
            )?,
            next_allowed_ms: 0,
            armed: false,
            random,
            clock,
        })
    }

    /// Restart the campaign with new parameters.
    ///
    /// On error the context is left unchanged.
    pub fn initialize(&mut self, base_ms: u32, max_backoff_ms: u32, max_attempts: u32) -> Result<()> {
        self.generator = ExponentialGenerator::new(base_ms, max_backoff_ms, max_attempts)?;
        self.next_allowed_ms = 0;
        self.armed = false;
        Ok(())
    }

    /// Whether the caller must still wait before retrying.
    ///
    /// Collapses the deadline to the current tick when it lies more than
    /// `max_backoff_ms` ahead.
    pub fn is_in_backoff(&mut self) -> bool {
        self.remaining_ms() > 0
    }

    /// Milliseconds left until the deadline, or `0` when a retry may proceed.
    pub fn remaining_ms(&mut self) -> u32 {
        if !self.armed {
            return 0;
        }

        let now = self.clock.now_ms();
        let remaining = self.next_allowed_ms.wrapping_sub(now);
        if remaining <= self.generator.max_backoff() {
            return remaining;
        }

        // Either the deadline has passed, or the clock rolled over and left
        // a phantom deadline far in the future.
        if now < self.next_allowed_ms {
            debug!(
                "Clock rollover detected, collapsing deadline {} ms to {} ms",
                self.next_allowed_ms, now
            );
            self.next_allowed_ms = now;
        }
        0
    }

    /// Arm the next backoff.
    ///
    /// Draws a random value, asks the generator for the next delay and stores
    /// `now + delay` as the deadline. When the attempt limit has been reached
    /// the deadline is set to `now` and [`BackoffStatus::RetriesExhausted`] is
    /// returned; further calls keep reporting exhaustion until
    /// [`initialize`](Self::initialize) starts a new campaign.
    ///
    /// # Errors
    ///
    /// [`RetryError::Entropy`](crate::error::RetryError::Entropy) if no random
    /// value could be drawn; the context is left unchanged.
    pub fn advance_backoff(&mut self) -> Result<BackoffStatus> {
        let now = self.clock.now_ms();
        let random = bounded_random(self.random.as_ref())?;

        self.armed = true;
        match self.generator.next_backoff(random) {
            NextBackoff::Delay(delay_ms) => {
                self.next_allowed_ms = now.wrapping_add(delay_ms);
                debug!(
                    "Backoff armed for {} ms, next attempt allowed at {} ms",
                    delay_ms, self.next_allowed_ms
                );
                Ok(BackoffStatus::Armed { delay_ms })
            }
            NextBackoff::Exhausted => {
                self.next_allowed_ms = now;
                debug!(
                    "Backoff attempts exhausted after {} attempts",
                    self.generator.attempts_done()
                );
                Ok(BackoffStatus::RetriesExhausted)
            }
        }
    }

    /// Earliest tick at which a retry may proceed; `0` before the first
    /// `advance_backoff`.
    pub fn next_allowed_ms(&self) -> u32 {
        self.next_allowed_ms
    }

    /// The underlying delay generator.
    pub fn generator(&self) -> &ExponentialGenerator {
        &self.generator
    }
}

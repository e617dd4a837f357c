//! Capped exponential backoff with full jitter.

use crate::error::{Result, RetryError};
use serde::{Deserialize, Serialize};

/// Outcome of [`ExponentialGenerator::next_backoff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextBackoff {
    /// Wait this many milliseconds before retrying.
    Delay(u32),
    /// The attempt limit has been reached; no delay was produced.
    Exhausted,
}

/// Bounded exponential delay generator.
///
/// Attempt `n` (0-indexed) draws a delay uniformly from
/// `[0, min(base * 2^n, max_backoff)]`, using a caller-supplied random value.
/// The attempt counter is incremented on every call; the call that brings it
/// to `max_attempts` reports [`NextBackoff::Exhausted`]. A `max_attempts` of
/// `0` never exhausts.
///
/// # Examples
///
/// ```rust
/// use netretry_core::retry::{ExponentialGenerator, NextBackoff};
///
/// let mut generator = ExponentialGenerator::new(100, 1_000, 3).unwrap();
/// assert_eq!(generator.next_backoff(250), NextBackoff::Delay(250 % 101));
/// assert_eq!(generator.next_backoff(250), NextBackoff::Delay(250 % 201));
/// assert_eq!(generator.next_backoff(250), NextBackoff::Exhausted);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExponentialGenerator {
    attempts_done: u32,
    base: u32,
    max_backoff: u32,
    max_attempts: u32,
    next_jitter_max: u32,
}

impl ExponentialGenerator {
    /// Create a generator with no attempts recorded.
    ///
    /// # Errors
    ///
    /// [`RetryError::InvalidArgument`] if `base` is zero or exceeds
    /// `max_backoff`.
    pub fn new(base: u32, max_backoff: u32, max_attempts: u32) -> Result<Self> {
        if base == 0 {
            return Err(RetryError::InvalidArgument(
                "backoff base must be at least 1 ms".into(),
            ));
        }
        if base > max_backoff {
            return Err(RetryError::InvalidArgument(format!(
                "backoff base ({} ms) exceeds max backoff ({} ms)",
                base, max_backoff
            )));
        }

        Ok(Self {
            attempts_done: 0,
            base,
            max_backoff,
            max_attempts,
            next_jitter_max: base,
        })
    }

    /// Produce the next delay from `random`.
    pub fn next_backoff(&mut self, random: u32) -> NextBackoff {
        let jitter_max = self.next_jitter_max;
        self.attempts_done = self.attempts_done.saturating_add(1);

        if self.max_attempts != 0 && self.attempts_done >= self.max_attempts {
            return NextBackoff::Exhausted;
        }

        let delay = match jitter_max.checked_add(1) {
            Some(bound) => random % bound,
            None => random,
        };

        self.next_jitter_max = self.next_jitter_max.saturating_mul(2).min(self.max_backoff);

        NextBackoff::Delay(delay)
    }

    /// Calls made since creation.
    pub fn attempts_done(&self) -> u32 {
        self.attempts_done
    }

    /// Starting jitter ceiling in milliseconds.
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Largest delay this generator will ever produce, in milliseconds.
    pub fn max_backoff(&self) -> u32 {
        self.max_backoff
    }

    /// Attempt limit; `0` means unlimited.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Inclusive upper bound of the next delay.
    pub fn next_jitter_max(&self) -> u32 {
        self.next_jitter_max
    }

    /// Whether the attempt limit has been reached.
    pub fn is_exhausted(&self) -> bool {
        self.max_attempts != 0 && self.attempts_done >= self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ceiling_doubles_then_caps() {
        let mut generator = ExponentialGenerator::new(1_000, 10_000, 0).unwrap();
        let mut ceilings = Vec::new();
        for _ in 0..6 {
            ceilings.push(generator.next_jitter_max());
            generator.next_backoff(0);
        }
        assert_eq!(ceilings, vec![1_000, 2_000, 4_000, 8_000, 10_000, 10_000]);
    }

    #[test]
    fn test_max_random_hits_ceiling() {
        let mut generator = ExponentialGenerator::new(1_000, 10_000, 0).unwrap();
        assert_eq!(generator.next_backoff(1_000), NextBackoff::Delay(1_000));
        assert_eq!(generator.next_backoff(2_000), NextBackoff::Delay(2_000));
        assert_eq!(generator.next_backoff(4_001), NextBackoff::Delay(0));
    }

    #[test]
    fn test_exhausts_on_cap_call() {
        let mut generator = ExponentialGenerator::new(1_000, 10_000, 5).unwrap();
        for _ in 0..4 {
            assert!(matches!(generator.next_backoff(7), NextBackoff::Delay(_)));
        }
        assert!(!generator.is_exhausted());
        let ceiling = generator.next_jitter_max();

        assert_eq!(generator.next_backoff(7), NextBackoff::Exhausted);
        assert!(generator.is_exhausted());
        assert_eq!(generator.attempts_done(), 5);
        assert_eq!(generator.next_jitter_max(), ceiling);

        assert_eq!(generator.next_backoff(7), NextBackoff::Exhausted);
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(ExponentialGenerator::new(0, 10, 1).is_err());
        assert!(ExponentialGenerator::new(20, 10, 1).is_err());
        assert!(ExponentialGenerator::new(10, 10, 1).is_ok());
    }

    #[test]
    fn test_full_range_ceiling_does_not_overflow() {
        let mut generator = ExponentialGenerator::new(u32::MAX, u32::MAX, 0).unwrap();
        assert_eq!(generator.next_backoff(17), NextBackoff::Delay(17));
    }

    proptest! {
        /// Property: every delay lies in [0, min(base * 2^n, max_backoff)]
        #[test]
        fn prop_delay_within_capped_exponential(
            base in 1u32..5_000,
            extra in 0u32..60_000,
            randoms in proptest::collection::vec(any::<u32>(), 1..20),
        ) {
            let max_backoff = base + extra;
            let mut generator = ExponentialGenerator::new(base, max_backoff, 0).unwrap();

            for (n, random) in randoms.into_iter().enumerate() {
                let bound = (u64::from(base) << n.min(40)).min(u64::from(max_backoff));
                match generator.next_backoff(random) {
                    NextBackoff::Delay(delay) => prop_assert!(u64::from(delay) <= bound),
                    NextBackoff::Exhausted => prop_assert!(false, "unlimited generator exhausted"),
                }
            }
        }
    }
}

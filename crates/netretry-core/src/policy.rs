//! Tunable constants for both backoff styles.

use crate::error::{Result, RetryError};
use serde::{Deserialize, Serialize};

/// Default attempt limit per campaign.
pub const MAX_RETRY_ATTEMPTS: u32 = 4;

/// Default starting jitter ceiling, in seconds.
pub const INITIAL_RETRY_BACKOFF_SECONDS: u32 = 1;

/// Default ceiling the jitter window may grow to, in seconds.
pub const MAX_RETRY_BACKOFF_SECONDS: u32 = 128;

/// Default spread of the random offset added on reset, in seconds.
pub const MAX_JITTER_VALUE_SECONDS: u32 = 5;

/// Attempt limit and jitter window bounds for a
/// [`JitterBackoff`](crate::retry::JitterBackoff).
///
/// Fixed at construction; nothing changes these at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JitterPolicy {
    /// Attempts per campaign; `0` retries forever.
    pub max_retry_attempts: u32,
    /// Base of the jitter ceiling after a reset.
    pub initial_backoff_secs: u32,
    /// Upper bound of the jitter ceiling.
    pub max_backoff_secs: u32,
    /// Random offset on reset is drawn from `[0, max_jitter_secs)`.
    pub max_jitter_secs: u32,
}

impl Default for JitterPolicy {
    fn default() -> Self {
        Self {
            max_retry_attempts: MAX_RETRY_ATTEMPTS,
            initial_backoff_secs: INITIAL_RETRY_BACKOFF_SECONDS,
            max_backoff_secs: MAX_RETRY_BACKOFF_SECONDS,
            max_jitter_secs: MAX_JITTER_VALUE_SECONDS,
        }
    }
}

impl JitterPolicy {
    /// Whether the campaign never exhausts.
    pub fn retries_forever(&self) -> bool {
        self.max_retry_attempts == 0
    }

    /// Check that every reachable ceiling stays inside
    /// `[initial_backoff_secs, max_backoff_secs]`.
    pub fn validate(&self) -> Result<()> {
        if self.initial_backoff_secs == 0 {
            return Err(RetryError::InvalidArgument(
                "initial_backoff_secs must be at least 1".into(),
            ));
        }
        if self.max_jitter_secs == 0 {
            return Err(RetryError::InvalidArgument(
                "max_jitter_secs must be at least 1".into(),
            ));
        }
        if self.max_backoff_secs < 2 {
            return Err(RetryError::InvalidArgument(
                "max_backoff_secs must be at least 2".into(),
            ));
        }

        let widest_reset = self
            .initial_backoff_secs
            .checked_add(self.max_jitter_secs - 1)
            .ok_or_else(|| RetryError::InvalidArgument("jitter window overflows".into()))?;
        if widest_reset > self.max_backoff_secs {
            return Err(RetryError::InvalidArgument(format!(
                "initial_backoff_secs + max_jitter_secs - 1 ({}) exceeds max_backoff_secs ({})",
                widest_reset, self.max_backoff_secs
            )));
        }
        Ok(())
    }
}

/// Default first-attempt jitter ceiling for deadline backoff, in milliseconds.
pub const DEFAULT_BACKOFF_BASE_MS: u32 = 1_000;

/// Default largest deadline backoff, in milliseconds.
pub const DEFAULT_MAX_BACKOFF_MS: u32 = 10_000;

/// Default attempt limit for deadline backoff.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Parameters of a [`BackoffContext`](crate::retry::BackoffContext).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadlineParams {
    /// Jitter ceiling of the first attempt.
    pub base_ms: u32,
    /// Cap on every delay; also the wraparound detection threshold.
    pub max_backoff_ms: u32,
    /// Attempt limit; `0` never exhausts.
    pub max_attempts: u32,
}

impl Default for DeadlineParams {
    fn default() -> Self {
        Self {
            base_ms: DEFAULT_BACKOFF_BASE_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl DeadlineParams {
    /// Check `1 <= base_ms <= max_backoff_ms`.
    pub fn validate(&self) -> Result<()> {
        if self.base_ms == 0 {
            return Err(RetryError::InvalidArgument(
                "base_ms must be at least 1".into(),
            ));
        }
        if self.base_ms > self.max_backoff_ms {
            return Err(RetryError::InvalidArgument(format!(
                "base_ms ({}) exceeds max_backoff_ms ({})",
                self.base_ms, self.max_backoff_ms
            )));
        }
        Ok(())
    }
}

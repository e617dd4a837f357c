//! The two backoff styles.
//!
//! - [`JitterBackoff`] blocks (or awaits) a randomized, doubling delay and
//!   owns the attempt limit of a [`RetrySession`].
//! - [`BackoffContext`] never blocks: it records a deadline and lets the
//!   caller poll whether it has passed.
//!
//! Both draw their randomness from an injected
//! [`RandomSource`](crate::entropy::RandomSource) and read time from an
//! injected [`Clock`](crate::clock::Clock).

mod deadline;
mod generator;
mod session;

pub use deadline::BackoffContext;
pub use generator::{ExponentialGenerator, NextBackoff};
pub use session::{JitterBackoff, JitterBackoffBuilder, RetrySession};

/// Result of one [`JitterBackoff`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStatus {
    /// The delay elapsed; retry the operation.
    Success,
    /// The attempt limit was reached and the session has been reset.
    RetriesExhausted,
}

/// Result of [`BackoffContext::advance_backoff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffStatus {
    /// A deadline `delay_ms` in the future was recorded.
    Armed {
        /// Chosen delay in milliseconds
        delay_ms: u32,
    },
    /// The attempt limit was reached; the deadline is the current tick.
    RetriesExhausted,
}

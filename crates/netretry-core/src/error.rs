//! Error taxonomy for backoff operations.
//!
//! Retry exhaustion is not an error. It is a terminal status reported
//! through [`RetryStatus`](crate::retry::RetryStatus) and
//! [`BackoffStatus`](crate::retry::BackoffStatus).

use thiserror::Error;

/// Failures reported by a [`RandomSource`](crate::entropy::RandomSource).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntropyError {
    /// The underlying generator reported a failure.
    #[error("entropy source failed: {0}")]
    Source(String),

    /// The source wrote fewer bytes than requested.
    #[error("entropy source wrote {written} of {requested} requested bytes")]
    ShortRead {
        /// Bytes requested by the caller
        requested: usize,
        /// Bytes actually written
        written: usize,
    },

    /// No entropy backend exists for this device.
    #[error("no entropy source available on this device")]
    Unsupported,
}

/// Errors returned by the backoff state machines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetryError {
    /// A parameter or policy value is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The session was used before `reset` established its jitter ceiling.
    #[error("retry session used before reset")]
    SessionNotReset,

    /// A random value could not be produced.
    #[error(transparent)]
    Entropy(#[from] EntropyError),
}

/// Result alias for backoff operations.
pub type Result<T> = std::result::Result<T, RetryError>;

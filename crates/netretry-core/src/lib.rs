#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Backoff state machines for retrying transient failures.
//!
//! This crate decides, after each failed attempt of some operation (a
//! network connect, typically), whether to retry and how long to wait.
//! It does not run the operation, and it does not own a random number
//! generator or a clock: both are injected through narrow traits so the
//! same logic runs on a host, under a simulator, or on a device.
//!
//! - **Blocking jitter backoff** via [`JitterBackoff`](retry::JitterBackoff)
//!   over a caller-owned [`RetrySession`](retry::RetrySession)
//! - **Deadline backoff** via [`BackoffContext`](retry::BackoffContext),
//!   which never blocks
//! - **Bounded random helper** via [`bounded_random`](entropy::bounded_random)
//!
//! # Examples
//!
//! ```rust
//! use netretry_core::prelude::*;
//!
//! struct Fixed;
//!
//! impl RandomSource for Fixed {
//!     fn fill(&self, buf: &mut [u8]) -> Result<usize, EntropyError> {
//!         buf.copy_from_slice(&[2, 0, 3, 0]);
//!         Ok(buf.len())
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let clock = ManualClock::new(0);
//! let backoff = JitterBackoff::builder()
//!     .random_source(Fixed)
//!     .clock(clock.clone())
//!     .build()?;
//!
//! let mut session = RetrySession::new();
//! backoff.reset(&mut session)?;
//! assert_eq!(backoff.backoff_and_sleep(&mut session)?, RetryStatus::Success);
//! # Ok(())
//! # }
//! ```

mod log;

pub mod clock;
pub mod entropy;
pub mod error;
pub mod policy;
pub mod retry;

/// Convenient re-exports of commonly used items.
///
/// ```rust
/// use netretry_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::clock::{AsyncSleep, Clock, ManualClock, TokioSleep};
    pub use crate::entropy::{RandomSource, bounded_random};
    pub use crate::error::{EntropyError, RetryError};
    pub use crate::policy::{DeadlineParams, JitterPolicy};
    pub use crate::retry::{
        BackoffContext, BackoffStatus, ExponentialGenerator, JitterBackoff, NextBackoff,
        RetrySession, RetryStatus,
    };
}

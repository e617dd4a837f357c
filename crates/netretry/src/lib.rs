#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Jittered retry backoff for devices that talk to the network.
//!
//! `netretry` puts the state machines from [`netretry_core`] on a real
//! platform:
//!
//! - **Entropy backends** ([`entropy`]): OS CSPRNG, a once-seeded software
//!   DRBG, a hardware word-RNG adapter and an always-failing stub
//! - **A host clock** ([`clock::SystemClock`]) with a wrapping 32-bit tick
//! - **Configuration** ([`Config`]) from TOML or the environment
//! - **Factories** ([`Platform`]) wiring one shared source and clock into
//!   every campaign
//!
//! # Examples
//!
//! ```rust,no_run
//! use netretry::{Config, Platform};
//! use netretry::retry::{RetrySession, RetryStatus};
//!
//! # fn connect() -> Result<(), std::io::Error> { Ok(()) }
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let platform = Platform::from_config(&config)?;
//! let backoff = platform.jitter_backoff(config.jitter)?;
//!
//! let mut session = RetrySession::new();
//! backoff.reset(&mut session)?;
//! loop {
//!     if connect().is_ok() {
//!         break;
//!     }
//!     if backoff.backoff_and_sleep(&mut session)? == RetryStatus::RetriesExhausted {
//!         return Err("gave up connecting".into());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod entropy;
pub mod platform;
#[cfg(feature = "trace")]
pub mod telemetry;

pub use config::{Config, ConfigError};
pub use platform::Platform;

/// Re-export of the backoff state machines.
pub use netretry_core::retry;

/// Re-export of the collaborator traits.
pub use netretry_core::{clock::Clock, entropy::RandomSource};

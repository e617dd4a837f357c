//! Process-wide collaborators and the factories that hand them to campaigns.

use crate::clock::SystemClock;
use crate::config::{Config, ConfigError};
use netretry_core::clock::Clock;
use netretry_core::entropy::RandomSource;
use netretry_core::policy::{DeadlineParams, JitterPolicy};
use netretry_core::retry::{BackoffContext, JitterBackoff};
use std::fmt;
use std::sync::Arc;

/// One entropy source and one clock, shared by every retry campaign.
///
/// Build it once at start-up; each campaign then gets its own
/// [`RetrySession`](netretry_core::retry::RetrySession) or
/// [`BackoffContext`] backed by the same collaborators.
///
/// # Examples
///
/// ```rust
/// use netretry::{Config, Platform};
/// use netretry::retry::RetrySession;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::from_toml_str("entropy = \"drbg\"\nseed = 7")?;
/// let platform = Platform::from_config(&config)?;
///
/// let backoff = platform.jitter_backoff(config.jitter)?;
/// let mut session = RetrySession::new();
/// backoff.reset(&mut session)?;
///
/// let mut context = platform.backoff_context(config.deadline)?;
/// assert!(!context.is_in_backoff());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Platform {
    random: Arc<dyn RandomSource>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform").finish_non_exhaustive()
    }
}

impl Platform {
    /// Use explicit collaborators.
    pub fn new(random: Arc<dyn RandomSource>, clock: Arc<dyn Clock>) -> Self {
        Self { random, clock }
    }

    /// Validate `config`, start its entropy backend and a [`SystemClock`].
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let random = config.entropy.build(config.seed)?;
        tracing::info!("Using {} entropy backend", config.entropy);
        Ok(Self::new(random, Arc::new(SystemClock::new())))
    }

    /// The shared entropy source.
    pub fn random_source(&self) -> Arc<dyn RandomSource> {
        Arc::clone(&self.random)
    }

    /// The shared clock.
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// A blocking jitter backoff enforcing `policy`.
    pub fn jitter_backoff(&self, policy: JitterPolicy) -> Result<JitterBackoff, ConfigError> {
        Ok(JitterBackoff::builder()
            .policy(policy)
            .shared_random_source(self.random_source())
            .shared_clock(self.clock())
            .build()?)
    }

    /// A deadline backoff context for a new campaign.
    pub fn backoff_context(&self, params: DeadlineParams) -> Result<BackoffContext, ConfigError> {
        Ok(BackoffContext::with_shared(
            params,
            self.random_source(),
            self.clock(),
        )?)
    }
}

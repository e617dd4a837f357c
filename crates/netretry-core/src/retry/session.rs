//! Blocking jitter backoff over a caller-owned [`RetrySession`].

use super::RetryStatus;
use crate::clock::{AsyncSleep, Clock, TokioSleep};
use crate::entropy::{RandomSource, bounded_random};
use crate::error::{Result, RetryError};
use crate::log::{debug, error, info};
use crate::policy::JitterPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Per-campaign state for [`JitterBackoff`].
///
/// A fresh session is *not reset*: its jitter ceiling is zero and
/// [`JitterBackoff::backoff_and_sleep`] refuses it until
/// [`JitterBackoff::reset`] has been called once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySession {
    attempts_done: u32,
    next_jitter_max: u32,
}

impl RetrySession {
    /// Create an un-reset session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Backoff cycles completed in the current campaign.
    pub fn attempts_done(&self) -> u32 {
        self.attempts_done
    }

    /// Exclusive upper bound, in seconds, of the next randomized delay.
    pub fn next_jitter_max(&self) -> u32 {
        self.next_jitter_max
    }

    /// Whether `reset` has established a jitter ceiling.
    pub fn is_reset(&self) -> bool {
        self.next_jitter_max != 0
    }
}

/// What the next backoff call will do.
enum Step {
    Wait { delay_secs: u32 },
    Exhausted,
}

/// Randomized, doubling delay between retries of a failed operation.
///
/// Each call to [`backoff_and_sleep`](Self::backoff_and_sleep) reports one
/// failed attempt. It waits a uniformly random number of whole seconds below
/// the session's jitter ceiling, then doubles the ceiling up to
/// `max_backoff_secs`. The call reporting failure number
/// `max_retry_attempts` does not wait: the session is reset and
/// [`RetryStatus::RetriesExhausted`] is returned. A limit of `0` never
/// exhausts.
///
/// The backoff holds no campaign state itself; every campaign passes its
/// own [`RetrySession`].
///
/// # Examples
///
/// ```rust
/// use netretry_core::clock::ManualClock;
/// use netretry_core::entropy::RandomSource;
/// use netretry_core::error::EntropyError;
/// use netretry_core::retry::{JitterBackoff, RetrySession, RetryStatus};
///
/// struct Counter(std::sync::atomic::AtomicU8);
///
/// impl RandomSource for Counter {
///     fn fill(&self, buf: &mut [u8]) -> Result<usize, EntropyError> {
///         let n = self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
///         buf.fill(n.wrapping_add(1));
///         Ok(buf.len())
///     }
/// }
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let clock = ManualClock::new(0);
/// let backoff = JitterBackoff::builder()
///     .random_source(Counter(Default::default()))
///     .clock(clock.clone())
///     .build()?;
///
/// let mut session = RetrySession::new();
/// backoff.reset(&mut session)?;
///
/// while backoff.backoff_and_sleep(&mut session)? == RetryStatus::Success {
///     // retry the operation here
/// }
/// assert_eq!(session.attempts_done(), 0);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct JitterBackoff {
    policy: JitterPolicy,
    random: Arc<dyn RandomSource>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn AsyncSleep>,
}

impl fmt::Debug for JitterBackoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JitterBackoff")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl JitterBackoff {
    /// Create a builder for configuring the backoff.
    pub fn builder() -> JitterBackoffBuilder {
        JitterBackoffBuilder::default()
    }

    /// The policy this backoff enforces.
    pub fn policy(&self) -> &JitterPolicy {
        &self.policy
    }

    /// Start a new campaign.
    ///
    /// Zeroes the attempt counter and sets the jitter ceiling to
    /// `initial_backoff_secs` plus a random offset below `max_jitter_secs`.
    /// The random value is drawn before the session is touched, so an
    /// entropy failure leaves the session as it was.
    pub fn reset(&self, session: &mut RetrySession) -> Result<()> {
        debug!("Resetting retry session at tick {} ms", self.clock.now_ms());

        let jitter = bounded_random(self.random.as_ref())? % self.policy.max_jitter_secs;
        info!("Calculated jitter value {}", jitter);

        session.attempts_done = 0;
        session.next_jitter_max = self.policy.initial_backoff_secs + jitter;
        info!(
            "Calculated next jitter max value {}",
            session.next_jitter_max
        );
        Ok(())
    }

    /// Block the calling thread for a randomized delay before the next retry.
    ///
    /// Returns [`RetryStatus::Success`] after sleeping, or
    /// [`RetryStatus::RetriesExhausted`] (after resetting the session) once
    /// the attempt limit has been reached.
    ///
    /// # Errors
    ///
    /// - [`RetryError::SessionNotReset`] if `reset` was never called
    /// - [`RetryError::Entropy`] if no random value could be drawn; the
    ///   session is left unmodified
    pub fn backoff_and_sleep(&self, session: &mut RetrySession) -> Result<RetryStatus> {
        match self.plan(session)? {
            Step::Wait { delay_secs } => {
                self.clock.sleep_ms(u64::from(delay_secs) * 1_000);
                self.complete_attempt(session);
                Ok(RetryStatus::Success)
            }
            Step::Exhausted => self.exhaust(session),
        }
    }

    /// Cancellable counterpart of [`backoff_and_sleep`](Self::backoff_and_sleep).
    ///
    /// The wait is awaited instead of blocking. Dropping the future before
    /// the wait completes leaves the session exactly as it was: the attempt
    /// counter and ceiling only change once the wait has finished.
    pub async fn backoff_and_wait(&self, session: &mut RetrySession) -> Result<RetryStatus> {
        match self.plan(session)? {
            Step::Wait { delay_secs } => {
                self.sleeper.sleep_ms(u64::from(delay_secs) * 1_000).await;
                self.complete_attempt(session);
                Ok(RetryStatus::Success)
            }
            Step::Exhausted => self.exhaust(session),
        }
    }

    fn plan(&self, session: &RetrySession) -> Result<Step> {
        if !session.is_reset() {
            error!("Retry session used before reset, refusing to back off");
            return Err(RetryError::SessionNotReset);
        }

        // This call reports failure number `attempts_done + 1`; the one that
        // reaches the limit ends the campaign instead of sleeping.
        let failure = session.attempts_done.saturating_add(1);
        if self.policy.retries_forever() || failure < self.policy.max_retry_attempts {
            let delay_secs = bounded_random(self.random.as_ref())? % session.next_jitter_max;
            info!(
                "Wait for backoff time {} s for the next retry (attempt {})",
                delay_secs, failure
            );
            Ok(Step::Wait { delay_secs })
        } else {
            Ok(Step::Exhausted)
        }
    }

    fn complete_attempt(&self, session: &mut RetrySession) {
        // Saturate so a retry-forever campaign cannot wrap back to zero.
        session.attempts_done = session.attempts_done.saturating_add(1);

        if session.next_jitter_max < self.policy.max_backoff_secs / 2 {
            session.next_jitter_max += session.next_jitter_max;
        } else {
            session.next_jitter_max = self.policy.max_backoff_secs;
        }
    }

    fn exhaust(&self, session: &mut RetrySession) -> Result<RetryStatus> {
        info!("Max retry attempts are exhausted, resetting the retry session");
        self.reset(session)?;
        Ok(RetryStatus::RetriesExhausted)
    }
}

/// Builder for [`JitterBackoff`].
///
/// A random source and a clock are required; the policy defaults to
/// [`JitterPolicy::default`] and async waits default to [`TokioSleep`].
#[derive(Default)]
pub struct JitterBackoffBuilder {
    policy: Option<JitterPolicy>,
    random: Option<Arc<dyn RandomSource>>,
    clock: Option<Arc<dyn Clock>>,
    sleeper: Option<Arc<dyn AsyncSleep>>,
}

impl JitterBackoffBuilder {
    /// Set the attempt limit and jitter bounds.
    pub fn policy(mut self, policy: JitterPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Set the entropy source.
    pub fn random_source(mut self, source: impl RandomSource + 'static) -> Self {
        self.random = Some(Arc::new(source));
        self
    }

    /// Set a shared entropy source.
    pub fn shared_random_source(mut self, source: Arc<dyn RandomSource>) -> Self {
        self.random = Some(source);
        self
    }

    /// Set the clock used for blocking sleeps.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Set a shared clock.
    pub fn shared_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set the waiter used by `backoff_and_wait`.
    pub fn async_sleep(mut self, sleeper: impl AsyncSleep + 'static) -> Self {
        self.sleeper = Some(Arc::new(sleeper));
        self
    }

    /// Build the backoff.
    ///
    /// # Errors
    ///
    /// [`RetryError::InvalidArgument`] if the policy is invalid or a required
    /// collaborator is missing.
    pub fn build(self) -> Result<JitterBackoff> {
        let policy = self.policy.unwrap_or_default();
        policy.validate()?;

        let random = self
            .random
            .ok_or_else(|| RetryError::InvalidArgument("a random source is required".into()))?;
        let clock = self
            .clock
            .ok_or_else(|| RetryError::InvalidArgument("a clock is required".into()))?;

        Ok(JitterBackoff {
            policy,
            random,
            clock,
            sleeper: self.sleeper.unwrap_or_else(|| Arc::new(TokioSleep)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::EntropyError;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Yields `values[i]` as `r0 * 1` so `bounded_random` returns it exactly.
    struct Values {
        values: Mutex<Vec<u16>>,
    }

    impl Values {
        fn new(values: &[u16]) -> Self {
            let mut values = values.to_vec();
            values.reverse();
            Self {
                values: Mutex::new(values),
            }
        }
    }

    impl RandomSource for Values {
        fn fill(&self, buf: &mut [u8]) -> std::result::Result<usize, EntropyError> {
            let v = self.values.lock().unwrap().pop().expect("out of values");
            buf[..2].copy_from_slice(&v.to_le_bytes());
            buf[2..].copy_from_slice(&1u16.to_le_bytes());
            Ok(4)
        }
    }

    /// Fails once `broken` is set.
    struct Flaky {
        broken: AtomicBool,
    }

    impl RandomSource for Flaky {
        fn fill(&self, buf: &mut [u8]) -> std::result::Result<usize, EntropyError> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(EntropyError::Source("rng fault".into()));
            }
            buf.copy_from_slice(&[7, 0, 1, 0]);
            Ok(4)
        }
    }

    fn backoff(values: &[u16], clock: &ManualClock) -> JitterBackoff {
        JitterBackoff::builder()
            .random_source(Values::new(values))
            .clock(clock.clone())
            .build()
            .unwrap()
    }

    #[test]
    fn test_reset_adds_jitter_to_initial_backoff() {
        let clock = ManualClock::new(0);
        // 7 % 5 = 2
        let backoff = backoff(&[7], &clock);
        let mut session = RetrySession::new();

        backoff.reset(&mut session).unwrap();

        assert_eq!(session.attempts_done(), 0);
        assert_eq!(session.next_jitter_max(), 3);
    }

    #[test]
    fn test_concrete_campaign() {
        let clock = ManualClock::new(0);
        // reset: 2 % 5 = 2 -> ceiling 3
        // sleeps: 5 % 3 = 2, 8 % 6 = 2, 13 % 12 = 1
        // exhaustion reset: 4 % 5 = 4 -> ceiling 5
        let backoff = backoff(&[2, 5, 8, 13, 4], &clock);
        let mut session = RetrySession::new();
        backoff.reset(&mut session).unwrap();
        assert_eq!(session.next_jitter_max(), 3);

        assert_eq!(
            backoff.backoff_and_sleep(&mut session).unwrap(),
            RetryStatus::Success
        );
        assert_eq!(session.attempts_done(), 1);
        assert_eq!(session.next_jitter_max(), 6);
        assert_eq!(clock.slept_ms(), 2_000);

        assert_eq!(
            backoff.backoff_and_sleep(&mut session).unwrap(),
            RetryStatus::Success
        );
        assert_eq!(session.next_jitter_max(), 12);

        assert_eq!(
            backoff.backoff_and_sleep(&mut session).unwrap(),
            RetryStatus::Success
        );
        assert_eq!(session.attempts_done(), 3);
        assert_eq!(session.next_jitter_max(), 24);
        assert_eq!(clock.slept_ms(), 5_000);

        // Fourth failure reaches the limit: no sleep, fresh campaign.
        assert_eq!(
            backoff.backoff_and_sleep(&mut session).unwrap(),
            RetryStatus::RetriesExhausted
        );
        assert_eq!(session.attempts_done(), 0);
        assert_eq!(session.next_jitter_max(), 5);
        assert_eq!(clock.sleep_count(), 3);
    }

    #[test]
    fn test_ceiling_clamps_at_max_backoff() {
        let clock = ManualClock::new(0);
        let policy = JitterPolicy {
            max_retry_attempts: 0,
            initial_backoff_secs: 5,
            max_backoff_secs: 16,
            max_jitter_secs: 1,
        };
        let backoff = JitterBackoff::builder()
            .policy(policy)
            .random_source(Values::new(&[1, 1, 1, 1, 1]))
            .clock(clock.clone())
            .build()
            .unwrap();
        let mut session = RetrySession::new();
        backoff.reset(&mut session).unwrap();
        assert_eq!(session.next_jitter_max(), 5);

        backoff.backoff_and_sleep(&mut session).unwrap();
        // 5 < 8 doubles
        assert_eq!(session.next_jitter_max(), 10);
        backoff.backoff_and_sleep(&mut session).unwrap();
        // 10 >= 8 clamps
        assert_eq!(session.next_jitter_max(), 16);
        backoff.backoff_and_sleep(&mut session).unwrap();
        assert_eq!(session.next_jitter_max(), 16);
    }

    #[test]
    fn test_unreset_session_is_rejected() {
        let clock = ManualClock::new(0);
        let backoff = backoff(&[], &clock);
        let mut session = RetrySession::new();

        assert_eq!(
            backoff.backoff_and_sleep(&mut session),
            Err(RetryError::SessionNotReset)
        );
        assert_eq!(session, RetrySession::new());
        assert_eq!(clock.sleep_count(), 0);
    }

    #[test]
    fn test_entropy_failure_leaves_session_untouched() {
        let clock = ManualClock::new(0);
        let source = Arc::new(Flaky {
            broken: AtomicBool::new(false),
        });
        let backoff = JitterBackoff::builder()
            .shared_random_source(source.clone())
            .clock(clock.clone())
            .build()
            .unwrap();
        let mut session = RetrySession::new();
        backoff.reset(&mut session).unwrap();
        let before = session;

        source.broken.store(true, Ordering::SeqCst);

        assert!(matches!(
            backoff.backoff_and_sleep(&mut session),
            Err(RetryError::Entropy(EntropyError::Source(_)))
        ));
        assert!(matches!(
            backoff.reset(&mut session),
            Err(RetryError::Entropy(_))
        ));
        assert_eq!(session, before);
        assert_eq!(clock.sleep_count(), 0);
    }

    #[test]
    fn test_builder_requires_collaborators() {
        let err = JitterBackoff::builder()
            .clock(ManualClock::new(0))
            .build()
            .unwrap_err();
        assert!(matches!(err, RetryError::InvalidArgument(_)));

        let err = JitterBackoff::builder()
            .random_source(Values::new(&[]))
            .build()
            .unwrap_err();
        assert!(matches!(err, RetryError::InvalidArgument(_)));
    }

    #[test]
    fn test_builder_validates_policy() {
        let err = JitterBackoff::builder()
            .policy(JitterPolicy {
                max_jitter_secs: 0,
                ..Default::default()
            })
            .random_source(Values::new(&[]))
            .clock(ManualClock::new(0))
            .build()
            .unwrap_err();
        assert!(matches!(err, RetryError::InvalidArgument(_)));
    }
}

//! End-to-end retry campaigns on platform collaborators.

use netretry::entropy::{DrbgEntropy, EntropyBackend, WordEntropy};
use netretry::retry::{BackoffStatus, RetrySession, RetryStatus};
use netretry::{Config, Platform};
use netretry_core::clock::ManualClock;
use netretry_core::policy::{DeadlineParams, JitterPolicy};
use std::sync::Arc;

fn simulated(seed: u64) -> (Platform, ManualClock) {
    let clock = ManualClock::new(0);
    let platform = Platform::new(Arc::new(DrbgEntropy::from_seed(seed)), Arc::new(clock.clone()));
    (platform, clock)
}

#[test]
fn test_connect_succeeds_after_two_failures() {
    let (platform, clock) = simulated(17);
    let backoff = platform.jitter_backoff(JitterPolicy::default()).unwrap();
    let mut session = RetrySession::new();
    backoff.reset(&mut session).unwrap();

    let mut failures = 0;
    let connected = loop {
        if failures == 2 {
            break true;
        }
        failures += 1;
        if backoff.backoff_and_sleep(&mut session).unwrap() == RetryStatus::RetriesExhausted {
            break false;
        }
    };

    assert!(connected);
    assert_eq!(session.attempts_done(), 2);
    assert_eq!(clock.sleep_count(), 2);
}

#[test]
fn test_unreachable_host_gives_up_and_restarts() {
    let (platform, clock) = simulated(23);
    let backoff = platform.jitter_backoff(JitterPolicy::default()).unwrap();
    let mut session = RetrySession::new();
    backoff.reset(&mut session).unwrap();

    let mut calls = 0;
    while backoff.backoff_and_sleep(&mut session).unwrap() == RetryStatus::Success {
        calls += 1;
    }
    assert_eq!(calls, 3);
    assert_eq!(session.attempts_done(), 0);

    // Longest possible campaign: ceilings 5, 10, 20 seconds, each delay below its ceiling.
    assert!(clock.slept_ms() < 35_000);

    // The caller restarts the campaign.
    assert_eq!(
        backoff.backoff_and_sleep(&mut session).unwrap(),
        RetryStatus::Success
    );
}

#[test]
fn test_event_loop_polls_deadline() {
    let (platform, clock) = simulated(31);
    let mut context = platform
        .backoff_context(DeadlineParams {
            base_ms: 100,
            max_backoff_ms: 1_600,
            max_attempts: 6,
        })
        .unwrap();

    let mut attempts = 0;
    let mut ticks = 0;
    loop {
        // Scheduler tick: only attempt once the deadline has passed.
        if context.is_in_backoff() {
            clock.advance(10);
            ticks += 1;
            continue;
        }

        attempts += 1;
        match context.advance_backoff().unwrap() {
            BackoffStatus::Armed { delay_ms } => assert!(delay_ms <= 1_600),
            BackoffStatus::RetriesExhausted => break,
        }
    }

    assert_eq!(attempts, 6);
    // 100 + 200 + 400 + 800 + 1600 ms at most, in 10 ms ticks
    assert!(ticks <= 310);
}

#[test]
fn test_hardware_word_source_drives_backoff() {
    let clock = ManualClock::new(0);
    let platform = Platform::new(
        Arc::new(WordEntropy::new(|| 0x0001_0003)),
        Arc::new(clock.clone()),
    );
    let backoff = platform.jitter_backoff(JitterPolicy::default()).unwrap();
    let mut session = RetrySession::new();

    // r0 = 3, r1 = 1: jitter 3 % 5 = 3, ceiling 4, delay 3 % 4 = 3 s
    backoff.reset(&mut session).unwrap();
    assert_eq!(session.next_jitter_max(), 4);
    backoff.backoff_and_sleep(&mut session).unwrap();
    assert_eq!(clock.slept_ms(), 3_000);
}

#[test]
fn test_platform_from_seeded_config_is_reproducible() {
    let config = Config {
        entropy: EntropyBackend::Drbg,
        seed: Some(2024),
        ..Default::default()
    };

    let ceilings: Vec<u32> = (0..2)
        .map(|_| {
            let platform = Platform::from_config(&config).unwrap();
            let backoff = platform.jitter_backoff(config.jitter).unwrap();
            let mut session = RetrySession::new();
            backoff.reset(&mut session).unwrap();
            session.next_jitter_max()
        })
        .collect();

    assert_eq!(ceilings[0], ceilings[1]);
}

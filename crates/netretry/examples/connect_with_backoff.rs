//! Retry a flaky TCP connect with both backoff styles.
//!
//! Run with: `NETRETRY_LOG=debug cargo run --example connect_with_backoff --features trace`

use anyhow::{Context, Result, bail};
use netretry::retry::{BackoffStatus, RetrySession, RetryStatus};
use netretry::telemetry::init_tracing;
use netretry::{Config, Platform};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

// discard port; nothing usually listens here
const TARGET: ([u8; 4], u16) = ([127, 0, 0, 1], 9);

fn try_connect() -> std::io::Result<TcpStream> {
    TcpStream::connect_timeout(&SocketAddr::from(TARGET), Duration::from_millis(200))
}

fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env().context("load configuration")?;
    let platform = Platform::from_config(&config).context("start platform")?;

    // Blocking style: sleep between attempts.
    let backoff = platform.jitter_backoff(config.jitter)?;
    let mut session = RetrySession::new();
    backoff.reset(&mut session)?;
    loop {
        match try_connect() {
            Ok(_) => {
                println!("connected to {}", SocketAddr::from(TARGET));
                return Ok(());
            }
            Err(err) => println!("connect failed: {}", err),
        }
        if backoff.backoff_and_sleep(&mut session)? == RetryStatus::RetriesExhausted {
            println!("blocking backoff exhausted, switching to polling");
            break;
        }
    }

    // Polling style: a loop that must not stall checks the deadline.
    let mut context = platform.backoff_context(config.deadline)?;
    loop {
        if context.is_in_backoff() {
            // other work would run here
            std::thread::sleep(Duration::from_millis(50));
            continue;
        }
        if try_connect().is_ok() {
            println!("connected to {}", SocketAddr::from(TARGET));
            return Ok(());
        }
        if context.advance_backoff()? == BackoffStatus::RetriesExhausted {
            bail!("could not reach {}", SocketAddr::from(TARGET));
        }
    }
}

//! Logging bootstrap.

use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "NETRETRY_LOG";

/// Install a stderr `fmt` subscriber filtered by `NETRETRY_LOG`
/// (default `info`).
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

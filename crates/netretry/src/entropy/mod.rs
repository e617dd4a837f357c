//! Entropy backends for [`RandomSource`].
//!
//! Exactly one backend is chosen per process, at start-up, through
//! [`EntropyBackend::build`]. Campaigns share it via `Arc`.

mod drbg;
mod os;
mod unsupported;
mod word;

pub use drbg::DrbgEntropy;
pub use os::OsEntropy;
pub use unsupported::UnsupportedEntropy;
pub use word::WordEntropy;

use netretry_core::entropy::RandomSource;
use netretry_core::error::EntropyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Which [`RandomSource`] a process uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntropyBackend {
    /// Operating system CSPRNG.
    #[default]
    Os,
    /// Software DRBG seeded once at start-up.
    Drbg,
    /// No entropy available; every request fails.
    Unsupported,
}

impl EntropyBackend {
    /// Instantiate the backend.
    ///
    /// `seed` only affects [`EntropyBackend::Drbg`]: with a seed the stream is
    /// reproducible, without one the DRBG is seeded from the OS.
    pub fn build(self, seed: Option<u64>) -> Result<Arc<dyn RandomSource>, EntropyError> {
        let source: Arc<dyn RandomSource> = match self {
            EntropyBackend::Os => Arc::new(OsEntropy),
            EntropyBackend::Drbg => match seed {
                Some(seed) => Arc::new(DrbgEntropy::from_seed(seed)),
                None => Arc::new(DrbgEntropy::from_os()?),
            },
            EntropyBackend::Unsupported => Arc::new(UnsupportedEntropy),
        };
        Ok(source)
    }
}

impl fmt::Display for EntropyBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntropyBackend::Os => "os",
            EntropyBackend::Drbg => "drbg",
            EntropyBackend::Unsupported => "unsupported",
        })
    }
}

impl FromStr for EntropyBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "os" => Ok(EntropyBackend::Os),
            "drbg" => Ok(EntropyBackend::Drbg),
            "unsupported" | "none" => Ok(EntropyBackend::Unsupported),
            other => Err(format!("unknown entropy backend '{}'", other)),
        }
    }
}

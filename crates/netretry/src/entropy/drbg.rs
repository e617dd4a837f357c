use super::OsEntropy;
use netretry_core::entropy::RandomSource;
use netretry_core::error::EntropyError;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::sync::Mutex;

/// Software deterministic random bit generator.
///
/// Seeded exactly once, at construction. Retry campaigns never reseed it,
/// so resetting a session does not rewind the stream.
#[derive(Debug)]
pub struct DrbgEntropy {
    rng: Mutex<StdRng>,
}

impl DrbgEntropy {
    /// A reproducible generator.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// A generator seeded from the operating system.
    pub fn from_os() -> Result<Self, EntropyError> {
        let mut seed = <StdRng as SeedableRng>::Seed::default();
        OsEntropy.fill(&mut seed)?;
        Ok(Self {
            rng: Mutex::new(StdRng::from_seed(seed)),
        })
    }
}

impl RandomSource for DrbgEntropy {
    fn fill(&self, buf: &mut [u8]) -> Result<usize, EntropyError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| EntropyError::Source("DRBG state poisoned".into()))?;
        rng.fill_bytes(buf);
        Ok(buf.len())
    }
}

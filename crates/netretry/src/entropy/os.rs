use netretry_core::entropy::RandomSource;
use netretry_core::error::EntropyError;
use rand::RngCore;
use rand::rngs::OsRng;

/// Entropy from the operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl RandomSource for OsEntropy {
    fn fill(&self, buf: &mut [u8]) -> Result<usize, EntropyError> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| EntropyError::Source(e.to_string()))?;
        Ok(buf.len())
    }
}

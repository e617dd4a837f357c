use netretry_core::entropy::RandomSource;
use netretry_core::error::EntropyError;

/// Stand-in for devices without any entropy source. Always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedEntropy;

impl RandomSource for UnsupportedEntropy {
    fn fill(&self, _buf: &mut [u8]) -> Result<usize, EntropyError> {
        tracing::debug!("device not supported");
        Err(EntropyError::Unsupported)
    }
}

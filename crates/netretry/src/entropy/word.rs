use netretry_core::entropy::RandomSource;
use netretry_core::error::EntropyError;
use std::fmt;

/// Adapts a word-at-a-time hardware RNG to the byte-oriented contract.
///
/// `read` is called once per four bytes; a short tail uses the low bytes of
/// the last word.
///
/// # Examples
///
/// ```rust
/// use netretry::entropy::WordEntropy;
/// use netretry_core::entropy::RandomSource;
///
/// let trng = WordEntropy::new(|| 0x0403_0201);
/// let mut buf = [0u8; 6];
/// trng.fill(&mut buf).unwrap();
/// assert_eq!(buf, [1, 2, 3, 4, 1, 2]);
/// ```
pub struct WordEntropy<F> {
    read: F,
}

impl<F> WordEntropy<F>
where
    F: Fn() -> u32 + Send + Sync,
{
    /// Wrap a register read.
    pub fn new(read: F) -> Self {
        Self { read }
    }
}

impl<F> fmt::Debug for WordEntropy<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordEntropy").finish_non_exhaustive()
    }
}

impl<F> RandomSource for WordEntropy<F>
where
    F: Fn() -> u32 + Send + Sync,
{
    fn fill(&self, buf: &mut [u8]) -> Result<usize, EntropyError> {
        for chunk in buf.chunks_mut(4) {
            let word = (self.read)().to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
        Ok(buf.len())
    }
}

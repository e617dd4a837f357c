//! Random source contract and the bounded random helper built on it.

use crate::error::EntropyError;

/// Exclusive upper bound of [`bounded_random`].
pub const RANDOM_MODULUS: u32 = 9_999_999;

/// A device entropy source.
///
/// Implementations fill `buf` and return the number of bytes written.
/// Failure must be reported as an error, never by silently zero-filling.
/// Sources are shared across retry campaigns, so they must be safe for
/// concurrent use.
pub trait RandomSource: Send + Sync {
    /// Fill `buf` with random bytes.
    fn fill(&self, buf: &mut [u8]) -> Result<usize, EntropyError>;
}

impl<T: RandomSource + ?Sized> RandomSource for std::sync::Arc<T> {
    fn fill(&self, buf: &mut [u8]) -> Result<usize, EntropyError> {
        (**self).fill(buf)
    }
}

impl<T: RandomSource + ?Sized> RandomSource for &T {
    fn fill(&self, buf: &mut [u8]) -> Result<usize, EntropyError> {
        (**self).fill(buf)
    }
}

/// Produce a non-zero pseudo-random value in `[1, RANDOM_MODULUS)`.
///
/// Each round draws four bytes, reads them as two little-endian `u16`
/// samples and reduces their product modulo [`RANDOM_MODULUS`]. A zero
/// result is discarded and the source is asked again, so a source that
/// keeps producing zero bytes without failing will spin here.
///
/// A failing source aborts immediately with its error.
///
/// # Examples
///
/// ```rust
/// use netretry_core::entropy::{bounded_random, RandomSource, RANDOM_MODULUS};
/// use netretry_core::error::EntropyError;
///
/// struct Fixed;
///
/// impl RandomSource for Fixed {
///     fn fill(&self, buf: &mut [u8]) -> Result<usize, EntropyError> {
///         buf.copy_from_slice(&[3, 0, 7, 0]);
///         Ok(buf.len())
///     }
/// }
///
/// assert_eq!(bounded_random(&Fixed).unwrap(), 21);
/// assert!(21 < RANDOM_MODULUS);
/// ```
pub fn bounded_random(source: &dyn RandomSource) -> Result<u32, EntropyError> {
    let mut bytes = [0u8; 4];
    loop {
        let written = source.fill(&mut bytes)?;
        if written < bytes.len() {
            return Err(EntropyError::ShortRead {
                requested: bytes.len(),
                written,
            });
        }

        let r0 = u16::from_le_bytes([bytes[0], bytes[1]]) as u32;
        let r1 = u16::from_le_bytes([bytes[2], bytes[3]]) as u32;

        // u16 * u16 always fits in u32
        let value = (r0 * r1) % RANDOM_MODULUS;
        if value != 0 {
            return Ok(value);
        }
    }
}

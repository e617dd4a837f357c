//! Shared fixtures for netretry-core integration tests.

#![allow(dead_code)]

use netretry_core::entropy::RandomSource;
use netretry_core::error::EntropyError;
use std::sync::Mutex;

/// Deterministic xorshift byte stream.
pub struct XorShift {
    state: Mutex<u64>,
}

impl XorShift {
    pub fn new(seed: u64) -> Self {
        Self {
            // xorshift is stuck at zero
            state: Mutex::new(seed | 1),
        }
    }
}

impl RandomSource for XorShift {
    fn fill(&self, buf: &mut [u8]) -> Result<usize, EntropyError> {
        let mut state = self.state.lock().unwrap();
        for chunk in buf.chunks_mut(8) {
            *state ^= *state << 13;
            *state ^= *state >> 7;
            *state ^= *state << 17;
            let bytes = state.to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
        Ok(buf.len())
    }
}

/// Makes `bounded_random` return exactly `value` (which must be non-zero).
pub struct Constant(pub u16);

impl RandomSource for Constant {
    fn fill(&self, buf: &mut [u8]) -> Result<usize, EntropyError> {
        buf[..2].copy_from_slice(&self.0.to_le_bytes());
        buf[2..4].copy_from_slice(&1u16.to_le_bytes());
        Ok(4)
    }
}

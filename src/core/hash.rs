//! Map Hashing
//!
//! SHA-256 digest of the active window. Two generators fed the same seed and
//! the same player path must hash identically; replay tests and the demo
//! binary compare these digests.

use sha2::{Sha256, Digest};
use super::fixed::Fixed;
use super::vec2::FixedVec2;

/// Hash output type (256 bits / 32 bytes)
pub type MapHash = [u8; 32];

/// Incremental hasher over map state. Update order is part of the hash.
pub struct MapHasher {
    hasher: Sha256,
}

impl MapHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Hasher for the active lane window.
    pub fn for_window() -> Self {
        Self::new(b"CROSSING_LANES_WINDOW_V1")
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an i32 value (little-endian).
    #[inline]
    pub fn update_i32(&mut self, value: i32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a Fixed value.
    #[inline]
    pub fn update_fixed(&mut self, value: Fixed) {
        self.update_i32(value);
    }

    /// Update with a FixedVec2.
    #[inline]
    pub fn update_vec2(&mut self, value: FixedVec2) {
        self.update_fixed(value.x);
        self.update_fixed(value.y);
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with a packed boolean mask, eight tiles per byte.
    pub fn update_mask(&mut self, mask: &[bool]) {
        self.update_u32(mask.len() as u32);
        for chunk in mask.chunks(8) {
            let byte = chunk
                .iter()
                .enumerate()
                .fold(0u8, |acc, (bit, &set)| acc | ((set as u8) << bit));
            self.update_u8(byte);
        }
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> MapHash {
        self.hasher.finalize().into()
    }
}

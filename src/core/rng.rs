//! Deterministic Random Number Generator
//!
//! Xorshift128+ seeded through SplitMix64. Every random decision the map
//! generator makes (lane counts, set transitions, obstacles, item spacing)
//! draws from one of these, so a seed fully determines a run.

use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};

/// Denominator for probabilities expressed in permille.
pub const PERMILLE: u32 = 1000;

/// Deterministic PRNG using Xorshift128+.
///
/// ```
/// use crossing_lanes::core::rng::DeterministicRng;
///
/// let mut rng = DeterministicRng::new(12345);
/// assert_eq!(rng.next_u64(), 6233086606872742541);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: [u64; 2],
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicRng {
    /// Create a new RNG from a 64-bit seed.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // All-zero state would lock the generator at zero
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { state }
    }

    /// Create the RNG for one run of a given skin.
    pub fn for_run(base_seed: u64, run_index: u32, skin: &str) -> Self {
        Self::new(derive_run_seed(base_seed, run_index, skin))
    }

    /// Generate the next 64-bit random value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);

        result
    }

    /// Generate a random integer in `[0, max)`. Returns 0 when `max == 0`.
    #[inline]
    pub fn next_int(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        (self.next_u64() % max as u64) as u32
    }

    /// Generate a random integer in `[min, max]` (both inclusive).
    #[inline]
    pub fn next_int_range(&mut self, min: i32, max: i32) -> i32 {
        if min >= max {
            return min;
        }
        let range = (max as i64 - min as i64 + 1) as u32;
        min.wrapping_add(self.next_int(range) as i32)
    }

    /// Draw a uniform value in `[0, PERMILLE)`.
    #[inline]
    pub fn next_permille(&mut self) -> u32 {
        self.next_int(PERMILLE)
    }

    /// True with probability `chance / 1000`.
    ///
    /// `0` never fires and anything `>= 1000` always fires.
    #[inline]
    pub fn chance(&mut self, chance: u32) -> bool {
        self.next_permille() < chance
    }

    /// Fair coin flip.
    #[inline]
    pub fn coin_flip(&mut self) -> bool {
        self.next_u64() >> 63 == 1
    }

    /// Select a random element from a slice.
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        if slice.is_empty() {
            None
        } else {
            let idx = self.next_int(slice.len() as u32) as usize;
            slice.get(idx)
        }
    }

    /// Current state, folded into the map hash.
    pub fn state(&self) -> [u64; 2] {
        self.state
    }
}

/// SplitMix64 step, used only to expand the seed.
#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Derive the seed for one run.
///
/// Runs of the same profile get unrelated sequences even when their run
/// indices are adjacent, and switching skin reshuffles the map.
pub fn derive_run_seed(base_seed: u64, run_index: u32, skin: &str) -> u64 {
    let mut hasher = Sha256::new();

    hasher.update(b"CROSSING_LANES_RUN_V1");
    hasher.update(base_seed.to_le_bytes());
    hasher.update(run_index.to_le_bytes());
    hasher.update(skin.as_bytes());

    let hash = hasher.finalize();

    let mut seed = [0u8; 8];
    seed.copy_from_slice(&hash[0..8]);
    u64::from_le_bytes(seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_determinism() {
        let mut rng1 = DeterministicRng::new(12345);
        let mut rng2 = DeterministicRng::new(12345);

        for _ in 0..1000 {
            assert_eq!(rng1.next_u64(), rng2.next_u64());
        }
    }

    #[test]
    fn test_rng_known_values() {
        // Recorded maps depend on this exact sequence.
        let mut rng = DeterministicRng::new(42);
        assert_eq!(rng.next_u64(), 16629283624882167704);
        assert_eq!(rng.next_u64(), 1420492921613871959);
        assert_eq!(rng.next_u64(), 9768315062676884790);
    }

    #[test]
    fn test_next_int_range_inclusive() {
        let mut rng = DeterministicRng::new(5678);
        let mut seen_min = false;
        let mut seen_max = false;

        for _ in 0..2000 {
            let val = rng.next_int_range(2, 4);
            assert!((2..=4).contains(&val));
            seen_min |= val == 2;
            seen_max |= val == 4;
        }

        assert!(seen_min && seen_max);
        assert_eq!(rng.next_int_range(5, 5), 5);
        assert_eq!(rng.next_int_range(9, 3), 9);
    }

    #[test]
    fn test_chance_edges() {
        let mut rng = DeterministicRng::new(99);
        for _ in 0..500 {
            assert!(!rng.chance(0));
            assert!(rng.chance(PERMILLE));
        }
    }

    #[test]
    fn test_choose() {
        let mut rng = DeterministicRng::new(3);
        let empty: [u8; 0] = [];
        assert!(rng.choose(&empty).is_none());

        let items = [10, 20, 30];
        for _ in 0..100 {
            let picked = rng.choose(&items).copied();
            assert!(matches!(picked, Some(10 | 20 | 30)));
        }
    }

    #[test]
    fn test_derive_run_seed() {
        let a = derive_run_seed(7, 0, "classic");
        assert_eq!(a, derive_run_seed(7, 0, "classic"));
        assert_ne!(a, derive_run_seed(7, 1, "classic"));
        assert_ne!(a, derive_run_seed(7, 0, "winter"));
    }

    #[test]
    fn test_state_tracks_position() {
        let mut a = DeterministicRng::new(5555);
        let mut b = DeterministicRng::new(5555);
        for _ in 0..50 {
            a.next_u64();
            b.next_u64();
        }
        assert_eq!(a.state(), b.state());

        a.next_u64();
        assert_ne!(a.state(), b.state());
        b.next_u64();
        assert_eq!(a.state(), b.state());
    }
}

//! Core deterministic primitives.
//!
//! Fixed-point positions, the seeded RNG and map hashing. Nothing in here
//! knows about lanes.

pub mod fixed;
pub mod vec2;
pub mod rng;
pub mod hash;

// Re-export core types
pub use fixed::{Fixed, FIXED_ONE, FIXED_HALF, TILE_SIZE};
pub use vec2::{FixedVec2, TileCoord};
pub use rng::DeterministicRng;
pub use hash::{MapHash, MapHasher};

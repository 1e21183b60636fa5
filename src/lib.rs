//! # Crossing Lanes
//!
//! Deterministic endless lane generator for cross-the-road games.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      CROSSING LANES                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── fixed.rs    - Q16.16 fixed-point arithmetic             │
//! │  ├── vec2.rs     - World positions and tile coordinates      │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - Map hashing for replay checks             │
//! │                                                              │
//! │  map/            - Lane generation                           │
//! │  ├── pool.rs     - Fixed-capacity lane and item pools        │
//! │  ├── lane.rs     - Lane activation and connectivity          │
//! │  ├── item.rs     - Obstacles, platforms, vehicles, coins     │
//! │  ├── lane_set.rs - Lane runs and their lengths               │
//! │  ├── transition.rs - Which run follows which                 │
//! │  ├── manager.rs  - Sliding window around the character       │
//! │  ├── query.rs    - Passability and platform lookups          │
//! │  └── sinks.rs    - Score, audio and camera notifications     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! Generation is **100% deterministic**:
//! - No floating-point arithmetic in generation logic
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies
//! - All randomness from seeded Xorshift128+
//!
//! Given the same config, skin, run and character path, two generators
//! produce the same lanes and the same [`MapManager::map_hash`].
//!
//! Positions are Q16.16, so the map ends at row [`MAX_TILE`](crate::core::vec2::MAX_TILE)
//! (32767). Tiles past it clamp to the last row.
//!
//! ## Usage
//!
//! ```
//! use crossing_lanes::{FixedVec2, MapConfig, MapManager, MapSinks};
//! use crossing_lanes::map::DefaultCatalog;
//!
//! let mut map = MapManager::new(MapConfig::default(), Box::new(DefaultCatalog), MapSinks::default())?;
//! map.initialize_character_reference(FixedVec2::ZERO);
//! map.activate_map();
//!
//! let result = map.update(FixedVec2::from_ints(0, 1));
//! assert_eq!(result.rows_reached().collect::<Vec<_>>(), vec![1]);
//! # Ok::<(), crossing_lanes::MapError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod map;

// Re-export commonly used types
pub use core::fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE, TICK_DURATION};
pub use core::vec2::{FixedVec2, TileCoord};
pub use core::rng::DeterministicRng;
pub use map::{MapConfig, MapError, MapEvent, MapManager, MapSinks, UpdateResult};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;

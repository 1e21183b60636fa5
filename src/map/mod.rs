//! Lane generation.
//!
//! Leaves first: pools and lanes, then lane sets, then the window manager
//! that drives them.

pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod item;
pub mod lane;
pub mod lane_set;
pub mod manager;
pub mod pool;
pub mod query;
pub mod sinks;
pub mod transition;

// Re-export the manager surface
pub use catalog::{AssetId, DefaultCatalog, MapSkin, SharedEffect, SkinCatalog};
pub use config::{LaneTuning, MapConfig};
pub use error::MapError;
pub use events::{MapEvent, UpdateResult};
pub use item::{ItemCategory, ItemKind};
pub use lane::{Direction, Lane, LaneResource, LaneType};
pub use lane_set::{LaneSet, LaneSetKind};
pub use manager::{LaneSetRecord, MapManager, MapPhase};
pub use query::JumpTarget;
pub use sinks::{AmbientCue, AudioCueSink, CameraSink, DeathCause, FocusBehavior, FocusRequest, MapSinks, ScoreSink};

//! Map construction errors.
//!
//! Generation itself cannot fail; only tuning data can be wrong.

use crate::map::lane::LaneResource;
use crate::map::item::ItemKind;

/// Errors raised while validating configuration or building pools.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// The active window cannot hold any lanes.
    #[error("active lane count must be at least 2, got {0}")]
    WindowTooSmall(usize),

    /// The lookahead does not fit inside the window.
    #[error("min rows ahead ({min_rows_ahead}) must be smaller than the active lane count ({active_lane_count})")]
    LookaheadExceedsWindow {
        /// Configured lookahead.
        min_rows_ahead: u32,
        /// Configured window size.
        active_lane_count: usize,
    },

    /// The character start row leaves no room behind it in the window.
    #[error("start row {start_row} puts {rows_behind} rows behind the character, window holds {active_lane_count}")]
    StartRowOutsideWindow {
        /// Configured start row.
        start_row: i32,
        /// Rows the beginning set must cover behind the character.
        rows_behind: u32,
        /// Configured window size.
        active_lane_count: usize,
    },

    /// Lanes need at least one playable column.
    #[error("lane width must be between 1 and {max}, got {width}")]
    InvalidLaneWidth {
        /// Configured playable width.
        width: usize,
        /// Largest supported width.
        max: usize,
    },

    /// A probability is outside `0..=1000` permille.
    #[error("{name} must be a permille value (0..=1000), got {value}")]
    InvalidChance {
        /// Config field name.
        name: &'static str,
        /// Value found.
        value: u32,
    },

    /// A per-lane item limit is below what generation always spawns.
    #[error("{name} must be at least {min}, got {value}")]
    InvalidItemLimit {
        /// Config field name.
        name: &'static str,
        /// Value found.
        value: u32,
        /// Smallest accepted value.
        min: u32,
    },

    /// A lane pool override is below the derived minimum.
    #[error("lane pool {resource:?} capacity {capacity} is below the required {required}")]
    LanePoolTooSmall {
        /// Resource whose pool is undersized.
        resource: LaneResource,
        /// Configured capacity.
        capacity: usize,
        /// Derived minimum.
        required: usize,
    },

    /// An item pool override is below the derived minimum.
    #[error("item pool {kind:?} capacity {capacity} is below the required {required}")]
    ItemPoolTooSmall {
        /// Item kind whose pool is undersized.
        kind: ItemKind,
        /// Configured capacity.
        capacity: usize,
        /// Derived minimum.
        required: usize,
    },

    /// Config file could not be parsed.
    #[error("invalid map config: {0}")]
    Parse(#[from] serde_json::Error),
}

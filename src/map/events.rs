//! Map Events
//!
//! Everything a mutating call changed, returned to the caller instead of
//! being broadcast.

use serde::{Serialize, Deserialize};

use crate::map::catalog::MapSkin;
use crate::map::lane::LaneResource;
use crate::map::lane_set::LaneSetKind;

/// Something that happened to the map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapEvent {
    /// A new lane set took over generation
    LaneSetStarted {
        kind: LaneSetKind,
        start_row: i32,
        target_count: u32,
    },

    /// A lane entered the window
    LaneActivated {
        row: i32,
        resource: LaneResource,
    },

    /// A lane left the window
    LaneDeactivated {
        row: i32,
    },

    /// The character reached a row it had not reached before
    RowReached {
        row: i32,
    },

    /// A coin was picked up
    CoinCollected {
        row: i32,
        column: i32,
        total: u32,
    },

    /// Pools were rebuilt for a new skin
    SkinChanged {
        skin: MapSkin,
    },
}

/// Result of a window update.
#[derive(Debug, Default)]
pub struct UpdateResult {
    /// Events in the order they happened
    pub events: Vec<MapEvent>,
    /// Lanes created during this update
    pub lanes_created: u32,
}

impl UpdateResult {
    /// Rows newly reached during this update.
    pub fn rows_reached(&self) -> impl Iterator<Item = i32> + '_ {
        self.events.iter().filter_map(|event| match event {
            MapEvent::RowReached { row } => Some(*row),
            _ => None,
        })
    }
}

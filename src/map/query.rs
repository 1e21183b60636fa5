//! Window queries used by character movement.
//!
//! All lookups go through the active window; rows outside it, or too far
//! behind the character's best row, answer as blocked.

use serde::{Serialize, Deserialize};

use crate::core::fixed::{Fixed, TILE_SIZE};
use crate::core::vec2::{FixedVec2, TileCoord};
use crate::map::events::MapEvent;
use crate::map::item::{Item, ItemCategory, ItemHandle};
use crate::map::lane::{Lane, LaneType};
use crate::map::manager::MapManager;

/// Half the character's width, for vehicle contact.
const CHARACTER_REACH: Fixed = TILE_SIZE * 3 / 10;

/// What a jump onto a tile lands on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JumpTarget {
    /// Tile cannot be entered
    Blocked,
    /// Solid ground
    Ground,
    /// Log or lily pad
    Platform(ItemHandle),
    /// Open water
    Water,
}

impl MapManager {
    /// Tile under a world position.
    pub fn tile_coordinate(&self, position: FixedVec2) -> TileCoord {
        position.to_tile()
    }

    /// Active lane at `row`.
    pub fn lane_at(&self, row: i32) -> Option<&Lane> {
        if row < self.lowest_row || row > self.highest_row {
            return None;
        }
        let handle = self.window.get((row - self.lowest_row) as usize)?;
        self.pools.lane(*handle)
    }

    /// Lowest row the character may still enter.
    pub fn backtrack_floor(&self) -> i32 {
        self.highest_reached_row
            .saturating_sub(self.config.max_rows_back as i32)
            .max(self.lowest_row)
    }

    /// Whether the character may stand on `tile`.
    ///
    /// River tiles count only while a platform covers them. Drifting rivers
    /// open every playable tile in the lane itself, so this answer changes
    /// as the logs move.
    pub fn is_tile_passable(&self, tile: TileCoord) -> bool {
        matches!(self.jump_target(tile), JumpTarget::Ground | JumpTarget::Platform(_))
    }

    /// Platform under a world position, on a river lane.
    pub fn platform_at(&self, position: FixedVec2) -> Option<(ItemHandle, &Item)> {
        let lane = self.lane_at(position.to_tile().row)?;
        if lane.lane_type() != LaneType::River {
            return None;
        }
        self.items_on(lane, ItemCategory::Platform)
            .find(|(_, item)| item.overlaps(position.x, 0))
    }

    /// Vehicle touching a world position.
    pub fn hazard_at(&self, position: FixedVec2) -> Option<(ItemHandle, &Item)> {
        let lane = self.lane_at(position.to_tile().row)?;
        self.items_on(lane, ItemCategory::Vehicle)
            .find(|(_, item)| item.overlaps(position.x, CHARACTER_REACH))
    }

    /// Classify the landing tile of a jump.
    pub fn jump_target(&self, tile: TileCoord) -> JumpTarget {
        if tile.row < self.backtrack_floor() {
            return JumpTarget::Blocked;
        }
        let Some(lane) = self.lane_at(tile.row) else {
            return JumpTarget::Blocked;
        };

        if lane.lane_type() == LaneType::River {
            let in_bounds = lane
                .geometry()
                .index_of(tile.column)
                .is_some_and(|index| lane.geometry().playable_mask().contains(index));
            if !in_bounds {
                return JumpTarget::Blocked;
            }
            return match self.platform_at(tile.center()) {
                Some((handle, _)) => JumpTarget::Platform(handle),
                None => JumpTarget::Water,
            };
        }

        if lane.is_passable(tile.column) {
            JumpTarget::Ground
        } else {
            JumpTarget::Blocked
        }
    }

    /// Row of the active lane of `lane_type` closest to `from_row`.
    ///
    /// Ties go to the lane ahead.
    pub fn nearest_lane_of_type(&self, from_row: i32, lane_type: LaneType) -> Option<i32> {
        self.window
            .iter()
            .filter_map(|&handle| self.pools.lane(handle))
            .filter(|lane| lane.lane_type() == lane_type)
            .map(Lane::row)
            .min_by_key(|&row| (row.abs_diff(from_row), row < from_row))
    }

    /// Pick up the coin on `tile`, if there is one.
    pub fn collect_coin(&mut self, tile: TileCoord) -> Option<MapEvent> {
        if tile.row < self.lowest_row || tile.row > self.highest_row {
            return None;
        }
        let handle = *self.window.get((tile.row - self.lowest_row) as usize)?;
        if !self.pools.take_coin(handle, tile.column) {
            return None;
        }

        self.coins += 1;
        self.sinks.score.coin_collected(self.coins);
        Some(MapEvent::CoinCollected {
            row: tile.row,
            column: tile.column,
            total: self.coins,
        })
    }

    fn items_on<'a>(&'a self, lane: &'a Lane, category: ItemCategory) -> impl Iterator<Item = (ItemHandle, &'a Item)> + 'a {
        lane.items()
            .iter()
            .filter(move |handle| handle.kind.category() == category)
            .filter_map(move |&handle| self.pools.items().get(handle).map(|item| (handle, item)))
    }
}

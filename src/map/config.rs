//! Map Configuration
//!
//! Tuning for window size, lane geometry and per-lane content. Everything
//! has a default; a JSON file only needs the fields it changes.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::core::fixed::{Fixed, to_fixed};
use crate::core::rng::PERMILLE;
use crate::map::error::MapError;
use crate::map::item::ItemKind;
use crate::map::lane::{LaneGeometry, LaneResource, MAX_COLUMNS, MIN_LOGS_PER_LANE, MIN_VEHICLES_PER_LANE};

/// Lanes the beginning set needs on top of the rows behind the character.
const BEGINNING_MIN_EXTRA: u32 = 4;

/// Per-lane content tuning. Chances are permille.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneTuning {
    /// Chance a grass tile holds a tree or rock
    pub obstacle_chance: u32,
    /// Chance a grass lane holds a coin
    pub coin_chance: u32,
    /// Chance a river lane is still water with lily pads
    pub lily_pad_chance: u32,
    /// Chance each extra tile of a still river holds a pad
    pub lily_pad_density: u32,
    /// Most vehicles on one road lane
    pub max_vehicles_per_lane: u32,
    /// Chance a vehicle is a truck
    pub truck_chance: u32,
    /// Most logs on one river lane
    pub max_logs_per_lane: u32,
    /// Vehicle speed at row 0 (tiles per second)
    pub road_speed: Fixed,
    /// Log speed at row 0
    pub river_speed: Fixed,
    /// Train speed at row 0
    pub train_speed: Fixed,
}

impl Default for LaneTuning {
    fn default() -> Self {
        Self {
            obstacle_chance: 250,
            coin_chance: 100,
            lily_pad_chance: 300,
            lily_pad_density: 350,
            max_vehicles_per_lane: 3,
            truck_chance: 250,
            max_logs_per_lane: 3,
            road_speed: to_fixed(2.0),
            river_speed: to_fixed(1.25),
            train_speed: to_fixed(18.0),
        }
    }
}

/// Map generator configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Base seed; each run and skin derives its own stream from it
    pub seed: u64,
    /// Lanes kept active at once
    pub active_lane_count: usize,
    /// Rows that must exist ahead of the character
    pub min_rows_ahead: u32,
    /// First row of the beginning set
    pub start_row: i32,
    /// Walkable columns per lane
    pub lane_width: usize,
    /// Blocked columns on each side of the walkable ones
    pub border_columns: usize,
    /// Open rows kept behind the character in the beginning set
    pub open_rows_behind: u32,
    /// Rows the character may walk back below its best row
    pub max_rows_back: u32,
    /// Rows within which a river lane triggers the water cue
    pub river_cue_distance: u32,
    /// Lane content tuning
    pub tuning: LaneTuning,
    /// Lane pool sizes above the derived minimum
    pub lane_pool_capacity: BTreeMap<LaneResource, usize>,
    /// Item pool sizes above the derived minimum
    pub item_pool_capacity: BTreeMap<ItemKind, usize>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            seed: 0x00C0_FFEE,
            active_lane_count: 20,
            min_rows_ahead: 13,
            start_row: -6,
            lane_width: 9,
            border_columns: 4,
            open_rows_behind: 3,
            max_rows_back: 3,
            river_cue_distance: 3,
            tuning: LaneTuning::default(),
            lane_pool_capacity: BTreeMap::new(),
            item_pool_capacity: BTreeMap::new(),
        }
    }
}

impl MapConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the config can drive a map.
    pub fn validate(&self) -> Result<(), MapError> {
        let window = self.active_lane_count;
        if window < 2 {
            return Err(MapError::WindowTooSmall(window));
        }

        if self.min_rows_ahead as usize >= window {
            return Err(MapError::LookaheadExceedsWindow {
                min_rows_ahead: self.min_rows_ahead,
                active_lane_count: window,
            });
        }

        let rows_behind = self.rows_behind_character(0);
        if (rows_behind + BEGINNING_MIN_EXTRA) as usize > window {
            return Err(MapError::StartRowOutsideWindow {
                start_row: self.start_row,
                rows_behind,
                active_lane_count: window,
            });
        }

        let max_width = MAX_COLUMNS.saturating_sub(2 * self.border_columns);
        if self.lane_width == 0 || self.lane_width > max_width {
            return Err(MapError::InvalidLaneWidth {
                width: self.lane_width,
                max: max_width,
            });
        }

        let tuning = &self.tuning;
        let chances = [
            ("obstacle_chance", tuning.obstacle_chance),
            ("coin_chance", tuning.coin_chance),
            ("lily_pad_chance", tuning.lily_pad_chance),
            ("lily_pad_density", tuning.lily_pad_density),
            ("truck_chance", tuning.truck_chance),
        ];
        for (name, value) in chances {
            if value > PERMILLE {
                return Err(MapError::InvalidChance { name, value });
            }
        }

        // Generation always spawns at least the minimum
        let limits = [
            ("max_vehicles_per_lane", tuning.max_vehicles_per_lane, MIN_VEHICLES_PER_LANE),
            ("max_logs_per_lane", tuning.max_logs_per_lane, MIN_LOGS_PER_LANE),
        ];
        for (name, value, min) in limits {
            if value < min {
                return Err(MapError::InvalidItemLimit { name, value, min });
            }
        }

        Ok(())
    }

    /// Column layout of every lane.
    pub fn geometry(&self) -> LaneGeometry {
        LaneGeometry {
            playable: self.lane_width,
            border: self.border_columns,
        }
    }

    /// Most items a single lane can hold.
    ///
    /// A full grass lane carries one obstacle per walkable tile plus a coin.
    pub fn max_items_per_lane(&self) -> usize {
        let tuning = &self.tuning;
        (self.lane_width + 1)
            .max(tuning.max_vehicles_per_lane as usize)
            .max(tuning.max_logs_per_lane as usize)
    }

    /// Rows between the start row and a character at `character_row`.
    pub fn rows_behind_character(&self, character_row: i32) -> u32 {
        character_row.saturating_sub(self.start_row).max(0) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = MapConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rows_behind_character(0), 6);
        assert_eq!(config.geometry().total(), 17);
        assert_eq!(config.max_items_per_lane(), 10);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = MapConfig::from_json(r#"{ "seed": 7, "tuning": { "coin_chance": 0 } }"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.tuning.coin_chance, 0);
        assert_eq!(config.tuning.max_logs_per_lane, 3);
        assert_eq!(config.active_lane_count, 20);
    }

    #[test]
    fn test_pool_overrides_from_json() {
        let json = r#"{ "lane_pool_capacity": { "River": 32 }, "item_pool_capacity": { "Coin": 40 } }"#;
        let config = MapConfig::from_json(json).unwrap();
        assert_eq!(config.lane_pool_capacity.get(&LaneResource::River), Some(&32));
        assert_eq!(config.item_pool_capacity.get(&ItemKind::Coin), Some(&40));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(MapConfig::from_json("{ seed: }"), Err(MapError::Parse(_))));
    }

    #[test]
    fn test_validation_errors() {
        let mut config = MapConfig { active_lane_count: 1, ..Default::default() };
        assert!(matches!(config.validate(), Err(MapError::WindowTooSmall(1))));

        config.active_lane_count = 13;
        assert!(matches!(config.validate(), Err(MapError::LookaheadExceedsWindow { .. })));

        config = MapConfig { start_row: -30, ..Default::default() };
        assert!(matches!(
            config.validate(),
            Err(MapError::StartRowOutsideWindow { rows_behind: 30, .. })
        ));

        config = MapConfig { lane_width: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(MapError::InvalidLaneWidth { width: 0, max: 56 })));

        config = MapConfig::default();
        config.tuning.truck_chance = 1001;
        assert!(matches!(
            config.validate(),
            Err(MapError::InvalidChance { name: "truck_chance", value: 1001 })
        ));

        config = MapConfig::default();
        config.tuning.max_logs_per_lane = 1;
        assert!(matches!(
            config.validate(),
            Err(MapError::InvalidItemLimit { name: "max_logs_per_lane", value: 1, min: 2 })
        ));

        config = MapConfig::default();
        config.tuning.max_vehicles_per_lane = 0;
        assert!(matches!(
            config.validate(),
            Err(MapError::InvalidItemLimit { name: "max_vehicles_per_lane", value: 0, min: 1 })
        ));
    }
}

//! Map Window Manager
//!
//! Owns the sliding window of active lanes. As the character moves forward,
//! lanes are created at the leading edge until the lookahead is satisfied,
//! and lanes fall off the trailing edge once the window is full.
//!
//! ## Ordering
//!
//! Within one fill step the trailing lanes are evicted *before* the new
//! lanes are fetched, so pools sized to the window never wrap onto a lane
//! that is still on screen. Lanes are created strictly in row order and the
//! seam is threaded from each lane to the next.

use std::collections::VecDeque;
use serde::{Serialize, Deserialize};
use tracing::{debug, info, warn};

use crate::core::fixed::{from_int, TICK_DURATION};
use crate::core::hash::{MapHash, MapHasher};
use crate::core::rng::DeterministicRng;
use crate::core::vec2::FixedVec2;
use crate::map::catalog::{MapSkin, SkinCatalog};
use crate::map::config::MapConfig;
use crate::map::error::MapError;
use crate::map::events::{MapEvent, UpdateResult};
use crate::map::item::ItemKind;
use crate::map::lane::{LaneHandle, LaneType, Seam};
use crate::map::lane_set::{GenerationEnv, LaneSet, LaneSetKind};
use crate::map::pool::MapPools;
use crate::map::sinks::{AmbientCue, DeathCause, FocusRequest, MapSinks};
use crate::map::transition::next_kind;

/// Lane sets remembered for inspection.
pub const HISTORY_LIMIT: usize = 256;

/// Tiles beyond the lane edge at which a train starts to count as approaching.
const TRAIN_WARNING_TILES: i32 = 6;

/// Whether the map is generating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapPhase {
    /// Pools are built, no lanes active
    Ready,
    /// Lanes are being generated around the character
    Active,
}

/// A lane set as it was started.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneSetRecord {
    /// Set kind
    pub kind: LaneSetKind,
    /// First row
    pub start_row: i32,
    /// Lanes the set was drawn to have
    pub target_count: u32,
}

/// Endless lane generator around one character.
pub struct MapManager {
    pub(crate) config: MapConfig,
    pub(crate) catalog: Box<dyn SkinCatalog>,
    pub(crate) sinks: MapSinks,
    pub(crate) pools: MapPools,
    rng: DeterministicRng,
    run_index: u32,
    phase: MapPhase,
    paused: bool,

    pub(crate) window: VecDeque<LaneHandle>,
    pub(crate) lowest_row: i32,
    pub(crate) highest_row: i32,
    current_set: Option<LaneSet>,
    history: VecDeque<LaneSetRecord>,
    sets_created: u64,

    character_start: FixedVec2,
    pub(crate) player_row: i32,
    pub(crate) highest_reached_row: i32,
    pub(crate) coins: u32,
    last_cue: AmbientCue,
    ticks: u64,
}

impl MapManager {
    /// Validate `config` and build the pools for the default skin.
    pub fn new(config: MapConfig, catalog: Box<dyn SkinCatalog>, sinks: MapSinks) -> Result<Self, MapError> {
        config.validate()?;

        let skin = MapSkin::default();
        let pools = MapPools::populate(&config, catalog.as_ref(), skin)?;
        let rng = DeterministicRng::for_run(config.seed, 0, skin.name());
        let window = VecDeque::with_capacity(config.active_lane_count);

        info!(
            seed = config.seed,
            window = config.active_lane_count,
            lookahead = config.min_rows_ahead,
            skin = skin.name(),
            "map manager initialized"
        );

        Ok(Self {
            lowest_row: config.start_row,
            highest_row: config.start_row - 1,
            config,
            catalog,
            sinks,
            pools,
            rng,
            run_index: 0,
            phase: MapPhase::Ready,
            paused: false,
            window,
            current_set: None,
            history: VecDeque::with_capacity(HISTORY_LIMIT),
            sets_created: 0,
            character_start: FixedVec2::ZERO,
            player_row: 0,
            highest_reached_row: 0,
            coins: 0,
            last_cue: AmbientCue::Quiet,
            ticks: 0,
        })
    }

    /// Tear down the current map and prepare a new run with `skin`.
    ///
    /// Pools are rebuilt only when the skin differs from the current one.
    /// Each call starts a new run with its own RNG stream.
    pub fn create_new_map(&mut self, skin: MapSkin) -> Result<UpdateResult, MapError> {
        let mut result = UpdateResult::default();

        while !self.window.is_empty() {
            self.evict_trailing(&mut result);
        }

        if skin != self.pools.skin() {
            let dropped = self.pools.clear_all();
            self.pools = MapPools::populate(&self.config, self.catalog.as_ref(), skin)?;
            debug!(dropped, skin = skin.name(), "rebuilt pools for new skin");
            result.events.push(MapEvent::SkinChanged { skin });
        }

        self.run_index = self.run_index.wrapping_add(1);
        self.rng = DeterministicRng::for_run(self.config.seed, self.run_index, skin.name());

        self.phase = MapPhase::Ready;
        self.paused = false;
        self.current_set = None;
        self.history.clear();
        self.lowest_row = self.config.start_row;
        self.highest_row = self.config.start_row - 1;
        self.coins = 0;
        self.last_cue = AmbientCue::Quiet;
        self.ticks = 0;

        info!(run = self.run_index, skin = skin.name(), "new map created");

        Ok(result)
    }

    /// Record where the character starts. Call before [`activate_map`](Self::activate_map).
    pub fn initialize_character_reference(&mut self, start_position: FixedVec2) {
        self.character_start = start_position;
        self.player_row = start_position.to_tile().row;
        self.highest_reached_row = self.player_row;
        debug!(row = self.player_row, "character reference set");
    }

    /// Generate the beginning set and fill the window.
    pub fn activate_map(&mut self) -> UpdateResult {
        let mut result = UpdateResult::default();
        if self.phase == MapPhase::Active {
            warn!("activate_map called on an active map");
            return result;
        }

        let seam = Seam::open(&self.config.geometry());
        let set = LaneSet::beginning(self.config.start_row, self.player_row, &self.config, seam, &mut self.rng);
        self.begin_set(set, &mut result);
        self.phase = MapPhase::Active;

        let full_window = self.config.start_row + self.config.active_lane_count as i32 - 1;
        let last_row = full_window.max(self.lookahead_row());
        self.fill_to(last_row, &mut result);

        info!(
            lowest = self.lowest_row,
            highest = self.highest_row,
            lanes = self.window.len(),
            "map activated"
        );

        result
    }

    /// Advance the map for one tick with the character at `player_position`.
    pub fn update(&mut self, player_position: FixedVec2) -> UpdateResult {
        let mut result = UpdateResult::default();
        if self.phase != MapPhase::Active {
            return result;
        }

        self.ticks += 1;
        let tile = player_position.to_tile();
        self.player_row = tile.row;

        while self.highest_reached_row < self.player_row {
            self.highest_reached_row += 1;
            self.sinks.score.row_reached(self.highest_reached_row);
            result.events.push(MapEvent::RowReached { row: self.highest_reached_row });
        }

        let last_row = self.lookahead_row();
        self.fill_to(last_row, &mut result);

        if let Some(event) = self.collect_coin(tile) {
            result.events.push(event);
        }

        if !self.paused {
            for &lane in &self.window {
                self.pools.advance_lane_items(lane, TICK_DURATION);
            }
        }

        let cue = self.ambient_cue();
        if cue != self.last_cue {
            self.last_cue = cue;
            self.sinks.audio.ambient(cue);
        }

        result
    }

    /// Stop item motion. Generation still follows the character.
    pub fn pause(&mut self) {
        self.paused = true;
        debug!("map paused");
    }

    /// Resume item motion.
    pub fn unpause(&mut self) {
        self.paused = false;
        debug!("map unpaused");
    }

    /// Ask the camera to react to the character's death.
    pub fn notify_death(&mut self, cause: DeathCause, position: FixedVec2) -> FocusRequest {
        let skin = self.pools.skin();
        let request = FocusRequest {
            cause,
            behavior: cause.focus_behavior(),
            position,
            effect: cause.effect().map(|effect| self.catalog.effect_asset(skin, effect)),
        };
        info!(?cause, row = position.to_tile().row, "character died");
        self.sinks.camera.focus(request);
        request
    }

    /// SHA-256 over the window, every active lane and its items.
    pub fn map_hash(&self) -> MapHash {
        let mut hasher = MapHasher::for_window();
        hasher.update_u32(self.run_index);
        hasher.update_i32(self.lowest_row);
        hasher.update_i32(self.highest_row);
        hasher.update_i32(self.highest_reached_row);
        hasher.update_u32(self.coins);
        hasher.update_vec2(self.character_start);
        hasher.update_u32(self.window.len() as u32);

        for lane in self.window.iter().filter_map(|&handle| self.pools.lane(handle)) {
            hasher.update_i32(lane.row());
            hasher.update_u8(lane.resource() as u8);
            hasher.update_u8(lane.direction() as u8);
            hasher.update_fixed(lane.speed());
            hasher.update_bool(lane.is_still());
            hasher.update_mask(lane.passable());

            for item in lane.items().iter().filter_map(|&handle| self.pools.items().get(handle)) {
                hasher.update_u8(item.kind() as u8);
                hasher.update_fixed(item.x());
                hasher.update_fixed(item.length());
            }
        }

        let [s0, s1] = self.rng.state();
        hasher.update_u64(s0);
        hasher.update_u64(s1);
        hasher.finalize()
    }

    // =========================================================================
    // FILL LOOP
    // =========================================================================

    fn lookahead_row(&self) -> i32 {
        self.player_row.saturating_add(self.config.min_rows_ahead as i32)
    }

    /// Create lanes until `highest_row >= last_row`.
    fn fill_to(&mut self, last_row: i32, result: &mut UpdateResult) {
        while self.highest_row < last_row {
            if self.current_set.as_ref().map_or(true, LaneSet::is_set_complete) {
                self.start_next_set(result);
            }
            let deficit = (last_row - self.highest_row) as u32;
            let Some(batch) = self.current_set.as_ref().map(|set| deficit.min(set.remaining())) else {
                return;
            };

            let overflow = (self.window.len() + batch as usize).saturating_sub(self.config.active_lane_count);
            for _ in 0..overflow {
                self.evict_trailing(result);
            }

            let Some(set) = self.current_set.as_mut() else {
                return;
            };
            let env = GenerationEnv {
                pools: &mut self.pools,
                rng: &mut self.rng,
                config: &self.config,
            };
            let mut created = 0;
            for lane in set.create_lanes(batch, env) {
                self.highest_row += 1;
                self.window.push_back(lane);
                result.events.push(MapEvent::LaneActivated {
                    row: self.highest_row,
                    resource: lane.resource,
                });
                created += 1;
            }
            result.lanes_created += created;

            if created < batch {
                warn!(created, batch, row = self.highest_row, "lane pool exhausted, window left short");
                return;
            }
        }
    }

    fn evict_trailing(&mut self, result: &mut UpdateResult) {
        if let Some(lane) = self.window.pop_front() {
            self.pools.deactivate_lane(lane);
            result.events.push(MapEvent::LaneDeactivated { row: self.lowest_row });
            self.lowest_row += 1;
        }
    }

    /// Replace the finished set with the next one.
    fn start_next_set(&mut self, result: &mut UpdateResult) {
        let Some(outgoing) = self.current_set.take() else {
            return;
        };
        let kind = next_kind(outgoing.kind(), self.highest_row, &mut self.rng);
        let set = LaneSet::new(kind, self.highest_row + 1, *outgoing.seam(), &mut self.rng);
        self.begin_set(set, result);
    }

    fn begin_set(&mut self, set: LaneSet, result: &mut UpdateResult) {
        let record = LaneSetRecord {
            kind: set.kind(),
            start_row: set.start_row(),
            target_count: set.target_lane_count(),
        };
        debug!(kind = ?record.kind, start_row = record.start_row, target = record.target_count, "lane set started");

        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(record);
        self.sets_created += 1;
        result.events.push(MapEvent::LaneSetStarted {
            kind: record.kind,
            start_row: record.start_row,
            target_count: record.target_count,
        });
        self.current_set = Some(set);
    }

    // =========================================================================
    // AUDIO
    // =========================================================================

    fn ambient_cue(&self) -> AmbientCue {
        let half_width = self.config.geometry().half_width();
        let warning = from_int(TRAIN_WARNING_TILES);

        for row in [self.player_row, self.player_row + 1] {
            let Some(lane) = self.lane_at(row).filter(|lane| lane.lane_type() == LaneType::Railroad) else {
                continue;
            };
            let train_near = lane
                .items()
                .iter()
                .filter(|handle| handle.kind == ItemKind::Train)
                .filter_map(|&handle| self.pools.items().get(handle))
                .any(|train| train.approaches(half_width, warning));
            if train_near {
                return AmbientCue::TrainApproaching { row };
            }
        }

        self.nearest_lane_of_type(self.player_row, LaneType::River)
            .map(|row| row.abs_diff(self.player_row))
            .filter(|&distance| distance <= self.config.river_cue_distance)
            .map_or(AmbientCue::Quiet, |distance| AmbientCue::River { distance })
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Current phase.
    pub fn phase(&self) -> MapPhase {
        self.phase
    }

    /// Whether item motion is suspended.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Skin the pools are built for.
    pub fn skin(&self) -> MapSkin {
        self.pools.skin()
    }

    /// Runs started since construction.
    pub fn run_index(&self) -> u32 {
        self.run_index
    }

    /// Configuration in use.
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Pools backing the window.
    pub fn pools(&self) -> &MapPools {
        &self.pools
    }

    /// Active lane handles, lowest row first.
    pub fn window(&self) -> &VecDeque<LaneHandle> {
        &self.window
    }

    /// Row of the trailing lane.
    pub fn lowest_row(&self) -> i32 {
        self.lowest_row
    }

    /// Row of the leading lane.
    pub fn highest_row(&self) -> i32 {
        self.highest_row
    }

    /// Character row at the last update.
    pub fn player_row(&self) -> i32 {
        self.player_row
    }

    /// Best row reached this run.
    pub fn highest_reached_row(&self) -> i32 {
        self.highest_reached_row
    }

    /// Where the character started.
    pub fn character_start(&self) -> FixedVec2 {
        self.character_start
    }

    /// Coins collected this run.
    pub fn coins(&self) -> u32 {
        self.coins
    }

    /// Updates since the map was activated.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Set currently creating lanes.
    pub fn current_set(&self) -> Option<&LaneSet> {
        self.current_set.as_ref()
    }

    /// Most recent lane sets, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &LaneSetRecord> {
        self.history.iter()
    }

    /// Lane sets started since construction.
    pub fn sets_created(&self) -> u64 {
        self.sets_created
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use crate::core::vec2::TileCoord;
    use crate::map::catalog::DefaultCatalog;
    use crate::map::lane::LaneResource;
    use crate::map::sinks::{AudioCueSink, CameraSink, FocusBehavior, ScoreSink};

    fn manager(config: MapConfig) -> MapManager {
        MapManager::new(config, Box::new(DefaultCatalog), MapSinks::default()).unwrap()
    }

    fn active(config: MapConfig) -> MapManager {
        let mut map = manager(config);
        map.initialize_character_reference(FixedVec2::ZERO);
        map.activate_map();
        map
    }

    fn at_row(row: i32) -> FixedVec2 {
        TileCoord::new(row, 0).center()
    }

    fn assert_window_contiguous(map: &MapManager) {
        assert!(map.window.len() <= map.config.active_lane_count);
        let rows: Vec<_> = map
            .window
            .iter()
            .map(|&handle| map.pools.lane(handle).map(|lane| lane.row()))
            .collect();
        let expected: Vec<_> = (map.lowest_row..=map.highest_row).map(Some).collect();
        assert_eq!(rows, expected);
    }

    #[derive(Default)]
    struct Recorder {
        rows: Vec<i32>,
        coins: Vec<u32>,
        cues: Vec<AmbientCue>,
        focus: Vec<FocusRequest>,
    }

    #[derive(Clone, Default)]
    struct SharedRecorder(Rc<RefCell<Recorder>>);

    impl ScoreSink for SharedRecorder {
        fn row_reached(&mut self, row: i32) {
            self.0.borrow_mut().rows.push(row);
        }
        fn coin_collected(&mut self, total: u32) {
            self.0.borrow_mut().coins.push(total);
        }
    }

    impl AudioCueSink for SharedRecorder {
        fn ambient(&mut self, cue: AmbientCue) {
            self.0.borrow_mut().cues.push(cue);
        }
    }

    impl CameraSink for SharedRecorder {
        fn focus(&mut self, request: FocusRequest) {
            self.0.borrow_mut().focus.push(request);
        }
    }

    fn recording_sinks(recorder: &SharedRecorder) -> MapSinks {
        MapSinks {
            score: Box::new(recorder.clone()),
            audio: Box::new(recorder.clone()),
            camera: Box::new(recorder.clone()),
        }
    }

    #[test]
    fn test_initial_scenario() {
        let map = active(MapConfig::default());

        assert_eq!(map.phase(), MapPhase::Active);
        assert_eq!(map.lowest_row(), -6);
        assert_eq!(map.highest_row(), 13);
        assert_eq!(map.window.len(), 20);
        assert!(map.highest_row() - map.player_row() >= 13);
        assert_window_contiguous(&map);

        let history: Vec<_> = map.history().collect();
        assert_eq!(history[0].kind, LaneSetKind::Beginning);
        assert_eq!(history[0].start_row, -6);
        assert_eq!(history.iter().filter(|record| record.kind == LaneSetKind::Beginning).count(), 1);
    }

    #[test]
    fn test_beginning_lanes() {
        let map = active(MapConfig::default());

        // Rows -6..=-4 are walls, -3 onward is open grass
        for row in -6..=-4 {
            let lane = map.lane_at(row).unwrap();
            assert!(lane.passable().iter().all(|tile| !tile), "row {row}");
        }
        for row in -3..=1 {
            let lane = map.lane_at(row).unwrap();
            assert_eq!(lane.lane_type(), LaneType::Grass);
            assert!((-4..=4).all(|column| lane.is_passable(column)), "row {row}");
        }
    }

    #[test]
    fn test_window_invariants_hold_every_tick() {
        let mut map = active(MapConfig::default());

        for row in 0..400 {
            map.update(at_row(row));
            assert_window_contiguous(&map);
            assert!(map.highest_row() - row >= 13);
            assert_eq!(map.window.len(), 20);
        }
        assert_eq!(map.pools().live_reuse_count(), 0);
    }

    #[test]
    fn test_set_transition_rules() {
        let mut map = active(MapConfig::default());
        for row in 0..600 {
            map.update(at_row(row));
        }

        let history: Vec<_> = map.history().copied().collect();
        for pair in history.windows(2) {
            let (outgoing, incoming) = (pair[0], pair[1]);
            assert_eq!(incoming.start_row, outgoing.start_row + outgoing.target_count as i32);
            match outgoing.kind {
                LaneSetKind::Grass | LaneSetKind::Beginning => assert_ne!(incoming.kind, LaneSetKind::Grass),
                kind => assert_ne!(incoming.kind, kind),
            }
            if outgoing.start_row + outgoing.target_count as i32 - 1 >= 200 {
                assert_ne!(incoming.kind, LaneSetKind::Grass);
            }
        }
    }

    #[test]
    fn test_every_lane_is_reachable() {
        let mut map = active(MapConfig::default());
        for row in 0..300 {
            map.update(at_row(row));
            let leading = map.lane_at(map.highest_row()).unwrap();
            assert!(!leading.reachable().is_empty(), "row {}", leading.row());
        }
    }

    #[test]
    fn test_same_seed_same_hash() {
        let mut a = active(MapConfig::default());
        let mut b = active(MapConfig::default());
        assert_eq!(a.map_hash(), b.map_hash());

        for row in [0, 1, 2, 2, 3, 5, 4, 8, 13, 20, 21] {
            a.update(at_row(row));
            b.update(at_row(row));
        }
        assert_eq!(a.map_hash(), b.map_hash());

        let mut c = active(MapConfig { seed: 1, ..Default::default() });
        for row in [0, 1, 2, 2, 3, 5, 4, 8, 13, 20, 21] {
            c.update(at_row(row));
        }
        assert_ne!(a.map_hash(), c.map_hash());
    }

    #[test]
    fn test_capacity_override_rejected() {
        let mut config = MapConfig::default();
        config.lane_pool_capacity.insert(LaneResource::River, 3);
        let result = MapManager::new(config, Box::new(DefaultCatalog), MapSinks::default());
        assert!(matches!(result, Err(MapError::LanePoolTooSmall { required: 20, .. })));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = MapConfig { min_rows_ahead: 25, ..Default::default() };
        let result = MapManager::new(config, Box::new(DefaultCatalog), MapSinks::default());
        assert!(matches!(result, Err(MapError::LookaheadExceedsWindow { .. })));
    }

    #[test]
    fn test_update_before_activation_is_noop() {
        let mut map = manager(MapConfig::default());
        let result = map.update(at_row(5));
        assert!(result.events.is_empty());
        assert!(map.window.is_empty());
    }

    #[test]
    fn test_rows_reached_reported_once() {
        let recorder = SharedRecorder::default();
        let mut map = MapManager::new(MapConfig::default(), Box::new(DefaultCatalog), recording_sinks(&recorder)).unwrap();
        map.initialize_character_reference(FixedVec2::ZERO);
        map.activate_map();

        let result = map.update(at_row(3));
        assert_eq!(result.rows_reached().collect::<Vec<_>>(), vec![1, 2, 3]);
        map.update(at_row(2));
        map.update(at_row(4));

        assert_eq!(recorder.0.borrow().rows, vec![1, 2, 3, 4]);
        assert_eq!(map.highest_reached_row(), 4);
    }

    #[test]
    fn test_new_map_resets_and_changes_skin() {
        let mut map = active(MapConfig::default());
        for row in 0..30 {
            map.update(at_row(row));
        }

        let result = map.create_new_map(MapSkin::Desert).unwrap();
        assert!(result.events.contains(&MapEvent::SkinChanged { skin: MapSkin::Desert }));
        assert_eq!(map.phase(), MapPhase::Ready);
        assert!(map.window.is_empty());
        assert_eq!(map.skin(), MapSkin::Desert);

        map.initialize_character_reference(FixedVec2::ZERO);
        map.activate_map();
        assert_window_contiguous(&map);
        assert_eq!(map.history().count(), map.history().filter(|r| r.kind != LaneSetKind::Beginning).count() + 1);

        // Same skin again keeps the pools
        let result = map.create_new_map(MapSkin::Desert).unwrap();
        assert!(!result.events.iter().any(|event| matches!(event, MapEvent::SkinChanged { .. })));
    }

    #[test]
    fn test_runs_differ_but_replay_matches() {
        let mut a = active(MapConfig::default());
        let first_run = a.map_hash();

        a.create_new_map(MapSkin::Classic).unwrap();
        a.initialize_character_reference(FixedVec2::ZERO);
        a.activate_map();
        assert_ne!(a.map_hash(), first_run);

        let mut b = manager(MapConfig::default());
        b.create_new_map(MapSkin::Classic).unwrap();
        b.initialize_character_reference(FixedVec2::ZERO);
        b.activate_map();
        assert_eq!(a.map_hash(), b.map_hash());
    }

    #[test]
    fn test_pause_freezes_items() {
        let mut map = active(MapConfig::default());
        map.pause();
        let frozen = map.map_hash();
        map.update(at_row(0));
        assert_eq!(map.map_hash(), frozen);

        map.unpause();
        for _ in 0..30 {
            map.update(at_row(0));
        }
        assert!(!map.is_paused());
    }

    #[test]
    fn test_notify_death_focuses_camera() {
        let recorder = SharedRecorder::default();
        let mut map = MapManager::new(MapConfig::default(), Box::new(DefaultCatalog), recording_sinks(&recorder)).unwrap();
        map.initialize_character_reference(FixedVec2::ZERO);
        map.activate_map();

        let request = map.notify_death(DeathCause::Drowned, at_row(4));
        assert_eq!(request.behavior, FocusBehavior::ZoomIn);
        assert!(request.effect.is_some());
        assert_eq!(recorder.0.borrow().focus, vec![request]);
    }

    #[test]
    fn test_audio_cues_only_on_change() {
        let recorder = SharedRecorder::default();
        let mut map = MapManager::new(MapConfig::default(), Box::new(DefaultCatalog), recording_sinks(&recorder)).unwrap();
        map.initialize_character_reference(FixedVec2::ZERO);
        map.activate_map();

        for row in 0..200 {
            map.update(at_row(row));
        }

        let cues = recorder.0.borrow().cues.clone();
        assert!(!cues.is_empty());
        for pair in cues.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn test_train_cue_follows_the_train() {
        let mut map = active(MapConfig::default());
        let mut row = 0;
        let rail = loop {
            if let Some(rail) = map.nearest_lane_of_type(row, LaneType::Railroad).filter(|&r| r > row) {
                break rail;
            }
            row += 1;
            map.update(at_row(row));
        };

        let mut warned = 0;
        let mut quiet = 0;
        for _ in 0..600 {
            map.update(at_row(rail));
            match map.ambient_cue() {
                AmbientCue::TrainApproaching { .. } => warned += 1,
                _ => quiet += 1,
            }
        }

        // Trains spend most of each lap far off the lane
        assert!(warned > 0);
        assert!(quiet > 0);
    }

    #[test]
    fn test_smallest_item_limits_never_wrap_live() {
        let mut config = MapConfig::default();
        config.tuning.max_logs_per_lane = 2;
        config.tuning.max_vehicles_per_lane = 1;
        config.tuning.lily_pad_chance = 0;
        config.validate().unwrap();
        let mut map = active(config);

        for row in 0..2000 {
            map.update(at_row(row));
        }
        assert_eq!(map.pools().live_reuse_count(), 0);
    }
}

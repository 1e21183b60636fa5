//! Lanes
//!
//! A lane is one row of the map. Lane records are pooled per resource and
//! re-activated in place: every activation rewrites the whole passability
//! array and replaces the lane's items.
//!
//! ## Connectivity
//!
//! Each activation consumes the previous lane's [`Seam`] and produces the next
//! one. The seam carries the columns the character can actually stand on
//! coming out of the previous lane, so every lane opens at least one tile
//! that continues an existing path.

use serde::{Serialize, Deserialize};

use crate::core::fixed::{Fixed, FIXED_HALF, TILE_SIZE, from_int};
use crate::core::rng::DeterministicRng;
use crate::core::vec2::MAX_TILE;
use crate::map::catalog::AssetId;
use crate::map::config::MapConfig;
use crate::map::item::{ItemHandle, ItemKind, ItemPlacement, ItemPools};
use crate::map::pool::PoolHandle;

/// Widest lane supported (columns, borders included).
pub const MAX_COLUMNS: usize = 64;

/// Extra tiles past each border that moving items travel through before
/// wrapping to the other side.
pub const WRAP_MARGIN_TILES: i32 = 4;

/// Wrap margin on railroads. Trains spend most of each lap off the lane.
pub const TRAIN_MARGIN_TILES: i32 = 40;

/// Fewest logs a drifting river spawns.
pub const MIN_LOGS_PER_LANE: u32 = 2;

/// Fewest vehicles a road spawns.
pub const MIN_VEHICLES_PER_LANE: u32 = 1;

/// Row at which item speeds reach twice their base value.
pub const SPEED_RAMP_ROWS: i32 = 200;

/// Share of grass obstacles that are trees rather than rocks (permille).
const TREE_SHARE: u32 = 650;

// =============================================================================
// LANE KINDS
// =============================================================================

/// Gameplay type of a lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum LaneType {
    /// Safe ground with static obstacles
    Grass = 0,
    /// Cars and trucks
    Road = 1,
    /// Trains
    Railroad = 2,
    /// Water with logs or lily pads
    River = 3,
}

/// Concrete lane resource. Each has its own pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum LaneResource {
    /// Grass, dark shade
    GrassDark = 0,
    /// Grass, light shade
    GrassLight = 1,
    /// Road with markings on both edges
    RoadSingle = 2,
    /// First lane of a multi-lane road
    RoadBottom = 3,
    /// Inner lane of a multi-lane road
    RoadMiddle = 4,
    /// Last lane of a multi-lane road
    RoadTop = 5,
    /// Railroad track
    Railroad = 6,
    /// River
    River = 7,
}

impl LaneResource {
    /// Every resource, in pool order.
    pub const ALL: [LaneResource; 8] = [
        LaneResource::GrassDark,
        LaneResource::GrassLight,
        LaneResource::RoadSingle,
        LaneResource::RoadBottom,
        LaneResource::RoadMiddle,
        LaneResource::RoadTop,
        LaneResource::Railroad,
        LaneResource::River,
    ];

    /// Lane type this resource renders.
    pub fn lane_type(self) -> LaneType {
        match self {
            LaneResource::GrassDark | LaneResource::GrassLight => LaneType::Grass,
            LaneResource::RoadSingle
            | LaneResource::RoadBottom
            | LaneResource::RoadMiddle
            | LaneResource::RoadTop => LaneType::Road,
            LaneResource::Railroad => LaneType::Railroad,
            LaneResource::River => LaneType::River,
        }
    }
}

/// Flow direction of a lane's moving items.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    /// Towards negative x
    Left = 0,
    /// Towards positive x
    Right = 1,
    /// Nothing moves
    #[default]
    None = 2,
}

impl Direction {
    /// -1, +1 or 0.
    #[inline]
    pub fn sign(self) -> i32 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
            Direction::None => 0,
        }
    }

    /// Reverse flow; `None` stays `None`.
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::None => Direction::None,
        }
    }

    fn random(rng: &mut DeterministicRng) -> Self {
        if rng.coin_flip() {
            Direction::Left
        } else {
            Direction::Right
        }
    }
}

// =============================================================================
// TILE MASK
// =============================================================================

/// One bit per tile column, bit 0 is the leftmost column.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TileMask(u64);

impl TileMask {
    /// No tiles.
    pub const EMPTY: Self = Self(0);

    /// Bits `start..start + len`.
    pub fn range(start: usize, len: usize) -> Self {
        if len == 0 || start >= MAX_COLUMNS {
            return Self::EMPTY;
        }
        let len = len.min(MAX_COLUMNS - start);
        let ones = if len == MAX_COLUMNS { u64::MAX } else { (1u64 << len) - 1 };
        Self(ones << start)
    }

    /// Mask of the `true` entries of a tile array.
    pub fn from_tiles(tiles: &[bool]) -> Self {
        tiles
            .iter()
            .take(MAX_COLUMNS)
            .enumerate()
            .fold(Self::EMPTY, |mask, (index, &set)| if set { mask.with(index) } else { mask })
    }

    /// Whether bit `index` is set.
    #[inline]
    pub fn contains(self, index: usize) -> bool {
        index < MAX_COLUMNS && self.0 & (1 << index) != 0
    }

    /// Copy with bit `index` set.
    #[inline]
    pub fn with(self, index: usize) -> Self {
        if index >= MAX_COLUMNS {
            return self;
        }
        Self(self.0 | (1 << index))
    }

    /// Intersection.
    #[inline]
    pub fn and(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// True if no bit is set.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of set bits.
    #[inline]
    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Indices of set bits, lowest first.
    pub fn indices(self) -> impl Iterator<Item = usize> {
        (0..MAX_COLUMNS).filter(move |&index| self.contains(index))
    }

    /// Grow `self` sideways through `open` until nothing new is reached.
    pub fn flood(self, open: Self) -> Self {
        let mut reach = self.and(open);
        loop {
            let grown = Self((reach.0 | (reach.0 << 1) | (reach.0 >> 1)) & open.0);
            if grown == reach {
                return reach;
            }
            reach = grown;
        }
    }

    /// Uniformly pick one set bit.
    pub fn pick(self, rng: &mut DeterministicRng) -> Option<usize> {
        let k = rng.next_int(self.count());
        self.indices().nth(k as usize)
    }
}

impl std::fmt::Debug for TileMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TileMask({:#b})", self.0)
    }
}

// =============================================================================
// GEOMETRY
// =============================================================================

/// Column layout shared by every lane.
///
/// `border` blocked columns flank `playable` walkable columns on both sides.
/// Column 0 is the centre column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneGeometry {
    /// Walkable columns.
    pub playable: usize,
    /// Decorative blocked columns on each side.
    pub border: usize,
}

impl LaneGeometry {
    /// Columns per lane, borders included.
    pub fn total(&self) -> usize {
        self.playable + 2 * self.border
    }

    fn half(&self) -> i32 {
        (self.total() / 2) as i32
    }

    /// Tile array index of a column.
    pub fn index_of(&self, column: i32) -> Option<usize> {
        let index = column.checked_add(self.half())?;
        usize::try_from(index).ok().filter(|&index| index < self.total())
    }

    /// Column of a tile array index.
    pub fn column_of(&self, index: usize) -> i32 {
        index as i32 - self.half()
    }

    /// Mask of the walkable columns.
    pub fn playable_mask(&self) -> TileMask {
        TileMask::range(self.border, self.playable)
    }

    /// Distance from the centre column's middle to the lane's outer edge.
    pub fn half_width(&self) -> Fixed {
        from_int(self.half()) + FIXED_HALF
    }

    /// Left edge and width of the band moving items wrap around in, with
    /// `margin_tiles` past each border.
    pub fn wrap_span(&self, margin_tiles: i32) -> (Fixed, Fixed) {
        let min_x = from_int(-(self.half() + margin_tiles));
        let span = from_int(self.total() as i32 + 2 * margin_tiles);
        (min_x, span)
    }
}

// =============================================================================
// SEAM
// =============================================================================

/// What one lane tells the next one about itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seam {
    /// Columns a character can reach on the previous lane.
    pub reachable: TileMask,
    /// Flow direction of the previous lane.
    pub direction: Direction,
    /// Type of the previous lane, if any.
    pub lane_type: Option<LaneType>,
    /// Previous lane was a still (lily pad) river.
    pub still_river: bool,
}

impl Seam {
    /// Seam in front of the very first lane: everything reachable.
    pub fn open(geometry: &LaneGeometry) -> Self {
        Self {
            reachable: geometry.playable_mask(),
            direction: Direction::None,
            lane_type: None,
            still_river: false,
        }
    }
}

/// How a lane is filled on activation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaneStyle {
    /// Normal rules for the lane type.
    Regular,
    /// Wall of trees; used behind the character's start.
    Blocked,
    /// Empty walkable ground around the start.
    Open,
}

/// Reference to a pooled lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LaneHandle {
    /// Pool the lane came from.
    pub resource: LaneResource,
    /// Slot within that pool.
    pub handle: PoolHandle,
}

// =============================================================================
// LANE
// =============================================================================

/// Pooled lane record.
#[derive(Clone, Debug)]
pub struct Lane {
    resource: LaneResource,
    asset: AssetId,
    geometry: LaneGeometry,
    row: i32,
    passable: Vec<bool>,
    reachable: TileMask,
    direction: Direction,
    speed: Fixed,
    still: bool,
    items: Vec<ItemHandle>,
    max_items: usize,
}

impl Lane {
    /// Blank lane record with storage for `max_items` items.
    pub fn new(resource: LaneResource, asset: AssetId, geometry: LaneGeometry, max_items: usize) -> Self {
        Self {
            resource,
            asset,
            geometry,
            row: 0,
            passable: vec![false; geometry.total()],
            reachable: TileMask::EMPTY,
            direction: Direction::None,
            speed: 0,
            still: false,
            items: Vec::with_capacity(max_items),
            max_items,
        }
    }

    /// Place this lane at `row` and fill it.
    ///
    /// Every tile of the passability array is rewritten and any items from a
    /// previous use are released first. Returns the seam for the next lane.
    pub fn activate(
        &mut self,
        row: i32,
        seam: &Seam,
        style: LaneStyle,
        rng: &mut DeterministicRng,
        items: &mut ItemPools,
        config: &MapConfig,
    ) -> Seam {
        self.release_items(items);

        self.row = row;
        self.direction = Direction::None;
        self.speed = 0;
        self.still = false;
        self.reachable = TileMask::EMPTY;
        self.passable.iter_mut().for_each(|tile| *tile = false);

        match (style, self.lane_type()) {
            (LaneStyle::Blocked, _) => self.fill_blocked(items),
            (LaneStyle::Open, _) => self.fill_open(),
            (LaneStyle::Regular, LaneType::Grass) => self.fill_grass(seam, rng, items, config),
            (LaneStyle::Regular, LaneType::Road) => self.fill_road(rng, items, config),
            (LaneStyle::Regular, LaneType::Railroad) => self.fill_railroad(rng, items, config),
            (LaneStyle::Regular, LaneType::River) => self.fill_river(seam, rng, items, config),
        }

        Seam {
            reachable: self.reachable,
            direction: self.direction,
            lane_type: Some(self.lane_type()),
            still_river: self.still,
        }
    }

    /// Release every item back to its pool.
    pub fn deactivate(&mut self, items: &mut ItemPools) {
        self.release_items(items);
        self.reachable = TileMask::EMPTY;
    }

    fn release_items(&mut self, items: &mut ItemPools) {
        for item in self.items.drain(..) {
            items.release(item);
        }
    }

    fn spawn(&mut self, kind: ItemKind, placement: &ItemPlacement, items: &mut ItemPools) {
        if self.items.len() >= self.max_items {
            return;
        }
        if let Some(item) = items.spawn(kind, placement) {
            self.items.push(item);
        }
    }

    fn open_all_playable(&mut self) {
        let playable = self.geometry.playable_mask();
        for index in playable.indices() {
            self.passable[index] = true;
        }
        self.reachable = playable;
    }

    fn fill_blocked(&mut self, items: &mut ItemPools) {
        for index in self.geometry.playable_mask().indices() {
            let column = self.geometry.column_of(index);
            self.spawn(ItemKind::Tree, &ItemPlacement::fixed_at(self.row, column), items);
        }
    }

    fn fill_open(&mut self) {
        self.open_all_playable();
    }

    fn fill_grass(&mut self, seam: &Seam, rng: &mut DeterministicRng, items: &mut ItemPools, config: &MapConfig) {
        let playable = self.geometry.playable_mask();
        let forced = forced_column(seam, playable, rng);

        for index in playable.indices() {
            if Some(index) != forced && rng.chance(config.tuning.obstacle_chance) {
                let kind = if rng.chance(TREE_SHARE) { ItemKind::Tree } else { ItemKind::Rock };
                let column = self.geometry.column_of(index);
                self.spawn(kind, &ItemPlacement::fixed_at(self.row, column), items);
            } else {
                self.passable[index] = true;
            }
        }

        self.reachable = reach_from(seam, TileMask::from_tiles(&self.passable));

        if rng.chance(config.tuning.coin_chance) {
            if let Some(index) = self.reachable.pick(rng) {
                let column = self.geometry.column_of(index);
                self.spawn(ItemKind::Coin, &ItemPlacement::fixed_at(self.row, column), items);
            }
        }
    }

    fn fill_road(&mut self, rng: &mut DeterministicRng, items: &mut ItemPools, config: &MapConfig) {
        let tuning = &config.tuning;
        self.open_all_playable();
        self.direction = Direction::random(rng);
        self.speed = ramp_speed(tuning.road_speed, self.row);

        let count = rng.next_int_range(MIN_VEHICLES_PER_LANE as i32, tuning.max_vehicles_per_lane as i32);
        for slot in 0..count {
            let kind = if rng.chance(tuning.truck_chance) { ItemKind::Truck } else { ItemKind::Car };
            let placement = self.moving_placement(from_int(kind.length_tiles()), slot, count, rng);
            self.spawn(kind, &placement, items);
        }
    }

    fn fill_railroad(&mut self, rng: &mut DeterministicRng, items: &mut ItemPools, config: &MapConfig) {
        self.open_all_playable();
        self.direction = Direction::random(rng);
        self.speed = ramp_speed(config.tuning.train_speed, self.row);

        let placement = self.moving_placement(from_int(ItemKind::Train.length_tiles()), 0, 1, rng);
        self.spawn(ItemKind::Train, &placement, items);
    }

    fn fill_river(&mut self, seam: &Seam, rng: &mut DeterministicRng, items: &mut ItemPools, config: &MapConfig) {
        let tuning = &config.tuning;
        let after_river = seam.lane_type == Some(LaneType::River);
        let still = !(after_river && seam.still_river) && rng.chance(tuning.lily_pad_chance);

        if still {
            self.still = true;
            let playable = self.geometry.playable_mask();
            let forced = forced_column(seam, playable, rng);

            for index in playable.indices() {
                if Some(index) == forced || rng.chance(tuning.lily_pad_density) {
                    self.passable[index] = true;
                    let column = self.geometry.column_of(index);
                    self.spawn(ItemKind::LilyPad, &ItemPlacement::fixed_at(self.row, column), items);
                }
            }

            self.reachable = reach_from(seam, TileMask::from_tiles(&self.passable));
            return;
        }

        // Logs drift, so every column is reachable sooner or later
        self.open_all_playable();
        self.direction = if after_river && seam.direction != Direction::None {
            seam.direction.opposite()
        } else {
            Direction::random(rng)
        };
        self.speed = ramp_speed(tuning.river_speed, self.row);

        let count = rng.next_int_range(MIN_LOGS_PER_LANE as i32, tuning.max_logs_per_lane as i32);
        for slot in 0..count {
            let length = from_int(rng.next_int_range(2, 4));
            let placement = self.moving_placement(length, slot, count, rng);
            self.spawn(ItemKind::Log, &placement, items);
        }
    }

    /// Evenly spaced start position for slot `slot` of `count`, with jitter.
    fn moving_placement(
        &self,
        length: Fixed,
        slot: i32,
        count: i32,
        rng: &mut DeterministicRng,
    ) -> ItemPlacement {
        let (min_x, span) = self.wrap_span();
        let spacing = span / count.max(1);
        let slack = (spacing - length).max(0) / 2;
        let jitter = rng.next_int(slack as u32) as Fixed;

        ItemPlacement {
            row: self.row,
            x: min_x + spacing * slot + jitter,
            length,
            direction: self.direction,
            speed: self.speed,
        }
    }

    /// Remove the coin on `column`, if any.
    pub fn take_coin(&mut self, column: i32, items: &mut ItemPools) -> bool {
        let target = from_int(column);
        let found = self.items.iter().position(|&item| {
            item.kind == ItemKind::Coin && items.get(item).is_some_and(|coin| coin.x() == target)
        });

        match found {
            Some(position) => {
                let coin = self.items.swap_remove(position);
                items.release(coin);
                true
            }
            None => false,
        }
    }

    /// Row coordinate.
    pub fn row(&self) -> i32 {
        self.row
    }

    /// Pool resource.
    pub fn resource(&self) -> LaneResource {
        self.resource
    }

    /// Gameplay type.
    pub fn lane_type(&self) -> LaneType {
        self.resource.lane_type()
    }

    /// Asset handle for the current skin.
    pub fn asset(&self) -> AssetId {
        self.asset
    }

    /// Column layout.
    pub fn geometry(&self) -> &LaneGeometry {
        &self.geometry
    }

    /// Passability per tile, borders included.
    pub fn passable(&self) -> &[bool] {
        &self.passable
    }

    /// Whether the tile at `column` can be stood on.
    pub fn is_passable(&self, column: i32) -> bool {
        self.geometry
            .index_of(column)
            .is_some_and(|index| self.passable[index])
    }

    /// Columns reachable along a connected path.
    pub fn reachable(&self) -> TileMask {
        self.reachable
    }

    /// Flow direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Item speed in world units per second.
    pub fn speed(&self) -> Fixed {
        self.speed
    }

    /// Still river (lily pads) rather than drifting logs.
    pub fn is_still(&self) -> bool {
        self.still
    }

    /// Items currently on this lane.
    pub fn items(&self) -> &[ItemHandle] {
        &self.items
    }

    /// Band this lane's moving items wrap around in.
    pub fn wrap_span(&self) -> (Fixed, Fixed) {
        let margin = match self.lane_type() {
            LaneType::Railroad => TRAIN_MARGIN_TILES,
            _ => WRAP_MARGIN_TILES,
        };
        self.geometry.wrap_span(margin)
    }

    /// Centre of the lane in world y.
    pub fn world_y(&self) -> Fixed {
        self.row.clamp(-MAX_TILE, MAX_TILE) * TILE_SIZE
    }
}

/// Column the seam guarantees to stay open.
fn forced_column(seam: &Seam, playable: TileMask, rng: &mut DeterministicRng) -> Option<usize> {
    let candidates = seam.reachable.and(playable);
    if candidates.is_empty() {
        playable.pick(rng)
    } else {
        candidates.pick(rng)
    }
}

/// Tiles of `open` connected to a tile the seam can reach.
fn reach_from(seam: &Seam, open: TileMask) -> TileMask {
    let reach = seam.reachable.flood(open);
    if reach.is_empty() {
        open
    } else {
        reach
    }
}

/// Base speed scaled up linearly to twice its value at [`SPEED_RAMP_ROWS`].
fn ramp_speed(base: Fixed, row: i32) -> Fixed {
    let progress = row.clamp(0, SPEED_RAMP_ROWS) as i64;
    base.wrapping_add((base as i64 * progress / SPEED_RAMP_ROWS as i64) as Fixed)
}

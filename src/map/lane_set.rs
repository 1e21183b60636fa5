//! Lane Sets
//!
//! A lane set is a contiguous run of lanes of one kind. The set decides how
//! many lanes it has when it starts, then hands lanes out one at a time
//! through [`LaneSet::create_lanes`].
//!
//! ## Lane counts
//!
//! | Kind      | Count                                          |
//! |-----------|------------------------------------------------|
//! | Beginning | rows behind the character + 2..=4              |
//! | Grass     | 1..=6, weighted towards short runs             |
//! | Road      | 1..=2 near the start, up to 1..=7 far out      |
//! | River     | 1..=2 near the start, up to 1..=5 far out      |
//! | Railroad  | 1..=2                                          |

use serde::{Serialize, Deserialize};
#[cfg(feature = "debug-tracing")]
use tracing::trace;

use crate::core::rng::{DeterministicRng, PERMILLE};
use crate::map::config::MapConfig;
use crate::map::lane::{LaneHandle, LaneResource, LaneStyle, LaneType, Seam};
use crate::map::pool::MapPools;

/// Grass run length weights for 1..=6 lanes (permille).
const GRASS_WEIGHTS: [u32; 6] = [300, 300, 200, 100, 50, 50];

/// Upper row of each distance band. Rows past the last band use the final entry.
const BAND_LIMITS: [i32; 5] = [25, 50, 100, 150, 200];

/// Longest road per distance band.
const ROAD_MAX: [i32; 6] = [2, 3, 4, 5, 6, 7];

/// Longest river per distance band.
const RIVER_MAX: [i32; 6] = [2, 2, 3, 3, 4, 5];

/// Kind of a lane set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum LaneSetKind {
    /// Grass around the character's start
    Beginning = 0,
    /// Grass with obstacles
    Grass = 1,
    /// Road
    Road = 2,
    /// Railroad
    Railroad = 3,
    /// River
    River = 4,
}

impl LaneSetKind {
    /// Lane type every lane in this set has.
    pub fn lane_type(self) -> LaneType {
        match self {
            LaneSetKind::Beginning | LaneSetKind::Grass => LaneType::Grass,
            LaneSetKind::Road => LaneType::Road,
            LaneSetKind::Railroad => LaneType::Railroad,
            LaneSetKind::River => LaneType::River,
        }
    }
}

/// Index of the distance band containing `row`.
fn band(row: i32) -> usize {
    BAND_LIMITS
        .iter()
        .position(|&limit| row <= limit)
        .unwrap_or(BAND_LIMITS.len())
}

/// Largest road set starting at `row`.
pub fn road_max_lanes(row: i32) -> u32 {
    ROAD_MAX[band(row)] as u32
}

/// Largest river set starting at `row`.
pub fn river_max_lanes(row: i32) -> u32 {
    RIVER_MAX[band(row)] as u32
}

fn grass_count(rng: &mut DeterministicRng) -> u32 {
    let draw = rng.next_int(PERMILLE);
    let mut cumulative = 0;
    for (index, weight) in GRASS_WEIGHTS.iter().enumerate() {
        cumulative += weight;
        if draw < cumulative {
            return index as u32 + 1;
        }
    }
    GRASS_WEIGHTS.len() as u32
}

/// Lane count for a non-beginning set starting at `start_row`.
fn target_count(kind: LaneSetKind, start_row: i32, rng: &mut DeterministicRng) -> u32 {
    match kind {
        LaneSetKind::Beginning => rng.next_int_range(2, 4) as u32,
        LaneSetKind::Grass => grass_count(rng),
        LaneSetKind::Road => rng.next_int_range(1, road_max_lanes(start_row) as i32) as u32,
        LaneSetKind::River => rng.next_int_range(1, river_max_lanes(start_row) as i32) as u32,
        LaneSetKind::Railroad => rng.next_int_range(1, 2) as u32,
    }
}

/// Everything lane creation touches outside the set itself.
pub struct GenerationEnv<'a> {
    /// Lane and item pools
    pub pools: &'a mut MapPools,
    /// Generation stream
    pub rng: &'a mut DeterministicRng,
    /// Tuning
    pub config: &'a MapConfig,
}

/// A contiguous run of lanes of one kind.
#[derive(Clone, Debug)]
pub struct LaneSet {
    kind: LaneSetKind,
    start_row: i32,
    target: u32,
    current: u32,
    seam: Seam,
    blocked_below: i32,
}

impl LaneSet {
    /// Start a set of `kind` at `start_row`, drawing its lane count.
    pub fn new(kind: LaneSetKind, start_row: i32, seam: Seam, rng: &mut DeterministicRng) -> Self {
        Self {
            kind,
            start_row,
            target: target_count(kind, start_row, rng),
            current: 0,
            seam,
            blocked_below: i32::MIN,
        }
    }

    /// The first set of a map.
    ///
    /// Covers every row from `start_row` up to the character plus a few
    /// open rows ahead. Rows further than `open_rows_behind` below the
    /// character are walled off.
    pub fn beginning(
        start_row: i32,
        character_row: i32,
        config: &MapConfig,
        seam: Seam,
        rng: &mut DeterministicRng,
    ) -> Self {
        let rows_behind = config.rows_behind_character(character_row);
        Self {
            kind: LaneSetKind::Beginning,
            start_row,
            target: rows_behind + target_count(LaneSetKind::Beginning, start_row, rng),
            current: 0,
            seam,
            blocked_below: character_row.saturating_sub(config.open_rows_behind as i32),
        }
    }

    /// Resource for the next lane.
    fn next_resource(&self) -> LaneResource {
        match self.kind {
            LaneSetKind::Beginning | LaneSetKind::Grass => {
                if (self.start_row.unsigned_abs() + self.current) % 2 == 0 {
                    LaneResource::GrassDark
                } else {
                    LaneResource::GrassLight
                }
            }
            LaneSetKind::Road => match self.current {
                _ if self.target == 1 => LaneResource::RoadSingle,
                0 => LaneResource::RoadBottom,
                current if current + 1 == self.target => LaneResource::RoadTop,
                _ => LaneResource::RoadMiddle,
            },
            LaneSetKind::Railroad => LaneResource::Railroad,
            LaneSetKind::River => LaneResource::River,
        }
    }

    fn style_for(&self, row: i32) -> LaneStyle {
        match self.kind {
            LaneSetKind::Beginning if row < self.blocked_below => LaneStyle::Blocked,
            LaneSetKind::Beginning => LaneStyle::Open,
            _ => LaneStyle::Regular,
        }
    }

    /// Fetch, place and fill the next lane of this set.
    ///
    /// Returns `None` once the set is complete.
    pub fn create_lane(&mut self, env: &mut GenerationEnv<'_>) -> Option<LaneHandle> {
        if self.is_set_complete() {
            return None;
        }

        let resource = self.next_resource();
        let row = self.start_row + self.current as i32;
        let style = self.style_for(row);

        let lane = env.pools.fetch_lane(resource)?;
        let seam = env
            .pools
            .activate_lane(lane, row, &self.seam, style, env.rng, env.config)?;

        self.seam = seam;
        self.current += 1;

        #[cfg(feature = "debug-tracing")]
        trace!(row, ?resource, ?style, reachable = seam.reachable.count(), "lane created");

        Some(lane)
    }

    /// Lazily create up to `max_count` lanes.
    ///
    /// The batch stops early when the set completes.
    pub fn create_lanes<'a>(&'a mut self, max_count: u32, env: GenerationEnv<'a>) -> LaneBatch<'a> {
        LaneBatch {
            set: self,
            env,
            remaining: max_count,
        }
    }

    /// All lanes have been created.
    pub fn is_set_complete(&self) -> bool {
        self.current >= self.target
    }

    /// Lanes this set will create in total.
    pub fn target_lane_count(&self) -> u32 {
        self.target
    }

    /// Lanes created so far.
    pub fn current_lane_count(&self) -> u32 {
        self.current
    }

    /// Lanes still to create.
    pub fn remaining(&self) -> u32 {
        self.target - self.current
    }

    /// Set kind.
    pub fn kind(&self) -> LaneSetKind {
        self.kind
    }

    /// Row of the first lane.
    pub fn start_row(&self) -> i32 {
        self.start_row
    }

    /// Row the next lane will be placed at.
    pub fn next_row(&self) -> i32 {
        self.start_row + self.current as i32
    }

    /// Seam left by the last lane created.
    pub fn seam(&self) -> &Seam {
        &self.seam
    }

    /// Replace the seam, e.g. when a new set takes over.
    pub fn set_seam(&mut self, seam: Seam) {
        self.seam = seam;
    }
}

/// Lanes created by one [`LaneSet::create_lanes`] call.
///
/// Each `next` creates a lane; dropping the batch early creates no more.
pub struct LaneBatch<'a> {
    set: &'a mut LaneSet,
    env: GenerationEnv<'a>,
    remaining: u32,
}

impl Iterator for LaneBatch<'_> {
    type Item = LaneHandle;

    fn next(&mut self) -> Option<LaneHandle> {
        if self.remaining == 0 {
            return None;
        }
        let lane = self.set.create_lane(&mut self.env)?;
        self.remaining -= 1;
        Some(lane)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let upper = self.remaining.min(self.set.remaining()) as usize;
        (0, Some(upper))
    }
}

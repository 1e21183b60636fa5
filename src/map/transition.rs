//! Lane set transitions.
//!
//! Grass is never followed by grass, and a non-grass kind never repeats
//! immediately. The further the character gets, the rarer grass becomes.

use crate::core::rng::DeterministicRng;
use crate::map::lane_set::LaneSetKind;

/// Kinds a grass run can be followed by.
const NON_GRASS: [LaneSetKind; 3] = [LaneSetKind::Road, LaneSetKind::Railroad, LaneSetKind::River];

/// Chance (permille) that a non-grass set is followed by grass.
pub fn grass_chance(highest_row: i32) -> u32 {
    match highest_row {
        i32::MIN..=49 => 900,
        50..=99 => 750,
        100..=149 => 500,
        150..=199 => 250,
        _ => 0,
    }
}

/// Pick the kind of the set that follows `outgoing`.
pub fn next_kind(outgoing: LaneSetKind, highest_row: i32, rng: &mut DeterministicRng) -> LaneSetKind {
    match outgoing {
        LaneSetKind::Grass | LaneSetKind::Beginning => {
            *rng.choose(&NON_GRASS).unwrap_or(&LaneSetKind::Road)
        }
        _ => {
            if rng.chance(grass_chance(highest_row)) {
                return LaneSetKind::Grass;
            }
            let mut others = [LaneSetKind::Road; 2];
            for (slot, kind) in others.iter_mut().zip(NON_GRASS.iter().filter(|&&kind| kind != outgoing)) {
                *slot = *kind;
            }
            *rng.choose(&others).unwrap_or(&LaneSetKind::Road)
        }
    }
}

//! Fixed-Point 2D Positions
//!
//! The map is a plane: `x` runs across a lane (tile columns), `y` runs
//! forward through the lanes (rows). Row 0 sits at `y == 0` and each tile
//! is [`TILE_SIZE`] wide in both directions.
//!
//! Q16.16 only covers tiles `-MAX_TILE..=MAX_TILE`. Tile coordinates past
//! that are clamped to the last representable tile in both directions.

use std::fmt;
use serde::{Serialize, Deserialize};

use super::fixed::{Fixed, FIXED_HALF, FIXED_SCALE, TILE_SIZE, fixed_div, to_float};

/// Furthest tile, in rows or columns, whose centre fits in a [`Fixed`].
pub const MAX_TILE: i32 = i16::MAX as i32;

/// 2D vector with fixed-point components.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FixedVec2 {
    /// Across-lane component (Q16.16)
    pub x: Fixed,
    /// Forward component (Q16.16)
    pub y: Fixed,
}

/// Integer tile address in the map grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TileCoord {
    /// Row coordinate (forward).
    pub row: i32,
    /// Column coordinate; 0 is the centre column.
    pub column: i32,
}

impl TileCoord {
    /// Create a tile coordinate.
    pub const fn new(row: i32, column: i32) -> Self {
        Self { row, column }
    }

    /// World position of the tile centre. Clamped to [`MAX_TILE`].
    pub fn center(self) -> FixedVec2 {
        FixedVec2::new(tile_center(self.column), tile_center(self.row))
    }
}

#[inline]
fn tile_center(index: i32) -> Fixed {
    index.clamp(-MAX_TILE, MAX_TILE) * TILE_SIZE
}

#[inline]
fn tile_of(value: Fixed) -> i32 {
    let rounded = (fixed_div(value, TILE_SIZE) as i64 + FIXED_HALF as i64) >> FIXED_SCALE;
    rounded.clamp(-MAX_TILE as i64, MAX_TILE as i64) as i32
}

impl FixedVec2 {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Create a new vector from fixed-point components.
    #[inline]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from whole world units.
    #[inline]
    pub const fn from_ints(x: i32, y: i32) -> Self {
        Self {
            x: x << FIXED_SCALE,
            y: y << FIXED_SCALE,
        }
    }

    /// Tile containing this position (nearest tile centre).
    #[inline]
    pub fn to_tile(self) -> TileCoord {
        TileCoord {
            row: tile_of(self.y),
            column: tile_of(self.x),
        }
    }

    /// Convert to float tuple for display.
    #[inline]
    pub fn to_floats(self) -> (f32, f32) {
        (to_float(self.x), to_float(self.y))
    }
}

impl fmt::Debug for FixedVec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (fx, fy) = self.to_floats();
        write!(f, "Vec2({:.3}, {:.3})", fx, fy)
    }
}

impl fmt::Display for FixedVec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (fx, fy) = self.to_floats();
        write!(f, "({:.3}, {:.3})", fx, fy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::to_fixed;

    #[test]
    fn test_to_tile_rounds_to_nearest() {
        let pos = FixedVec2::new(to_fixed(1.4), to_fixed(-5.6));
        assert_eq!(pos.to_tile(), TileCoord::new(-6, 1));

        let pos = FixedVec2::new(to_fixed(-0.4), to_fixed(12.5));
        assert_eq!(pos.to_tile(), TileCoord::new(13, 0));
    }

    #[test]
    fn test_tile_center_roundtrip() {
        let tile = TileCoord::new(7, -3);
        assert_eq!(tile.center(), FixedVec2::from_ints(-3, 7));
        assert_eq!(tile.center().to_tile(), tile);
    }

    #[test]
    fn test_tiles_clamp_at_fixed_range() {
        let far = TileCoord::new(40_000, -40_000);
        assert_eq!(far.center(), FixedVec2::from_ints(-MAX_TILE, MAX_TILE));
        assert_eq!(far.center().to_tile(), TileCoord::new(MAX_TILE, -MAX_TILE));

        let last = TileCoord::new(MAX_TILE, 0);
        assert_eq!(last.center().to_tile(), last);

        // Rounding up past the last tile must not wrap negative
        let edge = FixedVec2::new(Fixed::MIN, Fixed::MAX);
        assert_eq!(edge.to_tile(), TileCoord::new(MAX_TILE, -MAX_TILE));
    }
}

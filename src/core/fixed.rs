//! Q16.16 Fixed-Point Arithmetic
//!
//! World positions and item speeds are stored as Q16.16 so that item motion
//! and tile lookups are bit-identical across platforms. One world unit is
//! one tile.
//!
//! ```text
//! [S][IIIIIIIIIIIIIII][FFFFFFFFFFFFFFFF]
//!     15 integer bits   16 fraction bits
//! ```

/// Q16.16 fixed-point number stored as i32.
pub type Fixed = i32;

/// Number of fractional bits (16)
pub const FIXED_SCALE: i32 = 16;

/// 1.0 in fixed-point (65536)
pub const FIXED_ONE: Fixed = 1 << FIXED_SCALE;

/// 0.5 in fixed-point (32768)
pub const FIXED_HALF: Fixed = FIXED_ONE >> 1;

// =============================================================================
// MAP CONSTANTS
// =============================================================================

/// Edge length of one tile in world units.
pub const TILE_SIZE: Fixed = FIXED_ONE;

/// Simulation step: 1/60 second = round(65536/60) = 1092
pub const TICK_DURATION: Fixed = 1092;

/// Convert a compile-time float to fixed-point.
///
/// Only for constants and configuration; generation never calls this.
///
/// ```
/// use crossing_lanes::core::fixed::{to_fixed, FIXED_ONE};
/// const SPEED: i32 = to_fixed(1.5);
/// assert_eq!(SPEED, FIXED_ONE + FIXED_ONE / 2);
/// ```
#[inline]
pub const fn to_fixed(f: f64) -> Fixed {
    (f * (FIXED_ONE as f64)) as Fixed
}

/// Convert fixed-point to float for display only.
#[inline]
pub fn to_float(f: Fixed) -> f32 {
    f as f32 / FIXED_ONE as f32
}

/// Whole number to fixed-point.
#[inline]
pub const fn from_int(i: i32) -> Fixed {
    i.wrapping_shl(FIXED_SCALE as u32)
}

/// Round to the nearest whole number (halves round up).
#[inline]
pub fn round_to_int(f: Fixed) -> i32 {
    f.wrapping_add(FIXED_HALF) >> FIXED_SCALE
}

/// Multiply two fixed-point numbers through an i64 intermediate.
#[inline]
pub fn fixed_mul(a: Fixed, b: Fixed) -> Fixed {
    let wide = (a as i64) * (b as i64);
    (wide >> FIXED_SCALE) as Fixed
}

/// Divide two fixed-point numbers. Divide-by-zero yields 0.
#[inline]
pub fn fixed_div(a: Fixed, b: Fixed) -> Fixed {
    if b == 0 {
        return 0;
    }
    let wide = (a as i64) << FIXED_SCALE;
    (wide / b as i64) as Fixed
}

/// Wrap `value` into the half-open span `[min, min + span)`.
///
/// Used for items that scroll off one side of a lane and re-enter on the
/// other. A non-positive span returns `min`.
#[inline]
pub fn wrap_into(value: Fixed, min: Fixed, span: Fixed) -> Fixed {
    if span <= 0 {
        return min;
    }
    let offset = (value as i64 - min as i64).rem_euclid(span as i64);
    min.wrapping_add(offset as Fixed)
}

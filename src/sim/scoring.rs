//! Combo multiplier and merge scoring

use super::tier::radius;

/// Multiplier by combo count, clamped to the last entry
pub const COMBO_BONUS: [u64; 6] = [1, 1, 2, 3, 4, 5];

/// Flat base awarded when two same-rank pieces outside the tier table collide
pub const FALLBACK_BASE: u64 = 100;

/// Multiplier for a combo count
#[inline]
pub fn combo_multiplier(combo: u32) -> u64 {
    let idx = (combo as usize).min(COMBO_BONUS.len() - 1);
    COMBO_BONUS[idx]
}

/// Points for consuming two pieces of `rank` at the given (already incremented) combo
pub fn merge_score(rank: u8, combo: u32) -> u64 {
    2 * radius(rank) as u64 * combo_multiplier(combo)
}

/// Points for the fallback branch
pub fn fallback_score(combo: u32) -> u64 {
    FALLBACK_BASE * combo_multiplier(combo)
}

/// Combo chime level (1..=5) for a combo count
#[inline]
pub fn combo_sound_level(combo: u32) -> u8 {
    combo.min(COMBO_BONUS.len() as u32 - 1) as u8
}

//! Tier table
//!
//! Ten ranks of ball, each a strictly larger circle than the last. Rank 9 is
//! the top of the chain: two of them annihilate instead of merging.

use rand::Rng;

/// A single tier definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierSpec {
    pub rank: u8,
    /// Collider and sprite radius in simulation pixels
    pub radius: u32,
    /// Sprite path relative to the page
    pub sprite: &'static str,
}

/// Number of tiers in the table
pub const TIER_COUNT: usize = 10;

/// Highest rank; cannot merge upward
pub const MAX_TIER: u8 = (TIER_COUNT - 1) as u8;

pub const TIERS: [TierSpec; TIER_COUNT] = [
    TierSpec { rank: 0, radius: 10, sprite: "maru/001.png" },
    TierSpec { rank: 1, radius: 20, sprite: "maru/002.png" },
    TierSpec { rank: 2, radius: 30, sprite: "maru/003.png" },
    TierSpec { rank: 3, radius: 40, sprite: "maru/004.png" },
    TierSpec { rank: 4, radius: 50, sprite: "maru/005.png" },
    TierSpec { rank: 5, radius: 60, sprite: "maru/006.png" },
    TierSpec { rank: 6, radius: 70, sprite: "maru/007.png" },
    TierSpec { rank: 7, radius: 80, sprite: "maru/008.png" },
    TierSpec { rank: 8, radius: 90, sprite: "maru/009.png" },
    TierSpec { rank: 9, radius: 100, sprite: "maru/010.png" },
];

/// Look up a tier by rank (None if the rank is not in the table)
#[inline]
pub fn tier_spec(rank: u8) -> Option<&'static TierSpec> {
    TIERS.get(rank as usize)
}

/// Radius for a rank, 0 for ranks outside the table
#[inline]
pub fn radius(rank: u8) -> u32 {
    tier_spec(rank).map(|t| t.radius).unwrap_or(0)
}

/// Rank produced by merging two pieces of `rank`, or None at the top of the chain
pub fn next_tier(rank: u8) -> Option<u8> {
    if rank < MAX_TIER { Some(rank + 1) } else { None }
}

/// Pick a rank uniformly from the whole table
pub fn random_tier<R: Rng>(rng: &mut R) -> u8 {
    rng.random_range(0..TIER_COUNT as u8)
}

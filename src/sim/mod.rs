//! Merge-and-score engine
//!
//! All gameplay decisions live here. This module stays pure:
//! - Seeded RNG only
//! - Time is passed in, never read
//! - Physics is reached only through the `PhysicsWorld` trait
//! - No rendering or platform dependencies

pub mod events;
pub mod merge;
pub mod scoring;
pub mod state;
pub mod tier;

pub use events::{GameEvent, GameOverReport, ResolutionOutcome};
pub use scoring::{COMBO_BONUS, combo_multiplier, merge_score};
pub use state::{Ball, GamePhase, Session};
pub use tier::{MAX_TIER, TIER_COUNT, TIERS, TierSpec, next_tier, tier_spec};

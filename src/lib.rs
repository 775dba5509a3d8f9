//! Maru Merge - a drop-and-merge physics puzzle
//!
//! Core modules:
//! - `sim`: Game engine (tiers, scoring, collision resolution, session state)
//! - `physics`: Physics world seam and the rapier2d adapter
//! - `service`: High score HTTP handler and its stores
//! - `highscores`: Client-side board, podium threshold, name/submit seam
//! - `overlay`, `hud`, `assets`: Presentation helpers shared with the browser shell
//! - `platform`: Browser/native platform abstraction
//! - `tuning`: Data-driven game balance

pub mod assets;
pub mod audio;
pub mod highscores;
pub mod hud;
pub mod net;
pub mod overlay;
pub mod physics;
pub mod platform;
#[cfg(target_arch = "wasm32")]
pub mod render;
pub mod service;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use highscores::HighScores;
pub use settings::Settings;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Arena dimensions (simulation pixels)
    pub const ARENA_WIDTH: f32 = 540.0;
    pub const ARENA_HEIGHT: f32 = 960.0;
    /// Floor and side walls
    pub const WALL_THICKNESS: f32 = 50.0;
}

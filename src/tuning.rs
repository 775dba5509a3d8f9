//! Data-driven game balance
//!
//! Everything the designer might want to tweak without touching the engine.
//! Defaults reproduce the shipped game; a JSON file can override any field.

use anyhow::{Context, Result, bail, ensure};
use serde::{Deserialize, Serialize};

use crate::sim::tier::MAX_TIER;

/// Game balance and wiring constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Session ===
    /// Minimum gap between accepted drops (ms)
    pub drop_cooldown_ms: f64,
    /// Session length before game over (ms)
    pub session_length_ms: f64,
    /// Spawn height for dropped pieces
    pub drop_height: f32,
    /// Rank whose score must be beaten to get on the board
    pub podium_rank: usize,

    // === Special events ===
    /// Chance of the celebratory overlay per qualifying merge
    pub special_event_probability: f64,
    /// Result ranks that qualify for a special event roll
    pub special_event_tiers: Vec<u8>,
    /// Overlay clips, one picked at random per event
    pub overlay_clips: Vec<String>,

    // === Physics ===
    pub gravity: f32,
    pub ball_restitution: f32,
    pub ball_friction: f32,

    // === Network ===
    /// High score endpoint (GET top list, POST new record)
    pub score_endpoint: String,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            drop_cooldown_ms: 1000.0,
            session_length_ms: 60_000.0,
            drop_height: 50.0,
            podium_rank: 3,

            special_event_probability: 0.33,
            special_event_tiers: vec![7, 8, 9],
            overlay_clips: (1..=5).map(|i| format!("cutin/cutin{:03}.mp4", i)).collect(),

            gravity: 1000.0,
            ball_restitution: 0.5,
            ball_friction: 0.5,

            score_endpoint: "https://shinoariserver.onrender.com/highscores".to_string(),
        }
    }
}

impl Tuning {
    /// Parse and validate a tuning document (missing fields keep defaults)
    pub fn from_json(json: &str) -> Result<Self> {
        let tuning: Tuning = serde_json::from_str(json).context("parsing tuning JSON")?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load a tuning file from disk (native runner)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_file(path: &std::path::Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading tuning file {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("loading {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.special_event_probability),
            "special_event_probability must be within [0, 1], got {}",
            self.special_event_probability
        );
        ensure!(self.drop_cooldown_ms >= 0.0, "drop_cooldown_ms must not be negative");
        ensure!(self.session_length_ms > 0.0, "session_length_ms must be positive");
        ensure!(self.podium_rank > 0, "podium_rank must be at least 1");
        if let Some(bad) = self.special_event_tiers.iter().find(|t| **t > MAX_TIER) {
            bail!("special event tier {} is outside 0..={}", bad, MAX_TIER);
        }
        Ok(())
    }

    /// Whether a merge producing `rank` may roll for a special event
    pub fn is_special_tier(&self, rank: u8) -> bool {
        self.special_event_tiers.contains(&rank)
    }
}

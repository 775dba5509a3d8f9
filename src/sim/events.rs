//! Events emitted by the engine for the shell to react to
//!
//! Sound, overlay and HUD effects hang off these; none of them feed back
//! into scoring.

use crate::physics::BallId;

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Two pieces became one piece of the next tier
    Merged {
        consumed: (BallId, BallId),
        spawned: BallId,
        tier: u8,
        points: u64,
        combo: u32,
    },
    /// Two top-tier pieces cleared each other
    Annihilated {
        consumed: (BallId, BallId),
        points: u64,
        combo: u32,
    },
    /// Two same-rank pieces with a rank missing from the tier table
    FallbackCleared {
        consumed: (BallId, BallId),
        points: u64,
        combo: u32,
    },
    /// Combo chime for level 1..=5
    ComboSound { level: u8 },
    /// Celebratory overlay requested after a big merge
    SpecialEvent { tier: u8 },
}

/// Summary of one collision batch
#[derive(Debug, Clone, Default)]
pub struct ResolutionOutcome {
    pub removed: Vec<BallId>,
    pub spawned: Vec<BallId>,
    pub events: Vec<GameEvent>,
}

impl ResolutionOutcome {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }

    /// Whether any special event fired in this batch
    pub fn celebrates(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, GameEvent::SpecialEvent { .. }))
    }
}

/// Final numbers handed out once per session
#[derive(Debug, Clone, PartialEq)]
pub struct GameOverReport {
    pub score: u64,
    pub elapsed_ms: f64,
    /// Score beat the podium threshold
    pub qualified: bool,
    /// Name that was submitted, if any
    pub submitted_as: Option<String>,
}

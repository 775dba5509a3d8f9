//! Session state and spawn control
//!
//! One [`Session`] owns everything that changes during a game: score, combo,
//! the live ball set, the clock and the seeded RNG. The shell drives it with
//! drops, collision batches and clock updates.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::events::GameOverReport;
use super::tier::{random_tier, tier_spec};
use crate::consts::ARENA_WIDTH;
use crate::highscores::{HighScoreEntry, HighScores, ScoreReporter};
use crate::physics::{BallId, PhysicsWorld};
use crate::tuning::Tuning;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Accepting drops, physics running
    Playing,
    /// Time is up; physics frozen until reset
    GameOver,
}

/// A live ball
#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    pub id: BallId,
    pub tier: u8,
    pub pos: Vec2,
    pub angle: f32,
}

impl Ball {
    pub fn new(id: BallId, tier: u8, pos: Vec2) -> Self {
        Self {
            id,
            tier,
            pos,
            angle: 0.0,
        }
    }

    /// Radius from the tier table (0 for ranks outside it)
    pub fn radius(&self) -> f32 {
        tier_spec(self.tier).map(|t| t.radius as f32).unwrap_or(0.0)
    }
}

pub struct Session {
    pub phase: GamePhase,
    pub score: u64,
    pub combo: u32,
    /// Rank of the piece the next drop will spawn
    pub next_tier: u8,
    /// Live balls, in spawn order
    pub balls: Vec<Ball>,
    /// Wall-clock time the session started (ms)
    pub started_at_ms: f64,
    /// Time played so far; frozen at game over
    pub elapsed_ms: f64,
    pub(super) tuning: Tuning,
    pub(super) rng: Pcg32,
    last_drop_ms: Option<f64>,
    next_id: BallId,
}

impl Session {
    /// Start a fresh session at `now_ms`
    pub fn new(seed: u64, now_ms: f64, tuning: Tuning) -> Self {
        Self {
            phase: GamePhase::Playing,
            score: 0,
            combo: 0,
            next_tier: 0,
            balls: Vec::new(),
            started_at_ms: now_ms,
            elapsed_ms: 0.0,
            tuning,
            rng: Pcg32::seed_from_u64(seed),
            last_drop_ms: None,
            next_id: 1,
        }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    pub fn ball(&self, id: BallId) -> Option<&Ball> {
        self.balls.iter().find(|b| b.id == id)
    }

    /// Allocate a new ball ID
    fn next_ball_id(&mut self) -> BallId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Create a ball in both the session and the physics world
    pub(super) fn spawn(&mut self, tier: u8, pos: Vec2, physics: &mut dyn PhysicsWorld) -> BallId {
        let id = self.next_ball_id();
        let ball = Ball::new(id, tier, pos);
        physics.add_ball(id, pos, ball.radius());
        self.balls.push(ball);
        id
    }

    /// Player drop at simulation x. Returns the new ball, or None when the
    /// drop is ignored (cooldown or game over).
    pub fn try_drop(&mut self, x: f32, now_ms: f64, physics: &mut dyn PhysicsWorld) -> Option<BallId> {
        if !self.is_playing() {
            return None;
        }
        if let Some(last) = self.last_drop_ms {
            if now_ms - last < self.tuning.drop_cooldown_ms {
                return None;
            }
        }

        let tier = self.next_tier;
        let r = Ball::new(0, tier, Vec2::ZERO).radius();
        let x = x.clamp(r, ARENA_WIDTH - r);
        let id = self.spawn(tier, Vec2::new(x, self.tuning.drop_height), physics);

        self.next_tier = random_tier(&mut self.rng);
        self.combo = 0;
        self.last_drop_ms = Some(now_ms);
        log::debug!("Dropped ball {} (tier {}) at x={:.0}, next tier {}", id, tier, x, self.next_tier);
        Some(id)
    }

    /// Copy poses back from the physics world after a step
    pub fn sync_poses(&mut self, physics: &dyn PhysicsWorld) {
        for ball in &mut self.balls {
            if let Some(pose) = physics.ball_pose(ball.id) {
                ball.pos = pose.pos;
                ball.angle = pose.angle;
            }
        }
    }

    /// Advance the session clock; ends the game once the time limit is hit
    pub fn update_clock(
        &mut self,
        now_ms: f64,
        board: &HighScores,
        reporter: &mut dyn ScoreReporter,
    ) -> Option<GameOverReport> {
        if !self.is_playing() {
            return None;
        }
        self.elapsed_ms = (now_ms - self.started_at_ms).max(0.0);
        if self.elapsed_ms >= self.tuning.session_length_ms {
            return self.end_game(now_ms, board, reporter);
        }
        None
    }

    /// Playing -> GameOver. Later calls return None and touch nothing.
    pub fn end_game(
        &mut self,
        now_ms: f64,
        board: &HighScores,
        reporter: &mut dyn ScoreReporter,
    ) -> Option<GameOverReport> {
        if !self.is_playing() {
            return None;
        }
        self.phase = GamePhase::GameOver;
        self.elapsed_ms = (now_ms - self.started_at_ms).max(0.0);

        let threshold = board.podium_threshold(self.tuning.podium_rank);
        let qualified = board.qualifies(self.score, self.tuning.podium_rank);
        let mut submitted_as = None;
        if qualified {
            let name = reporter
                .request_name(self.score)
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty());
            if let Some(name) = name {
                reporter.submit(HighScoreEntry::new(name.clone(), self.score));
                submitted_as = Some(name);
            }
        }

        log::info!(
            "Game over: score {} in {:.1}s (podium threshold {})",
            self.score,
            self.elapsed_ms / 1000.0,
            threshold
        );
        Some(GameOverReport {
            score: self.score,
            elapsed_ms: self.elapsed_ms,
            qualified,
            submitted_as,
        })
    }

    /// Tear everything down and start over at `now_ms`
    pub fn reset(&mut self, now_ms: f64, physics: &mut dyn PhysicsWorld) {
        physics.reset_world();
        self.balls.clear();
        self.phase = GamePhase::Playing;
        self.score = 0;
        self.combo = 0;
        self.next_tier = 0;
        self.started_at_ms = now_ms;
        self.elapsed_ms = 0.0;
        self.last_drop_ms = None;
        log::info!("Game reset");
    }
}

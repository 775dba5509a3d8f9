//! Physics collaborator
//!
//! The merge engine never integrates motion itself. It talks to a
//! [`PhysicsWorld`] that owns bodies, steps the simulation and reports which
//! pairs of balls started touching during a step.

pub mod rapier;

use glam::Vec2;

pub use rapier::{BallMaterial, RapierWorld};

/// Stable ball identifier shared by the session and the physics world
pub type BallId = u32;

/// Two balls that started touching during a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionPair {
    pub a: BallId,
    pub b: BallId,
}

impl CollisionPair {
    pub fn new(a: BallId, b: BallId) -> Self {
        Self { a, b }
    }
}

/// Where a ball is right now
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallPose {
    pub pos: Vec2,
    /// Rotation (radians)
    pub angle: f32,
}

/// Capabilities the engine consumes from a 2D physics engine
pub trait PhysicsWorld {
    /// Insert a dynamic circle
    fn add_ball(&mut self, id: BallId, pos: Vec2, radius: f32);

    /// Remove a ball (no-op if unknown)
    fn remove_ball(&mut self, id: BallId);

    /// Drop every body and rebuild the floor and side walls
    fn reset_world(&mut self);

    /// Advance by `dt` seconds, returning ball pairs in reported order
    fn step(&mut self, dt: f32) -> Vec<CollisionPair>;

    /// Current pose of a ball
    fn ball_pose(&self, id: BallId) -> Option<BallPose>;
}

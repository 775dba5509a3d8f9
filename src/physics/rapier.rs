//! rapier2d adapter
//!
//! Simulation space matches the canvas: origin top-left, y grows downward,
//! so gravity is positive y. Static bounds are a floor and two walls sitting
//! just outside the playfield.

use std::collections::HashMap;

use glam::Vec2;
use rapier2d::prelude::*;

use super::{BallId, BallPose, CollisionPair, PhysicsWorld};
use crate::consts::{ARENA_HEIGHT, ARENA_WIDTH, WALL_THICKNESS};
use crate::tuning::Tuning;

/// Material for dropped and merged balls
#[derive(Debug, Clone, Copy)]
pub struct BallMaterial {
    pub restitution: f32,
    pub friction: f32,
}

impl Default for BallMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.5,
            friction: 0.5,
        }
    }
}

pub struct RapierWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    material: BallMaterial,
    ball_bodies: HashMap<BallId, RigidBodyHandle>,
    collider_to_ball: HashMap<ColliderHandle, BallId>,
}

impl RapierWorld {
    /// Create a world with bounds already in place
    pub fn new(gravity: f32, material: BallMaterial) -> Self {
        let mut world = Self {
            pipeline: PhysicsPipeline::new(),
            gravity: vector![0.0, gravity],
            integration_params: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            material,
            ball_bodies: HashMap::new(),
            collider_to_ball: HashMap::new(),
        };
        world.build_bounds();
        world
    }

    /// World configured from the balance file
    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self::new(
            tuning.gravity,
            BallMaterial {
                restitution: tuning.ball_restitution,
                friction: tuning.ball_friction,
            },
        )
    }

    /// Floor plus left and right walls
    fn build_bounds(&mut self) {
        let half_t = WALL_THICKNESS / 2.0;
        let bounds = [
            // Floor
            (ARENA_WIDTH / 2.0, ARENA_HEIGHT - half_t, ARENA_WIDTH / 2.0, half_t),
            // Left wall
            (-half_t, ARENA_HEIGHT / 2.0, half_t, ARENA_HEIGHT / 2.0),
            // Right wall
            (ARENA_WIDTH + half_t, ARENA_HEIGHT / 2.0, half_t, ARENA_HEIGHT / 2.0),
        ];
        for (x, y, hw, hh) in bounds {
            let body = self
                .bodies
                .insert(RigidBodyBuilder::fixed().translation(vector![x, y]).build());
            let collider = ColliderBuilder::cuboid(hw, hh).friction(0.5).build();
            self.colliders
                .insert_with_parent(collider, body, &mut self.bodies);
        }
    }

    /// Number of live balls
    pub fn ball_count(&self) -> usize {
        self.ball_bodies.len()
    }

    /// Number of rigid bodies including static bounds
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

impl PhysicsWorld for RapierWorld {
    fn add_ball(&mut self, id: BallId, pos: Vec2, radius: f32) {
        if self.ball_bodies.contains_key(&id) {
            return;
        }
        let body = self.bodies.insert(
            RigidBodyBuilder::dynamic()
                .translation(vector![pos.x, pos.y])
                .build(),
        );
        let collider = ColliderBuilder::ball(radius)
            .restitution(self.material.restitution)
            .friction(self.material.friction)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        let handle = self
            .colliders
            .insert_with_parent(collider, body, &mut self.bodies);
        self.ball_bodies.insert(id, body);
        self.collider_to_ball.insert(handle, id);
    }

    fn remove_ball(&mut self, id: BallId) {
        let Some(body) = self.ball_bodies.remove(&id) else {
            return;
        };
        self.bodies.remove(
            body,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        self.collider_to_ball.retain(|_, ball| *ball != id);
    }

    fn reset_world(&mut self) {
        *self = Self::new(self.gravity.y, self.material);
        log::info!("Physics world reset");
    }

    fn step(&mut self, dt: f32) -> Vec<CollisionPair> {
        self.integration_params.dt = dt;

        let (collision_send, collision_recv) =
            rapier2d::crossbeam::channel::unbounded::<CollisionEvent>();
        let (force_send, _force_recv) =
            rapier2d::crossbeam::channel::unbounded::<ContactForceEvent>();
        let events = ChannelEventCollector::new(collision_send, force_send);

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &events,
        );

        // Ball-vs-bound contacts have no entry in collider_to_ball and drop out here
        let mut pairs = Vec::new();
        while let Ok(event) = collision_recv.try_recv() {
            if let CollisionEvent::Started(h1, h2, _) = event {
                let a = self.collider_to_ball.get(&h1).copied();
                let b = self.collider_to_ball.get(&h2).copied();
                if let (Some(a), Some(b)) = (a, b) {
                    pairs.push(CollisionPair::new(a, b));
                }
            }
        }
        pairs
    }

    fn ball_pose(&self, id: BallId) -> Option<BallPose> {
        let body = self.bodies.get(*self.ball_bodies.get(&id)?)?;
        let t = body.translation();
        Some(BallPose {
            pos: Vec2::new(t.x, t.y),
            angle: body.rotation().angle(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn world() -> RapierWorld {
        RapierWorld::new(1000.0, BallMaterial::default())
    }

    #[test]
    fn test_bounds_only_on_creation() {
        let w = world();
        assert_eq!(w.body_count(), 3);
        assert_eq!(w.ball_count(), 0);
    }

    #[test]
    fn test_overlapping_balls_report_pair() {
        let mut w = world();
        w.add_ball(1, Vec2::new(270.0, 500.0), 10.0);
        w.add_ball(2, Vec2::new(275.0, 500.0), 10.0);

        let mut pairs = Vec::new();
        for _ in 0..5 {
            pairs.extend(w.step(SIM_DT));
        }
        assert!(
            pairs
                .iter()
                .any(|p| (p.a == 1 && p.b == 2) || (p.a == 2 && p.b == 1))
        );
    }

    #[test]
    fn test_floor_contact_is_not_a_pair() {
        let mut w = world();
        w.add_ball(1, Vec2::new(270.0, 880.0), 20.0);
        for _ in 0..120 {
            assert!(w.step(SIM_DT).is_empty());
        }
        // Resting on the floor, not fallen through
        let pose = w.ball_pose(1).unwrap();
        assert!(pose.pos.y < ARENA_HEIGHT - WALL_THICKNESS);
    }

    #[test]
    fn test_gravity_pulls_down() {
        let mut w = world();
        w.add_ball(7, Vec2::new(100.0, 100.0), 10.0);
        for _ in 0..10 {
            w.step(SIM_DT);
        }
        assert!(w.ball_pose(7).unwrap().pos.y > 100.0);
    }

    #[test]
    fn test_remove_and_reset() {
        let mut w = world();
        w.add_ball(1, Vec2::new(100.0, 100.0), 10.0);
        w.add_ball(2, Vec2::new(200.0, 100.0), 10.0);
        w.remove_ball(1);
        w.remove_ball(1);
        assert_eq!(w.ball_count(), 1);
        assert!(w.ball_pose(1).is_none());

        w.reset_world();
        assert_eq!(w.ball_count(), 0);
        assert_eq!(w.body_count(), 3);
    }
}

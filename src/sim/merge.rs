//! Collision resolution
//!
//! The physics world hands over the pairs that started touching this step.
//! Same-rank pairs are consumed in reported order; a ball consumed by one
//! pair is skipped by every later pair in the same batch.

use std::collections::HashSet;

use rand::Rng;

use super::events::{GameEvent, ResolutionOutcome};
use super::scoring::{combo_sound_level, fallback_score, merge_score};
use super::state::Session;
use super::tier::{next_tier, tier_spec};
use crate::physics::{CollisionPair, PhysicsWorld};

impl Session {
    /// Resolve one step's collision batch
    pub fn resolve_collisions(
        &mut self,
        pairs: &[CollisionPair],
        physics: &mut dyn PhysicsWorld,
    ) -> ResolutionOutcome {
        let mut outcome = ResolutionOutcome::default();
        if !self.is_playing() {
            return outcome;
        }

        let mut consumed = HashSet::new();
        for pair in pairs {
            if pair.a == pair.b || consumed.contains(&pair.a) || consumed.contains(&pair.b) {
                continue;
            }
            let (Some(a), Some(b)) = (self.ball(pair.a), self.ball(pair.b)) else {
                continue;
            };
            // Different ranks just bounce
            if a.tier != b.tier {
                continue;
            }
            let (rank, at) = (a.tier, a.pos);
            let ids = (a.id, b.id);

            consumed.insert(ids.0);
            consumed.insert(ids.1);
            physics.remove_ball(ids.0);
            physics.remove_ball(ids.1);
            outcome.removed.extend([ids.0, ids.1]);
            self.combo += 1;
            let combo = self.combo;

            let mut special = None;
            match (tier_spec(rank), next_tier(rank)) {
                (Some(_), Some(up)) => {
                    let points = merge_score(rank, combo);
                    self.score += points;
                    let spawned = self.spawn(up, at, physics);
                    outcome.spawned.push(spawned);
                    outcome.events.push(GameEvent::Merged {
                        consumed: ids,
                        spawned,
                        tier: up,
                        points,
                        combo,
                    });
                    if self.tuning.is_special_tier(up) {
                        special = Some(up);
                    }
                    log::debug!("Merged {:?} into tier {} (+{}, combo {})", ids, up, points, combo);
                }
                (Some(_), None) => {
                    let points = merge_score(rank, combo);
                    self.score += points;
                    outcome.events.push(GameEvent::Annihilated {
                        consumed: ids,
                        points,
                        combo,
                    });
                    special = Some(rank);
                    log::debug!("Top tier pair {:?} cleared (+{}, combo {})", ids, points, combo);
                }
                (None, _) => {
                    let points = fallback_score(combo);
                    self.score += points;
                    outcome.events.push(GameEvent::FallbackCleared {
                        consumed: ids,
                        points,
                        combo,
                    });
                    log::warn!("Cleared pair {:?} with rank {} outside the tier table", ids, rank);
                }
            }

            outcome.events.push(GameEvent::ComboSound {
                level: combo_sound_level(combo),
            });
            if let Some(tier) = special {
                if self.roll_special_event() {
                    outcome.events.push(GameEvent::SpecialEvent { tier });
                }
            }
        }

        if !consumed.is_empty() {
            self.balls.retain(|b| !consumed.contains(&b.id));
        }
        outcome
    }

    /// One uniform draw against the configured probability
    fn roll_special_event(&mut self) -> bool {
        self.rng.random::<f64>() < self.tuning.special_event_probability
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::BallId;
    use crate::sim::state::tests::{ScriptedPhysics, session};
    use crate::sim::state::Ball;
    use crate::sim::tier::MAX_TIER;
    use crate::tuning::Tuning;
    use glam::Vec2;
    use proptest::prelude::*;

    fn place(s: &mut Session, physics: &mut ScriptedPhysics, tier: u8, x: f32) -> BallId {
        s.spawn(tier, Vec2::new(x, 500.0), physics)
    }

    fn pair(a: BallId, b: BallId) -> CollisionPair {
        CollisionPair::new(a, b)
    }

    fn no_specials() -> Session {
        Session::new(
            1,
            0.0,
            Tuning {
                special_event_probability: 0.0,
                ..Tuning::default()
            },
        )
    }

    #[test]
    fn test_merge_two_smallest() {
        let mut s = session();
        let mut physics = ScriptedPhysics::default();
        let a = place(&mut s, &mut physics, 0, 100.0);
        let b = place(&mut s, &mut physics, 0, 110.0);

        let out = s.resolve_collisions(&[pair(a, b)], &mut physics);
        assert_eq!(out.removed, vec![a, b]);
        assert_eq!(out.spawned.len(), 1);
        assert_eq!(s.score, 20);
        assert_eq!(s.combo, 1);
        assert_eq!(s.balls.len(), 1);
        let merged = &s.balls[0];
        assert_eq!(merged.tier, 1);
        assert_eq!(merged.pos, Vec2::new(100.0, 500.0));
        assert!(physics.bodies.contains_key(&merged.id));
        assert!(!physics.bodies.contains_key(&a));
        assert!(!physics.bodies.contains_key(&b));
    }

    #[test]
    fn test_fifth_merge_in_chain() {
        let mut s = no_specials();
        let mut physics = ScriptedPhysics::default();
        s.combo = 4;
        let a = place(&mut s, &mut physics, 3, 100.0);
        let b = place(&mut s, &mut physics, 3, 150.0);
        s.resolve_collisions(&[pair(a, b)], &mut physics);
        assert_eq!(s.score, 400);
        assert_eq!(s.combo, 5);
    }

    #[test]
    fn test_different_tiers_bounce() {
        let mut s = session();
        let mut physics = ScriptedPhysics::default();
        let a = place(&mut s, &mut physics, 2, 100.0);
        let b = place(&mut s, &mut physics, 3, 150.0);
        let out = s.resolve_collisions(&[pair(a, b)], &mut physics);
        assert!(out.is_empty());
        assert!(out.events.is_empty());
        assert_eq!(s.balls.len(), 2);
        assert_eq!(s.score, 0);
        assert_eq!(s.combo, 0);
    }

    #[test]
    fn test_max_tier_annihilates() {
        let mut s = no_specials();
        let mut physics = ScriptedPhysics::default();
        let a = place(&mut s, &mut physics, MAX_TIER, 100.0);
        let b = place(&mut s, &mut physics, MAX_TIER, 300.0);
        let out = s.resolve_collisions(&[pair(a, b)], &mut physics);
        assert_eq!(out.removed.len(), 2);
        assert!(out.spawned.is_empty());
        assert!(s.balls.is_empty());
        assert_eq!(s.score, 200);
        assert!(matches!(out.events[0], GameEvent::Annihilated { points: 200, .. }));
    }

    #[test]
    fn test_fallback_branch() {
        let mut s = no_specials();
        let mut physics = ScriptedPhysics::default();
        s.combo = 1;
        // Ranks outside the table can only appear through direct construction
        s.balls.push(Ball::new(900, 12, Vec2::new(10.0, 10.0)));
        s.balls.push(Ball::new(901, 12, Vec2::new(20.0, 10.0)));
        let out = s.resolve_collisions(&[pair(900, 901)], &mut physics);
        assert_eq!(s.combo, 2);
        assert_eq!(s.score, 200);
        assert!(out.spawned.is_empty());
        assert!(s.balls.is_empty());
        assert!(matches!(out.events[0], GameEvent::FallbackCleared { .. }));
    }

    #[test]
    fn test_consumed_ball_skipped_later_in_batch() {
        let mut s = session();
        let mut physics = ScriptedPhysics::default();
        let a = place(&mut s, &mut physics, 1, 100.0);
        let b = place(&mut s, &mut physics, 1, 120.0);
        let c = place(&mut s, &mut physics, 1, 140.0);

        let out = s.resolve_collisions(&[pair(a, b), pair(b, c), pair(c, a)], &mut physics);
        assert_eq!(out.removed, vec![a, b]);
        assert_eq!(s.combo, 1);
        assert_eq!(s.balls.len(), 2);
        assert!(s.ball(c).is_some());
        assert_eq!(physics.removed, vec![a, b]);
    }

    #[test]
    fn test_batch_chains_combo() {
        let mut s = no_specials();
        let mut physics = ScriptedPhysics::default();
        let a = place(&mut s, &mut physics, 0, 100.0);
        let b = place(&mut s, &mut physics, 0, 120.0);
        let c = place(&mut s, &mut physics, 2, 300.0);
        let d = place(&mut s, &mut physics, 2, 320.0);

        let out = s.resolve_collisions(&[pair(a, b), pair(c, d)], &mut physics);
        // 10*2*1 + 30*2*2
        assert_eq!(s.score, 20 + 120);
        assert_eq!(s.combo, 2);
        let levels: Vec<u8> = out
            .events
            .iter()
            .filter_map(|e| match e {
                GameEvent::ComboSound { level } => Some(*level),
                _ => None,
            })
            .collect();
        assert_eq!(levels, vec![1, 2]);
    }

    #[test]
    fn test_stale_and_self_pairs_ignored() {
        let mut s = session();
        let mut physics = ScriptedPhysics::default();
        let a = place(&mut s, &mut physics, 0, 100.0);
        let out = s.resolve_collisions(&[pair(a, a), pair(a, 9999)], &mut physics);
        assert!(out.is_empty());
        assert_eq!(s.balls.len(), 1);
    }

    #[test]
    fn test_special_event_always_with_certain_probability() {
        let mut s = Session::new(
            3,
            0.0,
            Tuning {
                special_event_probability: 1.0,
                ..Tuning::default()
            },
        );
        let mut physics = ScriptedPhysics::default();

        // 6 -> 7 qualifies
        let a = place(&mut s, &mut physics, 6, 100.0);
        let b = place(&mut s, &mut physics, 6, 200.0);
        let out = s.resolve_collisions(&[pair(a, b)], &mut physics);
        assert!(out.celebrates());
        assert_eq!(out.events.last(), Some(&GameEvent::SpecialEvent { tier: 7 }));

        // 5 -> 6 does not
        let a = place(&mut s, &mut physics, 5, 100.0);
        let b = place(&mut s, &mut physics, 5, 200.0);
        assert!(!s.resolve_collisions(&[pair(a, b)], &mut physics).celebrates());

        // Top tier always rolls
        let a = place(&mut s, &mut physics, MAX_TIER, 100.0);
        let b = place(&mut s, &mut physics, MAX_TIER, 300.0);
        let out = s.resolve_collisions(&[pair(a, b)], &mut physics);
        assert_eq!(out.events.last(), Some(&GameEvent::SpecialEvent { tier: MAX_TIER }));
    }

    #[test]
    fn test_special_event_rate() {
        let mut s = session();
        let mut physics = ScriptedPhysics::default();
        let mut hits = 0;
        for _ in 0..2000 {
            let a = place(&mut s, &mut physics, 8, 100.0);
            let b = place(&mut s, &mut physics, 8, 200.0);
            if s.resolve_collisions(&[pair(a, b)], &mut physics).celebrates() {
                hits += 1;
            }
        }
        let rate = hits as f64 / 2000.0;
        assert!((0.27..0.39).contains(&rate), "rate {}", rate);
    }

    #[test]
    fn test_no_resolution_after_game_over() {
        use crate::highscores::HighScores;
        use crate::sim::state::tests::CountingReporter;

        let mut s = session();
        let mut physics = ScriptedPhysics::default();
        let a = place(&mut s, &mut physics, 0, 100.0);
        let b = place(&mut s, &mut physics, 0, 110.0);
        s.end_game(0.0, &HighScores::new(), &mut CountingReporter::default());
        assert!(s.resolve_collisions(&[pair(a, b)], &mut physics).is_empty());
        assert_eq!(s.balls.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_merge_replaces_two_with_one_higher(tier in 0u8..MAX_TIER, combo in 0u32..20) {
            let mut s = session();
            let mut physics = ScriptedPhysics::default();
            s.combo = combo;
            let a = place(&mut s, &mut physics, tier, 100.0);
            let b = place(&mut s, &mut physics, tier, 200.0);
            let before = s.score;

            let out = s.resolve_collisions(&[pair(a, b)], &mut physics);
            prop_assert_eq!(out.removed.len(), 2);
            prop_assert_eq!(out.spawned.len(), 1);
            prop_assert_eq!(s.balls.len(), 1);
            prop_assert_eq!(s.balls[0].tier, tier + 1);
            prop_assert_eq!(s.combo, combo + 1);
            prop_assert!(s.score > before);
        }

        #[test]
        fn prop_score_never_decreases(tiers in proptest::collection::vec(0u8..=MAX_TIER, 2..40)) {
            let mut s = session();
            let mut physics = ScriptedPhysics::default();
            let ids: Vec<BallId> = tiers
                .iter()
                .enumerate()
                .map(|(i, t)| place(&mut s, &mut physics, *t, i as f32))
                .collect();
            let mut last = 0;
            for w in ids.windows(2) {
                s.resolve_collisions(&[pair(w[0], w[1])], &mut physics);
                prop_assert!(s.score >= last);
                last = s.score;
            }
            prop_assert!(s.balls.iter().all(|b| b.tier <= MAX_TIER));
        }
    }
}

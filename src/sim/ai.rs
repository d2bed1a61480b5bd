//! Boss AI contract and the pieces shared by every archetype
//!
//! Each archetype splits its fight into stages. A stage is one `BossAi`
//! implementation with its own closed set of states; the boss holds the
//! current stage and at most one staged replacement, which it swaps in at
//! the end of its tick.

use std::fmt;

use glam::{Vec2, Vec3};

use super::animation::AnimationMultiLerp;
use super::body_part::PartId;
use super::boss::{BossBody, report_damage};
use super::classical_ai::{ArmsBodyHeadAi, BodyHeadAi, HeadAi};
use super::collision::circle_lines_collision;
use super::error::BossError;
use super::state::{GameBall, GameEvent, GameLevel, GameModel, Projectile, ProjectileKind};
use super::weakpoint::DamageOutcome;
use crate::consts::*;
use crate::rotate_degs;

/// Mutable view of everything an AI stage may touch during one call
pub struct AiContext<'a> {
    pub body: &'a mut BossBody,
    pub model: &'a mut GameModel,
    next_ai: &'a mut Option<BossAiState>,
}

impl<'a> AiContext<'a> {
    pub(crate) fn new(
        body: &'a mut BossBody,
        model: &'a mut GameModel,
        next_ai: &'a mut Option<BossAiState>,
    ) -> Self {
        Self { body, model, next_ai }
    }

    /// Stage the AI that takes over once the boss finishes its current tick
    pub fn set_next_ai_state(&mut self, state: BossAiState) {
        log::debug!("Staging AI stage {}", state.as_ai().stage_name());
        if let Some(old) = self.next_ai.replace(state) {
            log::debug!("Dropping staged AI {}", old.as_ai().stage_name());
        }
    }

    pub fn has_next_ai_state(&self) -> bool {
        self.next_ai.is_some()
    }

    /// World position of the alive assembly
    pub fn boss_position(&self) -> Vec2 {
        self.body.alive_position()
    }
}

/// Behaviour of one boss stage.
///
/// Only `tick` is mandatory. Collision and explosion notifications default to
/// doing nothing: a stage reacts only to the events that matter to it.
pub trait BossAi: fmt::Debug {
    /// Name of the stage (stable across its states)
    fn stage_name(&self) -> &'static str;

    /// Name of the state the stage is currently in
    fn state_name(&self) -> &'static str;

    fn tick(&mut self, dt: f32, ctx: &mut AiContext<'_>) -> Result<(), BossError>;

    fn collision_occurred_with_ball(
        &mut self,
        _ctx: &mut AiContext<'_>,
        _ball: &mut GameBall,
        _part: PartId,
        _outcome: DamageOutcome,
    ) -> Result<(), BossError> {
        Ok(())
    }

    fn collision_occurred_with_projectile(
        &mut self,
        _ctx: &mut AiContext<'_>,
        _projectile: &Projectile,
        _part: PartId,
        _outcome: DamageOutcome,
    ) -> Result<(), BossError> {
        Ok(())
    }

    fn collision_occurred_with_paddle(&mut self, _ctx: &mut AiContext<'_>, _part: PartId) -> Result<(), BossError> {
        Ok(())
    }

    fn beam_collision_occurred(
        &mut self,
        _ctx: &mut AiContext<'_>,
        _part: PartId,
        _outcome: DamageOutcome,
    ) -> Result<(), BossError> {
        Ok(())
    }

    fn rocket_explosion_occurred(
        &mut self,
        _ctx: &mut AiContext<'_>,
        _center: Vec2,
        _radius: f32,
    ) -> Result<(), BossError> {
        Ok(())
    }

    fn mine_explosion_occurred(
        &mut self,
        _ctx: &mut AiContext<'_>,
        _center: Vec2,
        _radius: f32,
    ) -> Result<(), BossError> {
        Ok(())
    }

    fn tesla_lightning_arc_hit_occurred(
        &mut self,
        _ctx: &mut AiContext<'_>,
        _start: Vec2,
        _end: Vec2,
    ) -> Result<(), BossError> {
        Ok(())
    }

    /// Whether touching the boss body currently hurts the paddle
    fn can_hurt_paddle_with_body(&self) -> bool {
        false
    }

    /// True once the final stage has reached its terminal state
    fn is_state_machine_finished(&self) -> bool {
        false
    }
}

/// Every AI stage of every buildable archetype
#[derive(Debug)]
pub enum BossAiState {
    ClassicalArmsBodyHead(ArmsBodyHeadAi),
    ClassicalBodyHead(BodyHeadAi),
    ClassicalHead(HeadAi),
}

impl BossAiState {
    pub fn as_ai(&self) -> &dyn BossAi {
        match self {
            BossAiState::ClassicalArmsBodyHead(ai) => ai,
            BossAiState::ClassicalBodyHead(ai) => ai,
            BossAiState::ClassicalHead(ai) => ai,
        }
    }

    pub fn as_ai_mut(&mut self) -> &mut dyn BossAi {
        match self {
            BossAiState::ClassicalArmsBodyHead(ai) => ai,
            BossAiState::ClassicalBodyHead(ai) => ai,
            BossAiState::ClassicalHead(ai) => ai,
        }
    }
}

impl From<ArmsBodyHeadAi> for BossAiState {
    fn from(ai: ArmsBodyHeadAi) -> Self {
        BossAiState::ClassicalArmsBodyHead(ai)
    }
}

impl From<BodyHeadAi> for BossAiState {
    fn from(ai: BodyHeadAi) -> Self {
        BossAiState::ClassicalBodyHead(ai)
    }
}

impl From<HeadAi> for BossAiState {
    fn from(ai: HeadAi) -> Self {
        BossAiState::ClassicalHead(ai)
    }
}

/// Steering and move-to-target state shared by every stage
#[derive(Debug, Clone)]
pub struct BossAiCore {
    pub curr_vel: Vec2,
    pub desired_vel: Vec2,
    accel_magnitude: f32,
    max_speed: f32,
    start_position: Vec2,
    target_position: Vec2,
    target_error: f32,
}

impl BossAiCore {
    /// Arrival tolerance for `move_to_target_position`
    pub const DEFAULT_TARGET_ERROR: f32 = 0.1 * PIECE_HEIGHT;

    pub fn new(max_speed: f32, accel_magnitude: f32) -> Self {
        Self {
            curr_vel: Vec2::ZERO,
            desired_vel: Vec2::ZERO,
            accel_magnitude,
            max_speed,
            start_position: Vec2::ZERO,
            target_position: Vec2::ZERO,
            target_error: Self::DEFAULT_TARGET_ERROR,
        }
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    pub fn accel_magnitude(&self) -> f32 {
        self.accel_magnitude
    }

    pub fn stop(&mut self) {
        self.curr_vel = Vec2::ZERO;
        self.desired_vel = Vec2::ZERO;
    }

    /// Constant-magnitude steering toward the desired velocity
    pub fn acceleration(&self) -> Vec2 {
        let diff = self.desired_vel - self.curr_vel;
        if diff == Vec2::ZERO {
            return Vec2::ZERO;
        }
        diff.normalize_or_zero() * self.accel_magnitude
    }

    /// Move the alive body by the current velocity, keep it inside the
    /// level, then steer the velocity toward the desired one.
    pub fn update_movement(&mut self, dt: f32, body: &mut BossBody, level: &GameLevel) {
        let alive = body.alive_parts_root();

        if self.curr_vel != Vec2::ZERO {
            let d_movement = dt * self.curr_vel;
            body.tree_mut().translate(alive, d_movement.extend(0.0));

            if let Some(correction) = level.collide_boss_with_level(&body.alive_aabb()) {
                log::trace!("Boss pushed back inside the level by {correction}");
                body.tree_mut().translate(alive, correction.extend(0.0));
            }
        }

        if self.curr_vel != self.desired_vel {
            let d_accel = dt * self.acceleration();
            let vel_diff = self.desired_vel - self.curr_vel;
            if vel_diff.length_squared() <= d_accel.length_squared() {
                self.curr_vel = self.desired_vel;
            } else {
                self.curr_vel += d_accel;
            }
        }

        body.tree_mut().set_collision_velocity(alive, self.curr_vel);
    }

    pub fn set_move_to_target_position(&mut self, start: Vec2, target: Vec2, error: f32) {
        self.start_position = start;
        self.target_position = target;
        self.target_error = error;
    }

    pub fn target_position(&self) -> Vec2 {
        self.target_position
    }

    /// Steer toward the stored target, braking in time to stop on it.
    ///
    /// Returns true (and stops the boss) once it is within tolerance of the
    /// target or has overshot it.
    pub fn move_to_target_position(&mut self, body: &BossBody, max_move_speed: f32) -> bool {
        let boss_pos = body.alive_position();
        let start_to_target = self.target_position - self.start_position;
        let curr_to_target = self.target_position - boss_pos;

        if curr_to_target.length() < self.target_error || start_to_target.dot(curr_to_target) <= 0.0 {
            self.stop();
            return true;
        }

        let stop_dist = if self.accel_magnitude > 0.0 {
            self.curr_vel.length_squared() / (2.0 * self.accel_magnitude)
        } else {
            0.0
        };
        if curr_to_target.length_squared() - EPSILON <= stop_dist * stop_dist {
            self.desired_vel = Vec2::ZERO;
        } else {
            self.desired_vel = max_move_speed * curr_to_target.normalize_or_zero();
        }
        false
    }
}

/// The `count` candidates furthest from `boss_pos`, furthest first
pub fn furthest_dist_from_boss_positions(boss_pos: Vec2, positions: &[Vec2], count: usize) -> Vec<Vec2> {
    let mut by_dist: Vec<(f32, Vec2)> = positions
        .iter()
        .map(|p| (boss_pos.distance_squared(*p), *p))
        .collect();
    by_dist.sort_by(|a, b| b.0.total_cmp(&a.0));
    by_dist.into_iter().take(count).map(|(_, p)| p).collect()
}

/// Fan of five boss lasers aimed at the paddle: one straight, two either side
pub fn execute_laser_spray(model: &mut GameModel, origin: Vec2, spread_degs: f32) {
    let aim = (model.paddle.center_position() - origin).try_normalize().unwrap_or(Vec2::NEG_Y);

    for step in [0.0, 1.0, 2.0, -1.0, -2.0] {
        let dir = rotate_degs(aim, step * spread_degs);
        model.add_projectile(ProjectileKind::BossLaserBullet, origin, dir * BOSS_LASER_SPEED);
    }
    model.push_event(GameEvent::BossLaserSpray { shots: 5 });
}

/// Single boss laser straight at the paddle
pub fn fire_laser_at_paddle(model: &mut GameModel, origin: Vec2) {
    let aim = (model.paddle.center_position() - origin).try_normalize().unwrap_or(Vec2::NEG_Y);
    model.add_projectile(ProjectileKind::BossLaserBullet, origin, aim * BOSS_LASER_SPEED);
}

/// Damage every live weakpoint touched by an explosion circle and report
/// what happened to each
pub fn damage_weakpoints_in_radius(
    ctx: &mut AiContext<'_>,
    center: Vec2,
    radius: f32,
    damage: f32,
) -> Vec<(PartId, DamageOutcome)> {
    let mut results = Vec::new();
    for id in ctx.body.live_weakpoints() {
        let tree = ctx.body.tree();
        let inside = tree.generate_world_aabb(id).contains_point(center);
        if !inside && !circle_lines_collision(center, radius, &tree.world_bounds(id)).hit {
            continue;
        }
        let outcome = ctx
            .body
            .tree_mut()
            .part_mut(id)
            .weakpoint_mut()
            .map_or(DamageOutcome::Ignored, |wp| wp.diminish(damage));
        report_damage(ctx.model, id, outcome);
        results.push((id, outcome));
    }
    results
}

/// Offset the alive assembly's origin, used for angry and death shakes
pub fn alive_shake_offset(body: &mut BossBody, offset: Vec3) {
    let alive = body.alive_parts_root();
    body.tree_mut()
        .part_mut(alive)
        .animate_local_translation(AnimationMultiLerp::new(offset));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::body_part::BodyPart;
    use crate::sim::bounds::BoundingLines;

    fn single_block_body(x: f32) -> BossBody {
        let mut body = BossBody::new().unwrap();
        let alive = body.alive_parts_root();
        body.add_part(alive, BodyPart::basic("block", BoundingLines::rect(1.0, 1.0)))
            .unwrap();
        body.tree_mut().translate(alive, Vec3::new(x, 5.0, 0.0));
        body
    }

    #[test]
    fn test_exactly_touching_wall_needs_no_correction() {
        let level = GameLevel::new(20.0, 30.0);
        let mut body = single_block_body(18.0);
        let mut core = BossAiCore::new(10.0, 0.0);
        core.curr_vel = Vec2::new(2.0, 0.0);
        core.desired_vel = core.curr_vel;

        core.update_movement(0.5, &mut body, &level);

        assert_eq!(body.alive_position(), Vec2::new(19.0, 5.0));
        assert_eq!(body.alive_aabb().max.x, 20.0);
        assert_eq!(level.collide_boss_with_level(&body.alive_aabb()), None);
    }

    #[test]
    fn test_wall_penetration_is_fully_cancelled() {
        let level = GameLevel::new(20.0, 30.0);
        let mut body = single_block_body(18.0);
        let mut core = BossAiCore::new(10.0, 0.0);
        core.curr_vel = Vec2::new(4.0, 0.0);
        core.desired_vel = core.curr_vel;

        // Would end at x = 20 with the box reaching 21
        core.update_movement(0.5, &mut body, &level);

        assert_eq!(body.alive_position(), Vec2::new(19.0, 5.0));
        assert!(body.alive_aabb().max.x <= level.width);
    }

    #[test]
    fn test_velocity_steers_and_snaps_to_desired() {
        let level = GameLevel::new(100.0, 100.0);
        let mut body = single_block_body(50.0);
        let mut core = BossAiCore::new(10.0, 4.0);
        core.desired_vel = Vec2::new(3.0, 0.0);

        core.update_movement(0.5, &mut body, &level);
        assert!((core.curr_vel - Vec2::new(2.0, 0.0)).length() < 1e-5);
        core.update_movement(0.5, &mut body, &level);
        assert_eq!(core.curr_vel, Vec2::new(3.0, 0.0));
        assert_eq!(core.acceleration(), Vec2::ZERO);

        let alive = body.alive_parts_root();
        assert_eq!(body.tree().part(alive).collision_velocity(), core.curr_vel);
    }

    #[test]
    fn test_move_to_target_arrives_and_stops() {
        let level = GameLevel::new(100.0, 100.0);
        let mut body = single_block_body(10.0);
        let mut core = BossAiCore::new(8.0, 20.0);
        let start = body.alive_position();
        let target = Vec2::new(30.0, 5.0);
        core.set_move_to_target_position(start, target, BossAiCore::DEFAULT_TARGET_ERROR);

        let mut arrived = false;
        for _ in 0..2000 {
            if core.move_to_target_position(&body, core.max_speed()) {
                arrived = true;
                break;
            }
            core.update_movement(1.0 / 120.0, &mut body, &level);
        }

        assert!(arrived);
        assert_eq!(core.curr_vel, Vec2::ZERO);
        assert!((body.alive_position() - target).length() < 1.0);
    }

    #[test]
    fn test_furthest_positions_sorted() {
        let positions = [
            Vec2::new(1.0, 0.0),
            Vec2::new(5.0, 0.0),
            Vec2::new(-3.0, 0.0),
            Vec2::new(0.0, 2.0),
        ];
        let picked = furthest_dist_from_boss_positions(Vec2::ZERO, &positions, 2);
        assert_eq!(picked, vec![Vec2::new(5.0, 0.0), Vec2::new(-3.0, 0.0)]);
    }

    #[test]
    fn test_laser_spray_fans_toward_paddle() {
        let mut model = GameModel::new(1, GameLevel::default());
        let origin = model.paddle.center_position() + Vec2::new(0.0, 20.0);
        execute_laser_spray(&mut model, origin, 15.0);

        assert_eq!(model.projectiles.len(), 5);
        let straight = model.projectiles[0].vel.normalize();
        assert!((straight - Vec2::NEG_Y).length() < 1e-4);
        for p in &model.projectiles {
            assert_eq!(p.kind, ProjectileKind::BossLaserBullet);
            assert!((p.vel.length() - BOSS_LASER_SPEED).abs() < 1e-3);
            let angle = straight.angle_to(p.vel.normalize()).to_degrees().abs();
            assert!(angle < 30.0 + 1e-3);
        }
        assert_eq!(model.drain_events(), vec![GameEvent::BossLaserSpray { shots: 5 }]);
    }

    #[test]
    fn test_explosion_damages_only_touched_weakpoints() {
        let mut body = BossBody::new().unwrap();
        let alive = body.alive_parts_root();
        let near = body
            .add_part(alive, BodyPart::basic("near", BoundingLines::rect(1.0, 1.0)))
            .unwrap();
        let far = body
            .add_part(alive, BodyPart::basic("far", BoundingLines::rect(1.0, 1.0)))
            .unwrap();
        body.tree_mut().translate(far, Vec3::new(20.0, 0.0, 0.0));
        body.convert_alive_body_part_to_weakpoint(near, 100.0, 10.0, 1.0).unwrap();
        body.convert_alive_body_part_to_weakpoint(far, 100.0, 10.0, 1.0).unwrap();

        let mut model = GameModel::new(1, GameLevel::default());
        let mut next = None;
        let mut ctx = AiContext::new(&mut body, &mut model, &mut next);
        let hits = damage_weakpoints_in_radius(&mut ctx, Vec2::new(2.0, 0.0), 1.5, 150.0);

        assert_eq!(hits, vec![(near, DamageOutcome::Destroyed)]);
        assert!(body.tree().part(near).is_destroyed());
        assert!(!body.tree().part(far).is_destroyed());
        assert!(model.events.contains(&GameEvent::BossWeakpointDestroyed { part: near }));
    }
}

//! AI stages of the Classical boss
//!
//! 1. `ArmsBodyHeadAi`: the squares on the arms are the weakpoints. The boss
//!    patrols near the top of the level spraying lasers, then either chases
//!    the paddle and slams it with an arm or charges a laser barrage.
//! 2. `BodyHeadAi`: with both arms gone the columns are exposed. The boss
//!    moves faster and barrages from the centre of the level.
//! 3. `HeadAi`: only the pediment and its eye remain. The eye darts between
//!    far-apart spots until it is destroyed.

use glam::{Mat4, Vec2, Vec3};
use rand::Rng;

use super::ai::{
    AiContext, BossAi, BossAiCore, alive_shake_offset, damage_weakpoints_in_radius, execute_laser_spray,
    fire_laser_at_paddle, furthest_dist_from_boss_positions,
};
use super::animation::AnimationMultiLerp;
use super::body_part::PartId;
use super::boss::BossBody;
use super::boss_anims::{
    TOTAL_DEATH_ANIM_TIME, angry_flash_anim, angry_shake_anim, final_death_flash_anim, final_death_shake_anim,
    hurt_and_invulnerable_colour_anim_for, hurt_flash_and_fade_anim, limb_fall_off_translation_anim,
    limb_fall_off_z_rotation_anim,
};
use super::classical::{
    self, ARM_HEIGHT, ARM_WIDTH, ARM_X_TRANSLATION_FROM_CENTER, ARMS_BODY_HEAD_ACCELERATION,
    ARMS_BODY_HEAD_MAX_SPEED, BODY_HEAD_ACCELERATION, BODY_HEAD_MAX_SPEED, COLUMN_HEIGHT, ClassicalLayout,
    EYE_ACCELERATION, EYE_MAX_SPEED, HALF_ARM_WIDTH,
};
use super::error::BossError;
use super::state::{GameBall, GameEvent, Projectile, ProjectileKind};
use super::weakpoint::DamageOutcome;
use crate::consts::*;
use crate::sign_of;
use crate::tuning::ClassicalTuning;

const LIMB_FADE_TIME: f32 = 3.0;
const ANGRY_SHAKE_MAGNITUDE: f32 = 0.6;
const DEATH_SHAKE_MAGNITUDE: f32 = 0.3;

// --- Helpers shared by the three stages ---

fn weakpoint_life(body: &BossBody, id: PartId) -> f32 {
    body.tree()
        .part(id)
        .weakpoint()
        .map_or(0.0, |wp| wp.current_life_percentage())
}

fn eye_position(ctx: &AiContext<'_>, layout: &ClassicalLayout) -> Vec2 {
    ctx.body.tree().translation_pt2d(layout.eye)
}

fn basic_movement_height(ctx: &AiContext<'_>) -> f32 {
    ctx.model.level.level_unit_height() - 1.25 * ctx.body.alive_height()
}

/// Bob around the patrol height and sweep between the walls
fn patrol(core: &mut BossAiCore, ctx: &mut AiContext<'_>) {
    let level = ctx.model.level;
    let boss_pos = ctx.boss_position();
    let max_speed = core.max_speed();

    let avg_height = basic_movement_height(ctx);
    let up_down = ctx.body.alive_height() / 5.0;
    if boss_pos.y < avg_height - up_down {
        core.desired_vel.y = max_speed / 2.0;
    }
    if boss_pos.y > avg_height + up_down {
        core.desired_vel.y = -max_speed / 2.0;
    }

    let boss_width = ctx.body.alive_width();
    if boss_pos.x <= boss_width {
        core.desired_vel.x = max_speed / 1.25;
    } else if boss_pos.x >= level.level_unit_width() - boss_width {
        core.desired_vel.x = -max_speed / 1.25;
    }

    if core.desired_vel.x.abs() < EPSILON {
        let sign = if ctx.model.rng.random_bool(0.5) { 1.0 } else { -1.0 };
        core.desired_vel.x = sign * max_speed / 1.25;
    }
}

/// Root position that puts the centre of the alive body at `centre`
fn root_target_for_centre(body: &BossBody, centre: Vec2) -> Vec2 {
    let offset = body.alive_aabb().center() - body.alive_position();
    centre - offset
}

fn reset_alive_colour(body: &mut BossBody) {
    let alive = body.alive_parts_root();
    body.tree_mut().reset_colour(alive);
}

/// Detach `part` into the dead subtree and let it tumble out of the level.
/// The distances are in world space.
fn fall_off(body: &mut BossBody, part: PartId, world_dist: Vec2, rot_degs: f32) -> Result<(), BossError> {
    body.convert_alive_body_part_to_dead_body_part(part)?;

    let tree = body.tree_mut();
    let local_dist = tree
        .world_transform(part)
        .inverse()
        .transform_vector3(world_dist.extend(0.0));
    tree.animate_colour_rgba(part, &hurt_flash_and_fade_anim(LIMB_FADE_TIME));

    let p = tree.part_mut(part);
    p.animate_local_translation(limb_fall_off_translation_anim(LIMB_FADE_TIME, local_dist.x, local_dist.y));
    p.animate_local_z_rotation(limb_fall_off_z_rotation_anim(LIMB_FADE_TIME, rot_degs));
    Ok(())
}

/// Distance that drops a part from where it is to below the level floor
fn drop_below_floor(body: &BossBody, part: PartId, extra: f32) -> f32 {
    -body.tree().translation_pt2d(part).y - extra
}

fn begin_angry(ctx: &mut AiContext<'_>) -> AnimationMultiLerp<Vec3> {
    let alive = ctx.body.alive_parts_root();
    ctx.body.tree_mut().animate_colour_rgba(alive, &angry_flash_anim());
    ctx.model.push_event(GameEvent::BossAngry);
    angry_shake_anim(&mut ctx.model.rng, ANGRY_SHAKE_MAGNITUDE)
}

/// Shake the alive body; true once the shake is over and the body is settled
fn tick_angry(anim: &mut AnimationMultiLerp<Vec3>, dt: f32, body: &mut BossBody) -> bool {
    let done = anim.tick(dt);
    alive_shake_offset(body, anim.interpolant_value());
    if done {
        alive_shake_offset(body, Vec3::ZERO);
        reset_alive_colour(body);
    }
    done
}

fn stage_next(ctx: &mut AiContext<'_>, next: impl BossAi + Into<super::ai::BossAiState>) {
    ctx.model.push_event(GameEvent::BossStageChanged {
        stage: next.stage_name(),
    });
    ctx.set_next_ai_state(next.into());
}

// --- Stage 1: arms, body and head ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmsBodyHeadState {
    BasicMoveAndLaserSpray,
    ChasePaddle,
    AttackLeftArm,
    AttackRightArm,
    AttackBothArms,
    PrepLaser,
    MoveAndBarrageWithLaser,
    HurtLeftArm,
    HurtRightArm,
    LostArmsAngry,
}

impl ArmsBodyHeadState {
    pub fn name(self) -> &'static str {
        match self {
            Self::BasicMoveAndLaserSpray => "basic move and laser spray",
            Self::ChasePaddle => "chase paddle",
            Self::AttackLeftArm => "attack left arm",
            Self::AttackRightArm => "attack right arm",
            Self::AttackBothArms => "attack both arms",
            Self::PrepLaser => "prep laser",
            Self::MoveAndBarrageWithLaser => "move and barrage with laser",
            Self::HurtLeftArm => "hurt left arm",
            Self::HurtRightArm => "hurt right arm",
            Self::LostArmsAngry => "lost arms angry",
        }
    }

    /// (left, right) arms swinging in this state
    fn attacking_arms(self) -> Option<(bool, bool)> {
        match self {
            Self::AttackLeftArm => Some((true, false)),
            Self::AttackRightArm => Some((false, true)),
            Self::AttackBothArms => Some((true, true)),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct ArmsBodyHeadAi {
    core: BossAiCore,
    layout: ClassicalLayout,
    tuning: ClassicalTuning,
    state: ArmsBodyHeadState,

    // Basic move
    laser_spray_countdown: f32,
    countdown_to_next_state: f32,
    // Chase
    countdown_to_attack: f32,
    // Arm attacks
    arm_shake_anim: AnimationMultiLerp<f32>,
    arm_attack_y_anim: AnimationMultiLerp<f32>,
    left_arm_start_world: Mat4,
    right_arm_start_world: Mat4,
    paddle_hit_this_attack: bool,
    // Laser charge and barrage
    laser_charge_countdown: f32,
    barrage_shots_left: u32,
    barrage_countdown: f32,
    // Hurt and angry
    hurt_countdown: f32,
    angry_anim: AnimationMultiLerp<Vec3>,
}

impl ArmsBodyHeadAi {
    /// Turn both arm squares into weakpoints and start patrolling
    pub fn new(body: &mut BossBody, layout: ClassicalLayout, tuning: &ClassicalTuning) -> Result<Self, BossError> {
        for square in [layout.left_arm_square, layout.right_arm_square] {
            body.convert_alive_body_part_to_weakpoint(
                square,
                tuning.arm_life_points,
                tuning.arm_ball_damage,
                tuning.invulnerable_time,
            )?;
        }

        Ok(Self {
            core: BossAiCore::new(ARMS_BODY_HEAD_MAX_SPEED, ARMS_BODY_HEAD_ACCELERATION),
            layout,
            tuning: tuning.clone(),
            state: ArmsBodyHeadState::BasicMoveAndLaserSpray,
            laser_spray_countdown: tuning.laser_spray_reset_time,
            countdown_to_next_state: tuning.basic_move_time_min,
            countdown_to_attack: 0.0,
            arm_shake_anim: tuning.arm_shake.to_anim(0.15 * ARM_WIDTH),
            arm_attack_y_anim: tuning.arm_strike.to_anim(Self::max_arm_attack_y_movement()),
            left_arm_start_world: Mat4::IDENTITY,
            right_arm_start_world: Mat4::IDENTITY,
            paddle_hit_this_attack: false,
            laser_charge_countdown: 0.0,
            barrage_shots_left: 0,
            barrage_countdown: 0.0,
            hurt_countdown: 0.0,
            angry_anim: AnimationMultiLerp::new(Vec3::ZERO),
        })
    }

    pub fn state(&self) -> ArmsBodyHeadState {
        self.state
    }

    pub fn layout(&self) -> &ClassicalLayout {
        &self.layout
    }

    fn max_arm_attack_y_movement() -> f32 {
        0.7 * ARM_HEIGHT
    }

    fn follow_and_attack_height(ctx: &AiContext<'_>) -> f32 {
        0.8 * Self::max_arm_attack_y_movement() + ctx.body.alive_height() / 2.0
    }

    fn average_arm_life(&self, body: &BossBody) -> f32 {
        (weakpoint_life(body, self.layout.left_arm_square) + weakpoint_life(body, self.layout.right_arm_square)) / 2.0
    }

    fn arm_alive(&self, body: &BossBody, is_left: bool) -> bool {
        let arm = if is_left { self.layout.left_arm } else { self.layout.right_arm };
        body.is_alive_part(arm)
    }

    fn set_state(&mut self, new_state: ArmsBodyHeadState, ctx: &mut AiContext<'_>) {
        use ArmsBodyHeadState::*;

        log::debug!("Classical arms stage: {} -> {}", self.state.name(), new_state.name());
        match new_state {
            BasicMoveAndLaserSpray => {
                self.laser_spray_countdown = self.tuning.laser_spray_reset_time;
                self.countdown_to_next_state =
                    self.tuning.basic_move_time_min + ctx.model.rng.random::<f32>() * self.tuning.basic_move_time_jitter;
            }
            ChasePaddle => {
                self.countdown_to_attack =
                    self.tuning.follow_time_min + ctx.model.rng.random::<f32>() * self.tuning.follow_time_jitter;
            }
            AttackLeftArm | AttackRightArm | AttackBothArms => {
                self.core.stop();
                self.arm_shake_anim.reset_to_start();
                self.arm_attack_y_anim.reset_to_start();
                self.left_arm_start_world = ctx.body.tree().world_transform(self.layout.left_arm);
                self.right_arm_start_world = ctx.body.tree().world_transform(self.layout.right_arm);
                self.paddle_hit_this_attack = false;
            }
            PrepLaser => {
                let start = ctx.boss_position();
                let centre_x = ctx.model.level.level_unit_width() / 2.0;
                let target = Vec2::new(centre_x, basic_movement_height(ctx));
                self.core
                    .set_move_to_target_position(start, target, BossAiCore::DEFAULT_TARGET_ERROR);
                self.laser_charge_countdown = self.tuning.laser_charge_time;
            }
            MoveAndBarrageWithLaser => {
                self.barrage_shots_left = self.tuning.barrage_shots;
                self.barrage_countdown = 0.0;
            }
            HurtLeftArm | HurtRightArm => {
                self.core.desired_vel = Vec2::ZERO;
                self.hurt_countdown = self.tuning.hurt_time;
                let is_left = new_state == HurtLeftArm;
                if self.arm_alive(ctx.body, is_left) {
                    let arm = if is_left { self.layout.left_arm } else { self.layout.right_arm };
                    let anim = hurt_and_invulnerable_colour_anim_for(self.tuning.invulnerable_time);
                    ctx.body.tree_mut().animate_colour_rgba(arm, &anim);
                }
            }
            LostArmsAngry => {
                self.core.stop();
                self.angry_anim = begin_angry(ctx);
            }
        }
        self.state = new_state;
    }

    fn update_state(&mut self, dt: f32, ctx: &mut AiContext<'_>) -> Result<(), BossError> {
        use ArmsBodyHeadState::*;

        match self.state {
            BasicMoveAndLaserSpray => self.execute_basic_move_and_laser_spray_state(dt, ctx),
            ChasePaddle => self.execute_follow_paddle_state(dt, ctx),
            AttackLeftArm => self.execute_arm_attack_state(dt, ctx, true, false),
            AttackRightArm => self.execute_arm_attack_state(dt, ctx, false, true),
            AttackBothArms => self.execute_arm_attack_state(dt, ctx, true, true),
            PrepLaser => self.execute_prep_laser_state(dt, ctx),
            MoveAndBarrageWithLaser => self.execute_move_and_barrage_state(dt, ctx),
            HurtLeftArm | HurtRightArm => self.execute_hurt_state(dt, ctx),
            LostArmsAngry => return self.execute_lost_arms_angry_state(dt, ctx),
        }
        Ok(())
    }

    fn execute_basic_move_and_laser_spray_state(&mut self, dt: f32, ctx: &mut AiContext<'_>) {
        patrol(&mut self.core, ctx);

        if self.countdown_to_next_state <= 0.0 {
            // Laser barrages come more often the more damaged the arms are
            let total_life = self.average_arm_life(ctx.body);
            if ctx.model.rng.random::<f32>() >= total_life - 0.1 {
                self.set_state(ArmsBodyHeadState::PrepLaser, ctx);
            } else {
                self.set_state(ArmsBodyHeadState::ChasePaddle, ctx);
            }
        } else {
            self.countdown_to_next_state -= dt;
        }

        if self.laser_spray_countdown <= 0.0 {
            let eye = eye_position(ctx, &self.layout);
            execute_laser_spray(ctx.model, eye, self.tuning.laser_spread_degs);
            self.laser_spray_countdown = self.tuning.laser_spray_reset_time;
        } else {
            self.laser_spray_countdown -= dt;
        }
    }

    fn execute_follow_paddle_state(&mut self, dt: f32, ctx: &mut AiContext<'_>) {
        let paddle_pos = ctx.model.paddle.center_position();
        let boss_pos = ctx.boss_position();
        let max_speed = self.core.max_speed();

        let mut allowed_to_attack = false;
        if boss_pos.y > Self::follow_and_attack_height(ctx) {
            self.core.desired_vel.y = -max_speed / 2.0;
        } else {
            self.core.curr_vel.y = 0.0;
            self.core.desired_vel.y = 0.0;
            allowed_to_attack = true;
        }

        let boss_to_paddle = paddle_pos - boss_pos;
        let abs_x_dist = boss_to_paddle.x.abs();

        // Paddle is right under one of the arms
        if abs_x_dist <= ARM_X_TRANSLATION_FROM_CENTER + HALF_ARM_WIDTH
            && abs_x_dist >= ARM_X_TRANSLATION_FROM_CENTER - HALF_ARM_WIDTH
        {
            self.core.desired_vel.x = 0.0;
            if allowed_to_attack {
                let next = self.determine_next_arm_attack_state(ctx, boss_to_paddle);
                self.set_state(next, ctx);
            }
            return;
        }

        if abs_x_dist > ARM_X_TRANSLATION_FROM_CENTER + HALF_ARM_WIDTH {
            self.core.desired_vel.x = sign_of(boss_to_paddle.x) * max_speed;
        } else {
            // Paddle is between the arms: back away so an arm lines up with it
            let sign = if abs_x_dist < EPSILON {
                if ctx.model.rng.random_bool(0.5) { 1.0 } else { -1.0 }
            } else if boss_to_paddle.x < 0.0 {
                1.0
            } else {
                -1.0
            };
            self.core.desired_vel.x = sign * max_speed;
        }

        if self.countdown_to_attack <= 0.0 {
            if allowed_to_attack {
                let next = self.determine_next_arm_attack_state(ctx, boss_to_paddle);
                self.set_state(next, ctx);
            }
        } else {
            self.countdown_to_attack -= dt;
        }
    }

    /// Both arms when a roll beats the remaining arm life, otherwise the arm
    /// on the paddle's side
    fn determine_next_arm_attack_state(&self, ctx: &mut AiContext<'_>, boss_to_paddle: Vec2) -> ArmsBodyHeadState {
        let left_alive = self.arm_alive(ctx.body, true);
        let right_alive = self.arm_alive(ctx.body, false);
        match (left_alive, right_alive) {
            (true, false) => return ArmsBodyHeadState::AttackLeftArm,
            (false, true) => return ArmsBodyHeadState::AttackRightArm,
            _ => {}
        }

        let total_life = self.average_arm_life(ctx.body);
        if ctx.model.rng.random::<f32>() >= total_life {
            ArmsBodyHeadState::AttackBothArms
        } else if boss_to_paddle.x < 0.0 {
            ArmsBodyHeadState::AttackLeftArm
        } else {
            ArmsBodyHeadState::AttackRightArm
        }
    }

    /// Telegraph with a sideways shake, then strike straight down
    fn execute_arm_attack_state(&mut self, dt: f32, ctx: &mut AiContext<'_>, left: bool, right: bool) {
        let left = left && self.arm_alive(ctx.body, true);
        let right = right && self.arm_alive(ctx.body, false);
        let tree = ctx.body.tree_mut();

        let done_shaking = self.arm_shake_anim.tick(dt);
        if !done_shaking {
            let offset = Mat4::from_translation(Vec3::new(self.arm_shake_anim.interpolant_value(), 0.0, 0.0));
            if left {
                tree.set_world_transform(self.layout.left_arm, offset * self.left_arm_start_world);
            }
            if right {
                tree.set_world_transform(self.layout.right_arm, offset * self.right_arm_start_world);
            }
            return;
        }

        let attack_done = self.arm_attack_y_anim.tick(dt);
        let offset = Mat4::from_translation(Vec3::new(0.0, self.arm_attack_y_anim.interpolant_value(), 0.0));
        if left {
            tree.set_world_transform(self.layout.left_arm, offset * self.left_arm_start_world);
        }
        if right {
            tree.set_world_transform(self.layout.right_arm, offset * self.right_arm_start_world);
        }

        if attack_done {
            self.restore_arms(ctx.body);
            self.set_state(ArmsBodyHeadState::BasicMoveAndLaserSpray, ctx);
        }
    }

    fn restore_arms(&self, body: &mut BossBody) {
        if self.arm_alive(body, true) {
            body.tree_mut()
                .set_world_transform(self.layout.left_arm, self.left_arm_start_world);
        }
        if self.arm_alive(body, false) {
            body.tree_mut()
                .set_world_transform(self.layout.right_arm, self.right_arm_start_world);
        }
    }

    fn execute_prep_laser_state(&mut self, dt: f32, ctx: &mut AiContext<'_>) {
        let max_speed = self.core.max_speed();
        if !self.core.move_to_target_position(ctx.body, max_speed) {
            return;
        }

        self.laser_charge_countdown -= dt;
        if self.laser_charge_countdown <= 0.0 {
            self.set_state(ArmsBodyHeadState::MoveAndBarrageWithLaser, ctx);
        }
    }

    fn execute_move_and_barrage_state(&mut self, dt: f32, ctx: &mut AiContext<'_>) {
        patrol(&mut self.core, ctx);

        if self.barrage_countdown > 0.0 {
            self.barrage_countdown -= dt;
            return;
        }

        let eye = eye_position(ctx, &self.layout);
        fire_laser_at_paddle(ctx.model, eye);
        self.barrage_shots_left = self.barrage_shots_left.saturating_sub(1);
        self.barrage_countdown = self.tuning.barrage_interval;

        if self.barrage_shots_left == 0 {
            self.set_state(ArmsBodyHeadState::BasicMoveAndLaserSpray, ctx);
        }
    }

    fn execute_hurt_state(&mut self, dt: f32, ctx: &mut AiContext<'_>) {
        self.hurt_countdown -= dt;
        if self.hurt_countdown <= 0.0 {
            self.set_state(ArmsBodyHeadState::BasicMoveAndLaserSpray, ctx);
        }
    }

    fn execute_lost_arms_angry_state(&mut self, dt: f32, ctx: &mut AiContext<'_>) -> Result<(), BossError> {
        self.core.stop();
        if tick_angry(&mut self.angry_anim, dt, ctx.body) && !ctx.has_next_ai_state() {
            let next = BodyHeadAi::new(ctx.body, self.layout, &self.tuning)?;
            stage_next(ctx, next);
        }
        Ok(())
    }

    fn weakpoint_damaged(&mut self, ctx: &mut AiContext<'_>, part: PartId, outcome: DamageOutcome) -> Result<(), BossError> {
        use ArmsBodyHeadState::*;

        if !outcome.took_damage() || self.state == LostArmsAngry {
            return Ok(());
        }
        let is_left = if part == self.layout.left_arm_square {
            true
        } else if part == self.layout.right_arm_square {
            false
        } else {
            return Ok(());
        };

        // Any swing in progress is abandoned with the arms back in place
        if self.state.attacking_arms().is_some() {
            self.restore_arms(ctx.body);
        }

        if outcome == DamageOutcome::Destroyed {
            let (arm, side) = if is_left {
                (self.layout.left_arm, -1.0)
            } else {
                (self.layout.right_arm, 1.0)
            };
            let drop = drop_below_floor(ctx.body, arm, 2.0 * ARM_HEIGHT);
            fall_off(ctx.body, arm, Vec2::new(side * 3.0 * ARM_WIDTH, drop), -side * 180.0)?;
            log::info!("Classical boss lost its {} arm", if is_left { "left" } else { "right" });

            if !self.arm_alive(ctx.body, true) && !self.arm_alive(ctx.body, false) {
                self.set_state(LostArmsAngry, ctx);
                return Ok(());
            }
        }

        self.set_state(if is_left { HurtLeftArm } else { HurtRightArm }, ctx);
        Ok(())
    }

    fn explosion(&mut self, ctx: &mut AiContext<'_>, center: Vec2, radius: f32, kind: ProjectileKind) -> Result<(), BossError> {
        for (part, outcome) in damage_weakpoints_in_radius(ctx, center, radius, kind.default_damage()) {
            self.weakpoint_damaged(ctx, part, outcome)?;
        }
        Ok(())
    }
}

impl BossAi for ArmsBodyHeadAi {
    fn stage_name(&self) -> &'static str {
        "arms-body-head"
    }

    fn state_name(&self) -> &'static str {
        self.state.name()
    }

    fn tick(&mut self, dt: f32, ctx: &mut AiContext<'_>) -> Result<(), BossError> {
        self.update_state(dt, ctx)?;
        let level = ctx.model.level;
        self.core.update_movement(dt, ctx.body, &level);
        Ok(())
    }

    fn collision_occurred_with_ball(
        &mut self,
        ctx: &mut AiContext<'_>,
        _ball: &mut GameBall,
        part: PartId,
        outcome: DamageOutcome,
    ) -> Result<(), BossError> {
        self.weakpoint_damaged(ctx, part, outcome)
    }

    fn collision_occurred_with_projectile(
        &mut self,
        ctx: &mut AiContext<'_>,
        _projectile: &Projectile,
        part: PartId,
        outcome: DamageOutcome,
    ) -> Result<(), BossError> {
        self.weakpoint_damaged(ctx, part, outcome)
    }

    fn collision_occurred_with_paddle(&mut self, ctx: &mut AiContext<'_>, part: PartId) -> Result<(), BossError> {
        if !self.can_hurt_paddle_with_body() || self.paddle_hit_this_attack {
            return Ok(());
        }
        let tree = ctx.body.tree();
        let by_arm = tree.is_or_contains_part(self.layout.left_arm, part, true)
            || tree.is_or_contains_part(self.layout.right_arm, part, true);
        if by_arm {
            self.paddle_hit_this_attack = true;
            ctx.model.paddle.times_hurt += 1;
            ctx.model.push_event(GameEvent::PaddleHitByBoss);
        }
        Ok(())
    }

    fn beam_collision_occurred(
        &mut self,
        ctx: &mut AiContext<'_>,
        part: PartId,
        outcome: DamageOutcome,
    ) -> Result<(), BossError> {
        self.weakpoint_damaged(ctx, part, outcome)
    }

    fn rocket_explosion_occurred(&mut self, ctx: &mut AiContext<'_>, center: Vec2, radius: f32) -> Result<(), BossError> {
        self.explosion(ctx, center, radius, ProjectileKind::PaddleRocketBullet)
    }

    fn mine_explosion_occurred(&mut self, ctx: &mut AiContext<'_>, center: Vec2, radius: f32) -> Result<(), BossError> {
        self.explosion(ctx, center, radius, ProjectileKind::PaddleMineBullet)
    }

    fn can_hurt_paddle_with_body(&self) -> bool {
        self.state.attacking_arms().is_some()
    }
}

// --- Stage 2: body and head ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyHeadState {
    BasicMoveAndLaserSpray,
    MoveToCentreAndBarrage,
    Hurt,
    LostBodyAngry,
}

impl BodyHeadState {
    pub fn name(self) -> &'static str {
        match self {
            Self::BasicMoveAndLaserSpray => "basic move and laser spray",
            Self::MoveToCentreAndBarrage => "move to centre and barrage",
            Self::Hurt => "hurt",
            Self::LostBodyAngry => "lost body angry",
        }
    }
}

#[derive(Debug)]
pub struct BodyHeadAi {
    core: BossAiCore,
    layout: ClassicalLayout,
    tuning: ClassicalTuning,
    state: BodyHeadState,
    laser_spray_countdown: f32,
    countdown_to_next_state: f32,
    barrage_shots_left: u32,
    barrage_countdown: f32,
    hurt_countdown: f32,
    angry_anim: AnimationMultiLerp<Vec3>,
}

impl BodyHeadAi {
    /// Expose the columns and make each of them a weakpoint
    pub fn new(body: &mut BossBody, layout: ClassicalLayout, tuning: &ClassicalTuning) -> Result<Self, BossError> {
        classical::generate_full_column_pediment_bounds(body, &layout);
        for column in layout.columns {
            body.convert_alive_body_part_to_weakpoint(
                column,
                tuning.column_life_points,
                tuning.column_ball_damage,
                tuning.invulnerable_time,
            )?;
        }

        Ok(Self {
            core: BossAiCore::new(BODY_HEAD_MAX_SPEED, BODY_HEAD_ACCELERATION),
            layout,
            tuning: tuning.clone(),
            state: BodyHeadState::BasicMoveAndLaserSpray,
            laser_spray_countdown: tuning.laser_spray_reset_time,
            countdown_to_next_state: tuning.basic_move_time_min,
            barrage_shots_left: 0,
            barrage_countdown: 0.0,
            hurt_countdown: 0.0,
            angry_anim: AnimationMultiLerp::new(Vec3::ZERO),
        })
    }

    pub fn state(&self) -> BodyHeadState {
        self.state
    }

    fn columns_remaining(&self, body: &BossBody) -> usize {
        self.layout
            .columns
            .iter()
            .filter(|c| body.is_alive_part(**c))
            .count()
    }

    fn set_state(&mut self, new_state: BodyHeadState, ctx: &mut AiContext<'_>) {
        log::debug!("Classical body stage: {} -> {}", self.state.name(), new_state.name());
        match new_state {
            BodyHeadState::BasicMoveAndLaserSpray => {
                self.laser_spray_countdown = self.tuning.laser_spray_reset_time;
                self.countdown_to_next_state =
                    self.tuning.basic_move_time_min + ctx.model.rng.random::<f32>() * self.tuning.basic_move_time_jitter;
            }
            BodyHeadState::MoveToCentreAndBarrage => {
                let start = ctx.boss_position();
                let target = Vec2::new(ctx.model.level.level_unit_width() / 2.0, basic_movement_height(ctx));
                self.core
                    .set_move_to_target_position(start, target, BossAiCore::DEFAULT_TARGET_ERROR);
                self.barrage_shots_left = self.tuning.barrage_shots;
                self.barrage_countdown = 0.0;
            }
            BodyHeadState::Hurt => {
                self.core.desired_vel = Vec2::ZERO;
                self.hurt_countdown = self.tuning.hurt_time;
            }
            BodyHeadState::LostBodyAngry => {
                self.core.stop();
                self.angry_anim = begin_angry(ctx);
            }
        }
        self.state = new_state;
    }

    fn update_state(&mut self, dt: f32, ctx: &mut AiContext<'_>) -> Result<(), BossError> {
        match self.state {
            BodyHeadState::BasicMoveAndLaserSpray => {
                patrol(&mut self.core, ctx);
                if self.countdown_to_next_state <= 0.0 {
                    self.set_state(BodyHeadState::MoveToCentreAndBarrage, ctx);
                } else {
                    self.countdown_to_next_state -= dt;
                }

                if self.laser_spray_countdown <= 0.0 {
                    let eye = eye_position(ctx, &self.layout);
                    execute_laser_spray(ctx.model, eye, self.tuning.laser_spread_degs);
                    self.laser_spray_countdown = self.tuning.laser_spray_reset_time;
                } else {
                    self.laser_spray_countdown -= dt;
                }
            }
            BodyHeadState::MoveToCentreAndBarrage => {
                let max_speed = self.core.max_speed();
                if !self.core.move_to_target_position(ctx.body, max_speed) {
                    return Ok(());
                }
                if self.barrage_countdown > 0.0 {
                    self.barrage_countdown -= dt;
                    return Ok(());
                }
                let eye = eye_position(ctx, &self.layout);
                fire_laser_at_paddle(ctx.model, eye);
                self.barrage_shots_left = self.barrage_shots_left.saturating_sub(1);
                self.barrage_countdown = self.tuning.barrage_interval;
                if self.barrage_shots_left == 0 {
                    self.set_state(BodyHeadState::BasicMoveAndLaserSpray, ctx);
                }
            }
            BodyHeadState::Hurt => {
                self.hurt_countdown -= dt;
                if self.hurt_countdown <= 0.0 {
                    self.set_state(BodyHeadState::BasicMoveAndLaserSpray, ctx);
                }
            }
            BodyHeadState::LostBodyAngry => {
                self.core.stop();
                if tick_angry(&mut self.angry_anim, dt, ctx.body) && !ctx.has_next_ai_state() {
                    self.drop_frame(ctx)?;
                    let next = HeadAi::new(ctx.body, self.layout, &self.tuning)?;
                    stage_next(ctx, next);
                }
            }
        }
        Ok(())
    }

    /// Tablatures and base come away, leaving only the head
    fn drop_frame(&mut self, ctx: &mut AiContext<'_>) -> Result<(), BossError> {
        let parts = self.layout.tablatures.into_iter().chain([self.layout.base]);
        for part in parts {
            if !ctx.body.is_alive_part(part) {
                continue;
            }
            let x = ctx.body.tree().translation_pt2d(part).x - ctx.boss_position().x;
            let drop = drop_below_floor(ctx.body, part, 2.0 * COLUMN_HEIGHT);
            let spin = ctx.model.rng.random_range(30.0..90.0) * sign_of(x);
            fall_off(ctx.body, part, Vec2::new(sign_of(x) * 2.0 * PIECE_WIDTH, drop), -spin)?;
        }
        Ok(())
    }

    fn weakpoint_damaged(&mut self, ctx: &mut AiContext<'_>, part: PartId, outcome: DamageOutcome) -> Result<(), BossError> {
        if !outcome.took_damage() || self.state == BodyHeadState::LostBodyAngry || !self.layout.columns.contains(&part) {
            return Ok(());
        }

        if outcome == DamageOutcome::Destroyed {
            let drop = drop_below_floor(ctx.body, part, 2.0 * COLUMN_HEIGHT);
            let spin = ctx.model.rng.random_range(-90.0..90.0);
            fall_off(ctx.body, part, Vec2::new(0.0, drop), spin)?;
            log::info!("Classical boss lost a column, {} left", self.columns_remaining(ctx.body));

            if self.columns_remaining(ctx.body) == 0 {
                self.set_state(BodyHeadState::LostBodyAngry, ctx);
                return Ok(());
            }
        } else {
            let anim = hurt_and_invulnerable_colour_anim_for(self.tuning.invulnerable_time);
            ctx.body.tree_mut().animate_colour_rgba(part, &anim);
        }

        self.set_state(BodyHeadState::Hurt, ctx);
        Ok(())
    }

    fn explosion(&mut self, ctx: &mut AiContext<'_>, center: Vec2, radius: f32, kind: ProjectileKind) -> Result<(), BossError> {
        for (part, outcome) in damage_weakpoints_in_radius(ctx, center, radius, kind.default_damage()) {
            self.weakpoint_damaged(ctx, part, outcome)?;
        }
        Ok(())
    }
}

impl BossAi for BodyHeadAi {
    fn stage_name(&self) -> &'static str {
        "body-head"
    }

    fn state_name(&self) -> &'static str {
        self.state.name()
    }

    fn tick(&mut self, dt: f32, ctx: &mut AiContext<'_>) -> Result<(), BossError> {
        self.update_state(dt, ctx)?;
        let level = ctx.model.level;
        self.core.update_movement(dt, ctx.body, &level);
        Ok(())
    }

    fn collision_occurred_with_ball(
        &mut self,
        ctx: &mut AiContext<'_>,
        _ball: &mut GameBall,
        part: PartId,
        outcome: DamageOutcome,
    ) -> Result<(), BossError> {
        self.weakpoint_damaged(ctx, part, outcome)
    }

    fn collision_occurred_with_projectile(
        &mut self,
        ctx: &mut AiContext<'_>,
        _projectile: &Projectile,
        part: PartId,
        outcome: DamageOutcome,
    ) -> Result<(), BossError> {
        self.weakpoint_damaged(ctx, part, outcome)
    }

    fn beam_collision_occurred(
        &mut self,
        ctx: &mut AiContext<'_>,
        part: PartId,
        outcome: DamageOutcome,
    ) -> Result<(), BossError> {
        self.weakpoint_damaged(ctx, part, outcome)
    }

    fn rocket_explosion_occurred(&mut self, ctx: &mut AiContext<'_>, center: Vec2, radius: f32) -> Result<(), BossError> {
        self.explosion(ctx, center, radius, ProjectileKind::PaddleRocketBullet)
    }

    fn mine_explosion_occurred(&mut self, ctx: &mut AiContext<'_>, center: Vec2, radius: f32) -> Result<(), BossError> {
        self.explosion(ctx, center, radius, ProjectileKind::PaddleMineBullet)
    }
}

// --- Stage 3: head ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadState {
    MoveAndLaserSpray,
    Hurt,
    FinalDeathThroes,
}

impl HeadState {
    pub fn name(self) -> &'static str {
        match self {
            Self::MoveAndLaserSpray => "move and laser spray",
            Self::Hurt => "hurt",
            Self::FinalDeathThroes => "final death throes",
        }
    }
}

#[derive(Debug)]
pub struct HeadAi {
    core: BossAiCore,
    layout: ClassicalLayout,
    tuning: ClassicalTuning,
    state: HeadState,
    laser_spray_countdown: f32,
    has_target: bool,
    hurt_countdown: f32,
    death_shake_anim: AnimationMultiLerp<Vec3>,
    death_countdown: f32,
    body_cleared: bool,
}

impl HeadAi {
    const NUM_TARGET_CHOICES: usize = 3;

    /// Give the eye its bounds and make it the last weakpoint
    pub fn new(body: &mut BossBody, layout: ClassicalLayout, tuning: &ClassicalTuning) -> Result<Self, BossError> {
        classical::generate_eye_bounds(body, &layout);
        body.convert_alive_body_part_to_weakpoint(
            layout.eye,
            tuning.eye_life_points,
            tuning.eye_ball_damage,
            tuning.invulnerable_time,
        )?;

        Ok(Self {
            core: BossAiCore::new(EYE_MAX_SPEED, EYE_ACCELERATION),
            layout,
            tuning: tuning.clone(),
            state: HeadState::MoveAndLaserSpray,
            laser_spray_countdown: tuning.laser_spray_reset_time,
            has_target: false,
            hurt_countdown: 0.0,
            death_shake_anim: AnimationMultiLerp::new(Vec3::ZERO),
            death_countdown: 0.0,
            body_cleared: false,
        })
    }

    pub fn state(&self) -> HeadState {
        self.state
    }

    /// Spots spread over the upper half of the level, as root positions
    fn target_positions(ctx: &AiContext<'_>) -> Vec<Vec2> {
        let level = ctx.model.level;
        let aabb = ctx.body.alive_aabb();
        let half = Vec2::new(aabb.width(), aabb.height()) / 2.0 + Vec2::splat(PIECE_HEIGHT);

        let (min_x, max_x) = (half.x, level.level_unit_width() - half.x);
        let (min_y, max_y) = (level.level_unit_height() / 2.0, level.level_unit_height() - half.y);

        let mut positions = Vec::with_capacity(10);
        for fy in [0.0, 1.0] {
            for fx in [0.0, 0.25, 0.5, 0.75, 1.0] {
                let centre = Vec2::new(min_x + fx * (max_x - min_x), min_y + fy * (max_y - min_y));
                positions.push(root_target_for_centre(ctx.body, centre));
            }
        }
        positions
    }

    fn choose_next_target(&mut self, ctx: &mut AiContext<'_>) {
        let boss_pos = ctx.boss_position();
        let candidates = Self::target_positions(ctx);
        let furthest = furthest_dist_from_boss_positions(boss_pos, &candidates, Self::NUM_TARGET_CHOICES);
        let pick = ctx.model.rng.random_range(0..furthest.len());
        self.core
            .set_move_to_target_position(boss_pos, furthest[pick], BossAiCore::DEFAULT_TARGET_ERROR);
        self.has_target = true;
    }

    fn set_state(&mut self, new_state: HeadState, ctx: &mut AiContext<'_>) {
        log::debug!("Classical head stage: {} -> {}", self.state.name(), new_state.name());
        match new_state {
            HeadState::MoveAndLaserSpray => {
                self.laser_spray_countdown = self.tuning.laser_spray_reset_time;
                self.has_target = false;
            }
            HeadState::Hurt => {
                self.core.desired_vel = Vec2::ZERO;
                self.hurt_countdown = self.tuning.hurt_time;
                let anim = hurt_and_invulnerable_colour_anim_for(self.tuning.invulnerable_time);
                let alive = ctx.body.alive_parts_root();
                ctx.body.tree_mut().animate_colour_rgba(alive, &anim);
            }
            HeadState::FinalDeathThroes => {
                self.core.stop();
                let alive = ctx.body.alive_parts_root();
                ctx.body.tree_mut().animate_colour_rgba(alive, &final_death_flash_anim());
                self.death_shake_anim = final_death_shake_anim(&mut ctx.model.rng, DEATH_SHAKE_MAGNITUDE);
                self.death_countdown = TOTAL_DEATH_ANIM_TIME;
                ctx.model.push_event(GameEvent::BossFinalDeath);
                log::info!("Classical boss entering its final death throes");
            }
        }
        self.state = new_state;
    }

    fn update_state(&mut self, dt: f32, ctx: &mut AiContext<'_>) -> Result<(), BossError> {
        match self.state {
            HeadState::MoveAndLaserSpray => {
                let max_speed = self.core.max_speed();
                if !self.has_target || self.core.move_to_target_position(ctx.body, max_speed) {
                    self.choose_next_target(ctx);
                }

                if self.laser_spray_countdown <= 0.0 {
                    let eye = eye_position(ctx, &self.layout);
                    execute_laser_spray(ctx.model, eye, self.tuning.laser_spread_degs);
                    self.laser_spray_countdown = self.tuning.laser_spray_reset_time;
                } else {
                    self.laser_spray_countdown -= dt;
                }
            }
            HeadState::Hurt => {
                self.hurt_countdown -= dt;
                if self.hurt_countdown <= 0.0 {
                    self.set_state(HeadState::MoveAndLaserSpray, ctx);
                }
            }
            HeadState::FinalDeathThroes => {
                self.core.stop();
                if self.body_cleared {
                    return Ok(());
                }
                self.death_shake_anim.tick(dt);
                alive_shake_offset(ctx.body, self.death_shake_anim.interpolant_value());

                self.death_countdown -= dt;
                if self.death_countdown <= 0.0 {
                    alive_shake_offset(ctx.body, Vec3::ZERO);
                    let alive = ctx.body.alive_parts_root();
                    for part in ctx.body.tree().children(alive).to_vec() {
                        ctx.body.convert_alive_body_part_to_dead_body_part(part)?;
                    }
                    self.body_cleared = true;
                }
            }
        }
        Ok(())
    }

    fn weakpoint_damaged(&mut self, ctx: &mut AiContext<'_>, part: PartId, outcome: DamageOutcome) -> Result<(), BossError> {
        if !outcome.took_damage() || part != self.layout.eye || self.state == HeadState::FinalDeathThroes {
            return Ok(());
        }
        if outcome == DamageOutcome::Destroyed {
            self.set_state(HeadState::FinalDeathThroes, ctx);
        } else {
            self.set_state(HeadState::Hurt, ctx);
        }
        Ok(())
    }

    fn explosion(&mut self, ctx: &mut AiContext<'_>, center: Vec2, radius: f32, kind: ProjectileKind) -> Result<(), BossError> {
        for (part, outcome) in damage_weakpoints_in_radius(ctx, center, radius, kind.default_damage()) {
            self.weakpoint_damaged(ctx, part, outcome)?;
        }
        Ok(())
    }
}

impl BossAi for HeadAi {
    fn stage_name(&self) -> &'static str {
        "head"
    }

    fn state_name(&self) -> &'static str {
        self.state.name()
    }

    fn tick(&mut self, dt: f32, ctx: &mut AiContext<'_>) -> Result<(), BossError> {
        self.update_state(dt, ctx)?;
        let level = ctx.model.level;
        self.core.update_movement(dt, ctx.body, &level);
        Ok(())
    }

    fn collision_occurred_with_ball(
        &mut self,
        ctx: &mut AiContext<'_>,
        _ball: &mut GameBall,
        part: PartId,
        outcome: DamageOutcome,
    ) -> Result<(), BossError> {
        self.weakpoint_damaged(ctx, part, outcome)
    }

    fn collision_occurred_with_projectile(
        &mut self,
        ctx: &mut AiContext<'_>,
        _projectile: &Projectile,
        part: PartId,
        outcome: DamageOutcome,
    ) -> Result<(), BossError> {
        self.weakpoint_damaged(ctx, part, outcome)
    }

    fn beam_collision_occurred(
        &mut self,
        ctx: &mut AiContext<'_>,
        part: PartId,
        outcome: DamageOutcome,
    ) -> Result<(), BossError> {
        self.weakpoint_damaged(ctx, part, outcome)
    }

    fn rocket_explosion_occurred(&mut self, ctx: &mut AiContext<'_>, center: Vec2, radius: f32) -> Result<(), BossError> {
        self.explosion(ctx, center, radius, ProjectileKind::PaddleRocketBullet)
    }

    fn mine_explosion_occurred(&mut self, ctx: &mut AiContext<'_>, center: Vec2, radius: f32) -> Result<(), BossError> {
        self.explosion(ctx, center, radius, ProjectileKind::PaddleMineBullet)
    }

    fn is_state_machine_finished(&self) -> bool {
        self.state == HeadState::FinalDeathThroes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ai::BossAiState;
    use crate::sim::boss::{Boss, WorldStyle};
    use crate::sim::classical::{EYE_HEIGHT, build_classical_body};
    use crate::sim::state::{BattlePhase, BossBattle, GameLevel, GameModel};
    use crate::sim::tick::{TickInput, tick};
    use crate::tuning::BossTuning;
    use glam::Vec4;

    const DT: f32 = 1.0 / 120.0;

    fn classical_boss(tuning: &BossTuning) -> (Boss, GameModel) {
        let boss = Boss::build_style_boss(WorldStyle::Classical, tuning).unwrap();
        (boss, GameModel::new(42, GameLevel::default()))
    }

    fn arms_ai(boss: &mut Boss) -> &mut ArmsBodyHeadAi {
        match boss.current_ai_state_mut() {
            Some(BossAiState::ClassicalArmsBodyHead(ai)) => ai,
            other => panic!("expected the arms stage, got {other:?}"),
        }
    }

    fn chase_with_expired_countdown(paddle_offset_x: f32) -> ArmsBodyHeadState {
        let (mut boss, mut model) = classical_boss(&BossTuning::default());
        // Low enough to be allowed to swing
        boss.translate(Vec3::new(28.0, 9.0, 0.0));
        model.paddle.center.x = 28.0 + paddle_offset_x;

        let ai = arms_ai(&mut boss);
        ai.state = ArmsBodyHeadState::ChasePaddle;
        ai.countdown_to_attack = 0.0;

        boss.tick(0.016, &mut model).unwrap();
        arms_ai(&mut boss).state()
    }

    #[test]
    fn test_expired_chase_attacks_on_next_tick() {
        // Paddle under the left arm
        assert_eq!(
            chase_with_expired_countdown(-ARM_X_TRANSLATION_FROM_CENTER),
            ArmsBodyHeadState::AttackLeftArm
        );
        // Paddle between the arms, right of centre
        assert_eq!(chase_with_expired_countdown(3.0), ArmsBodyHeadState::AttackRightArm);
    }

    #[test]
    fn test_arm_attack_shakes_then_strikes() {
        let tuning = BossTuning::default();
        let (mut body, layout) = build_classical_body().unwrap();
        let mut ai = ArmsBodyHeadAi::new(&mut body, layout, &tuning.classical).unwrap();
        let mut model = GameModel::new(1, GameLevel::default());
        let mut next = None;
        let mut ctx = AiContext::new(&mut body, &mut model, &mut next);

        ai.set_state(ArmsBodyHeadState::AttackLeftArm, &mut ctx);
        let start = ctx.body.tree().translation_pt2d(layout.left_arm);
        let right_start = ctx.body.tree().translation_pt2d(layout.right_arm);

        let (mut max_shake, mut max_strike) = (0.0_f32, 0.0_f32);
        let mut striking = false;
        for _ in 0..1000 {
            ai.tick(DT, &mut ctx).unwrap();
            if ai.state() != ArmsBodyHeadState::AttackLeftArm {
                break;
            }
            let delta = ctx.body.tree().translation_pt2d(layout.left_arm) - start;
            if ai.arm_shake_anim.is_finished() {
                striking = true;
                assert!(delta.x.abs() < 1e-4, "sideways drift during strike: {delta}");
                max_strike = max_strike.max(delta.y.abs());
            } else {
                assert!(!striking, "shake resumed after the strike began");
                assert!(delta.y.abs() < 1e-4, "vertical drift during shake: {delta}");
                max_shake = max_shake.max(delta.x.abs());
            }
            let right_delta = ctx.body.tree().translation_pt2d(layout.right_arm) - right_start;
            assert!(right_delta.length() < 1e-4);
        }

        assert_eq!(ai.state(), ArmsBodyHeadState::BasicMoveAndLaserSpray);
        assert!(max_shake > 0.1);
        assert!(max_strike > 0.9 * ArmsBodyHeadAi::max_arm_attack_y_movement());
        let end = ctx.body.tree().translation_pt2d(layout.left_arm);
        assert!((end - start).length() < 1e-4);
    }

    #[test]
    fn test_full_life_never_swings_both_arms() {
        for seed in 0..50 {
            let (mut body, layout) = build_classical_body().unwrap();
            let ai = ArmsBodyHeadAi::new(&mut body, layout, &BossTuning::default().classical).unwrap();
            let mut model = GameModel::new(seed, GameLevel::default());
            let mut next = None;
            let mut ctx = AiContext::new(&mut body, &mut model, &mut next);
            let state = ai.determine_next_arm_attack_state(&mut ctx, Vec2::new(-5.0, -5.0));
            assert_eq!(state, ArmsBodyHeadState::AttackLeftArm);
        }
    }

    #[test]
    fn test_paddle_struck_once_per_swing() {
        let (mut boss, mut model) = classical_boss(&BossTuning::default());
        let square = arms_ai(&mut boss).layout().left_arm_square;
        arms_ai(&mut boss).state = ArmsBodyHeadState::AttackLeftArm;

        assert!(boss.can_hurt_paddle_with_body());
        boss.collision_occurred_with_paddle(&mut model, square).unwrap();
        boss.collision_occurred_with_paddle(&mut model, square).unwrap();
        assert_eq!(model.paddle.times_hurt, 1);
        assert_eq!(
            model.drain_events().iter().filter(|e| **e == GameEvent::PaddleHitByBoss).count(),
            1
        );
    }

    #[test]
    fn test_losing_both_arms_stages_body_head() {
        let mut tuning = BossTuning::default();
        tuning.classical.arm_life_points = 100.0;
        let (mut boss, mut model) = classical_boss(&tuning);
        boss.translate(Vec3::new(28.0, 18.0, 0.0));
        let layout = *arms_ai(&mut boss).layout();
        let mut ball = GameBall::new(99, Vec2::ZERO, Vec2::ZERO);

        boss.collision_occurred_with_ball(&mut model, &mut ball, layout.left_arm_square).unwrap();
        assert_eq!(arms_ai(&mut boss).state(), ArmsBodyHeadState::HurtLeftArm);
        assert!(!boss.body().is_alive_part(layout.left_arm));
        assert_eq!(ball.last_thing_collided_with(), Some(layout.left_arm_square));

        boss.collision_occurred_with_ball(&mut model, &mut ball, layout.right_arm_square).unwrap();
        assert_eq!(arms_ai(&mut boss).state(), ArmsBodyHeadState::LostArmsAngry);
        assert!(model.events.contains(&GameEvent::BossAngry));

        let mut ticks = 0;
        while boss.current_ai_state().unwrap().as_ai().stage_name() == "arms-body-head" {
            boss.tick(DT, &mut model).unwrap();
            ticks += 1;
            assert!(ticks < 10_000, "never left the arms stage");
        }

        assert_eq!(boss.current_ai_state().unwrap().as_ai().stage_name(), "body-head");
        assert!(boss.next_ai_state().is_none());
        for column in layout.columns {
            assert!(boss.body_part(column).is_weakpoint());
        }
        assert!(model.events.contains(&GameEvent::BossStageChanged { stage: "body-head" }));
        // Arms keep their handles in the dead subtree
        assert_eq!(boss.body().tree().parent(layout.left_arm), Some(boss.body().dead_parts_root()));
    }

    #[test]
    fn test_destroyed_eye_finishes_the_fight() {
        let mut tuning = BossTuning::default();
        tuning.classical.eye_life_points = 100.0;
        let (mut body, layout) = build_classical_body().unwrap();
        let mut model = GameModel::new(5, GameLevel::default());

        let mut ai = HeadAi::new(&mut body, layout, &tuning.classical).unwrap();
        assert!(body.tree().part(layout.eye).is_weakpoint());
        assert!(!body.tree().generate_world_aabb(layout.eye).is_empty());

        let outcome = body
            .tree_mut()
            .part_mut(layout.eye)
            .weakpoint_mut()
            .unwrap()
            .ball_collision();
        assert_eq!(outcome, DamageOutcome::Destroyed);

        let mut next = None;
        let mut ctx = AiContext::new(&mut body, &mut model, &mut next);
        let mut ball = GameBall::new(1, Vec2::ZERO, Vec2::ZERO);
        ai.collision_occurred_with_ball(&mut ctx, &mut ball, layout.eye, outcome).unwrap();
        assert!(ai.is_state_machine_finished());

        let ticks = (TOTAL_DEATH_ANIM_TIME / DT) as usize + 10;
        for _ in 0..ticks {
            ai.tick(DT, &mut ctx).unwrap();
        }
        let alive = ctx.body.alive_parts_root();
        assert!(ctx.body.tree().children(alive).is_empty());
        assert!(model.events.contains(&GameEvent::BossFinalDeath));
    }

    #[test]
    fn test_fall_off_moves_in_world_space() {
        let (mut body, layout) = build_classical_body().unwrap();
        // Upside down, so its own frame is a half turn from the world's
        let part = layout.tablatures[0];
        let start = body.tree().translation_pt2d(part);
        fall_off(&mut body, part, Vec2::new(3.0, -20.0), 45.0).unwrap();
        assert!(!body.is_alive_part(part));

        let root = body.root();
        let ticks = (LIMB_FADE_TIME / DT) as usize + 10;
        for _ in 0..ticks {
            body.tree_mut().tick(root, DT);
        }

        let fallen = body.tree().part(part);
        assert!((fallen.local_anim_z_rotation() - 45.0).abs() < 1e-3);
        assert!((fallen.local_anim_translation().truncate() - Vec2::new(-3.0, 20.0)).length() < 1e-3);
        let end = body.tree().translation_pt2d(part);
        assert!((end - start - Vec2::new(3.0, -20.0)).length() < 1e-3);
    }

    #[test]
    fn test_angry_shake_settles_untinted() {
        let (mut body, _) = build_classical_body().unwrap();
        let mut model = GameModel::new(9, GameLevel::default());
        let mut next = None;
        let mut ctx = AiContext::new(&mut body, &mut model, &mut next);
        let alive = ctx.body.alive_parts_root();

        let mut anim = begin_angry(&mut ctx);
        let (mut ticks, mut shook) = (0, false);
        while !tick_angry(&mut anim, DT, ctx.body) {
            shook |= ctx.body.tree().part(alive).local_anim_translation() != Vec3::ZERO;
            ticks += 1;
            assert!(ticks < 10_000, "angry shake never finished");
        }

        assert!(shook);
        assert_eq!(ctx.body.tree().part(alive).local_anim_translation(), Vec3::ZERO);
        for id in ctx.body.tree().leaves(alive) {
            assert_eq!(ctx.body.tree().part(id).colour(), Vec4::ONE);
        }
    }

    /// Boss reduced to the pediment and the eye, with every other part fallen away
    fn head_stage_boss(tuning: &BossTuning) -> (Boss, ClassicalLayout) {
        let (mut body, layout) = build_classical_body().unwrap();
        let _ = BodyHeadAi::new(&mut body, layout, &tuning.classical).unwrap();
        let fallen = [layout.left_arm, layout.right_arm]
            .into_iter()
            .chain(layout.columns)
            .chain(layout.tablatures)
            .chain([layout.base]);
        for part in fallen {
            body.convert_alive_body_part_to_dead_body_part(part).unwrap();
        }
        let head = HeadAi::new(&mut body, layout, &tuning.classical).unwrap();

        let mut boss = Boss::new(WorldStyle::Classical, body);
        boss.set_current_ai_state_immediately(head.into());
        boss.translate(Vec3::new(28.0, 14.0, 0.0));
        (boss, layout)
    }

    #[test]
    fn test_ball_reaches_eye_from_below() {
        let (boss, layout) = head_stage_boss(&BossTuning::default());
        let eye = boss.body().tree().translation_pt2d(layout.eye);
        let below_eye = eye - Vec2::new(0.0, EYE_HEIGHT / 2.0 + BALL_RADIUS - 0.05);
        let (part, _) = boss.collision_check_circle(below_eye, BALL_RADIUS).unwrap();
        assert_eq!(part, layout.eye);

        let mut battle = BossBattle {
            model: GameModel::new(8, GameLevel::default()),
            boss,
            phase: BattlePhase::Playing,
            time_ticks: 0,
        };
        let start = eye - Vec2::new(0.0, EYE_HEIGHT / 2.0 + BALL_RADIUS + 1.2);
        battle.model.balls.push(GameBall::new(500, start, Vec2::new(0.0, 40.0)));

        let mut hurt = false;
        for _ in 0..60 {
            tick(&mut battle, &TickInput::default(), DT).unwrap();
            hurt |= battle.model.events.contains(&GameEvent::BossHurt { part: layout.eye });
            if hurt {
                break;
            }
        }
        assert!(hurt, "ball never reached the eye");
        assert!(!battle.model.events.contains(&GameEvent::BossHurt { part: layout.pediment }));
    }

    #[test]
    fn test_head_targets_stay_inside_level() {
        let (mut body, layout) = build_classical_body().unwrap();
        let tuning = BossTuning::default();
        let _ = BodyHeadAi::new(&mut body, layout, &tuning.classical).unwrap();
        let mut model = GameModel::new(3, GameLevel::default());
        let mut next = None;
        let ctx = AiContext::new(&mut body, &mut model, &mut next);

        let offset = ctx.body.alive_aabb().center() - ctx.body.alive_position();
        let half = Vec2::new(ctx.body.alive_width(), ctx.body.alive_height()) / 2.0;
        for target in HeadAi::target_positions(&ctx) {
            let centre = target + offset;
            assert!(centre.x - half.x >= 0.0 && centre.x + half.x <= ctx.model.level.width);
            assert!(centre.y + half.y <= ctx.model.level.height);
        }
    }
}

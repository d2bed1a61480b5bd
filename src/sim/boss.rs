//! The boss: body hierarchy, AI staging and collision routing
//!
//! Every boss has the same top of tree:
//!
//! ```text
//! root
//! |____dead parts root
//! |____alive parts root
//!      |____ (archetype specific parts)
//! ```
//!
//! Parts that are destroyed move from the alive subtree into the dead one,
//! where they can keep animating (falling off, fading) without taking part
//! in the fight.

use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use super::ai::{AiContext, BossAi, BossAiState};
use super::body_part::{BodyPart, PartId, PartKind};
use super::body_tree::BodyTree;
use super::bounds::Aabb2;
use super::classical;
use super::collision::{CollisionResult, circle_lines_collision};
use super::error::BossError;
use super::state::{GameBall, GameEvent, GameModel, Projectile};
use super::weakpoint::{DamageOutcome, Weakpoint};
use crate::tuning::BossTuning;

/// Visual style of a world; each world ends with its own boss
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorldStyle {
    Deco,
    Futurism,
    Classical,
    GothicRomantic,
    Nouveau,
    Electric,
    Cyberpunk,
}

/// The body-part tree of one boss, with its three fixed composites
#[derive(Debug, Clone)]
pub struct BossBody {
    tree: BodyTree,
    root: PartId,
    dead_parts_root: PartId,
    alive_parts_root: PartId,
}

impl BossBody {
    pub fn new() -> Result<Self, BossError> {
        let mut tree = BodyTree::new();
        let root = tree.create_composite("root");
        let dead_parts_root = tree.create_composite("dead parts root");
        let alive_parts_root = tree.create_composite("alive parts root");
        tree.add_body_part(root, dead_parts_root)?;
        tree.add_body_part(root, alive_parts_root)?;
        Ok(Self {
            tree,
            root,
            dead_parts_root,
            alive_parts_root,
        })
    }

    pub fn tree(&self) -> &BodyTree {
        &self.tree
    }

    pub(crate) fn tree_mut(&mut self) -> &mut BodyTree {
        &mut self.tree
    }

    pub fn root(&self) -> PartId {
        self.root
    }

    pub fn dead_parts_root(&self) -> PartId {
        self.dead_parts_root
    }

    pub fn alive_parts_root(&self) -> PartId {
        self.alive_parts_root
    }

    /// Register a new part under `parent`
    pub(crate) fn add_part(&mut self, parent: PartId, part: BodyPart) -> Result<PartId, BossError> {
        let id = self.tree.insert(part);
        self.tree.add_body_part(parent, id)?;
        Ok(id)
    }

    /// Strictly inside the alive subtree (the alive root itself excluded)
    pub fn is_alive_part(&self, id: PartId) -> bool {
        id != self.alive_parts_root && self.tree.is_or_contains_part(self.alive_parts_root, id, true)
    }

    pub fn alive_aabb(&self) -> Aabb2 {
        self.tree.generate_world_aabb(self.alive_parts_root)
    }

    pub fn alive_width(&self) -> f32 {
        self.alive_aabb().width()
    }

    pub fn alive_height(&self) -> f32 {
        self.alive_aabb().height()
    }

    /// World position of the alive assembly's origin
    pub fn alive_position(&self) -> Vec2 {
        self.tree.translation_pt2d(self.alive_parts_root)
    }

    /// Turn an alive basic part into a weakpoint in place.
    ///
    /// The handle, the geometry and the position in the parent's child list
    /// are all kept; only the part's kind changes.
    pub fn convert_alive_body_part_to_weakpoint(
        &mut self,
        id: PartId,
        life_points: f32,
        damage_on_ball_hit: f32,
        invulnerable_time: f32,
    ) -> Result<(), BossError> {
        if !self.is_alive_part(id) {
            return Err(BossError::NotAlive(id));
        }

        let part = self.tree.part_mut(id);
        let reason = match part.kind {
            PartKind::Basic if part.is_destroyed() => Some("part is destroyed"),
            PartKind::Basic => None,
            PartKind::Weakpoint(_) => Some("part is already a weakpoint"),
            PartKind::Composite(_) => Some("composites have no bounds of their own"),
        };
        if let Some(reason) = reason {
            return Err(BossError::NotConvertible {
                part: id,
                name: part.name,
                reason,
            });
        }

        let mut weakpoint = Weakpoint::new(life_points, damage_on_ball_hit);
        weakpoint.set_invulnerable_time(invulnerable_time);
        part.kind = PartKind::Weakpoint(weakpoint);

        log::debug!("{} ({}) is now a weakpoint with {} life", id, part.name, life_points);
        Ok(())
    }

    /// Move an alive part (and its children) into the dead subtree.
    ///
    /// The part keeps its world placement, stops colliding and is flagged
    /// destroyed.
    pub fn convert_alive_body_part_to_dead_body_part(&mut self, id: PartId) -> Result<(), BossError> {
        if !self.is_alive_part(id) {
            return Err(BossError::NotAlive(id));
        }

        self.tree.reparent(id, self.dead_parts_root)?;
        self.tree.set_destroyed(id, true);
        self.tree.set_collisions_disabled(id, true);
        self.tree.set_collision_velocity(id, Vec2::ZERO);

        log::debug!("{} ({}) moved to the dead parts", id, self.tree.part(id).name);
        Ok(())
    }

    /// Alive, collidable leaves in traversal order
    pub fn collidable_parts(&self) -> Vec<PartId> {
        self.tree
            .leaves(self.alive_parts_root)
            .into_iter()
            .filter(|id| {
                let part = self.tree.part(*id);
                !part.is_destroyed() && !part.collisions_disabled() && !part.local_bounds().is_empty()
            })
            .collect()
    }

    /// Every alive weakpoint that can still take damage
    pub fn live_weakpoints(&self) -> Vec<PartId> {
        self.collidable_parts()
            .into_iter()
            .filter(|id| self.tree.part(*id).is_weakpoint())
            .collect()
    }
}

/// What renderers read each frame for one part
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartSnapshot {
    pub id: PartId,
    pub name: &'static str,
    pub parent: Option<PartId>,
    pub alive: bool,
    pub destroyed: bool,
    /// Fraction of life left, for weakpoints
    pub life: Option<f32>,
    pub world_translation: Vec3,
    pub aabb: Option<Aabb2>,
    pub colour: Vec4,
}

/// A boss fight's opponent
#[derive(Debug)]
pub struct Boss {
    style: WorldStyle,
    body: BossBody,
    curr_ai: Option<BossAiState>,
    next_ai: Option<BossAiState>,
}

impl Boss {
    /// Build the boss that ends worlds of the given style
    pub fn build_style_boss(style: WorldStyle, tuning: &BossTuning) -> Result<Boss, BossError> {
        let boss = match style {
            WorldStyle::Classical => classical::build_classical_boss(&tuning.classical)?,
            other => return Err(BossError::UnsupportedArchetype(other)),
        };
        log::info!(
            "Built {:?} boss with {} body parts",
            style,
            boss.body.tree().len()
        );
        Ok(boss)
    }

    pub(crate) fn new(style: WorldStyle, body: BossBody) -> Self {
        Self {
            style,
            body,
            curr_ai: None,
            next_ai: None,
        }
    }

    pub fn style(&self) -> WorldStyle {
        self.style
    }

    pub fn body(&self) -> &BossBody {
        &self.body
    }

    pub(crate) fn body_mut(&mut self) -> &mut BossBody {
        &mut self.body
    }

    /// Part by its stable registry index
    pub fn body_part(&self, id: PartId) -> &BodyPart {
        self.body.tree().part(id)
    }

    pub fn body_part_count(&self) -> usize {
        self.body.tree().len()
    }

    /// Move the whole boss
    pub fn translate(&mut self, v: Vec3) {
        let root = self.body.root();
        self.body.tree_mut().translate(root, v);
    }

    pub fn alive_width(&self) -> f32 {
        self.body.alive_width()
    }

    pub fn alive_height(&self) -> f32 {
        self.body.alive_height()
    }

    /// Box around everything, falling limbs included
    pub fn dying_aabb(&self) -> Aabb2 {
        self.body.tree().generate_world_aabb(self.body.root())
    }

    pub fn current_ai_state(&self) -> Option<&BossAiState> {
        self.curr_ai.as_ref()
    }

    pub(crate) fn current_ai_state_mut(&mut self) -> Option<&mut BossAiState> {
        self.curr_ai.as_mut()
    }

    pub fn next_ai_state(&self) -> Option<&BossAiState> {
        self.next_ai.as_ref()
    }

    /// Stage `state` to replace the current AI at the end of the next tick.
    /// Any previously staged state is dropped.
    pub fn set_next_ai_state(&mut self, state: BossAiState) {
        if let Some(old) = self.next_ai.replace(state) {
            log::debug!("Dropping staged AI {}", old.as_ai().stage_name());
        }
    }

    /// Replace the current AI right away; only for construction
    pub fn set_current_ai_state_immediately(&mut self, state: BossAiState) {
        self.next_ai = None;
        self.curr_ai = Some(state);
    }

    /// Advance the boss by one step.
    ///
    /// Order matters: body animations, then the current AI, then the swap to
    /// any AI staged during this step.
    pub fn tick(&mut self, dt: f32, model: &mut GameModel) -> Result<(), BossError> {
        let root = self.body.root();
        self.body.tree_mut().tick(root, dt);

        self.dispatch(model, |ai, ctx| ai.tick(dt, ctx))?;

        self.update_ai_state();
        Ok(())
    }

    fn update_ai_state(&mut self) {
        if let Some(next) = self.next_ai.take() {
            log::info!("Boss AI stage -> {}", next.as_ai().stage_name());
            self.curr_ai = Some(next);
        }
    }

    /// Run `f` against the current AI with a context borrowing the rest of the boss
    fn dispatch<F>(&mut self, model: &mut GameModel, f: F) -> Result<(), BossError>
    where
        F: FnOnce(&mut dyn BossAi, &mut AiContext<'_>) -> Result<(), BossError>,
    {
        let Boss {
            body,
            curr_ai,
            next_ai,
            ..
        } = self;
        match curr_ai.as_mut() {
            Some(ai) => {
                let mut ctx = AiContext::new(body, model, next_ai);
                f(ai.as_ai_mut(), &mut ctx)
            }
            None => Ok(()),
        }
    }

    /// Apply a damage function to a part if it is a live weakpoint and
    /// report the result to the game
    fn damage_part<F>(&mut self, model: &mut GameModel, part: PartId, f: F) -> DamageOutcome
    where
        F: FnOnce(&mut Weakpoint) -> DamageOutcome,
    {
        let body_part = self.body.tree_mut().part_mut(part);
        if body_part.collisions_disabled() || body_part.is_destroyed() {
            return DamageOutcome::Ignored;
        }
        let outcome = body_part.weakpoint_mut().map_or(DamageOutcome::Ignored, f);
        report_damage(model, part, outcome);
        outcome
    }

    // --- Collision routing ---

    /// A ball struck `part`
    pub fn collision_occurred_with_ball(
        &mut self,
        model: &mut GameModel,
        ball: &mut GameBall,
        part: PartId,
    ) -> Result<(), BossError> {
        ball.set_last_thing_collided_with(Some(part));
        let outcome = self.damage_part(model, part, |wp| wp.ball_collision());
        self.dispatch(model, |ai, ctx| {
            ai.collision_occurred_with_ball(ctx, ball, part, outcome)
        })
    }

    /// A projectile struck `part`
    pub fn collision_occurred_with_projectile(
        &mut self,
        model: &mut GameModel,
        projectile: &mut Projectile,
        part: PartId,
    ) -> Result<(), BossError> {
        let (kind, damage) = (projectile.kind, projectile.damage);
        let outcome = self.damage_part(model, part, |wp| wp.projectile_collision(kind, damage));
        projectile.set_last_thing_collided_with(Some(part));
        self.dispatch(model, |ai, ctx| {
            ai.collision_occurred_with_projectile(ctx, projectile, part, outcome)
        })
    }

    /// The paddle touched `part`
    pub fn collision_occurred_with_paddle(
        &mut self,
        model: &mut GameModel,
        part: PartId,
    ) -> Result<(), BossError> {
        self.dispatch(model, |ai, ctx| ai.collision_occurred_with_paddle(ctx, part))
    }

    /// A beam held on `part` for `dt` seconds
    pub fn beam_collision_occurred(
        &mut self,
        model: &mut GameModel,
        part: PartId,
        dt: f32,
        damage_per_second: f32,
    ) -> Result<(), BossError> {
        let outcome = self.damage_part(model, part, |wp| wp.beam_tick(dt, damage_per_second));
        self.dispatch(model, |ai, ctx| ai.beam_collision_occurred(ctx, part, outcome))
    }

    pub fn rocket_explosion_occurred(
        &mut self,
        model: &mut GameModel,
        center: Vec2,
        radius: f32,
    ) -> Result<(), BossError> {
        self.dispatch(model, |ai, ctx| ai.rocket_explosion_occurred(ctx, center, radius))
    }

    pub fn mine_explosion_occurred(
        &mut self,
        model: &mut GameModel,
        center: Vec2,
        radius: f32,
    ) -> Result<(), BossError> {
        self.dispatch(model, |ai, ctx| ai.mine_explosion_occurred(ctx, center, radius))
    }

    pub fn tesla_lightning_arc_hit_occurred(
        &mut self,
        model: &mut GameModel,
        start: Vec2,
        end: Vec2,
    ) -> Result<(), BossError> {
        self.dispatch(model, |ai, ctx| ai.tesla_lightning_arc_hit_occurred(ctx, start, end))
    }

    // --- Queries ---

    pub fn can_hurt_paddle_with_body(&self) -> bool {
        self.curr_ai
            .as_ref()
            .is_some_and(|ai| ai.as_ai().can_hurt_paddle_with_body())
    }

    pub fn is_state_machine_finished(&self) -> bool {
        self.curr_ai
            .as_ref()
            .is_some_and(|ai| ai.as_ai().is_state_machine_finished())
    }

    /// Boss-fired projectiles fly through the boss
    pub fn projectile_passes_through(&self, projectile: &Projectile) -> bool {
        projectile.kind.is_boss_projectile()
    }

    /// Deepest contact between a circle and any collidable alive part
    pub fn collision_check_circle(&self, center: Vec2, radius: f32) -> Option<(PartId, CollisionResult)> {
        if !self.body.alive_aabb().overlaps_circle(center, radius) {
            return None;
        }
        let tree = self.body.tree();
        self.body
            .collidable_parts()
            .into_iter()
            .map(|id| (id, circle_lines_collision(center, radius, &tree.world_bounds(id))))
            .filter(|(_, result)| result.hit)
            .max_by(|a, b| a.1.penetration.total_cmp(&b.1.penetration))
    }

    /// First collidable alive part whose box overlaps `aabb`
    pub fn collision_check_aabb(&self, aabb: &Aabb2) -> Option<PartId> {
        let tree = self.body.tree();
        self.body
            .collidable_parts()
            .into_iter()
            .find(|id| tree.generate_world_aabb(*id).overlaps(aabb))
    }

    /// World transforms, bounds and tints of every part, in registry order
    pub fn render_snapshot(&self) -> Vec<PartSnapshot> {
        let tree = self.body.tree();
        tree.ids()
            .map(|id| {
                let part = tree.part(id);
                let aabb = tree.generate_world_aabb(id);
                PartSnapshot {
                    id,
                    name: part.name,
                    parent: part.parent(),
                    alive: self.body.is_alive_part(id),
                    destroyed: part.is_destroyed(),
                    life: part.weakpoint().map(|wp| wp.current_life_percentage()),
                    world_translation: tree.translation_pt3d(id),
                    aabb: (!aabb.is_empty()).then_some(aabb),
                    colour: part.colour(),
                }
            })
            .collect()
    }

    /// World-space bounding segments of the whole boss
    #[cfg(debug_assertions)]
    pub fn debug_draw(&self) -> Vec<(Vec2, Vec2)> {
        self.body.tree().debug_lines(self.body.root())
    }
}

/// Push hurt/destroyed events for a weakpoint damage outcome
pub(crate) fn report_damage(model: &mut GameModel, part: PartId, outcome: DamageOutcome) {
    match outcome {
        DamageOutcome::Hurt => model.push_event(GameEvent::BossHurt { part }),
        DamageOutcome::Destroyed => {
            model.push_event(GameEvent::BossHurt { part });
            model.push_event(GameEvent::BossWeakpointDestroyed { part });
        }
        DamageOutcome::Ignored => {}
    }
}

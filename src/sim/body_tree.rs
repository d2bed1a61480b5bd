//! Arena of body parts and their transforms
//!
//! The tree owns every part of one boss in a flat registry. A part's world
//! transform is its parent's world transform composed with its own local
//! transform, so moving a composite moves its whole sub-assembly.
//!
//! `translate`, `rotate_z`, `rotate_y` and `transform` pre-multiply the
//! part's base transform: the new operation is applied in the parent's frame
//! after everything already applied. Translate-then-rotate therefore swings
//! the translated part around the parent origin, while rotate-then-translate
//! spins it in place before moving it.

use glam::{Mat4, Vec2, Vec3, Vec4};

use super::animation::AnimationMultiLerp;
use super::body_part::{BodyPart, PartId, PartKind};
use super::bounds::{Aabb2, BoundingLines};
use crate::translation_of;

/// Flat registry of parts addressed by `PartId`
#[derive(Debug, Clone, Default)]
pub struct BodyTree {
    parts: Vec<BodyPart>,
}

impl BodyTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an unparented part and return its handle
    pub fn insert(&mut self, part: BodyPart) -> PartId {
        let id = PartId(self.parts.len());
        self.parts.push(part);
        id
    }

    pub fn create_basic(&mut self, name: &'static str, bounds: BoundingLines) -> PartId {
        self.insert(BodyPart::basic(name, bounds))
    }

    pub fn create_composite(&mut self, name: &'static str) -> PartId {
        self.insert(BodyPart::composite(name))
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// All handles in registry order
    pub fn ids(&self) -> impl Iterator<Item = PartId> + use<> {
        (0..self.parts.len()).map(PartId)
    }

    #[inline]
    pub fn part(&self, id: PartId) -> &BodyPart {
        &self.parts[id.0]
    }

    #[inline]
    pub fn part_mut(&mut self, id: PartId) -> &mut BodyPart {
        &mut self.parts[id.0]
    }

    pub fn parent(&self, id: PartId) -> Option<PartId> {
        self.part(id).parent
    }

    pub fn children(&self, id: PartId) -> &[PartId] {
        self.part(id).children()
    }

    // --- Transforms ---

    /// Accumulated transform from the tree root down to `id`
    pub fn world_transform(&self, id: PartId) -> Mat4 {
        let part = self.part(id);
        match part.parent {
            Some(parent) => self.world_transform(parent) * part.local_transform(),
            None => part.local_transform(),
        }
    }

    /// Place a part so that its world transform equals `world`
    pub fn set_world_transform(&mut self, id: PartId, world: Mat4) {
        let parent_world = match self.parent(id) {
            Some(parent) => self.world_transform(parent),
            None => Mat4::IDENTITY,
        };
        let part = self.part_mut(id);
        part.local = parent_world.inverse() * world * part.anim_offset().inverse();
    }

    pub fn transform(&mut self, id: PartId, m: Mat4) {
        let part = self.part_mut(id);
        part.local = m * part.local;
    }

    pub fn translate(&mut self, id: PartId, t: Vec3) {
        self.transform(id, Mat4::from_translation(t));
    }

    pub fn rotate_z(&mut self, id: PartId, degs: f32) {
        self.transform(id, Mat4::from_rotation_z(degs.to_radians()));
    }

    pub fn rotate_y(&mut self, id: PartId, degs: f32) {
        self.transform(id, Mat4::from_rotation_y(degs.to_radians()));
    }

    /// Move a part (and everything under it) to an absolute world position
    pub fn set_world_translation(&mut self, id: PartId, pos: Vec3) {
        let world = self.world_transform(id);
        let delta = pos - translation_of(&world);
        self.set_world_transform(id, Mat4::from_translation(delta) * world);
    }

    pub fn translation_pt3d(&self, id: PartId) -> Vec3 {
        translation_of(&self.world_transform(id))
    }

    pub fn translation_pt2d(&self, id: PartId) -> Vec2 {
        self.translation_pt3d(id).truncate()
    }

    // --- Bounds ---

    /// Bounding lines of a leaf part in world space (empty for composites)
    pub fn world_bounds(&self, id: PartId) -> BoundingLines {
        let part = self.part(id);
        if part.local_bounds().is_empty() {
            return BoundingLines::new();
        }
        part.local_bounds().transformed(&self.world_transform(id))
    }

    /// World-space box of a leaf's bounds, or the union over a composite's children
    pub fn generate_world_aabb(&self, id: PartId) -> Aabb2 {
        match &self.part(id).kind {
            PartKind::Composite(children) => children
                .iter()
                .fold(Aabb2::EMPTY, |acc, child| acc.union(&self.generate_world_aabb(*child))),
            _ => self.world_bounds(id).aabb(),
        }
    }

    // --- Recursive state ---

    /// Advance part-local animations through the whole subtree
    pub fn tick(&mut self, id: PartId, dt: f32) {
        self.part_mut(id).tick_local(dt);
        for child in self.children(id).to_vec() {
            self.tick(child, dt);
        }
    }

    pub fn set_collision_velocity(&mut self, id: PartId, vel: Vec2) {
        self.part_mut(id).collision_velocity = vel;
        for child in self.children(id).to_vec() {
            self.set_collision_velocity(child, vel);
        }
    }

    pub fn set_destroyed(&mut self, id: PartId, destroyed: bool) {
        self.part_mut(id).destroyed = destroyed;
        for child in self.children(id).to_vec() {
            self.set_destroyed(child, destroyed);
        }
    }

    pub fn set_collisions_disabled(&mut self, id: PartId, disabled: bool) {
        self.part_mut(id).collisions_disabled = disabled;
        for child in self.children(id).to_vec() {
            self.set_collisions_disabled(child, disabled);
        }
    }

    pub fn animate_colour_rgba(&mut self, id: PartId, anim: &AnimationMultiLerp<Vec4>) {
        self.part_mut(id).animate_colour_rgba(anim.clone());
        for child in self.children(id).to_vec() {
            self.animate_colour_rgba(child, anim);
        }
    }

    /// Back to an untinted white for `id` and everything under it
    pub fn reset_colour(&mut self, id: PartId) {
        self.part_mut(id).reset_colour();
        for child in self.children(id).to_vec() {
            self.reset_colour(child);
        }
    }

    /// Every non-composite part at or under `id`, in traversal order
    pub fn leaves(&self, id: PartId) -> Vec<PartId> {
        let mut out = Vec::new();
        self.collect_leaves(id, &mut out);
        out
    }

    fn collect_leaves(&self, id: PartId, out: &mut Vec<PartId>) {
        match &self.part(id).kind {
            PartKind::Composite(children) => {
                for child in children {
                    self.collect_leaves(*child, out);
                }
            }
            _ => out.push(id),
        }
    }

    /// World-space segments of every bounded part under `id`, for debug overlays
    #[cfg(debug_assertions)]
    pub fn debug_lines(&self, id: PartId) -> Vec<(Vec2, Vec2)> {
        self.leaves(id)
            .into_iter()
            .flat_map(|leaf| {
                self.world_bounds(leaf)
                    .lines()
                    .iter()
                    .map(|l| (l.p0, l.p1))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

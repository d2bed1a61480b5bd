//! A single node of a boss body
//!
//! Parts live in a `BodyTree` arena and refer to each other by `PartId`.
//! A part is either a basic rigid piece with bounding lines, a weakpoint (a
//! basic piece with hit points), or a composite that owns an ordered list of
//! children.

use std::fmt;

use glam::{Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use super::animation::AnimationMultiLerp;
use super::bounds::BoundingLines;
use super::weakpoint::Weakpoint;

/// Stable handle of a part within its body tree.
///
/// Handles are indices into the tree's flat registry and never change for the
/// lifetime of the boss, including across weakpoint conversion and death.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartId(pub(crate) usize);

impl PartId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "part#{}", self.0)
    }
}

/// What kind of node a part is
#[derive(Debug, Clone)]
pub enum PartKind {
    /// Rigid piece with bounds and no state of its own
    Basic,
    /// Rigid piece with hit points
    Weakpoint(Weakpoint),
    /// Ordered children (insertion order = traversal/draw order)
    Composite(Vec<PartId>),
}

/// A node in the boss body hierarchy
#[derive(Debug, Clone)]
pub struct BodyPart {
    pub name: &'static str,
    pub(crate) parent: Option<PartId>,
    pub(crate) kind: PartKind,
    /// Collision bounds in local space (empty for composites)
    local_bounds: BoundingLines,
    /// Base transform relative to the parent
    pub(crate) local: Mat4,
    /// Animated offsets, applied after the base transform
    anim_translation: Vec3,
    anim_z_rotation: f32,
    translation_anim: AnimationMultiLerp<Vec3>,
    z_rotation_anim: AnimationMultiLerp<f32>,
    colour_anim: AnimationMultiLerp<Vec4>,
    /// Velocity the collision layer should treat this part as moving with
    pub(crate) collision_velocity: Vec2,
    pub(crate) destroyed: bool,
    pub(crate) collisions_disabled: bool,
}

impl BodyPart {
    fn with_kind(name: &'static str, kind: PartKind, local_bounds: BoundingLines) -> Self {
        Self {
            name,
            parent: None,
            kind,
            local_bounds,
            local: Mat4::IDENTITY,
            anim_translation: Vec3::ZERO,
            anim_z_rotation: 0.0,
            translation_anim: AnimationMultiLerp::new(Vec3::ZERO),
            z_rotation_anim: AnimationMultiLerp::new(0.0),
            colour_anim: AnimationMultiLerp::new(Vec4::ONE),
            collision_velocity: Vec2::ZERO,
            destroyed: false,
            collisions_disabled: false,
        }
    }

    pub fn basic(name: &'static str, local_bounds: BoundingLines) -> Self {
        Self::with_kind(name, PartKind::Basic, local_bounds)
    }

    pub fn composite(name: &'static str) -> Self {
        Self::with_kind(name, PartKind::Composite(Vec::new()), BoundingLines::new())
    }

    pub fn kind(&self) -> &PartKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<PartId> {
        self.parent
    }

    #[inline]
    pub fn is_composite(&self) -> bool {
        matches!(self.kind, PartKind::Composite(_))
    }

    #[inline]
    pub fn is_weakpoint(&self) -> bool {
        matches!(self.kind, PartKind::Weakpoint(_))
    }

    pub fn weakpoint(&self) -> Option<&Weakpoint> {
        match &self.kind {
            PartKind::Weakpoint(wp) => Some(wp),
            _ => None,
        }
    }

    pub fn weakpoint_mut(&mut self) -> Option<&mut Weakpoint> {
        match &mut self.kind {
            PartKind::Weakpoint(wp) => Some(wp),
            _ => None,
        }
    }

    /// Direct children (empty for leaves)
    pub fn children(&self) -> &[PartId] {
        match &self.kind {
            PartKind::Composite(children) => children,
            _ => &[],
        }
    }

    pub fn local_bounds(&self) -> &BoundingLines {
        &self.local_bounds
    }

    pub fn set_local_bounds(&mut self, bounds: BoundingLines) {
        self.local_bounds = bounds;
    }

    /// Full transform relative to the parent, animation offsets included
    pub fn local_transform(&self) -> Mat4 {
        self.local * self.anim_offset()
    }

    pub(crate) fn anim_offset(&self) -> Mat4 {
        Mat4::from_translation(self.anim_translation)
            * Mat4::from_rotation_z(self.anim_z_rotation.to_radians())
    }

    /// Destroyed parts (and dead weakpoints) no longer take part in the fight
    pub fn is_destroyed(&self) -> bool {
        self.destroyed || self.weakpoint().is_some_and(|wp| wp.is_destroyed())
    }

    pub fn collisions_disabled(&self) -> bool {
        self.collisions_disabled
    }

    pub fn set_collisions_disabled(&mut self, disabled: bool) {
        self.collisions_disabled = disabled;
    }

    pub fn collision_velocity(&self) -> Vec2 {
        self.collision_velocity
    }

    /// Current RGBA tint
    pub fn colour(&self) -> Vec4 {
        self.colour_anim.interpolant_value()
    }

    pub fn local_anim_translation(&self) -> Vec3 {
        self.anim_translation
    }

    pub fn local_anim_z_rotation(&self) -> f32 {
        self.anim_z_rotation
    }

    /// Play a translation curve on top of the base transform
    pub fn animate_local_translation(&mut self, anim: AnimationMultiLerp<Vec3>) {
        self.translation_anim = anim;
        self.anim_translation = self.translation_anim.interpolant_value();
    }

    /// Play a z-rotation curve (degrees) on top of the base transform
    pub fn animate_local_z_rotation(&mut self, anim: AnimationMultiLerp<f32>) {
        self.z_rotation_anim = anim;
        self.anim_z_rotation = self.z_rotation_anim.interpolant_value();
    }

    pub fn animate_colour_rgba(&mut self, anim: AnimationMultiLerp<Vec4>) {
        self.colour_anim = anim;
    }

    pub fn reset_colour(&mut self) {
        self.colour_anim = AnimationMultiLerp::new(Vec4::ONE);
    }

    /// Advance this part's own animations (children are ticked by the tree)
    pub(crate) fn tick_local(&mut self, dt: f32) {
        if self.translation_anim.has_points() {
            self.translation_anim.tick(dt);
            self.anim_translation = self.translation_anim.interpolant_value();
        }
        if self.z_rotation_anim.has_points() {
            self.z_rotation_anim.tick(dt);
            self.anim_z_rotation = self.z_rotation_anim.interpolant_value();
        }
        self.colour_anim.tick(dt);

        if let PartKind::Weakpoint(wp) = &mut self.kind {
            wp.tick(dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_part_defaults() {
        let part = BodyPart::basic("slab", BoundingLines::rect(1.0, 1.0));
        assert!(!part.is_composite());
        assert!(!part.is_weakpoint());
        assert!(!part.is_destroyed());
        assert!(part.children().is_empty());
        assert_eq!(part.local_transform(), Mat4::IDENTITY);
        assert_eq!(part.colour(), Vec4::ONE);
    }

    #[test]
    fn test_translation_anim_drives_local_transform() {
        let mut part = BodyPart::basic("slab", BoundingLines::rect(1.0, 1.0));
        part.animate_local_translation(AnimationMultiLerp::from_points(
            vec![0.0, 1.0],
            vec![Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0)],
        ));

        for _ in 0..3 {
            part.tick_local(0.5);
        }
        let t = part.local_transform().w_axis.truncate();
        assert!((t - Vec3::new(4.0, 0.0, 0.0)).length() < 0.001);
    }

    #[test]
    fn test_z_rotation_anim_applies_after_translation_offset() {
        let mut part = BodyPart::basic("slab", BoundingLines::new());
        part.animate_local_z_rotation(AnimationMultiLerp::from_points(
            vec![0.0, 0.0],
            vec![0.0, 90.0],
        ));
        part.tick_local(0.1);
        let x_axis = part.local_transform().transform_vector3(Vec3::X);
        assert!((x_axis - Vec3::Y).length() < 0.001);
    }
}

//! Bounding geometry for boss parts
//!
//! Every collidable part carries a `BoundingLines` in its local space: line
//! segments with outward-facing normals. World-space copies are produced by
//! transforming with the part's world matrix.

use glam::{Mat4, Vec2};
use serde::{Deserialize, Serialize};

/// 2D axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb2 {
    pub min: Vec2,
    pub max: Vec2,
}

impl Default for Aabb2 {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb2 {
    /// The box containing nothing; the identity for `union`
    pub const EMPTY: Aabb2 = Aabb2 {
        min: Vec2::splat(f32::INFINITY),
        max: Vec2::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_points<I: IntoIterator<Item = Vec2>>(points: I) -> Self {
        let mut aabb = Self::EMPTY;
        for p in points {
            aabb.add_point(p);
        }
        aabb
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn add_point(&mut self, p: Vec2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Smallest box containing both; empty boxes are ignored
    pub fn union(&self, other: &Aabb2) -> Aabb2 {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return *other;
        }
        Aabb2 {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        if self.is_empty() { 0.0 } else { self.max.x - self.min.x }
    }

    #[inline]
    pub fn height(&self) -> f32 {
        if self.is_empty() { 0.0 } else { self.max.y - self.min.y }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn overlaps(&self, other: &Aabb2) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Whether a circle touches the box
    pub fn overlaps_circle(&self, center: Vec2, radius: f32) -> bool {
        if self.is_empty() {
            return false;
        }
        let closest = center.clamp(self.min, self.max);
        closest.distance_squared(center) <= radius * radius
    }
}

/// A single bounding segment with its outward normal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundLine {
    pub p0: Vec2,
    pub p1: Vec2,
    pub normal: Vec2,
}

impl BoundLine {
    pub fn new(p0: Vec2, p1: Vec2, normal: Vec2) -> Self {
        Self { p0, p1, normal }
    }
}

/// Ordered set of bounding segments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingLines {
    lines: Vec<BoundLine>,
}

impl BoundingLines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Closed rectangle centered on the origin
    pub fn rect(half_width: f32, half_height: f32) -> Self {
        let (hw, hh) = (half_width, half_height);
        let mut bounds = Self::new();
        bounds.add_bound(Vec2::new(-hw, hh), Vec2::new(-hw, -hh), Vec2::NEG_X);
        bounds.add_bound(Vec2::new(-hw, -hh), Vec2::new(hw, -hh), Vec2::NEG_Y);
        bounds.add_bound(Vec2::new(hw, -hh), Vec2::new(hw, hh), Vec2::X);
        bounds.add_bound(Vec2::new(hw, hh), Vec2::new(-hw, hh), Vec2::Y);
        bounds
    }

    pub fn add_bound(&mut self, p0: Vec2, p1: Vec2, normal: Vec2) {
        self.lines.push(BoundLine::new(p0, p1, normal));
    }

    pub fn lines(&self) -> &[BoundLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Copy of these bounds with every point and normal transformed by `m`
    pub fn transformed(&self, m: &Mat4) -> BoundingLines {
        let lines = self
            .lines
            .iter()
            .map(|line| {
                let p0 = m.transform_point3(line.p0.extend(0.0)).truncate();
                let p1 = m.transform_point3(line.p1.extend(0.0)).truncate();
                let normal = m
                    .transform_vector3(line.normal.extend(0.0))
                    .truncate()
                    .normalize_or_zero();
                BoundLine::new(p0, p1, normal)
            })
            .collect();
        BoundingLines { lines }
    }

    /// Box around every segment endpoint
    pub fn aabb(&self) -> Aabb2 {
        Aabb2::from_points(self.lines.iter().flat_map(|l| [l.p0, l.p1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_empty_aabb_union_identity() {
        let a = Aabb2::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 2.0));
        assert_eq!(a.union(&Aabb2::EMPTY), a);
        assert_eq!(Aabb2::EMPTY.union(&a), a);
        assert!(Aabb2::EMPTY.union(&Aabb2::EMPTY).is_empty());
        assert_eq!(Aabb2::EMPTY.width(), 0.0);
    }

    #[test]
    fn test_rect_bounds_aabb() {
        let bounds = BoundingLines::rect(1.5, 0.5);
        let aabb = bounds.aabb();
        assert_eq!(aabb.min, Vec2::new(-1.5, -0.5));
        assert_eq!(aabb.max, Vec2::new(1.5, 0.5));
        assert_eq!(bounds.len(), 4);
    }

    #[test]
    fn test_transformed_rotates_normals() {
        let bounds = BoundingLines::rect(1.0, 1.0);
        let m = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0))
            * Mat4::from_rotation_z(90f32.to_radians());
        let world = bounds.transformed(&m);

        // Left edge normal (-X) rotated by 90 degrees points down
        assert!((world.lines()[0].normal - Vec2::NEG_Y).length() < 0.001);
        let aabb = world.aabb();
        assert!((aabb.center() - Vec2::new(5.0, 0.0)).length() < 0.001);
    }

    #[test]
    fn test_overlaps_circle() {
        let aabb = Aabb2::new(Vec2::ZERO, Vec2::new(2.0, 2.0));
        assert!(aabb.overlaps_circle(Vec2::new(2.4, 1.0), 0.5));
        assert!(!aabb.overlaps_circle(Vec2::new(3.0, 3.0), 0.5));
        assert!(!Aabb2::EMPTY.overlaps_circle(Vec2::ZERO, 10.0));
    }
}

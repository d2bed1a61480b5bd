//! Collision detection and response for bounding lines
//!
//! Boss parts are bounded by line segments with outward normals. A ball (or
//! any circle) collides with a segment when the segment's closest point lies
//! within the circle's radius.

use glam::Vec2;

use super::bounds::{BoundLine, BoundingLines};
use super::state::GameLevel;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Collision point (if hit)
    pub point: Vec2,
    /// Surface normal at collision (pointing toward ball center, for reflection)
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check collision between a circle and a single bounding line
pub fn circle_line_collision(center: Vec2, radius: f32, line: &BoundLine) -> CollisionResult {
    let line_vec = line.p1 - line.p0;
    let line_len_sq = line_vec.length_squared();

    let closest = if line_len_sq < 0.0001 {
        line.p0 // Degenerate segment, treat as a point
    } else {
        let t = ((center - line.p0).dot(line_vec) / line_len_sq).clamp(0.0, 1.0);
        line.p0 + line_vec * t
    };

    let dist = (center - closest).length();
    if dist >= radius {
        return CollisionResult::miss();
    }

    let normal = (center - closest).normalize_or_zero();
    let normal = if normal.length_squared() < 0.5 {
        // Circle center is on the line - fall back to the line's outward normal
        line.normal
    } else {
        normal
    };

    CollisionResult {
        hit: true,
        point: closest,
        normal,
        penetration: radius - dist,
    }
}

/// Check collision between a circle and a set of bounding lines.
///
/// Returns the deepest contact when several lines overlap the circle.
pub fn circle_lines_collision(center: Vec2, radius: f32, bounds: &BoundingLines) -> CollisionResult {
    let mut best = CollisionResult::miss();
    for line in bounds.lines() {
        let result = circle_line_collision(center, radius, line);
        if result.hit && (!best.hit || result.penetration > best.penetration) {
            best = result;
        }
    }
    best
}

/// Check a circle against the walls and ceiling of the level.
///
/// The bottom of the level is open; balls leaving it are lost.
pub fn circle_level_collision(center: Vec2, radius: f32, level: &GameLevel) -> CollisionResult {
    if center.x - radius < 0.0 {
        return CollisionResult {
            hit: true,
            point: Vec2::new(0.0, center.y),
            normal: Vec2::X,
            penetration: radius - center.x,
        };
    }
    if center.x + radius > level.width {
        return CollisionResult {
            hit: true,
            point: Vec2::new(level.width, center.y),
            normal: Vec2::NEG_X,
            penetration: center.x + radius - level.width,
        };
    }
    if center.y + radius > level.height {
        return CollisionResult {
            hit: true,
            point: Vec2::new(center.x, level.height),
            normal: Vec2::NEG_Y,
            penetration: center.y + radius - level.height,
        };
    }
    CollisionResult::miss()
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

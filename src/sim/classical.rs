//! The Classical (temple) boss body
//!
//! ```text
//! root
//! |____dead parts root
//! |____alive parts root
//!      |____eye
//!      |____pediment
//!      |____top-left, top-right, bottom-left, bottom-right tablature
//!      |____left columns 1..3, right columns 1..3
//!      |____base
//!      |____left arm
//!      |    |____rest of arm, square
//!      |____right arm
//!           |____rest of arm, square
//! ```
//!
//! The eye and the four inner columns start without bounds: they sit behind
//! other geometry and only become hittable when a later stage exposes them.

use glam::{Vec2, Vec3};

use super::body_part::{BodyPart, PartId};
use super::boss::{Boss, BossBody, WorldStyle};
use super::bounds::BoundingLines;
use super::classical_ai::ArmsBodyHeadAi;
use super::error::BossError;
use crate::consts::*;
use crate::tuning::ClassicalTuning;

pub const ARM_X_TRANSLATION_FROM_CENTER: f32 = 10.3;
pub const ARM_Y_TRANSLATION: f32 = 0.834;
pub const ARM_WIDTH: f32 = 2.4;
pub const HALF_ARM_WIDTH: f32 = ARM_WIDTH / 2.0;
pub const ARM_HEIGHT: f32 = 9.66;

pub const COLUMN_WIDTH: f32 = 1.704;
pub const COLUMN_HEIGHT: f32 = 4.373;
pub const BASE_WIDTH: f32 = 18.355;
pub const BASE_HEIGHT: f32 = 2.150;
pub const TABLATURE_WIDTH: f32 = 7.621;
pub const TABLATURE_TOP_WIDTH: f32 = 6.933;
pub const TABLATURE_HEIGHT: f32 = 1.334;
pub const PEDIMENT_WIDTH: f32 = 17.823;
pub const PEDIMENT_HEIGHT: f32 = 3.16;
pub const EYE_WIDTH: f32 = 3.150;
pub const EYE_HEIGHT: f32 = 1.575;

pub const ARMS_BODY_HEAD_MAX_SPEED: f32 = 0.8 * PADDLE_DEFAULT_MAX_SPEED / 1.75;
pub const ARMS_BODY_HEAD_ACCELERATION: f32 = 0.8 * PADDLE_DEFAULT_ACCELERATION / 2.25;
pub const BODY_HEAD_MAX_SPEED: f32 = 0.8 * PADDLE_DEFAULT_MAX_SPEED + 5.0;
pub const BODY_HEAD_ACCELERATION: f32 = 0.8 * PADDLE_DEFAULT_ACCELERATION;
pub const EYE_MAX_SPEED: f32 = 0.8 * PADDLE_DEFAULT_MAX_SPEED + 8.0;
pub const EYE_ACCELERATION: f32 = 0.8 * PADDLE_DEFAULT_ACCELERATION + 12.0;

const COLUMN_X_POSITIONS: [f32; 6] = [-7.275, -5.101, -2.927, 7.275, 5.101, 2.927];
const TABLATURE_X: f32 = 5.101;
const TABLATURE_Y: f32 = 2.854;

const SQUARE_SIZE: f32 = 2.445 + 0.25;
const SUPPORT_HEIGHT: f32 = 0.652 - 0.25;

/// Handles to every named part of the Classical boss
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassicalLayout {
    pub eye: PartId,
    pub pediment: PartId,
    /// Top-left, top-right, bottom-left, bottom-right
    pub tablatures: [PartId; 4],
    /// Left 1..3 (outer to inner), then right 1..3
    pub columns: [PartId; 6],
    pub base: PartId,
    pub left_arm: PartId,
    pub left_rest_of_arm: PartId,
    pub left_arm_square: PartId,
    pub right_arm: PartId,
    pub right_rest_of_arm: PartId,
    pub right_arm_square: PartId,
}

/// Segment with a normalised copy of the given outward direction
fn add_bound(bounds: &mut BoundingLines, p0: Vec2, p1: Vec2, normal: Vec2) {
    bounds.add_bound(p0, p1, normal.normalize_or_zero());
}

fn pediment_bounds() -> BoundingLines {
    let (hw, hh) = (PEDIMENT_WIDTH / 2.0, PEDIMENT_HEIGHT / 2.0);
    let mut bounds = BoundingLines::new();
    add_bound(&mut bounds, Vec2::new(0.0, hh), Vec2::new(-hw, -hh), Vec2::new(-PEDIMENT_HEIGHT, hw));
    add_bound(&mut bounds, Vec2::new(0.0, hh), Vec2::new(hw, -hh), Vec2::new(PEDIMENT_HEIGHT, hw));
    bounds
}

fn tablature_bounds() -> BoundingLines {
    let hh = TABLATURE_HEIGHT / 2.0;
    let (hb, ht) = (TABLATURE_WIDTH / 2.0, TABLATURE_TOP_WIDTH / 2.0);
    let mut bounds = BoundingLines::new();
    add_bound(&mut bounds, Vec2::new(-ht, hh), Vec2::new(ht, hh), Vec2::Y);
    add_bound(&mut bounds, Vec2::new(-ht, hh), Vec2::new(-hb, -hh), Vec2::new(-TABLATURE_HEIGHT, hb - ht));
    add_bound(&mut bounds, Vec2::new(ht, hh), Vec2::new(hb, -hh), Vec2::new(TABLATURE_HEIGHT, hb - ht));
    bounds
}

pub fn column_bounds() -> BoundingLines {
    let (hw, hh) = (COLUMN_WIDTH / 2.0, COLUMN_HEIGHT / 2.0);
    let mut bounds = BoundingLines::new();
    add_bound(&mut bounds, Vec2::new(-hw, hh), Vec2::new(-hw, -hh), Vec2::NEG_X);
    add_bound(&mut bounds, Vec2::new(hw, hh), Vec2::new(hw, -hh), Vec2::X);
    bounds
}

/// Diamond around the eye
pub fn eye_bounds() -> BoundingLines {
    let (hw, hh) = (EYE_WIDTH / 2.0, EYE_HEIGHT / 2.0);
    let mut bounds = BoundingLines::new();
    add_bound(&mut bounds, Vec2::new(0.0, hh), Vec2::new(-hw, 0.0), Vec2::new(-hh, hw));
    add_bound(&mut bounds, Vec2::new(0.0, hh), Vec2::new(hw, 0.0), Vec2::new(hh, hw));
    add_bound(&mut bounds, Vec2::new(0.0, -hh), Vec2::new(-hw, 0.0), Vec2::new(-hh, -hw));
    add_bound(&mut bounds, Vec2::new(0.0, -hh), Vec2::new(hw, 0.0), Vec2::new(hh, -hw));
    bounds
}

fn base_bounds() -> BoundingLines {
    BoundingLines::rect(BASE_WIDTH / 2.0, BASE_HEIGHT / 2.0)
}

/// Support pieces and the tapered column beneath the arm's square
fn rest_of_arm_bounds() -> BoundingLines {
    let half_support_w = SQUARE_SIZE / 2.0;
    let half_support_h = SUPPORT_HEIGHT / 2.0;
    let mut bounds = BoundingLines::new();

    // Top support
    let t = Vec2::new(0.0, 3.097 + half_support_h);
    add_bound(&mut bounds, t + Vec2::new(-half_support_w, half_support_h), t + Vec2::new(half_support_w, half_support_h), Vec2::Y);
    add_bound(&mut bounds, t + Vec2::new(-half_support_w, half_support_h), t + Vec2::new(-half_support_w, -half_support_h), Vec2::NEG_X);
    add_bound(&mut bounds, t + Vec2::new(half_support_w, half_support_h), t + Vec2::new(half_support_w, -half_support_h), Vec2::X);

    // Bottom support
    let t = Vec2::new(0.0, half_support_h);
    add_bound(&mut bounds, t + Vec2::new(-half_support_w, half_support_h), t + Vec2::new(-half_support_w, -half_support_h), Vec2::NEG_X);
    add_bound(&mut bounds, t + Vec2::new(half_support_w, half_support_h), t + Vec2::new(half_support_w, -half_support_h), Vec2::X);

    // Column top base
    const TOP_BASE_W: f32 = 2.375;
    const TOP_BASE_H: f32 = 0.292;
    let t = Vec2::new(0.0, -TOP_BASE_H / 2.0);
    let (hw, hh) = (TOP_BASE_W / 2.0, TOP_BASE_H / 2.0);
    add_bound(&mut bounds, t + Vec2::new(-hw, hh), t + Vec2::new(-hw, -hh), Vec2::NEG_X);
    add_bound(&mut bounds, t + Vec2::new(hw, hh), t + Vec2::new(hw, -hh), Vec2::X);

    // Tapered top
    const TAPER_H: f32 = 0.207;
    const TAPER_BOTTOM_W: f32 = 1.599;
    let t = Vec2::new(0.0, -(TOP_BASE_H + TAPER_H / 2.0));
    let (top_hw, bottom_hw, hh) = (TOP_BASE_W / 2.0, TAPER_BOTTOM_W / 2.0, TAPER_H / 2.0);
    add_bound(&mut bounds, t + Vec2::new(-top_hw, hh), t + Vec2::new(-bottom_hw, -hh), Vec2::new(-TAPER_H, bottom_hw - top_hw));
    add_bound(&mut bounds, t + Vec2::new(top_hw, hh), t + Vec2::new(bottom_hw, -hh), Vec2::new(TAPER_H, bottom_hw - top_hw));

    // Shaft
    const SHAFT_H: f32 = 4.792;
    const SHAFT_BOTTOM_W: f32 = 2.375;
    let t = Vec2::new(0.0, -(TOP_BASE_H + TAPER_H + SHAFT_H / 2.0));
    let (top_hw, bottom_hw, hh) = (TAPER_BOTTOM_W / 2.0, SHAFT_BOTTOM_W / 2.0, SHAFT_H / 2.0);
    add_bound(&mut bounds, t + Vec2::new(-top_hw, hh), t + Vec2::new(-bottom_hw, -hh), Vec2::new(-SHAFT_H, bottom_hw - top_hw));
    add_bound(&mut bounds, t + Vec2::new(top_hw, hh), t + Vec2::new(bottom_hw, -hh), Vec2::new(SHAFT_H, bottom_hw - top_hw));

    // Foot
    const FOOT_H: f32 = 0.621;
    let t = Vec2::new(0.0, -(TOP_BASE_H + TAPER_H + SHAFT_H + FOOT_H / 2.0));
    let (hw, hh) = (SHAFT_BOTTOM_W / 2.0, FOOT_H / 2.0);
    add_bound(&mut bounds, t + Vec2::new(-hw, -hh), t + Vec2::new(hw, -hh), Vec2::NEG_Y);
    add_bound(&mut bounds, t + Vec2::new(-hw, hh), t + Vec2::new(-hw, -hh), Vec2::NEG_X);
    add_bound(&mut bounds, t + Vec2::new(hw, hh), t + Vec2::new(hw, -hh), Vec2::X);

    bounds
}

fn square_bounds() -> BoundingLines {
    let h = SQUARE_SIZE / 2.0;
    let mut bounds = BoundingLines::new();
    add_bound(&mut bounds, Vec2::new(-h, h), Vec2::new(-h, -h), Vec2::NEG_X);
    add_bound(&mut bounds, Vec2::new(h, h), Vec2::new(h, -h), Vec2::X);
    bounds
}

fn add_placed(
    body: &mut BossBody,
    parent: PartId,
    name: &'static str,
    bounds: BoundingLines,
    at: Vec3,
) -> Result<PartId, BossError> {
    let id = body.add_part(parent, BodyPart::basic(name, bounds))?;
    body.tree_mut().translate(id, at);
    Ok(id)
}

/// Arm composite, square and rest-of-arm: returns (arm, rest of arm, square)
fn build_arm(body: &mut BossBody, is_left: bool) -> Result<(PartId, PartId, PartId), BossError> {
    let alive = body.alive_parts_root();
    let arm = body.add_part(alive, BodyPart::composite(if is_left { "left arm" } else { "right arm" }))?;

    let rest = body.add_part(arm, BodyPart::basic("rest of arm", rest_of_arm_bounds()))?;
    let square = add_placed(
        body,
        arm,
        "arm square",
        square_bounds(),
        Vec3::new(0.0, SUPPORT_HEIGHT + SQUARE_SIZE / 2.0, 0.0),
    )?;

    let side = if is_left { -1.0 } else { 1.0 };
    body.tree_mut()
        .translate(arm, Vec3::new(side * ARM_X_TRANSLATION_FROM_CENTER, ARM_Y_TRANSLATION, 0.0));
    Ok((arm, rest, square))
}

/// Lay out the Classical body around the origin
pub fn build_classical_body() -> Result<(BossBody, ClassicalLayout), BossError> {
    let mut body = BossBody::new()?;
    let alive = body.alive_parts_root();

    let eye = add_placed(&mut body, alive, "eye", BoundingLines::new(), Vec3::new(0.0, 5.081, 1.053))?;
    let pediment = add_placed(&mut body, alive, "pediment", pediment_bounds(), Vec3::new(0.0, 5.0905, 0.0))?;

    let mut tablatures = [eye; 4];
    let tablature_spots = [
        ("top-left tablature", -TABLATURE_X, TABLATURE_Y, true),
        ("top-right tablature", TABLATURE_X, TABLATURE_Y, true),
        ("bottom-left tablature", -TABLATURE_X, -TABLATURE_Y, false),
        ("bottom-right tablature", TABLATURE_X, -TABLATURE_Y, false),
    ];
    for (slot, (name, x, y, upside_down)) in tablatures.iter_mut().zip(tablature_spots) {
        let id = body.add_part(alive, BodyPart::basic(name, tablature_bounds()))?;
        if upside_down {
            body.tree_mut().rotate_z(id, 180.0);
        }
        body.tree_mut().translate(id, Vec3::new(x, y, 0.0));
        *slot = id;
    }

    let mut columns = [eye; 6];
    for (i, (slot, x)) in columns.iter_mut().zip(COLUMN_X_POSITIONS).enumerate() {
        let outer = i % 3 == 0;
        let bounds = if outer { column_bounds() } else { BoundingLines::new() };
        *slot = add_placed(&mut body, alive, "body column", bounds, Vec3::new(x, 0.0, 0.0))?;
    }

    let base = add_placed(&mut body, alive, "base", base_bounds(), Vec3::new(0.0, -4.596, 0.0))?;

    let (left_arm, left_rest_of_arm, left_arm_square) = build_arm(&mut body, true)?;
    let (right_arm, right_rest_of_arm, right_arm_square) = build_arm(&mut body, false)?;

    let layout = ClassicalLayout {
        eye,
        pediment,
        tablatures,
        columns,
        base,
        left_arm,
        left_rest_of_arm,
        left_arm_square,
        right_arm,
        right_rest_of_arm,
        right_arm_square,
    };
    Ok((body, layout))
}

/// Build the Classical boss with its first AI stage in place
pub fn build_classical_boss(tuning: &ClassicalTuning) -> Result<Boss, BossError> {
    let (mut body, layout) = build_classical_body()?;
    let ai = ArmsBodyHeadAi::new(&mut body, layout, tuning)?;

    let mut boss = Boss::new(WorldStyle::Classical, body);
    boss.set_current_ai_state_immediately(ai.into());
    Ok(boss)
}

/// Close the pediment underneath and give every column its bounds, once the
/// arms are gone and the body is what gets hit
pub fn generate_full_column_pediment_bounds(body: &mut BossBody, layout: &ClassicalLayout) {
    let (hw, hh) = (PEDIMENT_WIDTH / 2.0, PEDIMENT_HEIGHT / 2.0);
    let mut pediment = body.tree().part(layout.pediment).local_bounds().clone();
    add_bound(&mut pediment, Vec2::new(-hw, -hh), Vec2::new(hw, -hh), Vec2::NEG_Y);
    body.tree_mut().part_mut(layout.pediment).set_local_bounds(pediment);

    for column in layout.columns {
        body.tree_mut().part_mut(column).set_local_bounds(column_bounds());
    }
}

/// Give the eye its bounds and reopen the pediment underneath, so the eye
/// is reachable from below once the frame has fallen away
pub fn generate_eye_bounds(body: &mut BossBody, layout: &ClassicalLayout) {
    body.tree_mut().part_mut(layout.pediment).set_local_bounds(pediment_bounds());
    body.tree_mut().part_mut(layout.eye).set_local_bounds(eye_bounds());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_registry_and_order() {
        let (body, layout) = build_classical_body().unwrap();
        let alive = body.alive_parts_root();

        // root, dead, alive, eye, pediment, 4 tablatures, 6 columns, base,
        // 2 x (arm, rest, square)
        assert_eq!(body.tree().len(), 3 + 1 + 1 + 4 + 6 + 1 + 6);
        assert_eq!(body.tree().children(alive).first(), Some(&layout.eye));
        assert_eq!(body.tree().children(alive).last(), Some(&layout.right_arm));
        assert_eq!(
            body.tree().children(layout.left_arm),
            &[layout.left_rest_of_arm, layout.left_arm_square]
        );
    }

    #[test]
    fn test_hidden_parts_start_without_bounds() {
        let (mut body, layout) = build_classical_body().unwrap();
        assert!(body.tree().generate_world_aabb(layout.eye).is_empty());
        assert!(body.tree().generate_world_aabb(layout.columns[1]).is_empty());
        assert!(!body.tree().generate_world_aabb(layout.columns[0]).is_empty());

        generate_full_column_pediment_bounds(&mut body, &layout);
        for column in layout.columns {
            let aabb = body.tree().generate_world_aabb(column);
            assert!((aabb.width() - COLUMN_WIDTH).abs() < 1e-4);
        }
        assert_eq!(body.tree().part(layout.pediment).local_bounds().len(), 3);

        generate_eye_bounds(&mut body, &layout);
        let eye = body.tree().generate_world_aabb(layout.eye);
        assert!((eye.center() - Vec2::new(0.0, 5.081)).length() < 1e-4);
        assert_eq!(body.tree().part(layout.pediment).local_bounds().len(), 2);
    }

    #[test]
    fn test_arms_mirror_each_other() {
        let (body, layout) = build_classical_body().unwrap();
        let left = body.tree().generate_world_aabb(layout.left_arm);
        let right = body.tree().generate_world_aabb(layout.right_arm);
        assert!((left.center().x + right.center().x).abs() < 1e-3);
        assert!((left.height() - right.height()).abs() < 1e-4);
        assert!((body.tree().translation_pt2d(layout.right_arm).x - ARM_X_TRANSLATION_FROM_CENTER).abs() < 1e-5);

        // Upside-down tablatures keep their footprint
        let top = body.tree().generate_world_aabb(layout.tablatures[0]);
        let bottom = body.tree().generate_world_aabb(layout.tablatures[2]);
        assert!((top.width() - bottom.width()).abs() < 1e-3);
        assert!((top.center().y - TABLATURE_Y).abs() < 1e-3);
    }

    #[test]
    fn test_normals_are_unit_length() {
        for bounds in [pediment_bounds(), tablature_bounds(), eye_bounds(), rest_of_arm_bounds()] {
            for line in bounds.lines() {
                assert!((line.normal.length() - 1.0).abs() < 1e-5);
            }
        }
    }
}

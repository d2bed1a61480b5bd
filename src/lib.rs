//! Breakout Boss - boss battles for a 3D breakout game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (body-part hierarchy, weakpoints, boss AI)
//! - `tuning`: Data-driven boss balance

pub mod sim;
pub mod tuning;

pub use tuning::BossTuning;

use glam::{Mat4, Vec2, Vec3};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Comparison tolerance for positions, velocities and curve times
    pub const EPSILON: f32 = 1e-5;

    /// Level piece dimensions (level units)
    pub const PIECE_WIDTH: f32 = 2.5;
    pub const PIECE_HEIGHT: f32 = 1.0;

    /// Boss arena size in pieces
    pub const BOSS_LEVEL_WIDTH_IN_PIECES: u32 = 23;
    pub const BOSS_LEVEL_HEIGHT_IN_PIECES: u32 = 32;

    /// Paddle defaults - boss speeds are derived from these
    pub const PADDLE_DEFAULT_MAX_SPEED: f32 = 26.0;
    pub const PADDLE_DEFAULT_ACCELERATION: f32 = 139.0;
    pub const PADDLE_HALF_WIDTH: f32 = 2.0;
    pub const PADDLE_HALF_HEIGHT: f32 = 0.25;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 0.5;
    pub const BALL_DEFAULT_SPEED: f32 = 15.0;
    pub const DEFAULT_DAMAGE_ON_BALL_HIT: f32 = 100.0;

    /// Boss laser bullet speed (units/s)
    pub const BOSS_LASER_SPEED: f32 = 20.0;

    /// Blast radii of paddle weapons that explode on contact
    pub const ROCKET_EXPLOSION_RADIUS: f32 = 2.0 * PIECE_WIDTH;
    pub const MINE_EXPLOSION_RADIUS: f32 = 1.5 * PIECE_WIDTH;
}

/// Rotate a 2D vector counter-clockwise by the given angle in degrees
#[inline]
pub fn rotate_degs(v: Vec2, degs: f32) -> Vec2 {
    Vec2::from_angle(degs.to_radians()).rotate(v)
}

/// -1.0, 0.0 or 1.0 depending on the sign of `x`
#[inline]
pub fn sign_of(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Translation column of an affine transform
#[inline]
pub fn translation_of(m: &Mat4) -> Vec3 {
    m.w_axis.truncate()
}

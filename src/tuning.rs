//! Boss balance data
//!
//! Life pools, timings and animation curves for each boss archetype. Every
//! field has a built-in default, so a tuning file only needs the values it
//! overrides.

use serde::{Deserialize, Serialize};

use crate::sim::AnimationMultiLerp;

/// A curve as plain (time, value) lists, scaled when turned into an animation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePoints {
    pub times: Vec<f32>,
    pub values: Vec<f32>,
}

impl CurvePoints {
    pub fn new(times: Vec<f32>, values: Vec<f32>) -> Self {
        Self { times, values }
    }

    /// Non-repeating animation with every value multiplied by `scale`
    pub fn to_anim(&self, scale: f32) -> AnimationMultiLerp<f32> {
        let values = self.values.iter().map(|v| v * scale).collect();
        AnimationMultiLerp::from_points(self.times.clone(), values)
    }

    /// Whether the lists line up and the times are ordered
    pub fn is_valid(&self) -> bool {
        self.times.len() == self.values.len()
            && self.times.len() >= 2
            && self.times.windows(2).all(|w| w[0] <= w[1])
    }
}

/// Tuning for the Classical (temple) boss
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassicalTuning {
    /// Arm squares (first stage weakpoints)
    pub arm_life_points: f32,
    pub arm_ball_damage: f32,
    /// Body columns (second stage weakpoints)
    pub column_life_points: f32,
    pub column_ball_damage: f32,
    /// The eye (final weakpoint)
    pub eye_life_points: f32,
    pub eye_ball_damage: f32,
    /// Seconds a weakpoint ignores damage after a non-lethal hit
    pub invulnerable_time: f32,

    /// Seconds between laser sprays while moving
    pub laser_spray_reset_time: f32,
    /// Angle between neighbouring lasers in a spray
    pub laser_spread_degs: f32,
    /// Basic movement lasts `min + rand * jitter` seconds
    pub basic_move_time_min: f32,
    pub basic_move_time_jitter: f32,
    /// Paddle chasing lasts `min + rand * jitter` seconds before an attack
    pub follow_time_min: f32,
    pub follow_time_jitter: f32,
    /// Eye charge before a laser barrage
    pub laser_charge_time: f32,
    pub barrage_shots: u32,
    pub barrage_interval: f32,
    /// Time spent reeling after a weakpoint takes damage
    pub hurt_time: f32,

    /// Arm wind-up shake, values as fractions of the maximum shake distance
    pub arm_shake: CurvePoints,
    /// Arm strike, values as fractions of the maximum strike distance
    pub arm_strike: CurvePoints,
}

impl Default for ClassicalTuning {
    fn default() -> Self {
        Self {
            arm_life_points: 300.0,
            arm_ball_damage: 100.0,
            column_life_points: 200.0,
            column_ball_damage: 100.0,
            eye_life_points: 400.0,
            eye_ball_damage: 100.0,
            invulnerable_time: 1.5,

            laser_spray_reset_time: 1.5,
            laser_spread_degs: 15.0,
            basic_move_time_min: 10.0,
            basic_move_time_jitter: 5.0,
            follow_time_min: 5.0,
            follow_time_jitter: 5.0,
            laser_charge_time: 2.0,
            barrage_shots: 6,
            barrage_interval: 0.5,
            hurt_time: 1.0,

            arm_shake: CurvePoints::new(
                vec![
                    0.0, 0.01, 0.025, 0.07, 0.10, 0.13, 0.18, 0.2, 0.21, 0.225, 0.27, 0.315,
                    0.34, 0.377, 0.4, 0.412, 0.49, 0.55, 0.6, 0.61, 0.625, 0.67, 0.70, 0.73,
                    0.78, 0.8, 0.81, 0.825, 0.87, 0.915, 0.94, 0.977, 1.0,
                ],
                vec![
                    0.0, 0.6, -0.1, -1.0, -0.75, 0.4, 1.0, -0.2, 0.1, -1.0, 0.6, -0.1, -1.0,
                    -0.75, 0.4, 1.0, -0.2, 0.6, -0.75, 0.4, 1.0, -0.2, 0.1, -1.0, 0.6, -0.1,
                    -1.0, -0.75, 0.4, 1.0, -0.2, 0.1, 0.0,
                ],
            ),
            arm_strike: CurvePoints::new(
                vec![0.0, 0.4, 0.48, 1.0, 2.5],
                vec![0.0, -1.15, -1.0, -1.0, 0.0],
            ),
        }
    }
}

/// Balance data for every boss archetype
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTuning {
    pub classical: ClassicalTuning,
}

impl BossTuning {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_curves_are_valid() {
        let tuning = BossTuning::default();
        assert!(tuning.classical.arm_shake.is_valid());
        assert!(tuning.classical.arm_strike.is_valid());
        assert_eq!(tuning.classical.arm_shake.times.len(), 33);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = BossTuning::from_json(r#"{ "classical": { "arm_life_points": 50.0 } }"#)
            .expect("valid tuning json");
        assert_eq!(tuning.classical.arm_life_points, 50.0);
        assert_eq!(tuning.classical.arm_ball_damage, 100.0);
        assert_eq!(tuning.classical.arm_strike, ClassicalTuning::default().arm_strike);
    }

    #[test]
    fn test_json_round_trip() {
        let tuning = BossTuning::default();
        let json = tuning.to_json().expect("serializes");
        assert_eq!(BossTuning::from_json(&json).expect("parses"), tuning);
    }

    #[test]
    fn test_curve_scaling() {
        let curve = CurvePoints::new(vec![0.0, 1.0], vec![0.0, -1.0]);
        let mut anim = curve.to_anim(3.0);
        anim.tick(1.0);
        anim.tick(1.0);
        assert!((anim.interpolant_value() + 3.0).abs() < 0.001);
    }
}

//! Weakpoints: body parts with hit points
//!
//! A weakpoint adopts the geometry of the basic part it replaces and adds a
//! life pool. Damage is ignored while the weakpoint is invulnerable (a short
//! window after every non-lethal hit) and once it is destroyed, so the
//! destroyed outcome is reported exactly once no matter how many hits land
//! in the same tick.

use serde::{Deserialize, Serialize};

use super::state::ProjectileKind;

/// What a single damage event did to a weakpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageOutcome {
    /// Nothing happened (not a weakpoint, invulnerable, already dead, no damage)
    Ignored,
    /// Life was lost but the weakpoint survives
    Hurt,
    /// This hit took the last of the weakpoint's life
    Destroyed,
}

impl DamageOutcome {
    #[inline]
    pub fn took_damage(self) -> bool {
        !matches!(self, DamageOutcome::Ignored)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weakpoint {
    total_life_points: f32,
    curr_life_points: f32,
    damage_on_ball_hit: f32,
    invulnerable_timer: f32,
    total_invulnerable_time: f32,
}

impl Weakpoint {
    /// Seconds of invulnerability after a non-lethal hit
    pub const DEFAULT_INVULNERABLE_TIME: f32 = 1.5;

    pub fn new(life_points: f32, damage_on_ball_hit: f32) -> Self {
        debug_assert!(life_points > 0.0);
        Self {
            total_life_points: life_points,
            curr_life_points: life_points,
            damage_on_ball_hit,
            invulnerable_timer: 0.0,
            total_invulnerable_time: Self::DEFAULT_INVULNERABLE_TIME,
        }
    }

    pub fn set_invulnerable_time(&mut self, secs: f32) {
        self.total_invulnerable_time = secs.max(0.0);
    }

    pub fn tick(&mut self, dt: f32) {
        if self.invulnerable_timer > 0.0 {
            self.invulnerable_timer = (self.invulnerable_timer - dt).max(0.0);
        }
    }

    #[inline]
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_timer > 0.0
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.curr_life_points <= 0.0
    }

    pub fn total_life_points(&self) -> f32 {
        self.total_life_points
    }

    pub fn current_life_points(&self) -> f32 {
        self.curr_life_points
    }

    /// Remaining life in [0, 1]
    pub fn current_life_percentage(&self) -> f32 {
        self.curr_life_points / self.total_life_points
    }

    pub fn damage_on_ball_hit(&self) -> f32 {
        self.damage_on_ball_hit
    }

    /// Take `damage` life points
    pub fn diminish(&mut self, damage: f32) -> DamageOutcome {
        if self.is_destroyed() || self.is_invulnerable() || damage <= 0.0 {
            return DamageOutcome::Ignored;
        }

        self.curr_life_points = (self.curr_life_points - damage).max(0.0);
        if self.is_destroyed() {
            self.invulnerable_timer = 0.0;
            DamageOutcome::Destroyed
        } else {
            self.invulnerable_timer = self.total_invulnerable_time;
            DamageOutcome::Hurt
        }
    }

    pub fn ball_collision(&mut self) -> DamageOutcome {
        self.diminish(self.damage_on_ball_hit)
    }

    /// Player projectiles hurt; mines only hurt through their explosion and
    /// boss projectiles never hurt their own boss.
    pub fn projectile_collision(&mut self, kind: ProjectileKind, damage: f32) -> DamageOutcome {
        if kind.damages_boss_on_contact() {
            self.diminish(damage)
        } else {
            DamageOutcome::Ignored
        }
    }

    /// Continuous damage from a beam held on the weakpoint for `dt` seconds
    pub fn beam_tick(&mut self, dt: f32, damage_per_second: f32) -> DamageOutcome {
        self.diminish(dt * damage_per_second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hurt_then_invulnerable() {
        let mut wp = Weakpoint::new(300.0, 100.0);
        assert_eq!(wp.ball_collision(), DamageOutcome::Hurt);
        assert!(wp.is_invulnerable());
        assert_eq!(wp.ball_collision(), DamageOutcome::Ignored);
        assert!((wp.current_life_percentage() - 2.0 / 3.0).abs() < 0.001);

        wp.tick(Weakpoint::DEFAULT_INVULNERABLE_TIME + 0.01);
        assert!(!wp.is_invulnerable());
        assert_eq!(wp.ball_collision(), DamageOutcome::Hurt);
    }

    #[test]
    fn test_destroyed_reported_once_for_lethal_hits() {
        let mut wp = Weakpoint::new(100.0, 100.0);
        let outcomes = [wp.diminish(100.0), wp.diminish(100.0)];
        let destroyed = outcomes.iter().filter(|o| **o == DamageOutcome::Destroyed).count();
        assert_eq!(destroyed, 1);
        assert_eq!(wp.current_life_points(), 0.0);
        assert!(!wp.is_invulnerable());
    }

    #[test]
    fn test_destroyed_reported_once_without_invulnerability() {
        let life = 100.0;
        let mut wp = Weakpoint::new(life, 10.0);
        wp.set_invulnerable_time(0.0);

        // Two hits in the same tick that together exceed the life pool
        let outcomes = [wp.diminish(0.6 * life), wp.diminish(0.6 * life)];
        assert_eq!(outcomes, [DamageOutcome::Hurt, DamageOutcome::Destroyed]);
        assert_eq!(wp.diminish(0.6 * life), DamageOutcome::Ignored);
    }

    #[test]
    fn test_life_never_goes_negative() {
        let mut wp = Weakpoint::new(50.0, 10.0);
        assert_eq!(wp.diminish(1000.0), DamageOutcome::Destroyed);
        assert_eq!(wp.current_life_points(), 0.0);
        assert_eq!(wp.current_life_percentage(), 0.0);
    }

    #[test]
    fn test_projectile_damage_table() {
        let mut wp = Weakpoint::new(100.0, 10.0);
        wp.set_invulnerable_time(0.0);

        assert_eq!(
            wp.projectile_collision(ProjectileKind::BossLaserBullet, 50.0),
            DamageOutcome::Ignored
        );
        assert_eq!(
            wp.projectile_collision(ProjectileKind::PaddleMineBullet, 50.0),
            DamageOutcome::Ignored
        );
        assert_eq!(
            wp.projectile_collision(ProjectileKind::PaddleLaserBullet, 50.0),
            DamageOutcome::Hurt
        );
    }

    #[test]
    fn test_beam_damage_scales_with_dt() {
        let mut wp = Weakpoint::new(100.0, 10.0);
        assert_eq!(wp.beam_tick(0.5, 40.0), DamageOutcome::Hurt);
        assert!((wp.current_life_points() - 80.0).abs() < 0.001);
        assert_eq!(wp.beam_tick(0.0, 40.0), DamageOutcome::Ignored);
    }
}

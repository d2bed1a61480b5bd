//! Stock animations shared by every boss archetype
//!
//! Colour flashes for hurt/angry/death, random shakes, and limb fall-off
//! curves applied to parts that have been moved into the dead subtree.

use glam::{Vec3, Vec4};
use rand::Rng;

use super::animation::AnimationMultiLerp;
use super::weakpoint::Weakpoint;

/// Seconds the final death sequence lasts
pub const TOTAL_DEATH_ANIM_TIME: f32 = 6.5;
pub const WAIT_BEFORE_FADE_TO_BLACK_TIME: f32 = 1.5;
pub const FADE_TO_BLACK_TIME: f32 = TOTAL_DEATH_ANIM_TIME / 1.75;

const NUM_HURT_FLASHES: usize = 20;
const NUM_SHAKES: usize = 15;
const SHAKE_INC_TIME: f32 = 0.03;
const ANGRY_FLASH_TIME: f32 = 0.2;

/// Red/white flicker lasting for the weakpoint invulnerability window
pub fn hurt_and_invulnerable_colour_anim() -> AnimationMultiLerp<Vec4> {
    hurt_and_invulnerable_colour_anim_for(Weakpoint::DEFAULT_INVULNERABLE_TIME)
}

pub fn hurt_and_invulnerable_colour_anim_for(total_time: f32) -> AnimationMultiLerp<Vec4> {
    let time_inc = total_time / (2 * NUM_HURT_FLASHES) as f32;
    let times = (0..=2 * NUM_HURT_FLASHES).map(|i| i as f32 * time_inc).collect();

    let mut colours = Vec::with_capacity(2 * NUM_HURT_FLASHES + 1);
    for _ in 0..NUM_HURT_FLASHES {
        colours.push(Vec4::new(1.0, 0.25, 0.25, 1.0));
        colours.push(Vec4::new(1.0, 0.9, 0.9, 0.5));
    }
    colours.push(Vec4::ONE);

    AnimationMultiLerp::from_points(times, colours)
}

/// Fade to half alpha, flicker, then fade out completely
pub fn hurt_flash_and_fade_anim(total_time: f32) -> AnimationMultiLerp<Vec4> {
    const FIRST_FADE_OUT_TIME: f32 = 0.5;
    const FIRST_ALPHA: f32 = 0.5;
    const SECOND_ALPHA: f32 = 0.25;

    let num_flashes = ((25.0 * total_time / 4.0) as usize).max(1);
    let flash_inc = (total_time - FIRST_FADE_OUT_TIME).max(0.0) / (2 * num_flashes + 1) as f32;

    let mut times = vec![0.0, FIRST_FADE_OUT_TIME];
    for _ in 0..=2 * num_flashes {
        let last = times[times.len() - 1];
        times.push(last + flash_inc);
    }

    let mut colours = vec![Vec4::ONE, Vec4::new(1.0, 1.0, 1.0, FIRST_ALPHA)];
    for _ in 0..num_flashes {
        colours.push(Vec4::new(1.0, 0.0, 0.0, SECOND_ALPHA));
        colours.push(Vec4::new(1.0, 0.8, 0.8, FIRST_ALPHA));
    }
    colours.push(Vec4::ZERO);

    AnimationMultiLerp::from_points(times, colours)
}

/// Hold, fade to black, then fade out over the death sequence
pub fn final_death_flash_anim() -> AnimationMultiLerp<Vec4> {
    AnimationMultiLerp::from_points(
        vec![0.0, WAIT_BEFORE_FADE_TO_BLACK_TIME, FADE_TO_BLACK_TIME, TOTAL_DEATH_ANIM_TIME],
        vec![
            Vec4::ONE,
            Vec4::ONE,
            Vec4::new(0.0, 0.0, 0.0, 1.0),
            Vec4::ZERO,
        ],
    )
}

/// Repeating red/yellow pulse
pub fn angry_flash_anim() -> AnimationMultiLerp<Vec4> {
    let mut anim = AnimationMultiLerp::from_points(
        (0..5).map(|i| i as f32 * ANGRY_FLASH_TIME).collect(),
        vec![
            Vec4::ONE,
            Vec4::new(1.0, 0.0, 0.0, 1.0),
            Vec4::new(1.0, 1.0, 0.0, 1.0),
            Vec4::new(1.0, 0.0, 0.0, 1.0),
            Vec4::ONE,
        ],
    );
    anim.set_repeat(true);
    anim
}

/// One-shot random jitter that ends back at the origin
pub fn angry_shake_anim<R: Rng>(rng: &mut R, magnitude: f32) -> AnimationMultiLerp<Vec3> {
    let times = (0..=2 * NUM_SHAKES + 1)
        .map(|i| i as f32 * SHAKE_INC_TIME)
        .collect();

    let mut moves = Vec::with_capacity(2 * NUM_SHAKES + 2);
    moves.push(Vec3::ZERO);
    for _ in 0..NUM_SHAKES {
        let x = rng.random_range(-1.0..=1.0) * magnitude;
        let y = rng.random_range(-1.0..=1.0) * magnitude;
        moves.push(Vec3::new(x, y, 0.0));
        moves.push(Vec3::new(-x, -y, 0.0));
    }
    moves.push(Vec3::ZERO);

    AnimationMultiLerp::from_points(times, moves)
}

/// Endless version of the angry shake for the death throes
pub fn final_death_shake_anim<R: Rng>(rng: &mut R, magnitude: f32) -> AnimationMultiLerp<Vec3> {
    let mut anim = angry_shake_anim(rng, magnitude);
    anim.set_repeat(true);
    anim
}

pub fn limb_fall_off_translation_anim(total_time: f32, x_dist: f32, y_dist: f32) -> AnimationMultiLerp<Vec3> {
    AnimationMultiLerp::from_points(
        vec![0.0, total_time],
        vec![Vec3::ZERO, Vec3::new(x_dist, y_dist, 0.0)],
    )
}

pub fn limb_fall_off_z_rotation_anim(total_time: f32, rot_degs: f32) -> AnimationMultiLerp<f32> {
    AnimationMultiLerp::from_points(vec![0.0, total_time], vec![0.0, rot_degs])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_hurt_colour_ends_white() {
        let mut anim = hurt_and_invulnerable_colour_anim();
        let final_time = anim.final_time().unwrap();
        assert!((final_time - Weakpoint::DEFAULT_INVULNERABLE_TIME).abs() < 1e-4);
        let mut ticks = 0;
        while !anim.tick(0.01) {
            ticks += 1;
            assert!(ticks < 1000);
        }
        assert_eq!(anim.interpolant_value(), Vec4::ONE);
    }

    #[test]
    fn test_angry_shake_is_deterministic_and_returns_home() {
        let mut a = Pcg32::seed_from_u64(3);
        let mut b = Pcg32::seed_from_u64(3);
        let mut anim_a = angry_shake_anim(&mut a, 0.5);
        let mut anim_b = angry_shake_anim(&mut b, 0.5);

        let mut ticks = 0;
        loop {
            let done = anim_a.tick(0.01);
            anim_b.tick(0.01);
            assert_eq!(anim_a.interpolant_value(), anim_b.interpolant_value());
            assert!(anim_a.interpolant_value().length() <= 0.5 * 2f32.sqrt() + 1e-4);
            if done {
                break;
            }
            ticks += 1;
            assert!(ticks < 1000);
        }
        assert_eq!(anim_a.interpolant_value(), Vec3::ZERO);
    }

    #[test]
    fn test_final_death_shake_repeats() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut anim = final_death_shake_anim(&mut rng, 0.2);
        for _ in 0..500 {
            assert!(!anim.tick(0.01));
        }
    }

    #[test]
    fn test_flash_and_fade_ends_transparent() {
        let mut anim = hurt_flash_and_fade_anim(2.0);
        while !anim.tick(0.01) {}
        assert_eq!(anim.interpolant_value(), Vec4::ZERO);
    }

    #[test]
    fn test_limb_fall_off_reaches_target() {
        let mut anim = limb_fall_off_translation_anim(1.0, 2.0, -10.0);
        while !anim.tick(0.05) {}
        assert!((anim.interpolant_value() - Vec3::new(2.0, -10.0, 0.0)).length() < 0.001);

        let mut rot = limb_fall_off_z_rotation_anim(1.0, 45.0);
        while !rot.tick(0.05) {}
        assert!((rot.interpolant_value() - 45.0).abs() < 0.001);
    }
}

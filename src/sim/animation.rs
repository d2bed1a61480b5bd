//! Piecewise-linear animation curves
//!
//! Curves are sampled as time -> value over an ordered list of points. Bosses
//! use them for shakes, strikes, limb fall-offs and colour flashes; a curve is
//! advanced with `tick` and read back with `interpolant_value`.

use std::ops::{Add, Mul, Sub};

use crate::consts::EPSILON;

/// Anything a curve can interpolate
pub trait Interpolant:
    Copy + Default + Add<Output = Self> + Sub<Output = Self> + Mul<f32, Output = Self>
{
}

impl<T> Interpolant for T where
    T: Copy + Default + Add<Output = T> + Sub<Output = T> + Mul<f32, Output = T>
{
}

/// Multi-point linear interpolation over time
#[derive(Debug, Clone, Default)]
pub struct AnimationMultiLerp<T: Interpolant> {
    times: Vec<f32>,
    values: Vec<T>,
    /// Current sampled value
    value: T,
    /// Elapsed time along the curve
    x: f32,
    /// Index of the segment start point currently being interpolated
    tracker: usize,
    repeat: bool,
}

impl<T: Interpolant> AnimationMultiLerp<T> {
    /// An empty curve holding `initial` as its value
    pub fn new(initial: T) -> Self {
        Self {
            times: Vec::new(),
            values: Vec::new(),
            value: initial,
            x: 0.0,
            tracker: 0,
            repeat: false,
        }
    }

    /// A non-repeating curve through the given points
    pub fn from_points(times: Vec<f32>, values: Vec<T>) -> Self {
        let mut anim = Self::new(T::default());
        anim.set_lerp(times, values);
        anim
    }

    /// Replace the curve points and rewind to the start
    pub fn set_lerp(&mut self, times: Vec<f32>, values: Vec<T>) {
        debug_assert_eq!(times.len(), values.len(), "curve times/values length mismatch");
        debug_assert!(times.windows(2).all(|w| w[0] <= w[1]), "curve times must be ordered");
        self.times = times;
        self.values = values;
        self.x = 0.0;
        self.tracker = 0;
        if let Some(first) = self.values.first() {
            self.value = *first;
        }
    }

    /// Single segment from the current value to `final_value` over `final_time`
    pub fn set_lerp_single(&mut self, final_time: f32, final_value: T) {
        let start = self.value;
        self.set_lerp(vec![0.0, final_time], vec![start, final_value]);
    }

    /// Drop all points; the current value is kept
    pub fn clear_lerp(&mut self) {
        self.times.clear();
        self.values.clear();
        self.x = 0.0;
        self.tracker = 0;
    }

    pub fn set_repeat(&mut self, repeat: bool) {
        self.repeat = repeat;
    }

    /// Rewind to the first point
    pub fn reset_to_start(&mut self) {
        self.x = 0.0;
        self.tracker = 0;
        if let Some(first) = self.values.first() {
            self.value = *first;
        }
    }

    /// Whether the curve has at least one segment to play
    pub fn has_points(&self) -> bool {
        self.times.len() >= 2 && self.times.len() == self.values.len()
    }

    /// Time of the last point, if any
    pub fn final_time(&self) -> Option<f32> {
        self.times.last().copied()
    }

    pub fn interpolant_value(&self) -> T {
        self.value
    }

    pub fn set_interpolant_value(&mut self, value: T) {
        self.value = value;
    }

    /// A non-repeating curve that has reached its last point
    pub fn is_finished(&self) -> bool {
        !self.has_points() || (!self.repeat && self.tracker == self.times.len() - 1)
    }

    /// Advance the curve by `dt` seconds.
    ///
    /// Returns true once a non-repeating curve has reached its final point,
    /// and always for a curve with fewer than two points.
    pub fn tick(&mut self, dt: f32) -> bool {
        if !self.has_points() {
            return true;
        }

        let last = self.times.len() - 1;
        if self.tracker == last {
            if self.repeat {
                self.reset_to_start();
            } else {
                return true;
            }
        }

        if self.x < self.times[0] {
            self.x += dt;
            return false;
        }

        let t_start = self.times[self.tracker];
        let t_end = self.times[self.tracker + 1];
        let v_start = self.values[self.tracker];
        let v_end = self.values[self.tracker + 1];

        // Zero-length segment: jump straight to its end value
        if (t_end - t_start).abs() < EPSILON {
            self.x = t_end;
            self.value = v_end;
            self.tracker += 1;
            return !self.repeat && self.tracker == last;
        }

        let s = (self.x - t_start) / (t_end - t_start);
        self.value = v_start + (v_end - v_start) * s;

        if self.x < t_end {
            self.x += dt;
            return false;
        }

        self.x = t_end;
        self.value = v_end;
        self.tracker += 1;

        !self.repeat && self.tracker == last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_single_segment_samples_and_finishes() {
        let mut anim = AnimationMultiLerp::from_points(vec![0.0, 1.0], vec![0.0_f32, 10.0]);

        assert!(!anim.tick(0.25));
        assert!(anim.interpolant_value().abs() < 0.001);
        assert!(!anim.tick(0.25));
        assert!((anim.interpolant_value() - 2.5).abs() < 0.001);

        let mut ticks = 0;
        while !anim.tick(0.25) {
            ticks += 1;
            assert!(ticks < 10, "curve never finished");
        }
        assert!((anim.interpolant_value() - 10.0).abs() < 0.001);
        // Stays finished
        assert!(anim.tick(0.25));
        assert!(anim.is_finished());
    }

    #[test]
    fn test_fewer_than_two_points_is_done() {
        let mut empty: AnimationMultiLerp<f32> = AnimationMultiLerp::new(3.0);
        assert!(empty.tick(0.1));
        assert_eq!(empty.interpolant_value(), 3.0);

        let mut single = AnimationMultiLerp::from_points(vec![0.0], vec![1.0_f32]);
        assert!(single.tick(0.1));
    }

    #[test]
    fn test_repeating_curve_never_finishes() {
        let mut anim = AnimationMultiLerp::from_points(vec![0.0, 0.1], vec![0.0_f32, 1.0]);
        anim.set_repeat(true);
        for _ in 0..100 {
            assert!(!anim.tick(0.03));
        }
    }

    #[test]
    fn test_zero_length_segment_jumps() {
        let mut anim =
            AnimationMultiLerp::from_points(vec![0.0, 0.0, 1.0], vec![0.0_f32, 5.0, 5.0]);
        assert!(!anim.tick(0.1));
        assert_eq!(anim.interpolant_value(), 5.0);
    }

    #[test]
    fn test_delayed_start_holds_first_value() {
        let mut anim = AnimationMultiLerp::from_points(vec![0.5, 1.0], vec![2.0_f32, 4.0]);
        assert!(!anim.tick(0.2));
        assert_eq!(anim.interpolant_value(), 2.0);
        assert!(!anim.tick(0.2));
        assert_eq!(anim.interpolant_value(), 2.0);
    }

    #[test]
    fn test_reset_to_start_rewinds() {
        let mut anim =
            AnimationMultiLerp::from_points(vec![0.0, 0.1], vec![Vec3::ZERO, Vec3::X]);
        while !anim.tick(0.05) {}
        assert!((anim.interpolant_value() - Vec3::X).length() < 0.001);

        anim.reset_to_start();
        assert!(!anim.is_finished());
        assert_eq!(anim.interpolant_value(), Vec3::ZERO);
    }

    #[test]
    fn test_set_lerp_single_starts_from_current_value() {
        let mut anim: AnimationMultiLerp<f32> = AnimationMultiLerp::new(4.0);
        anim.set_lerp_single(1.0, 0.0);
        assert_eq!(anim.final_time(), Some(1.0));
        anim.tick(0.5);
        assert_eq!(anim.interpolant_value(), 4.0);
        anim.tick(0.5);
        assert!((anim.interpolant_value() - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_clear_lerp_keeps_value() {
        let mut anim = AnimationMultiLerp::from_points(vec![0.0, 1.0], vec![1.0_f32, 2.0]);
        anim.clear_lerp();
        assert!(!anim.has_points());
        assert_eq!(anim.interpolant_value(), 1.0);
        assert!(anim.tick(0.1));
    }
}

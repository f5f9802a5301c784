//! Frame-rate independent smoothing.

/// Fraction of the remaining distance to cover this tick so that half of it
/// is covered every `1 / rate` seconds, whatever the tick length.
#[inline]
pub fn decay_step(rate: f32, dt: f32) -> f32 {
    1.0 - 0.5f32.powf(rate * dt)
}

/// Linear interpolation between two scalars, `t` clamped to [0, 1].
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Shortest signed difference between two angles in degrees, in (-180, 180].
pub fn delta_angle(current: f32, target: f32) -> f32 {
    let mut delta = (target - current).rem_euclid(360.0);
    if delta > 180.0 {
        delta -= 360.0;
    }
    delta
}

/// Critically damped spring toward `target`.
///
/// `velocity` is carried between calls by the caller. Never overshoots.
pub fn smooth_damp(current: f32, target: f32, velocity: &mut f32, smooth_time: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        return current;
    }

    let smooth_time = smooth_time.max(0.0001);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * exp;
    let mut output = target + (change + temp) * exp;

    // Clamp overshoot
    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = (output - target) / dt;
    }

    output
}

/// `smooth_damp` for angles in degrees, taking the short way around.
pub fn smooth_damp_angle(current: f32, target: f32, velocity: &mut f32, smooth_time: f32, dt: f32) -> f32 {
    let target = current + delta_angle(current, target);
    smooth_damp(current, target, velocity, smooth_time, dt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decay_step_is_frame_rate_independent() {
        // Two half-length ticks cover the same fraction as one full tick
        let full = decay_step(4.0, 0.1);
        let half = decay_step(4.0, 0.05);
        let two_halves = 1.0 - (1.0 - half) * (1.0 - half);

        assert!((full - two_halves).abs() < 1e-6);
        assert_eq!(decay_step(4.0, 0.0), 0.0);
        assert!((decay_step(1.0, 1.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_delta_angle_wraps() {
        assert_eq!(delta_angle(10.0, 20.0), 10.0);
        assert_eq!(delta_angle(350.0, 10.0), 20.0);
        assert_eq!(delta_angle(10.0, 350.0), -20.0);
    }

    #[test]
    fn test_smooth_damp_converges_without_overshoot() {
        let mut value = 0.0;
        let mut velocity = 0.0;

        for _ in 0..600 {
            value = smooth_damp(value, 15.0, &mut velocity, 0.1, 1.0 / 60.0);
            assert!(value <= 15.0);
        }

        assert!((value - 15.0).abs() < 1e-3);
    }

    #[test]
    fn test_smooth_damp_zero_dt_is_noop() {
        let mut velocity = 3.0;
        assert_eq!(smooth_damp(2.0, 10.0, &mut velocity, 0.1, 0.0), 2.0);
        assert_eq!(velocity, 3.0);
    }
}

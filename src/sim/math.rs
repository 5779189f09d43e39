//! Vector math and smoothing primitives shared by both actors
//!
//! All functions are pure. Angles are radians.

use std::f32::consts::{PI, TAU};

use glam::Vec2;

/// Squared length below which a direction is treated as zero
pub const DIRECTION_EPSILON_SQ: f32 = 0.0001;

/// Move a scalar toward `target` by at most `max_delta`, never overshooting.
#[inline]
pub fn move_towards_f32(current: f32, target: f32, max_delta: f32) -> f32 {
    let step = max_delta.max(0.0);
    let diff = target - current;
    if diff.abs() <= step {
        target
    } else {
        current + diff.signum() * step
    }
}

/// Move a point toward `target` by at most `max_delta` along the straight line.
///
/// Returns `target` exactly once it is within reach, so callers can rely on
/// landing on it instead of orbiting it.
#[inline]
pub fn move_towards(current: Vec2, target: Vec2, max_delta: f32) -> Vec2 {
    let step = max_delta.max(0.0);
    let to_target = target - current;
    let dist = to_target.length();
    if dist <= step {
        target
    } else {
        current + to_target / dist * step
    }
}

/// Linear interpolation with `t` clamped to [0, 1]
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Where `value` sits between `a` and `b`, clamped to [0, 1]. Returns 0 when `a == b`.
#[inline]
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    let span = b - a;
    if span.abs() <= f32::EPSILON {
        0.0
    } else {
        ((value - a) / span).clamp(0.0, 1.0)
    }
}

/// Interpolation weight for exponential smoothing at `rate` per second.
///
/// Applying `lerp(current, target, damp_factor(rate, dt))` every tick closes the
/// same fraction of the gap per second regardless of tick length.
#[inline]
pub fn damp_factor(rate: f32, dt: f32) -> f32 {
    if rate <= 0.0 || dt <= 0.0 {
        return 0.0;
    }
    1.0 - (-rate * dt).exp()
}

/// Wrap an angle into [-π, π)
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Interpolate between two angles along the shortest arc
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    let delta = wrap_angle(to - from);
    wrap_angle(from + delta * t.clamp(0.0, 1.0))
}

/// Critically damped approach of a scalar toward `target`.
///
/// `velocity` carries state between calls. The result never passes `target`.
pub fn smooth_damp_f32(
    current: f32,
    target: f32,
    velocity: &mut f32,
    smooth_time: f32,
    max_speed: f32,
    dt: f32,
) -> f32 {
    if dt <= 0.0 {
        return current;
    }
    let smooth_time = smooth_time.max(0.0001);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let max_change = max_speed * smooth_time;
    let change = (current - target).clamp(-max_change, max_change);
    let reachable = current - change;

    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * decay;
    let output = reachable + (change + temp) * decay;

    if (target - current > 0.0) == (output > target) {
        *velocity = 0.0;
        return target;
    }
    output
}

/// Make a raw input vector safe to integrate: non-finite components become 0
/// and each component is clamped to [-1, 1].
#[inline]
pub fn sanitize_input(raw: Vec2) -> Vec2 {
    let fix = |c: f32| if c.is_finite() { c.clamp(-1.0, 1.0) } else { 0.0 };
    Vec2::new(fix(raw.x), fix(raw.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_move_towards_reaches_target_exactly() {
        let p = move_towards(Vec2::new(0.0, 0.0), Vec2::new(0.03, 0.0), 0.04);
        assert_eq!(p, Vec2::new(0.03, 0.0));

        let p = move_towards(Vec2::ZERO, Vec2::new(3.0, 4.0), 1.0);
        assert!((p - Vec2::new(0.6, 0.8)).length() < 1e-6);
    }

    #[test]
    fn test_move_towards_negative_step_holds_position() {
        let p = move_towards(Vec2::ONE, Vec2::new(5.0, 1.0), -2.0);
        assert_eq!(p, Vec2::ONE);
        assert_eq!(move_towards_f32(1.0, 5.0, -2.0), 1.0);
    }

    #[test]
    fn test_inverse_lerp_clamps_and_handles_flat_range() {
        assert_eq!(inverse_lerp(3.0, 6.0, 4.5), 0.5);
        assert_eq!(inverse_lerp(3.0, 6.0, 9.0), 1.0);
        assert_eq!(inverse_lerp(3.0, 6.0, 0.0), 0.0);
        assert_eq!(inverse_lerp(2.0, 2.0, 2.0), 0.0);
    }

    #[test]
    fn test_damp_factor_is_frame_rate_independent() {
        let one_big = damp_factor(15.0, 0.04);
        let two_small = {
            let f = damp_factor(15.0, 0.02);
            1.0 - (1.0 - f) * (1.0 - f)
        };
        assert!((one_big - two_small).abs() < 1e-5);
        assert_eq!(damp_factor(0.0, 0.02), 0.0);
    }

    #[test]
    fn test_lerp_angle_takes_shortest_arc() {
        // From +170° to -170° should pass through 180°, not 0°
        let from = 170f32.to_radians();
        let to = (-170f32).to_radians();
        let mid = lerp_angle(from, to, 0.5);
        assert!((mid.abs() - PI).abs() < 1e-4, "mid = {}", mid.to_degrees());
    }

    #[test]
    fn test_smooth_damp_converges_without_overshoot() {
        let mut x = 0.0;
        let mut v = 0.0;
        for _ in 0..500 {
            x = smooth_damp_f32(x, -4.0, &mut v, 0.2, 100.0, 0.02);
            assert!(x >= -4.0 - 1e-4);
        }
        assert!((x + 4.0).abs() < 1e-3);

        let mut v = 0.0;
        assert_eq!(smooth_damp_f32(2.0, 8.0, &mut v, 0.2, 100.0, 0.0), 2.0);
        assert_eq!(v, 0.0);
    }

    #[test]
    fn test_sanitize_input_strips_nan() {
        let v = sanitize_input(Vec2::new(f32::NAN, 3.0));
        assert_eq!(v, Vec2::new(0.0, 1.0));
        let v = sanitize_input(Vec2::new(f32::NEG_INFINITY, -0.5));
        assert_eq!(v, Vec2::new(0.0, -0.5));
    }

    proptest! {
        #[test]
        fn prop_move_towards_never_overshoots(
            cx in -100.0f32..100.0, cy in -100.0f32..100.0,
            tx in -100.0f32..100.0, ty in -100.0f32..100.0,
            step in 0.0f32..50.0,
        ) {
            let current = Vec2::new(cx, cy);
            let target = Vec2::new(tx, ty);
            let next = move_towards(current, target, step);
            let before = current.distance(target);
            let after = next.distance(target);
            prop_assert!(after <= before + 1e-3);
            prop_assert!(current.distance(next) <= step + 1e-3);
        }

        #[test]
        fn prop_lerp_angle_stays_wrapped(a in -20.0f32..20.0, b in -20.0f32..20.0, t in 0.0f32..1.0) {
            let r = lerp_angle(a, b, t);
            prop_assert!((-PI..PI).contains(&r) || (r - PI).abs() < 1e-5);
        }

        #[test]
        fn prop_sanitized_input_is_finite_and_bounded(x in proptest::num::f32::ANY, y in proptest::num::f32::ANY) {
            let v = sanitize_input(Vec2::new(x, y));
            prop_assert!(v.is_finite());
            prop_assert!(v.x.abs() <= 1.0 && v.y.abs() <= 1.0);
        }
    }
}

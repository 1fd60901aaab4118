//! Increment snapping and magnitude clamping

use glam::Vec3;

/// Round `value` to the nearest multiple of `increment`.
///
/// Non-positive or non-finite increments leave the value untouched.
#[inline]
pub fn snap_to_increment(value: f32, increment: f32) -> f32 {
    if increment > 0.0 && increment.is_finite() {
        (value / increment).round() * increment
    } else {
        value
    }
}

/// Snap every component of `v`.
#[inline]
pub fn snap_vec3(v: Vec3, increment: f32) -> Vec3 {
    Vec3::new(
        snap_to_increment(v.x, increment),
        snap_to_increment(v.y, increment),
        snap_to_increment(v.z, increment),
    )
}

/// Keep `value` at least `min_abs` away from zero, preserving its sign.
///
/// Zero itself (and NaN) is pushed to `+min_abs`.
#[inline]
pub fn clamp_magnitude(value: f32, min_abs: f32) -> f32 {
    if value.is_nan() {
        return min_abs;
    }
    if value.abs() >= min_abs {
        value
    } else if value < 0.0 {
        -min_abs
    } else {
        min_abs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap() {
        assert_eq!(snap_to_increment(0.74, 0.5), 0.5);
        assert_eq!(snap_to_increment(0.76, 0.5), 1.0);
        assert_eq!(snap_to_increment(-1.3, 1.0), -1.0);
        assert_eq!(snap_to_increment(0.33, 0.0), 0.33);
    }

    #[test]
    fn test_clamp_magnitude_preserves_sign() {
        assert_eq!(clamp_magnitude(0.0, 0.001), 0.001);
        assert_eq!(clamp_magnitude(-0.0001, 0.001), -0.001);
        assert_eq!(clamp_magnitude(-2.0, 0.001), -2.0);
        assert_eq!(clamp_magnitude(f32::NAN, 0.001), 0.001);
    }
}

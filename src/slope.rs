//! Slope math used by skiing.
//!
//! All functions are total: degenerate inputs (zero vectors, an empty slope
//! range, non-finite values) produce a neutral result instead of NaN.

use bevy::prelude::*;

/// Horizontal directions shorter than this are treated as "no direction".
const DIRECTION_EPSILON: f32 = 1e-4;

/// Angle between a surface normal and world up, in radians (0 = flat).
///
/// Non-finite or zero normals are treated as flat ground.
pub fn slope_angle(normal: Vec3) -> f32 {
    let n = normal.normalize_or_zero();
    if n == Vec3::ZERO {
        return 0.0;
    }
    n.y.clamp(-1.0, 1.0).acos()
}

/// How strongly a slope drives skiing, in `[0, 1]`.
///
/// Zero at or below `min_slope`, one at or above `max_slope`, linear in
/// between. An empty or inverted range behaves as a step at `min_slope`.
pub fn slope_factor(angle: f32, min_slope: f32, max_slope: f32) -> f32 {
    if !angle.is_finite() || angle <= min_slope {
        return 0.0;
    }
    let range = max_slope - min_slope;
    if range <= f32::EPSILON {
        return 1.0;
    }
    ((angle - min_slope) / range).clamp(0.0, 1.0)
}

/// Project a vector onto the horizontal (XZ) plane.
#[inline]
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Normalized horizontal part of `v`, or `None` when it is (nearly) zero.
pub fn horizontal_direction(v: Vec3) -> Option<Vec3> {
    let flat = horizontal(v);
    if !flat.is_finite() || flat.length_squared() < DIRECTION_EPSILON * DIRECTION_EPSILON {
        None
    } else {
        Some(flat.normalize())
    }
}

/// Horizontal direction a body would slide on a surface with this normal.
///
/// `None` on flat ground.
pub fn downhill_direction(normal: Vec3) -> Option<Vec3> {
    horizontal_direction(normal)
}

/// Turn `current` toward `target` by a blend fraction in `[0, 1]`.
///
/// Both directions are horizontal unit vectors. When they are opposite the
/// blend would pass through zero, so the turn goes through the perpendicular
/// instead of collapsing.
pub fn blend_direction(current: Vec3, target: Vec3, fraction: f32) -> Vec3 {
    let t = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let Some(target) = horizontal_direction(target) else {
        return current;
    };
    let Some(current) = horizontal_direction(current) else {
        return target;
    };

    let blended = current.lerp(target, t);
    if let Some(dir) = horizontal_direction(blended) {
        return dir;
    }

    // Exactly opposite: turn toward the side first.
    let side = Vec3::new(-current.z, 0.0, current.x);
    horizontal_direction(current.lerp(side, t)).unwrap_or(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_4;

    // ==================== Slope Angle Tests ====================

    #[test]
    fn flat_ground_has_zero_angle() {
        assert!(slope_angle(Vec3::Y).abs() < 1e-6);
    }

    #[test]
    fn forty_five_degree_slope() {
        let normal = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert!((slope_angle(normal) - FRAC_PI_4).abs() < 1e-5);
    }

    #[test]
    fn unnormalized_normal_is_accepted() {
        let normal = Vec3::new(0.0, 5.0, 0.0);
        assert!(slope_angle(normal).abs() < 1e-6);
    }

    #[test]
    fn degenerate_normal_is_flat() {
        assert_eq!(slope_angle(Vec3::ZERO), 0.0);
        assert_eq!(slope_angle(Vec3::NAN), 0.0);
    }

    // ==================== Slope Factor Tests ====================

    #[test]
    fn factor_is_zero_below_min() {
        assert_eq!(slope_factor(0.1, 0.2, 0.8), 0.0);
        assert_eq!(slope_factor(0.2, 0.2, 0.8), 0.0);
    }

    #[test]
    fn factor_midpoint() {
        assert!((slope_factor(0.5, 0.2, 0.8) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn factor_saturates_above_max() {
        assert_eq!(slope_factor(0.8, 0.2, 0.8), 1.0);
        assert_eq!(slope_factor(1.2, 0.2, 0.8), 1.0);
        assert_eq!(slope_factor(std::f32::consts::PI, 0.2, 0.8), 1.0);
    }

    #[test]
    fn empty_range_is_step() {
        assert_eq!(slope_factor(0.3, 0.4, 0.4), 0.0);
        assert_eq!(slope_factor(0.5, 0.4, 0.4), 1.0);
        assert_eq!(slope_factor(0.5, 0.4, 0.1), 1.0);
    }

    #[test]
    fn nan_angle_is_zero_factor() {
        assert_eq!(slope_factor(f32::NAN, 0.2, 0.8), 0.0);
    }

    // ==================== Direction Tests ====================

    #[test]
    fn horizontal_direction_drops_vertical() {
        let dir = horizontal_direction(Vec3::new(3.0, 10.0, 4.0)).unwrap();
        assert!((dir - Vec3::new(0.6, 0.0, 0.8)).length() < 1e-5);
    }

    #[test]
    fn horizontal_direction_of_vertical_is_none() {
        assert!(horizontal_direction(Vec3::Y).is_none());
        assert!(horizontal_direction(Vec3::ZERO).is_none());
    }

    #[test]
    fn downhill_points_away_from_slope() {
        // Surface rising toward -X, so downhill is +X.
        let normal = Vec3::new(0.5, 0.866, 0.0);
        let downhill = downhill_direction(normal).unwrap();
        assert!((downhill - Vec3::X).length() < 1e-5);
        assert!(downhill_direction(Vec3::Y).is_none());
    }

    #[test]
    fn blend_is_gradual() {
        let dir = blend_direction(Vec3::Z, Vec3::X, 0.1);
        assert!((dir.length() - 1.0).abs() < 1e-5);
        assert!(dir.z > dir.x, "small blend should stay closer to the start");
        assert_eq!(dir.y, 0.0);
    }

    #[test]
    fn full_blend_reaches_target() {
        let dir = blend_direction(Vec3::Z, Vec3::X, 1.0);
        assert!((dir - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn blend_from_nothing_takes_target() {
        let dir = blend_direction(Vec3::ZERO, Vec3::new(0.0, 0.0, -2.0), 0.01);
        assert!((dir - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn blend_toward_nothing_keeps_current() {
        assert_eq!(blend_direction(Vec3::X, Vec3::ZERO, 0.5), Vec3::X);
    }

    #[test]
    fn opposite_blend_does_not_collapse() {
        let dir = blend_direction(Vec3::X, Vec3::NEG_X, 0.5);
        assert!((dir.length() - 1.0).abs() < 1e-5);
    }
}

//! Collision query results.
//!
//! These structures hold the results of the downward ground probe and of
//! contacts reported by the physics engine.

use bevy::prelude::*;

/// Minimum vertical component of a contact normal for the contact to count as
/// ground. `0.7` is roughly 45 degrees from vertical.
pub const GROUND_NORMAL_MIN_Y: f32 = 0.7;

/// Information about a raycast collision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionData {
    /// Distance from the ray origin to the hit point.
    pub distance: f32,
    /// Normal of the surface at hit point.
    pub normal: Vec3,
    /// World position of the hit point.
    pub point: Vec3,
    /// Entity that was hit (if any).
    pub entity: Option<Entity>,
}

impl Default for CollisionData {
    fn default() -> Self {
        Self {
            distance: 0.0,
            normal: Vec3::Y,
            point: Vec3::ZERO,
            entity: None,
        }
    }
}

impl CollisionData {
    /// Create a collision result.
    pub fn new(distance: f32, normal: Vec3, point: Vec3, entity: Option<Entity>) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
        }
    }

    /// Slope angle of the hit surface in radians (0 = flat).
    #[inline]
    pub fn slope_angle(&self) -> f32 {
        crate::slope::slope_angle(self.normal)
    }
}

/// Whether a contact normal is flat enough to count as standing on ground.
///
/// The normal is normalized before the test; zero and non-finite normals
/// never count.
#[inline]
pub fn is_ground_normal(normal: Vec3) -> bool {
    normal.normalize_or_zero().y > GROUND_NORMAL_MIN_Y
}

//! Terrain queries.
//!
//! Terrain generation lives elsewhere; the locomotion core only needs to know
//! how high the ground is and which way it faces at a given X/Z.

use bevy::prelude::*;

/// Ground height and orientation lookup.
pub trait TerrainQuery {
    /// Ground height at world `(x, z)`, or `None` outside the terrain.
    fn height_at(&self, x: f32, z: f32) -> Option<f32>;

    /// Unit surface normal at world `(x, z)`, or `None` outside the terrain.
    fn normal_at(&self, x: f32, z: f32) -> Option<Vec3>;
}

impl<T: TerrainQuery + ?Sized> TerrainQuery for &T {
    fn height_at(&self, x: f32, z: f32) -> Option<f32> {
        (**self).height_at(x, z)
    }

    fn normal_at(&self, x: f32, z: f32) -> Option<Vec3> {
        (**self).normal_at(x, z)
    }
}

/// Infinite horizontal ground.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlatTerrain {
    /// Ground height.
    pub height: f32,
}

impl FlatTerrain {
    /// Flat ground at `height`.
    pub fn new(height: f32) -> Self {
        Self { height }
    }
}

impl TerrainQuery for FlatTerrain {
    fn height_at(&self, _x: f32, _z: f32) -> Option<f32> {
        Some(self.height)
    }

    fn normal_at(&self, _x: f32, _z: f32) -> Option<Vec3> {
        Some(Vec3::Y)
    }
}

/// Infinite tilted plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InclinedPlane {
    /// Any point on the plane.
    pub origin: Vec3,
    /// Unit normal, with a positive vertical component.
    pub normal: Vec3,
}

impl InclinedPlane {
    /// Plane through `origin` with the given normal.
    ///
    /// Normals pointing down are flipped; degenerate normals become flat.
    pub fn new(origin: Vec3, normal: Vec3) -> Self {
        let mut normal = normal.normalize_or_zero();
        if normal.y < 0.0 {
            normal = -normal;
        }
        if normal.y <= f32::EPSILON {
            normal = Vec3::Y;
        }
        Self { origin, normal }
    }

    /// Plane through `origin` tilted `angle` radians from flat, descending
    /// toward `downhill`.
    pub fn from_angle(origin: Vec3, angle: f32, downhill: Vec3) -> Self {
        let downhill = Vec3::new(downhill.x, 0.0, downhill.z).normalize_or(Vec3::X);
        let (sin, cos) = angle.sin_cos();
        Self::new(origin, downhill * sin + Vec3::Y * cos)
    }

    /// Tilt of the plane in radians.
    pub fn angle(&self) -> f32 {
        crate::slope::slope_angle(self.normal)
    }
}

impl TerrainQuery for InclinedPlane {
    fn height_at(&self, x: f32, z: f32) -> Option<f32> {
        let n = self.normal;
        let dx = x - self.origin.x;
        let dz = z - self.origin.z;
        Some(self.origin.y - (n.x * dx + n.z * dz) / n.y)
    }

    fn normal_at(&self, _x: f32, _z: f32) -> Option<Vec3> {
        Some(self.normal)
    }
}

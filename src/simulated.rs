//! Headless point-mass body.
//!
//! [`SimulatedBody`] integrates forces, impulses and gravity over a
//! [`TerrainQuery`] without a physics engine. It exists for replays, tuning
//! tools and tests that need many independent characters.

use bevy::prelude::*;

use crate::body::{ensure_finite, BodyError, ContactCallback, PhysicsBody};
use crate::collision::CollisionData;
use crate::terrain::TerrainQuery;

/// Penetration tolerated by the ground probe before a resting body counts as
/// below the surface.
const PROBE_SKIN: f32 = 1e-3;

/// A point mass resting on (or flying above) a terrain.
///
/// The body's center is its contact point: it rests exactly on the terrain
/// height. Call [`step`](Self::step) once per tick after the movement core
/// has issued its commands.
pub struct SimulatedBody<T: TerrainQuery> {
    terrain: T,
    position: Vec3,
    rotation: Quat,
    linear_velocity: Vec3,
    angular_velocity: Vec3,
    mass: f32,
    gravity: Vec3,
    pending_force: Vec3,
    pending_impulse: Vec3,
    contact_callback: Option<ContactCallback>,
}

impl<T: TerrainQuery> SimulatedBody<T> {
    /// A 1 kg body at `position` under standard gravity.
    pub fn new(terrain: T, position: Vec3) -> Self {
        Self {
            terrain,
            position,
            rotation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass: 1.0,
            gravity: Vec3::new(0.0, -9.81, 0.0),
            pending_force: Vec3::ZERO,
            pending_impulse: Vec3::ZERO,
            contact_callback: None,
        }
    }

    /// Set the mass. Non-positive values are ignored.
    pub fn with_mass(mut self, mass: f32) -> Self {
        if mass > 0.0 && mass.is_finite() {
            self.mass = mass;
        }
        self
    }

    /// Set gravity acceleration.
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Start with a velocity.
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.linear_velocity = velocity;
        self
    }

    /// Current position (the contact point).
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Current orientation.
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Current angular velocity.
    pub fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    /// Mass in kilograms.
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Terrain the body rests on.
    pub fn terrain(&self) -> &T {
        &self.terrain
    }

    /// Force queued for the next step.
    pub fn pending_force(&self) -> Vec3 {
        self.pending_force
    }

    /// Impulse queued for the next step.
    pub fn pending_impulse(&self) -> Vec3 {
        self.pending_impulse
    }

    /// Advance the body by `dt` seconds (semi-implicit Euler).
    ///
    /// Queued forces and impulses are consumed. If the body ends up below the
    /// terrain it is placed on the surface, loses its velocity into the
    /// surface, and the contact callback receives the surface normal.
    pub fn step(&mut self, dt: f32) {
        if !(dt.is_finite() && dt > 0.0) {
            return;
        }

        let force = std::mem::take(&mut self.pending_force);
        let impulse = std::mem::take(&mut self.pending_impulse);

        self.linear_velocity += impulse / self.mass;
        self.linear_velocity += (self.gravity + force / self.mass) * dt;
        self.position += self.linear_velocity * dt;

        if self.angular_velocity != Vec3::ZERO {
            self.rotation = (Quat::from_scaled_axis(self.angular_velocity * dt) * self.rotation)
                .normalize();
        }

        self.resolve_terrain();
    }

    fn resolve_terrain(&mut self) {
        let Some(height) = self.terrain.height_at(self.position.x, self.position.z) else {
            return;
        };
        if self.position.y >= height {
            return;
        }

        let normal = self
            .terrain
            .normal_at(self.position.x, self.position.z)
            .unwrap_or(Vec3::Y);

        self.position.y = height;
        let into_surface = self.linear_velocity.dot(normal);
        if into_surface < 0.0 {
            self.linear_velocity -= normal * into_surface;
        }

        if let Some(callback) = self.contact_callback.as_mut() {
            callback(normal);
        }
    }
}

impl<T: TerrainQuery> PhysicsBody for SimulatedBody<T> {
    fn center(&self) -> Vec3 {
        self.position
    }

    fn linear_velocity(&self) -> Vec3 {
        self.linear_velocity
    }

    fn set_linear_velocity(&mut self, velocity: Vec3) -> Result<(), BodyError> {
        ensure_finite("linear velocity", velocity)?;
        self.linear_velocity = velocity;
        Ok(())
    }

    fn set_angular_velocity(&mut self, velocity: Vec3) -> Result<(), BodyError> {
        ensure_finite("angular velocity", velocity)?;
        self.angular_velocity = velocity;
        Ok(())
    }

    fn apply_force(&mut self, force: Vec3) -> Result<(), BodyError> {
        ensure_finite("force", force)?;
        self.pending_force += force;
        Ok(())
    }

    fn apply_impulse(&mut self, impulse: Vec3) -> Result<(), BodyError> {
        ensure_finite("impulse", impulse)?;
        self.pending_impulse += impulse;
        Ok(())
    }

    fn set_position(&mut self, position: Vec3) -> Result<(), BodyError> {
        ensure_finite("position", position)?;
        self.position = position;
        Ok(())
    }

    fn set_rotation(&mut self, rotation: Quat) -> Result<(), BodyError> {
        if !rotation.is_finite() {
            return Err(BodyError::NonFinite {
                what: "rotation",
                value: rotation.xyz(),
            });
        }
        self.rotation = rotation.normalize();
        Ok(())
    }

    fn probe_ground(&self, max_distance: f32) -> Option<CollisionData> {
        let height = self.terrain.height_at(self.position.x, self.position.z)?;
        let distance = self.position.y - height;
        if distance < -PROBE_SKIN || distance > max_distance {
            return None;
        }
        let normal = self
            .terrain
            .normal_at(self.position.x, self.position.z)
            .unwrap_or(Vec3::Y);
        Some(CollisionData::new(
            distance.max(0.0),
            normal,
            Vec3::new(self.position.x, height, self.position.z),
            None,
        ))
    }

    /// Replaces any previously registered callback.
    fn register_contact_callback(&mut self, callback: ContactCallback) {
        self.contact_callback = Some(callback);
    }
}

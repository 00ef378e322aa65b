//! Physics backend abstraction for the Bevy plugin.
//!
//! This module defines the trait that physics backends must implement to
//! drive [`Locomotion`](crate::controller::Locomotion) components. A backend
//! samples the real rigid body before the tick, fills
//! [`GroundSensor`](crate::detection::GroundSensor) from its own sensor
//! systems, and applies the recorded [`BodyCommands`] afterwards.

use bevy::prelude::*;

use crate::body::BodyCommands;

/// Position and velocity of a rigid body at the start of a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BodySample {
    /// World-space center of the body.
    pub center: Vec3,
    /// Linear velocity.
    pub linear_velocity: Vec3,
}

/// Trait for physics backend implementations.
///
/// Implement this trait to integrate a physics engine with
/// [`LocomotionPlugin`](crate::LocomotionPlugin). Sensor systems that need
/// engine-specific system parameters (ray casting, contact queries) are
/// added by [`plugin`](Self::plugin) in
/// [`LocomotionSet::Sensors`](crate::LocomotionSet::Sensors).
pub trait LocomotionBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Read the body's center and velocity. `None` keeps the previous sample.
    fn sample_body(world: &World, entity: Entity) -> Option<BodySample>;

    /// Execute the commands recorded during the tick.
    fn apply_commands(world: &mut World, entity: Entity, commands: BodyCommands);
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}

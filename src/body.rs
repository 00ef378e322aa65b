//! Physics body abstraction.
//!
//! The core never integrates motion itself. It asks a [`PhysicsBody`] for
//! velocity, position and a ground probe, and hands back forces and impulses.

use bevy::prelude::*;
use thiserror::Error;

use crate::collision::CollisionData;

/// Callback a body invokes with the surface normal of every contact it
/// resolves.
pub type ContactCallback = Box<dyn FnMut(Vec3) + Send + Sync>;

/// Failures raised by a physics body.
///
/// These are fatal for the tick and propagate out of
/// [`MovementCore::update`](crate::movement::MovementCore::update).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BodyError {
    /// A command carried NaN or infinite components.
    #[error("{what} is not finite: {value:?}")]
    NonFinite { what: &'static str, value: Vec3 },

    /// The underlying rigid body no longer exists.
    #[error("rigid body was removed from the simulation")]
    Removed,

    /// Engine-specific failure.
    #[error("physics backend error: {0}")]
    Backend(String),
}

/// Reject non-finite vectors before they reach a physics engine.
pub fn ensure_finite(what: &'static str, value: Vec3) -> Result<(), BodyError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(BodyError::NonFinite { what, value })
    }
}

/// Handle to the character's dynamic rigid body.
///
/// Implemented by physics integrations ([`BufferedBody`] for ECS backends,
/// [`SimulatedBody`](crate::simulated::SimulatedBody) for headless runs).
pub trait PhysicsBody {
    /// Center of the body in world space.
    fn center(&self) -> Vec3;

    /// Current linear velocity.
    fn linear_velocity(&self) -> Vec3;

    /// Overwrite the linear velocity.
    fn set_linear_velocity(&mut self, velocity: Vec3) -> Result<(), BodyError>;

    /// Overwrite the angular velocity.
    fn set_angular_velocity(&mut self, velocity: Vec3) -> Result<(), BodyError>;

    /// Apply a force over the next physics step.
    fn apply_force(&mut self, force: Vec3) -> Result<(), BodyError>;

    /// Apply an instantaneous change in momentum.
    fn apply_impulse(&mut self, impulse: Vec3) -> Result<(), BodyError>;

    /// Teleport the body.
    fn set_position(&mut self, position: Vec3) -> Result<(), BodyError>;

    /// Overwrite the body's orientation.
    fn set_rotation(&mut self, rotation: Quat) -> Result<(), BodyError>;

    /// Cast a ray straight down from [`center`](Self::center).
    ///
    /// Returns `None` when nothing is hit within `max_distance`.
    fn probe_ground(&self, max_distance: f32) -> Option<CollisionData>;

    /// Register a callback for contacts the engine resolves.
    fn register_contact_callback(&mut self, callback: ContactCallback);
}

/// Commands recorded by a [`BufferedBody`] during a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BodyCommands {
    /// Sum of forces applied this tick.
    pub force: Vec3,
    /// Sum of impulses applied this tick.
    pub impulse: Vec3,
    /// Linear velocity override, if any.
    pub linear_velocity: Option<Vec3>,
    /// Angular velocity override, if any.
    pub angular_velocity: Option<Vec3>,
    /// Teleport target, if any.
    pub position: Option<Vec3>,
    /// Orientation override, if any.
    pub rotation: Option<Quat>,
}

impl BodyCommands {
    /// Nothing to apply.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A [`PhysicsBody`] that records commands instead of executing them.
///
/// ECS backends feed it a sample of the real body and the sensor results
/// before the tick ([`sync`](Self::sync), [`set_ground`](Self::set_ground),
/// [`report_contact`](Self::report_contact)) and flush
/// [`take_commands`](Self::take_commands) into the engine afterwards.
#[derive(Default)]
pub struct BufferedBody {
    center: Vec3,
    linear_velocity: Vec3,
    ground: Option<CollisionData>,
    commands: BodyCommands,
    contact_callback: Option<ContactCallback>,
}

impl std::fmt::Debug for BufferedBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferedBody")
            .field("center", &self.center)
            .field("linear_velocity", &self.linear_velocity)
            .field("ground", &self.ground)
            .field("commands", &self.commands)
            .field("has_contact_callback", &self.contact_callback.is_some())
            .finish()
    }
}

impl BufferedBody {
    /// Create an empty body at the origin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the engine's current position and velocity in.
    pub fn sync(&mut self, center: Vec3, linear_velocity: Vec3) {
        self.center = center;
        self.linear_velocity = linear_velocity;
    }

    /// Store this tick's downward probe result.
    pub fn set_ground(&mut self, hit: Option<CollisionData>) {
        self.ground = hit;
    }

    /// Forward a contact normal to the registered callback.
    pub fn report_contact(&mut self, normal: Vec3) {
        if let Some(callback) = self.contact_callback.as_mut() {
            callback(normal);
        }
    }

    /// Commands recorded so far.
    pub fn commands(&self) -> &BodyCommands {
        &self.commands
    }

    /// Drain recorded commands for the backend to apply.
    pub fn take_commands(&mut self) -> BodyCommands {
        std::mem::take(&mut self.commands)
    }
}

impl PhysicsBody for BufferedBody {
    fn center(&self) -> Vec3 {
        self.commands.position.unwrap_or(self.center)
    }

    fn linear_velocity(&self) -> Vec3 {
        self.linear_velocity
    }

    fn set_linear_velocity(&mut self, velocity: Vec3) -> Result<(), BodyError> {
        ensure_finite("linear velocity", velocity)?;
        self.linear_velocity = velocity;
        self.commands.linear_velocity = Some(velocity);
        Ok(())
    }

    fn set_angular_velocity(&mut self, velocity: Vec3) -> Result<(), BodyError> {
        ensure_finite("angular velocity", velocity)?;
        self.commands.angular_velocity = Some(velocity);
        Ok(())
    }

    fn apply_force(&mut self, force: Vec3) -> Result<(), BodyError> {
        ensure_finite("force", force)?;
        self.commands.force += force;
        Ok(())
    }

    fn apply_impulse(&mut self, impulse: Vec3) -> Result<(), BodyError> {
        ensure_finite("impulse", impulse)?;
        self.commands.impulse += impulse;
        Ok(())
    }

    fn set_position(&mut self, position: Vec3) -> Result<(), BodyError> {
        ensure_finite("position", position)?;
        self.commands.position = Some(position);
        Ok(())
    }

    fn set_rotation(&mut self, rotation: Quat) -> Result<(), BodyError> {
        if !rotation.is_finite() {
            return Err(BodyError::NonFinite {
                what: "rotation",
                value: rotation.xyz(),
            });
        }
        self.commands.rotation = Some(rotation.normalize());
        Ok(())
    }

    fn probe_ground(&self, max_distance: f32) -> Option<CollisionData> {
        self.ground.filter(|hit| hit.distance <= max_distance)
    }

    fn register_contact_callback(&mut self, callback: ContactCallback) {
        self.contact_callback = Some(callback);
    }
}

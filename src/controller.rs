//! ECS component wrapping a [`MovementCore`].

use bevy::prelude::*;

use crate::body::BufferedBody;
use crate::config::MovementConfig;
use crate::detection::GroundSensor;
use crate::events::MovementEvent;
use crate::intent::MovementInput;
use crate::movement::{MovementCore, MovementError};
use crate::state::MovementState;

/// Locomotion for one character entity.
///
/// Holds a [`MovementCore`] over a [`BufferedBody`]. The plugin feeds the
/// body from the physics backend, steps the core with the entity's
/// [`MovementInput`], and flushes the recorded commands back.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use jetpack_locomotion::prelude::*;
///
/// fn spawn_player(mut commands: Commands) {
///     let locomotion = Locomotion::new(MovementConfig::player())
///         .expect("player config is valid");
///     commands.spawn((Transform::from_xyz(0.0, 2.0, 0.0), locomotion));
/// }
/// ```
#[derive(Component, Debug)]
#[require(MovementInput, GroundSensor)]
pub struct Locomotion {
    core: MovementCore<BufferedBody, Vec<MovementEvent>>,
}

impl Locomotion {
    /// Create an initialized core with a fresh buffered body.
    pub fn new(config: MovementConfig) -> Result<Self, MovementError> {
        let mut core = MovementCore::default();
        core.initialize(config)?;
        core.attach_body(BufferedBody::new());
        Ok(Self { core })
    }

    /// Copy of the current movement state.
    pub fn state(&self) -> MovementState {
        self.core.state()
    }

    /// Active configuration.
    pub fn config(&self) -> Option<&MovementConfig> {
        self.core.config()
    }

    /// Buffered body the backend syncs against.
    pub fn body_mut(&mut self) -> Option<&mut BufferedBody> {
        self.core.body_mut()
    }

    /// Underlying core.
    pub fn core(&self) -> &MovementCore<BufferedBody, Vec<MovementEvent>> {
        &self.core
    }

    /// Underlying core.
    pub fn core_mut(&mut self) -> &mut MovementCore<BufferedBody, Vec<MovementEvent>> {
        &mut self.core
    }

    /// Advance one tick.
    pub fn update(&mut self, input: &MovementInput, dt: f32) -> Result<(), MovementError> {
        self.core.update(input, dt)
    }

    /// Restore default state and stop the body (respawn).
    pub fn reset(&mut self) -> Result<(), MovementError> {
        self.core.reset()
    }

    /// Teleport on the next flush.
    pub fn set_position(&mut self, position: Vec3) -> Result<(), MovementError> {
        self.core.set_position(position)
    }

    /// Rotate on the next flush.
    pub fn set_rotation(&mut self, rotation: Quat) -> Result<(), MovementError> {
        self.core.set_rotation(rotation)
    }

    /// Take the transitions produced since the last drain.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, MovementEvent> {
        self.core.events_mut().drain(..)
    }
}

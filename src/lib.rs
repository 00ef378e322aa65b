//! # `jetpack_locomotion`
//!
//! Physics-driven 3D character locomotion with running, jumping, skiing and
//! a fuel-limited jetpack.
//!
//! This crate provides a per-character movement core that:
//! - Reads a ground probe and latched contacts to decide grounding
//! - Applies movement forces with reduced control while airborne
//! - Jumps on the rising edge of the jump input
//! - Skis down slopes with thrust scaled by slope steepness
//! - Burns and regenerates jetpack fuel with hysteresis on activation
//! - Reports state transitions through an event sink
//!
//! ## Architecture
//!
//! [`MovementCore`](movement::MovementCore) is engine-agnostic: it drives any
//! [`PhysicsBody`](body::PhysicsBody) once per fixed tick. The Bevy layer
//! wraps it in the [`Locomotion`](controller::Locomotion) component over a
//! [`BufferedBody`](body::BufferedBody), which a
//! [`LocomotionBackend`](backend::LocomotionBackend) syncs from and flushes
//! to the real physics engine (Rapier3D included behind `rapier3d`).
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use jetpack_locomotion::prelude::*;
//!
//! let mut core: MovementCore<_, Vec<MovementEvent>> = MovementCore::default();
//! core.initialize(MovementConfig::player()).unwrap();
//! core.attach_body(SimulatedBody::new(FlatTerrain::new(0.0), Vec3::ZERO));
//!
//! core.update(&MovementInput::new().with_jump(true), 1.0 / 60.0).unwrap();
//! assert!(core.state().is_jumping);
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod body;
pub mod collision;
pub mod config;
pub mod controller;
pub mod detection;
pub mod events;
pub mod intent;
pub mod jetpack;
pub mod movement;
pub mod simulated;
pub mod slope;
pub mod state;
pub mod systems;
pub mod terrain;

#[cfg(feature = "rapier3d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::{BodySample, LocomotionBackend, NoOpBackendPlugin};
    pub use crate::body::{BodyCommands, BodyError, BufferedBody, PhysicsBody};
    pub use crate::collision::CollisionData;
    pub use crate::config::{ConfigError, MovementConfig};
    pub use crate::controller::Locomotion;
    pub use crate::detection::GroundSensor;
    pub use crate::events::{LocomotionEvent, MovementEvent, MovementEvents};
    pub use crate::intent::MovementInput;
    pub use crate::movement::{MovementCore, MovementError};
    pub use crate::simulated::SimulatedBody;
    pub use crate::state::MovementState;
    pub use crate::terrain::{FlatTerrain, InclinedPlane, TerrainQuery};
    pub use crate::{LocomotionPlugin, LocomotionSet};

    #[cfg(feature = "rapier3d")]
    pub use crate::rapier::Rapier3dBackend;
}

/// Ordering of the locomotion phases inside `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocomotionSet {
    /// Undo last tick's backend bookkeeping.
    Preparation,
    /// Backend sensor systems fill [`GroundSensor`](detection::GroundSensor).
    Sensors,
    /// Cores are fed and stepped.
    Simulation,
    /// Recorded body commands are handed to the backend.
    FinalApplication,
}

/// Main plugin for locomotion.
///
/// Generic over a physics backend `B` which samples bodies, provides sensor
/// systems and applies the recorded commands.
///
/// # Examples
///
/// With Rapier3D backend:
/// ```rust,ignore
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use jetpack_locomotion::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(LocomotionPlugin::<Rapier3dBackend>::default())
///     .run();
/// ```
pub struct LocomotionPlugin<B: backend::LocomotionBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::LocomotionBackend> Default for LocomotionPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::LocomotionBackend> Plugin for LocomotionPlugin<B> {
    fn build(&self, app: &mut App) {
        app.add_event::<events::LocomotionEvent>();

        app.configure_sets(
            FixedUpdate,
            (
                LocomotionSet::Preparation,
                LocomotionSet::Sensors,
                LocomotionSet::Simulation,
                LocomotionSet::FinalApplication,
            )
                .chain(),
        );

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.add_systems(
            FixedUpdate,
            (
                systems::feed_body_sensors::<B>,
                systems::step_locomotion,
            )
                .chain()
                .in_set(LocomotionSet::Simulation),
        );
        app.add_systems(
            FixedUpdate,
            systems::flush_body_commands::<B>.in_set(LocomotionSet::FinalApplication),
        );
    }
}

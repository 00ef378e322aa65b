//! Transition notifications.
//!
//! The core reports every state-machine edge to an injected
//! [`MovementEvents`] sink, synchronously at the point of transition. Sink
//! methods return nothing, so a misbehaving subscriber cannot fail a tick.

use bevy::prelude::*;

/// Receiver for locomotion transitions.
///
/// Every method has an empty default, so a sink only implements what it
/// listens to.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use jetpack_locomotion::prelude::*;
///
/// #[derive(Default)]
/// struct LandingCounter(u32);
///
/// impl MovementEvents for LandingCounter {
///     fn ground_contact(&mut self, _normal: Vec3) {
///         self.0 += 1;
///     }
/// }
/// ```
pub trait MovementEvents {
    /// The character landed; `normal` is the surface it landed on.
    fn ground_contact(&mut self, _normal: Vec3) {}
    /// A jump impulse was applied.
    fn jump_start(&mut self) {}
    /// A jump ended by landing.
    fn jump_end(&mut self) {}
    /// Skiing engaged.
    fn ski_start(&mut self) {}
    /// Skiing disengaged.
    fn ski_end(&mut self) {}
    /// Jetpack started firing.
    fn jetpack_start(&mut self) {}
    /// Jetpack stopped firing.
    fn jetpack_end(&mut self) {}
}

/// Discards every notification.
impl MovementEvents for () {}

impl<E: MovementEvents + ?Sized> MovementEvents for &mut E {
    fn ground_contact(&mut self, normal: Vec3) {
        (**self).ground_contact(normal);
    }
    fn jump_start(&mut self) {
        (**self).jump_start();
    }
    fn jump_end(&mut self) {
        (**self).jump_end();
    }
    fn ski_start(&mut self) {
        (**self).ski_start();
    }
    fn ski_end(&mut self) {
        (**self).ski_end();
    }
    fn jetpack_start(&mut self) {
        (**self).jetpack_start();
    }
    fn jetpack_end(&mut self) {
        (**self).jetpack_end();
    }
}

/// A transition as a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementEvent {
    GroundContact { normal: Vec3 },
    JumpStart,
    JumpEnd,
    SkiStart,
    SkiEnd,
    JetpackStart,
    JetpackEnd,
}

impl MovementEvent {
    /// Deliver this event to a sink.
    pub fn dispatch(self, sink: &mut impl MovementEvents) {
        match self {
            MovementEvent::GroundContact { normal } => sink.ground_contact(normal),
            MovementEvent::JumpStart => sink.jump_start(),
            MovementEvent::JumpEnd => sink.jump_end(),
            MovementEvent::SkiStart => sink.ski_start(),
            MovementEvent::SkiEnd => sink.ski_end(),
            MovementEvent::JetpackStart => sink.jetpack_start(),
            MovementEvent::JetpackEnd => sink.jetpack_end(),
        }
    }
}

/// Records transitions in order, for buffering or tests.
impl MovementEvents for Vec<MovementEvent> {
    fn ground_contact(&mut self, normal: Vec3) {
        self.push(MovementEvent::GroundContact { normal });
    }
    fn jump_start(&mut self) {
        self.push(MovementEvent::JumpStart);
    }
    fn jump_end(&mut self) {
        self.push(MovementEvent::JumpEnd);
    }
    fn ski_start(&mut self) {
        self.push(MovementEvent::SkiStart);
    }
    fn ski_end(&mut self) {
        self.push(MovementEvent::SkiEnd);
    }
    fn jetpack_start(&mut self) {
        self.push(MovementEvent::JetpackStart);
    }
    fn jetpack_end(&mut self) {
        self.push(MovementEvent::JetpackEnd);
    }
}

/// Bevy event carrying a transition of one character.
///
/// Sent by [`LocomotionPlugin`](crate::LocomotionPlugin) after each
/// simulation step, in the order the core produced them.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct LocomotionEvent {
    /// Character entity.
    pub entity: Entity,
    /// What happened.
    pub event: MovementEvent,
}

//! Per-tick movement input.
//!
//! The input layer resolves raw devices (keyboard, gamepad, AI) into a
//! [`MovementInput`] before the tick. The core performs no key decoding.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Decoded movement input for a single tick.
///
/// `move_direction` lives in the horizontal plane; any vertical component is
/// ignored. The vector need not be normalized: its length scales the
/// walk/run force.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use jetpack_locomotion::prelude::*;
///
/// let input = MovementInput::moving(Vec3::Z).with_run(true).with_jetpack(true);
/// assert!(input.is_moving());
/// assert!(input.run && input.jetpack);
/// ```
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementInput {
    /// Desired horizontal movement direction.
    pub move_direction: Vec3,
    /// Run instead of walk.
    pub run: bool,
    /// Jump button held.
    pub jump: bool,
    /// Ski button held.
    pub ski: bool,
    /// Jetpack button held.
    pub jetpack: bool,
}

impl MovementInput {
    /// No movement, no buttons.
    pub fn new() -> Self {
        Self::default()
    }

    /// Input moving in a direction with no buttons held.
    pub fn moving(direction: Vec3) -> Self {
        Self {
            move_direction: direction,
            ..default()
        }
    }

    /// Set the run button.
    pub fn with_run(mut self, held: bool) -> Self {
        self.run = held;
        self
    }

    /// Set the jump button.
    pub fn with_jump(mut self, held: bool) -> Self {
        self.jump = held;
        self
    }

    /// Set the ski button.
    pub fn with_ski(mut self, held: bool) -> Self {
        self.ski = held;
        self
    }

    /// Set the jetpack button.
    pub fn with_jetpack(mut self, held: bool) -> Self {
        self.jetpack = held;
        self
    }

    /// Horizontal part of the move direction, length preserved.
    ///
    /// Non-finite directions yield zero.
    pub fn horizontal_move(&self) -> Vec3 {
        let flat = Vec3::new(self.move_direction.x, 0.0, self.move_direction.z);
        if flat.is_finite() {
            flat
        } else {
            Vec3::ZERO
        }
    }

    /// Whether there is any meaningful horizontal movement input.
    pub fn is_moving(&self) -> bool {
        self.horizontal_move().length_squared() > 1e-6
    }

    /// Release every button and clear the direction.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

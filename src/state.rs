//! Movement state snapshot.
//!
//! The core owns the live [`MovementState`]; callers only ever see copies.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-tick locomotion state.
///
/// Jump, ski and jetpack are independent sub-machines: skiing and jetpacking
/// may be active together, and neither implies `is_jumping`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementState {
    // === Ground / Jump ===
    /// The ground probe or a ground contact touched this tick.
    pub is_grounded: bool,
    /// Between a jump impulse and the next landing.
    pub is_jumping: bool,
    /// Running gait selected with movement input.
    pub is_running: bool,
    /// Last linear velocity read from the physics body.
    pub velocity: Vec3,

    // === Skiing ===
    /// Ski mode engaged.
    pub is_skiing: bool,
    /// Vertical velocity while skiing (descent rate, negative going downhill).
    pub ski_speed: f32,
    /// Horizontal unit direction the ski force pushes along.
    pub ski_direction: Vec3,
    /// Angle of the ground under the character, radians (0 = flat).
    pub slope_angle: f32,

    // === Jetpack ===
    /// Jetpack firing.
    pub is_jetpack_active: bool,
    /// Remaining fuel, within `[0, jetpack_fuel_capacity]`.
    pub jetpack_fuel: f32,
    /// Force the jetpack applied this tick.
    pub jetpack_force: Vec3,
}

impl Default for MovementState {
    fn default() -> Self {
        Self {
            is_grounded: false,
            is_jumping: false,
            is_running: false,
            velocity: Vec3::ZERO,
            is_skiing: false,
            ski_speed: 0.0,
            ski_direction: Vec3::ZERO,
            slope_angle: 0.0,
            is_jetpack_active: false,
            jetpack_fuel: 0.0,
            jetpack_force: Vec3::ZERO,
        }
    }
}

impl MovementState {
    /// Default state with a given fuel level.
    pub fn with_fuel(fuel: f32) -> Self {
        Self {
            jetpack_fuel: fuel,
            ..default()
        }
    }

    /// Not touching ground.
    #[inline]
    pub fn is_airborne(&self) -> bool {
        !self.is_grounded
    }

    /// Speed in the horizontal plane.
    pub fn horizontal_speed(&self) -> f32 {
        Vec3::new(self.velocity.x, 0.0, self.velocity.z).length()
    }

    /// Fuel as a fraction of `capacity`, for gauges.
    pub fn fuel_fraction(&self, capacity: f32) -> f32 {
        if capacity > 0.0 {
            (self.jetpack_fuel / capacity).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_zeroed() {
        let state = MovementState::default();
        assert!(!state.is_grounded && !state.is_jumping && !state.is_running);
        assert!(!state.is_skiing && !state.is_jetpack_active);
        assert_eq!(state.jetpack_fuel, 0.0);
        assert_eq!(state.velocity, Vec3::ZERO);
        assert_eq!(state.jetpack_force, Vec3::ZERO);
    }

    #[test]
    fn airborne_is_not_grounded() {
        let mut state = MovementState::default();
        assert!(state.is_airborne());
        state.is_grounded = true;
        assert!(!state.is_airborne());
    }

    #[test]
    fn horizontal_speed_ignores_vertical() {
        let state = MovementState {
            velocity: Vec3::new(3.0, -20.0, 4.0),
            ..default()
        };
        assert!((state.horizontal_speed() - 5.0).abs() < 1e-5);
    }

    #[test]
    fn fuel_fraction() {
        let state = MovementState::with_fuel(25.0);
        assert!((state.fuel_fraction(100.0) - 0.25).abs() < 1e-6);
        assert_eq!(state.fuel_fraction(0.0), 0.0);
    }
}

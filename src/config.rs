//! Movement configuration.
//!
//! A [`MovementConfig`] is handed to a [`MovementCore`](crate::movement::MovementCore)
//! once and stays fixed for the rest of the session. All speeds, forces and
//! rates are in world units and seconds.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a [`MovementConfig`] is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A tuning value is NaN or infinite.
    #[error("`{field}` must be finite, got {value}")]
    NotFinite { field: &'static str, value: f32 },

    /// A speed, force, rate or capacity is negative.
    #[error("`{field}` must be non-negative, got {value}")]
    Negative { field: &'static str, value: f32 },

    /// `air_control` is a fraction.
    #[error("`air_control` must be within [0, 1], got {0}")]
    AirControlOutOfRange(f32),

    /// The ski slope range is empty or inverted.
    #[error("`ski_min_slope` ({min}) must be less than `ski_max_slope` ({max})")]
    SkiSlopeRange { min: f32, max: f32 },

    /// The jetpack could never be switched on.
    #[error("`jetpack_min_fuel_to_activate` ({min}) exceeds `jetpack_fuel_capacity` ({capacity})")]
    ActivationAboveCapacity { min: f32, capacity: f32 },

    /// The RON document could not be parsed.
    #[error("invalid movement config: {0}")]
    Parse(String),
}

/// Tuning parameters for run, jump, ski and jetpack locomotion.
///
/// Missing fields in a serialized config fall back to [`Default`], so a RON
/// file only needs to list the values it changes.
///
/// # Example
///
/// ```rust
/// use jetpack_locomotion::prelude::*;
///
/// let config = MovementConfig::player()
///     .with_speeds(5.0, 9.0)
///     .with_jetpack_fuel(120.0, 20.0, 30.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    // === Locomotion ===
    /// Horizontal force target while walking (units/second).
    pub walk_speed: f32,

    /// Horizontal force target while running (units/second).
    pub run_speed: f32,

    /// Vertical impulse applied when jumping.
    pub jump_force: f32,

    /// Fraction of the horizontal force applied while airborne (0.0-1.0).
    pub air_control: f32,

    // === Skiing ===
    /// Slope angle (radians) at which skiing starts producing force.
    pub ski_min_slope: f32,

    /// Slope angle (radians) at which the ski force saturates.
    pub ski_max_slope: f32,

    /// Ski force at full slope factor.
    pub ski_acceleration: f32,

    /// Fraction per second by which the ski direction turns toward the input.
    pub ski_turn_rate: f32,

    // === Jetpack ===
    /// Upper bound on the upward jetpack force.
    pub jetpack_max_force: f32,

    /// Jetpack force per second of tick time, capped by `jetpack_max_force`.
    pub jetpack_acceleration: f32,

    /// Fuel tank size.
    pub jetpack_fuel_capacity: f32,

    /// Fuel regained per second while the jetpack is off.
    pub jetpack_fuel_regen_rate: f32,

    /// Fuel burned per second while the jetpack is on.
    pub jetpack_fuel_consumption: f32,

    /// Fuel required (strictly more than) to switch the jetpack on.
    pub jetpack_min_fuel_to_activate: f32,

    // === Sensors and policy ===
    /// Length of the downward ground probe from the body center.
    pub ground_probe_distance: f32,

    /// Whether skiing may stay engaged while the jetpack fires.
    ///
    /// When `false`, an active jetpack ends skiing and blocks it from starting.
    pub allow_ski_while_jetpacking: bool,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            // Locomotion
            walk_speed: 4.5,
            run_speed: 7.0,
            jump_force: 6.0,
            air_control: 0.3,

            // Skiing
            ski_min_slope: 0.2,
            ski_max_slope: 0.8,
            ski_acceleration: 18.0,
            ski_turn_rate: 2.5,

            // Jetpack (force reaches the cap at 60 Hz)
            jetpack_max_force: 30.0,
            jetpack_acceleration: 1800.0,
            jetpack_fuel_capacity: 100.0,
            jetpack_fuel_regen_rate: 12.0,
            jetpack_fuel_consumption: 25.0,
            jetpack_min_fuel_to_activate: 10.0,

            // Sensors and policy
            ground_probe_distance: 0.1,
            allow_ski_while_jetpacking: true,
        }
    }
}

impl MovementConfig {
    /// Create a config tuned for a responsive player character.
    pub fn player() -> Self {
        Self::default()
    }

    /// Fast, floaty tuning with generous fuel.
    pub fn arcade() -> Self {
        Self {
            walk_speed: 6.0,
            run_speed: 10.0,
            jump_force: 7.5,
            air_control: 0.6,
            ski_acceleration: 26.0,
            ski_turn_rate: 4.0,
            jetpack_max_force: 40.0,
            jetpack_acceleration: 2400.0,
            jetpack_fuel_capacity: 150.0,
            jetpack_fuel_regen_rate: 25.0,
            ..Self::default()
        }
    }

    /// Slow, heavy tuning: little air control and a small tank.
    pub fn heavy() -> Self {
        Self {
            walk_speed: 3.5,
            run_speed: 5.5,
            jump_force: 4.5,
            air_control: 0.1,
            ski_acceleration: 12.0,
            ski_turn_rate: 1.0,
            jetpack_max_force: 22.0,
            jetpack_fuel_capacity: 60.0,
            jetpack_fuel_regen_rate: 6.0,
            jetpack_fuel_consumption: 30.0,
            jetpack_min_fuel_to_activate: 15.0,
            ..Self::default()
        }
    }

    /// Horizontal force target for the current gait.
    #[inline]
    pub fn speed(&self, running: bool) -> f32 {
        if running {
            self.run_speed
        } else {
            self.walk_speed
        }
    }

    /// Set walking and running speeds.
    pub fn with_speeds(mut self, walk: f32, run: f32) -> Self {
        self.walk_speed = walk;
        self.run_speed = run;
        self
    }

    /// Set the jump impulse.
    pub fn with_jump_force(mut self, force: f32) -> Self {
        self.jump_force = force;
        self
    }

    /// Set the airborne force fraction.
    pub fn with_air_control(mut self, air_control: f32) -> Self {
        self.air_control = air_control;
        self
    }

    /// Set the slope range (radians) over which skiing ramps up.
    pub fn with_ski_slopes(mut self, min: f32, max: f32) -> Self {
        self.ski_min_slope = min;
        self.ski_max_slope = max;
        self
    }

    /// Set ski force and turn rate.
    pub fn with_ski(mut self, acceleration: f32, turn_rate: f32) -> Self {
        self.ski_acceleration = acceleration;
        self.ski_turn_rate = turn_rate;
        self
    }

    /// Set jetpack force cap and ramp.
    pub fn with_jetpack_force(mut self, max_force: f32, acceleration: f32) -> Self {
        self.jetpack_max_force = max_force;
        self.jetpack_acceleration = acceleration;
        self
    }

    /// Set tank size, regeneration and consumption rates.
    pub fn with_jetpack_fuel(mut self, capacity: f32, regen_rate: f32, consumption: f32) -> Self {
        self.jetpack_fuel_capacity = capacity;
        self.jetpack_fuel_regen_rate = regen_rate;
        self.jetpack_fuel_consumption = consumption;
        self
    }

    /// Set the fuel level that must be exceeded to switch the jetpack on.
    pub fn with_jetpack_min_fuel(mut self, min_fuel: f32) -> Self {
        self.jetpack_min_fuel_to_activate = min_fuel;
        self
    }

    /// Set the ground probe length.
    pub fn with_ground_probe_distance(mut self, distance: f32) -> Self {
        self.ground_probe_distance = distance;
        self
    }

    /// Allow or forbid skiing while the jetpack fires.
    pub fn with_ski_while_jetpacking(mut self, allow: bool) -> Self {
        self.allow_ski_while_jetpacking = allow;
        self
    }

    /// Check the invariants every core relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scalars = [
            ("walk_speed", self.walk_speed),
            ("run_speed", self.run_speed),
            ("jump_force", self.jump_force),
            ("air_control", self.air_control),
            ("ski_min_slope", self.ski_min_slope),
            ("ski_max_slope", self.ski_max_slope),
            ("ski_acceleration", self.ski_acceleration),
            ("ski_turn_rate", self.ski_turn_rate),
            ("jetpack_max_force", self.jetpack_max_force),
            ("jetpack_acceleration", self.jetpack_acceleration),
            ("jetpack_fuel_capacity", self.jetpack_fuel_capacity),
            ("jetpack_fuel_regen_rate", self.jetpack_fuel_regen_rate),
            ("jetpack_fuel_consumption", self.jetpack_fuel_consumption),
            ("jetpack_min_fuel_to_activate", self.jetpack_min_fuel_to_activate),
            ("ground_probe_distance", self.ground_probe_distance),
        ];

        for (field, value) in scalars {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field, value });
            }
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        if self.air_control > 1.0 {
            return Err(ConfigError::AirControlOutOfRange(self.air_control));
        }
        if self.ski_min_slope >= self.ski_max_slope {
            return Err(ConfigError::SkiSlopeRange {
                min: self.ski_min_slope,
                max: self.ski_max_slope,
            });
        }
        if self.jetpack_min_fuel_to_activate > self.jetpack_fuel_capacity {
            return Err(ConfigError::ActivationAboveCapacity {
                min: self.jetpack_min_fuel_to_activate,
                capacity: self.jetpack_fuel_capacity,
            });
        }
        Ok(())
    }

    /// Parse and validate a config from RON.
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed RON.
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Preset Tests ====================

    #[test]
    fn default_config_is_valid() {
        let config = MovementConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.ski_min_slope < config.ski_max_slope);
    }

    #[test]
    fn presets_are_valid() {
        assert!(MovementConfig::player().validate().is_ok());
        assert!(MovementConfig::arcade().validate().is_ok());
        assert!(MovementConfig::heavy().validate().is_ok());
    }

    #[test]
    fn arcade_is_faster_than_heavy() {
        let arcade = MovementConfig::arcade();
        let heavy = MovementConfig::heavy();
        assert!(arcade.run_speed > heavy.run_speed);
        assert!(arcade.air_control > heavy.air_control);
    }

    #[test]
    fn speed_selects_gait() {
        let config = MovementConfig::default().with_speeds(3.0, 7.0);
        assert_eq!(config.speed(false), 3.0);
        assert_eq!(config.speed(true), 7.0);
    }

    // ==================== Validation Tests ====================

    #[test]
    fn negative_rate_is_rejected() {
        let config = MovementConfig::default().with_jetpack_fuel(100.0, -1.0, 20.0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::Negative {
                field: "jetpack_fuel_regen_rate",
                value: -1.0
            })
        );
    }

    #[test]
    fn non_finite_is_rejected() {
        let config = MovementConfig::default().with_jump_force(f32::INFINITY);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotFinite { field: "jump_force", .. })
        ));
    }

    #[test]
    fn inverted_ski_range_is_rejected() {
        let config = MovementConfig::default().with_ski_slopes(0.8, 0.2);
        assert_eq!(
            config.validate(),
            Err(ConfigError::SkiSlopeRange { min: 0.8, max: 0.2 })
        );

        let config = MovementConfig::default().with_ski_slopes(0.5, 0.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn air_control_above_one_is_rejected() {
        let config = MovementConfig::default().with_air_control(1.5);
        assert_eq!(
            config.validate(),
            Err(ConfigError::AirControlOutOfRange(1.5))
        );
    }

    #[test]
    fn unreachable_activation_is_rejected() {
        let config = MovementConfig::default()
            .with_jetpack_fuel(50.0, 10.0, 10.0)
            .with_jetpack_min_fuel(60.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ActivationAboveCapacity { .. })
        ));
    }

    // ==================== RON Tests ====================

    #[test]
    fn partial_ron_fills_defaults() {
        let config = MovementConfig::from_ron_str("(run_speed: 12.0, jump_force: 8.0)").unwrap();
        assert_eq!(config.run_speed, 12.0);
        assert_eq!(config.jump_force, 8.0);
        assert_eq!(config.walk_speed, MovementConfig::default().walk_speed);
    }

    #[test]
    fn ron_output_parses_back() {
        let config = MovementConfig::heavy();
        let text = config.to_ron_string().unwrap();
        assert_eq!(MovementConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn invalid_ron_values_are_rejected() {
        let result = MovementConfig::from_ron_str("(ski_min_slope: 1.0, ski_max_slope: 0.5)");
        assert!(matches!(result, Err(ConfigError::SkiSlopeRange { .. })));

        let result = MovementConfig::from_ron_str("(run_speed: \"fast\")");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}

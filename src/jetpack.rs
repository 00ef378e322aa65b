//! Jetpack fuel economy.
//!
//! Fuel regenerates while the jetpack is off and burns while it fires. The
//! jetpack needs more than `jetpack_min_fuel_to_activate` to switch on, but
//! once lit it keeps firing until the input is released or the tank is empty.

use crate::config::MovementConfig;

/// Fuel levels below this are treated as an empty tank, so float drift
/// cannot leave a burn running on crumbs.
pub const EMPTY_FUEL_EPSILON: f32 = 1e-4;

/// Clamp a fuel level into `[0, capacity]`, mapping NaN to empty.
pub fn clamp_fuel(fuel: f32, config: &MovementConfig) -> f32 {
    if fuel.is_nan() {
        return 0.0;
    }
    fuel.clamp(0.0, config.jetpack_fuel_capacity)
}

/// Fuel after regenerating for `dt` seconds.
pub fn regenerate(fuel: f32, config: &MovementConfig, dt: f32) -> f32 {
    clamp_fuel(fuel + config.jetpack_fuel_regen_rate * dt, config)
}

/// Fuel after burning for `dt` seconds.
pub fn consume(fuel: f32, config: &MovementConfig, dt: f32) -> f32 {
    let remaining = clamp_fuel(fuel - config.jetpack_fuel_consumption * dt, config);
    if remaining <= EMPTY_FUEL_EPSILON {
        0.0
    } else {
        remaining
    }
}

/// Whether the tank holds enough to light the jetpack.
#[inline]
pub fn can_activate(fuel: f32, config: &MovementConfig) -> bool {
    fuel > config.jetpack_min_fuel_to_activate
}

/// Whether a lit jetpack still has fuel to burn.
#[inline]
pub fn has_fuel(fuel: f32) -> bool {
    fuel > 0.0
}

/// Upward force magnitude for a tick of length `dt`.
#[inline]
pub fn thrust(config: &MovementConfig, dt: f32) -> f32 {
    (config.jetpack_acceleration * dt).min(config.jetpack_max_force)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MovementConfig {
        MovementConfig::default()
            .with_jetpack_fuel(100.0, 10.0, 20.0)
            .with_jetpack_min_fuel(10.0)
            .with_jetpack_force(30.0, 600.0)
    }

    #[test]
    fn regeneration_is_capped() {
        let config = config();
        assert_eq!(regenerate(50.0, &config, 1.0), 60.0);
        assert_eq!(regenerate(95.0, &config, 1.0), 100.0);
        assert_eq!(regenerate(100.0, &config, 1.0), 100.0);
    }

    #[test]
    fn consumption_is_floored() {
        let config = config();
        assert_eq!(consume(50.0, &config, 1.0), 30.0);
        assert_eq!(consume(10.0, &config, 1.0), 0.0);
    }

    #[test]
    fn crumbs_count_as_empty() {
        let config = config();
        assert_eq!(consume(20.00001, &config, 1.0), 0.0);
    }

    #[test]
    fn activation_threshold_is_strict() {
        let config = config();
        assert!(!can_activate(10.0, &config));
        assert!(can_activate(10.5, &config));
        assert!(has_fuel(0.1));
        assert!(!has_fuel(0.0));
    }

    #[test]
    fn thrust_ramps_to_cap() {
        let config = config();
        assert!((thrust(&config, 0.01) - 6.0).abs() < 1e-5);
        assert_eq!(thrust(&config, 1.0), 30.0);
        assert_eq!(thrust(&config, 0.0), 0.0);
    }

    #[test]
    fn nan_fuel_is_empty() {
        assert_eq!(clamp_fuel(f32::NAN, &config()), 0.0);
        assert_eq!(clamp_fuel(500.0, &config()), 100.0);
        assert_eq!(clamp_fuel(-3.0, &config()), 0.0);
    }
}

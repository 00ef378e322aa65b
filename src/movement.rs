//! The locomotion core.
//!
//! [`MovementCore`] owns a [`MovementState`] and turns each tick's
//! [`MovementInput`] into forces and impulses on a [`PhysicsBody`], reporting
//! transitions to a [`MovementEvents`] sink.
//!
//! Every tick runs four steps in a fixed order:
//!
//! 1. **Ground check**: downward probe OR-ed with contact callbacks into a
//!    single grounded flag; landing logic runs once on its rising edge.
//! 2. **Locomotion**: walk/run force, jump impulse.
//! 3. **Skiing**: slope-scaled force along a smoothly turning direction.
//! 4. **Jetpack**: fuel regeneration, thrust and burn.

use std::sync::Arc;

use bevy::log::{debug, warn};
use bevy::prelude::*;
use parking_lot::Mutex;
use thiserror::Error;

use crate::body::{BodyError, PhysicsBody};
use crate::collision::{is_ground_normal, CollisionData};
use crate::config::{ConfigError, MovementConfig};
use crate::events::{MovementEvent, MovementEvents};
use crate::intent::MovementInput;
use crate::jetpack;
use crate::slope;
use crate::state::MovementState;

/// Errors reported by [`MovementCore`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MovementError {
    /// A configuration is already live; dispose the core first.
    #[error("movement core is already initialized; dispose it before applying a new config")]
    AlreadyInitialized,

    /// The supplied configuration breaks an invariant.
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    /// The physics body failed while executing a command.
    #[error(transparent)]
    Body(#[from] BodyError),
}

/// Ground contact normals reported by the body between ticks.
///
/// Shared with the body's contact callback; drained once per tick.
#[derive(Debug, Clone, Default)]
struct ContactLatch(Arc<Mutex<Option<Vec3>>>);

impl ContactLatch {
    /// Keep the flattest ground normal seen since the last drain.
    fn record(&self, normal: Vec3) {
        if !is_ground_normal(normal) {
            return;
        }
        let normal = normal.normalize_or_zero();
        let mut slot = self.0.lock();
        match *slot {
            Some(existing) if existing.y >= normal.y => {}
            _ => *slot = Some(normal),
        }
    }

    fn take(&self) -> Option<Vec3> {
        self.0.lock().take()
    }
}

/// Input edges and hysteresis that are not part of the public state.
#[derive(Debug, Clone, Copy, Default)]
struct Latches {
    /// Jump button state on the previous tick.
    jump_held: bool,
    /// The tank ran dry while the jetpack button was held.
    jetpack_burned_out: bool,
}

/// Run/jump/ski/jetpack locomotion for one character.
///
/// The core is inert until it has both a configuration
/// ([`initialize`](Self::initialize)) and a body
/// ([`attach_body`](Self::attach_body)); before that every operation is a
/// silent no-op.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use jetpack_locomotion::prelude::*;
///
/// let mut core = MovementCore::new(Vec::<MovementEvent>::new());
/// core.initialize(MovementConfig::player()).unwrap();
/// core.attach_body(SimulatedBody::new(FlatTerrain::new(0.0), Vec3::ZERO));
///
/// let input = MovementInput::moving(Vec3::Z).with_run(true);
/// core.update(&input, 1.0 / 60.0).unwrap();
///
/// let state = core.state();
/// assert!(state.is_grounded);
/// assert!(state.is_running);
/// ```
#[derive(Debug)]
pub struct MovementCore<B, E = Vec<MovementEvent>> {
    config: Option<MovementConfig>,
    body: Option<B>,
    events: E,
    state: MovementState,
    contacts: ContactLatch,
    latches: Latches,
}

impl<B, E: Default> Default for MovementCore<B, E> {
    fn default() -> Self {
        Self::new(E::default())
    }
}

impl<B, E> MovementCore<B, E> {
    /// Create an uninitialized core that reports to `events`.
    pub fn new(events: E) -> Self {
        Self {
            config: None,
            body: None,
            events,
            state: MovementState::default(),
            contacts: ContactLatch::default(),
            latches: Latches::default(),
        }
    }

    /// Copy of the current state.
    pub fn state(&self) -> MovementState {
        self.state
    }

    /// Active configuration, if initialized.
    pub fn config(&self) -> Option<&MovementConfig> {
        self.config.as_ref()
    }

    /// Attached body, if any.
    pub fn body(&self) -> Option<&B> {
        self.body.as_ref()
    }

    /// Attached body, if any.
    pub fn body_mut(&mut self) -> Option<&mut B> {
        self.body.as_mut()
    }

    /// The event sink.
    pub fn events(&self) -> &E {
        &self.events
    }

    /// The event sink.
    pub fn events_mut(&mut self) -> &mut E {
        &mut self.events
    }

    /// A configuration has been applied.
    pub fn is_initialized(&self) -> bool {
        self.config.is_some()
    }

    /// Both configuration and body are present; `update` will simulate.
    pub fn is_ready(&self) -> bool {
        self.config.is_some() && self.body.is_some()
    }

    /// Apply the session configuration and fill the jetpack tank.
    ///
    /// A second call without an intervening [`dispose`](Self::dispose) is
    /// rejected and the live configuration is kept.
    pub fn initialize(&mut self, config: MovementConfig) -> Result<(), MovementError> {
        if self.config.is_some() {
            warn!("rejected movement config: core is already initialized");
            return Err(MovementError::AlreadyInitialized);
        }
        config.validate()?;

        self.state.jetpack_fuel = config.jetpack_fuel_capacity;
        self.config = Some(config);
        Ok(())
    }

    /// Detach the body and drop the configuration.
    ///
    /// The core returns to its freshly constructed, inert state. The detached
    /// body is handed back.
    pub fn dispose(&mut self) -> Option<B> {
        self.config = None;
        self.state = MovementState::default();
        self.latches = Latches::default();
        // Fresh latch: callbacks held by the old body must not reach us.
        self.contacts = ContactLatch::default();
        self.body.take()
    }
}

impl<B: PhysicsBody, E: MovementEvents> MovementCore<B, E> {
    /// Attach the character's body and subscribe to its contacts.
    ///
    /// Contacts whose normal is within about 45 degrees of vertical count as
    /// ground, independently of the per-tick probe. Returns the previously
    /// attached body, if any.
    pub fn attach_body(&mut self, mut body: B) -> Option<B> {
        self.contacts = ContactLatch::default();
        let latch = self.contacts.clone();
        body.register_contact_callback(Box::new(move |normal| latch.record(normal)));
        self.body.replace(body)
    }

    /// Advance one tick.
    ///
    /// A no-op until the core is initialized and has a body. Negative or
    /// non-finite `dt` is treated as zero. Only body failures are returned.
    pub fn update(&mut self, input: &MovementInput, dt: f32) -> Result<(), MovementError> {
        let (Some(config), Some(body)) = (self.config.as_ref(), self.body.as_mut()) else {
            return Ok(());
        };

        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };

        let mut tick = Tick {
            config,
            body,
            events: &mut self.events,
            state: &mut self.state,
            latches: &mut self.latches,
            input,
            dt,
        };

        let contact = self.contacts.take();
        let ground = tick.ground_check(contact);
        tick.locomotion()?;
        tick.skiing(ground)?;
        tick.jetpack()?;
        Ok(())
    }

    /// Teleport the body. No-op without a body.
    pub fn set_position(&mut self, position: Vec3) -> Result<(), MovementError> {
        if let Some(body) = self.body.as_mut() {
            body.set_position(position)?;
        }
        Ok(())
    }

    /// Rotate the body. No-op without a body.
    pub fn set_rotation(&mut self, rotation: Quat) -> Result<(), MovementError> {
        if let Some(body) = self.body.as_mut() {
            body.set_rotation(rotation)?;
        }
        Ok(())
    }

    /// Restore default state (full tank) and stop the body, e.g. on respawn.
    ///
    /// No events are emitted for sub-states cut short by the reset.
    pub fn reset(&mut self) -> Result<(), MovementError> {
        let fuel = self
            .config
            .map(|config| config.jetpack_fuel_capacity)
            .unwrap_or(0.0);
        self.state = MovementState::with_fuel(fuel);
        self.latches = Latches::default();
        self.contacts.take();

        if let Some(body) = self.body.as_mut() {
            body.set_linear_velocity(Vec3::ZERO)?;
            body.set_angular_velocity(Vec3::ZERO)?;
        }
        Ok(())
    }
}

/// Borrowed view of the core for the duration of one tick.
struct Tick<'a, B, E> {
    config: &'a MovementConfig,
    body: &'a mut B,
    events: &'a mut E,
    state: &'a mut MovementState,
    latches: &'a mut Latches,
    input: &'a MovementInput,
    dt: f32,
}

impl<B: PhysicsBody, E: MovementEvents> Tick<'_, B, E> {
    /// Update the grounded flag and return the ground normal, if grounded.
    fn ground_check(&mut self, contact: Option<Vec3>) -> Option<Vec3> {
        let hit: Option<CollisionData> = self.body.probe_ground(self.config.ground_probe_distance);
        let normal = hit.map(|hit| hit.normal).or(contact);

        let was_grounded = self.state.is_grounded;
        self.state.is_grounded = normal.is_some();
        self.state.slope_angle = normal.map(slope::slope_angle).unwrap_or(0.0);

        if let Some(normal) = normal {
            if !was_grounded {
                self.land(normal);
            }
        }
        normal
    }

    /// Rising edge of the grounded flag.
    fn land(&mut self, normal: Vec3) {
        if self.state.is_jumping {
            self.state.is_jumping = false;
            debug!("jump ended on landing");
            self.events.jump_end();
        }
        self.events.ground_contact(normal);
    }

    fn locomotion(&mut self) -> Result<(), MovementError> {
        let input = self.input;
        let grounded = self.state.is_grounded;

        let mut force = input.horizontal_move() * self.config.speed(input.run);
        if !grounded {
            force *= self.config.air_control;
        }
        if force != Vec3::ZERO {
            self.body.apply_force(force)?;
        }

        let jump_pressed = input.jump && !self.latches.jump_held;
        self.latches.jump_held = input.jump;
        if jump_pressed && grounded && !self.state.is_jumping {
            self.body.apply_impulse(Vec3::Y * self.config.jump_force)?;
            self.state.is_jumping = true;
            debug!("jump started");
            self.events.jump_start();
        }

        self.state.is_running = input.run && input.is_moving();

        let velocity = self.body.linear_velocity();
        if velocity.is_finite() {
            self.state.velocity = velocity;
        }
        Ok(())
    }

    fn skiing(&mut self, ground: Option<Vec3>) -> Result<(), MovementError> {
        let blocked_by_jetpack =
            !self.config.allow_ski_while_jetpacking && self.state.is_jetpack_active;

        let normal = match ground {
            Some(normal) if self.input.ski && !blocked_by_jetpack => normal,
            _ => {
                if self.state.is_skiing {
                    self.state.is_skiing = false;
                    self.state.ski_speed = 0.0;
                    debug!("ski ended");
                    self.events.ski_end();
                }
                return Ok(());
            }
        };

        if !self.state.is_skiing {
            self.state.is_skiing = true;
            if let Some(heading) = slope::horizontal_direction(self.state.velocity) {
                self.state.ski_direction = heading;
            }
            debug!("ski started");
            self.events.ski_start();
        }

        let angle = slope::slope_angle(normal);
        self.state.slope_angle = angle;

        if angle > self.config.ski_min_slope {
            let factor =
                slope::slope_factor(angle, self.config.ski_min_slope, self.config.ski_max_slope);

            let target = slope::horizontal_direction(self.input.move_direction)
                .or_else(|| slope::downhill_direction(normal));
            if let Some(target) = target {
                self.state.ski_direction = slope::blend_direction(
                    self.state.ski_direction,
                    target,
                    self.config.ski_turn_rate * self.dt,
                );
            }

            let force = self.state.ski_direction * self.config.ski_acceleration * factor;
            if force != Vec3::ZERO {
                self.body.apply_force(force)?;
            }
        }

        // Descent rate, not horizontal speed.
        self.state.ski_speed = self.state.velocity.y;
        Ok(())
    }

    fn jetpack(&mut self) -> Result<(), MovementError> {
        let config = self.config;
        let held = self.input.jetpack;

        let mut fuel = jetpack::clamp_fuel(self.state.jetpack_fuel, config);
        if !self.state.is_jetpack_active {
            fuel = jetpack::regenerate(fuel, config, self.dt);
        }
        if !held {
            self.latches.jetpack_burned_out = false;
        }

        if self.state.is_jetpack_active {
            if !held || !jetpack::has_fuel(fuel) {
                self.stop_jetpack();
            }
        } else if held && !self.latches.jetpack_burned_out && jetpack::can_activate(fuel, config) {
            self.state.is_jetpack_active = true;
            debug!(fuel, "jetpack started");
            self.events.jetpack_start();
        }

        if self.state.is_jetpack_active {
            let force = Vec3::Y * jetpack::thrust(config, self.dt);
            if force != Vec3::ZERO {
                self.body.apply_force(force)?;
            }
            self.state.jetpack_force = force;

            fuel = jetpack::consume(fuel, config, self.dt);
            if !jetpack::has_fuel(fuel) {
                self.latches.jetpack_burned_out = true;
                self.stop_jetpack();
            }
        }

        self.state.jetpack_fuel = fuel;
        Ok(())
    }

    fn stop_jetpack(&mut self) {
        self.state.is_jetpack_active = false;
        self.state.jetpack_force = Vec3::ZERO;
        debug!("jetpack ended");
        self.events.jetpack_end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::SimulatedBody;
    use crate::terrain::{FlatTerrain, InclinedPlane};

    type Core = MovementCore<SimulatedBody<FlatTerrain>>;

    fn grounded_core(config: MovementConfig) -> Core {
        let mut core = Core::default();
        core.initialize(config).unwrap();
        core.attach_body(SimulatedBody::new(FlatTerrain::new(0.0), Vec3::ZERO));
        core
    }

    // ==================== Lifecycle Tests ====================

    #[test]
    fn new_core_is_inert() {
        let mut core = Core::default();
        assert!(!core.is_initialized());
        assert!(!core.is_ready());

        core.update(&MovementInput::moving(Vec3::Z).with_jump(true), 0.1)
            .unwrap();
        assert_eq!(core.state(), MovementState::default());
        assert!(core.events().is_empty());
    }

    #[test]
    fn config_without_body_is_inert() {
        let mut core = Core::default();
        core.initialize(MovementConfig::default()).unwrap();
        core.update(&MovementInput::moving(Vec3::Z), 0.1).unwrap();
        assert!(!core.state().is_grounded);
        assert!(core.set_position(Vec3::ONE).is_ok());
    }

    #[test]
    fn initialize_fills_tank() {
        let core = grounded_core(MovementConfig::default().with_jetpack_fuel(80.0, 5.0, 5.0));
        assert_eq!(core.state().jetpack_fuel, 80.0);
    }

    #[test]
    fn double_initialize_keeps_first_config() {
        let mut core = grounded_core(MovementConfig::default().with_speeds(1.0, 2.0));
        let result = core.initialize(MovementConfig::default().with_speeds(9.0, 9.0));

        assert_eq!(result, Err(MovementError::AlreadyInitialized));
        assert_eq!(core.config().unwrap().run_speed, 2.0);
    }

    #[test]
    fn invalid_config_is_not_stored() {
        let mut core = Core::default();
        let result = core.initialize(MovementConfig::default().with_ski_slopes(1.0, 0.1));
        assert!(matches!(result, Err(MovementError::InvalidConfig(_))));
        assert!(!core.is_initialized());
    }

    #[test]
    fn dispose_returns_to_inert() {
        let mut core = grounded_core(MovementConfig::default());
        core.update(&MovementInput::default(), 0.1).unwrap();
        assert!(core.state().is_grounded);

        let body = core.dispose();
        assert!(body.is_some());
        assert!(!core.is_ready());
        assert_eq!(core.state(), MovementState::default());

        let events_before = core.events().len();
        core.update(&MovementInput::moving(Vec3::Z).with_jump(true).with_jetpack(true), 0.1)
            .unwrap();
        assert_eq!(core.state(), MovementState::default());
        assert_eq!(core.events().len(), events_before);

        // Re-initialization is allowed after dispose.
        assert!(core.initialize(MovementConfig::default()).is_ok());
    }

    #[test]
    fn attach_returns_previous_body() {
        let mut core = grounded_core(MovementConfig::default());
        let previous = core.attach_body(SimulatedBody::new(FlatTerrain::new(3.0), Vec3::ZERO));
        assert!(previous.is_some());
    }

    // ==================== Contact Latch Tests ====================

    #[test]
    fn latch_ignores_walls_and_keeps_flattest() {
        let latch = ContactLatch::default();
        latch.record(Vec3::X);
        assert_eq!(latch.take(), None);

        latch.record(Vec3::new(0.6, 0.8, 0.0));
        latch.record(Vec3::Y);
        latch.record(Vec3::new(0.0, 0.75, 0.66));
        assert_eq!(latch.take(), Some(Vec3::Y));
        assert_eq!(latch.take(), None);
    }

    #[test]
    fn latch_rejects_unnormalized_wall() {
        let latch = ContactLatch::default();
        latch.record(Vec3::new(5.0, 0.8, 0.0));
        assert_eq!(latch.take(), None);

        latch.record(Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(latch.take(), Some(Vec3::Y));
    }

    #[test]
    fn wall_contact_does_not_land() {
        let mut core = Core::default();
        core.initialize(MovementConfig::default()).unwrap();
        core.attach_body(SimulatedBody::new(FlatTerrain::new(0.0), Vec3::new(0.0, 5.0, 0.0)));

        core.contacts.record(Vec3::new(5.0, 0.8, 0.0));
        core.update(&MovementInput::default(), 1.0 / 60.0).unwrap();

        assert!(!core.state().is_grounded);
        assert!(core.events().is_empty());
    }

    // ==================== Ground Tests ====================

    #[test]
    fn landing_emits_one_contact() {
        let mut core = grounded_core(MovementConfig::default());
        for _ in 0..10 {
            core.update(&MovementInput::default(), 1.0 / 60.0).unwrap();
        }
        let contacts = core
            .events()
            .iter()
            .filter(|e| matches!(e, MovementEvent::GroundContact { .. }))
            .count();
        assert_eq!(contacts, 1);
    }

    #[test]
    fn slope_angle_tracks_ground() {
        let plane = InclinedPlane::from_angle(Vec3::ZERO, 0.3, Vec3::X);
        let mut core: MovementCore<SimulatedBody<InclinedPlane>> = MovementCore::default();
        core.initialize(MovementConfig::default()).unwrap();
        core.attach_body(SimulatedBody::new(plane, Vec3::ZERO));

        core.update(&MovementInput::default(), 0.01).unwrap();
        assert!((core.state().slope_angle - 0.3).abs() < 1e-5);
    }

    // ==================== Reset Tests ====================

    #[test]
    fn reset_refills_and_stops_body() {
        let config = MovementConfig::default();
        let mut core = grounded_core(config);
        let jet = MovementInput::new().with_jetpack(true);
        for _ in 0..10 {
            core.update(&jet, 0.1).unwrap();
        }
        assert!(core.state().jetpack_fuel < config.jetpack_fuel_capacity);

        core.body_mut()
            .unwrap()
            .set_linear_velocity(Vec3::new(5.0, 1.0, 0.0))
            .unwrap();
        core.reset().unwrap();

        let state = core.state();
        assert_eq!(state.jetpack_fuel, config.jetpack_fuel_capacity);
        assert!(!state.is_jetpack_active);
        assert_eq!(core.body().unwrap().linear_velocity(), Vec3::ZERO);
    }

    #[test]
    fn non_finite_dt_is_zero() {
        let mut core = grounded_core(MovementConfig::default());
        let before = core.state().jetpack_fuel;
        core.update(&MovementInput::new().with_jetpack(true), f32::NAN)
            .unwrap();
        core.update(&MovementInput::new().with_jetpack(true), -1.0)
            .unwrap();
        assert_eq!(core.state().jetpack_fuel, before);
    }
}

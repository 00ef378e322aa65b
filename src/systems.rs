//! Plugin systems.
//!
//! These systems move data between the physics backend and each entity's
//! [`Locomotion`] core. They are generic over the backend so any engine can
//! drive the same locomotion logic.

use bevy::log::error;
use bevy::prelude::*;

use crate::backend::LocomotionBackend;
use crate::body::BufferedBody;
use crate::controller::Locomotion;
use crate::detection::GroundSensor;
use crate::events::LocomotionEvent;
use crate::intent::MovementInput;

/// Fallback step length when the fixed clock has not ticked yet.
const DEFAULT_TIMESTEP: f32 = 1.0 / 60.0;

fn locomotion_entities(world: &mut World) -> Vec<Entity> {
    world
        .query_filtered::<Entity, With<Locomotion>>()
        .iter(world)
        .collect()
}

/// Copy body samples and sensor results into each buffered body.
///
/// Sensor contents are consumed so a contact reaches the core only once.
pub fn feed_body_sensors<B: LocomotionBackend>(world: &mut World) {
    for entity in locomotion_entities(world) {
        let sample = B::sample_body(world, entity);
        let sensor = world
            .get_mut::<GroundSensor>(entity)
            .map(|mut sensor| std::mem::take(&mut *sensor))
            .unwrap_or_default();

        let Some(mut locomotion) = world.get_mut::<Locomotion>(entity) else {
            continue;
        };
        let Some(body) = locomotion.body_mut() else {
            continue;
        };

        if let Some(sample) = sample {
            body.sync(sample.center, sample.linear_velocity);
        }
        body.set_ground(sensor.hit);
        for normal in sensor.contacts {
            body.report_contact(normal);
        }
    }
}

/// Step every core and publish its transitions as [`LocomotionEvent`]s.
pub fn step_locomotion(
    time: Res<Time<Fixed>>,
    mut characters: Query<(Entity, &mut Locomotion, &MovementInput)>,
    mut events: EventWriter<LocomotionEvent>,
) {
    let dt = Some(time.delta_secs())
        .filter(|&d| d > 0.0)
        .unwrap_or(DEFAULT_TIMESTEP);

    for (entity, mut locomotion, input) in &mut characters {
        if let Err(err) = locomotion.update(input, dt) {
            error!(?entity, %err, "locomotion step failed");
        }
        for event in locomotion.drain_events() {
            events.write(LocomotionEvent { entity, event });
        }
    }
}

/// Hand the commands recorded this tick to the backend.
pub fn flush_body_commands<B: LocomotionBackend>(world: &mut World) {
    for entity in locomotion_entities(world) {
        let commands = world
            .get_mut::<Locomotion>(entity)
            .and_then(|mut locomotion| locomotion.body_mut().map(BufferedBody::take_commands));

        if let Some(commands) = commands.filter(|commands| !commands.is_empty()) {
            B::apply_commands(world, entity, commands);
        }
    }
}

//! Rapier3D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier3D.
//! Enable with the `rapier3d` feature.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::backend::{BodySample, LocomotionBackend};
use crate::body::BodyCommands;
use crate::collision::CollisionData;
use crate::controller::Locomotion;
use crate::detection::GroundSensor;
use crate::LocomotionSet;

/// Rapier3D physics backend for locomotion.
///
/// Body commands are written into `Velocity`, `ExternalImpulse`,
/// `ExternalForce` and `Transform`. Ground rays and contact manifolds are
/// read by a dedicated sensor system that receives the Rapier context as a
/// system parameter.
pub struct Rapier3dBackend;

impl LocomotionBackend for Rapier3dBackend {
    fn plugin() -> impl Plugin {
        Rapier3dBackendPlugin
    }

    fn sample_body(world: &World, entity: Entity) -> Option<BodySample> {
        let center = world
            .get::<Transform>(entity)
            .map(|t| t.translation)
            .or_else(|| world.get::<GlobalTransform>(entity).map(|t| t.translation()))?;
        let linear_velocity = world
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec3::ZERO);
        Some(BodySample {
            center,
            linear_velocity,
        })
    }

    fn apply_commands(world: &mut World, entity: Entity, commands: BodyCommands) {
        if let Some(mut velocity) = world.get_mut::<Velocity>(entity) {
            if let Some(linvel) = commands.linear_velocity {
                velocity.linvel = linvel;
            }
            if let Some(angvel) = commands.angular_velocity {
                velocity.angvel = angvel;
            }
        }

        if commands.impulse != Vec3::ZERO {
            if let Some(mut external) = world.get_mut::<ExternalImpulse>(entity) {
                external.impulse += commands.impulse;
            } else if let Some(mut velocity) = world.get_mut::<Velocity>(entity) {
                // No ExternalImpulse: treat as a unit-mass velocity change
                velocity.linvel += commands.impulse;
            }
        }

        if commands.force != Vec3::ZERO {
            if let Some(mut external) = world.get_mut::<ExternalForce>(entity) {
                external.force += commands.force;
                match world.get_mut::<LocomotionForce>(entity) {
                    Some(mut applied) => applied.0 += commands.force,
                    None => {
                        if let Ok(mut entity_mut) = world.get_entity_mut(entity) {
                            entity_mut.insert(LocomotionForce(commands.force));
                        }
                    }
                }
            }
        }

        if commands.position.is_some() || commands.rotation.is_some() {
            if let Some(mut transform) = world.get_mut::<Transform>(entity) {
                if let Some(position) = commands.position {
                    transform.translation = position;
                }
                if let Some(rotation) = commands.rotation {
                    transform.rotation = rotation;
                }
            }
        }
    }
}

/// Force this crate added to `ExternalForce` during the last tick.
///
/// Subtracted again in [`LocomotionSet::Preparation`] so user forces on the
/// same body are preserved.
#[derive(Component, Debug, Default, Clone, Copy, PartialEq)]
pub struct LocomotionForce(pub Vec3);

/// Plugin that sets up Rapier3D-specific systems for locomotion.
pub struct Rapier3dBackendPlugin;

impl Plugin for Rapier3dBackendPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            clear_locomotion_forces.in_set(LocomotionSet::Preparation),
        );
        app.add_systems(
            FixedUpdate,
            rapier_ground_sensor.in_set(LocomotionSet::Sensors),
        );
    }
}

/// Remove last tick's locomotion force from `ExternalForce`.
pub fn clear_locomotion_forces(mut q: Query<(&mut ExternalForce, &mut LocomotionForce)>) {
    for (mut external, mut applied) in &mut q {
        external.force -= applied.0;
        applied.0 = Vec3::ZERO;
    }
}

/// Distance from collider center to its lowest point.
pub fn collider_bottom_offset(collider: &Collider) -> f32 {
    if let Some(capsule) = collider.as_capsule() {
        let segment = capsule.segment();
        (segment.a() - segment.b()).length() / 2.0 + capsule.radius()
    } else if let Some(ball) = collider.as_ball() {
        ball.radius()
    } else if let Some(cuboid) = collider.as_cuboid() {
        cuboid.half_extents().y
    } else {
        0.0
    }
}

/// Cast the ground ray and collect contact normals for each character.
///
/// The ray starts at the body center and reaches the collider bottom plus
/// the configured probe distance. Reported hit distances are measured from
/// the collider bottom.
fn rapier_ground_sensor(
    rapier_context: ReadRapierContext,
    mut q_characters: Query<(
        Entity,
        &GlobalTransform,
        &Locomotion,
        &mut GroundSensor,
        Option<&Collider>,
        Option<&CollisionGroups>,
    )>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    for (entity, transform, locomotion, mut sensor, collider, groups) in &mut q_characters {
        sensor.clear();
        let Some(config) = locomotion.config() else {
            continue;
        };

        let origin = transform.translation();
        let bottom = collider.map(collider_bottom_offset).unwrap_or(0.0);
        let max_distance = bottom + config.ground_probe_distance;

        let mut filter = QueryFilter::default()
            .exclude_rigid_body(entity)
            .exclude_sensors();
        if let Some(groups) = groups {
            filter = filter.groups(*groups);
        }

        if let Some((hit_entity, hit)) =
            context.cast_ray_and_get_normal(origin, Vec3::NEG_Y, max_distance, true, filter)
        {
            sensor.record_hit(CollisionData::new(
                hit.time_of_impact - bottom,
                hit.normal,
                hit.point,
                Some(hit_entity),
            ));
        }

        for pair in context.contact_pairs_with(entity) {
            if !pair.has_any_active_contact() {
                continue;
            }
            for manifold in pair.manifolds() {
                // Manifold normals point away from the first body
                let normal = if manifold.rigid_body1() == Some(entity) {
                    -manifold.normal()
                } else {
                    manifold.normal()
                };
                sensor.record_contact(normal);
            }
        }
    }
}

/// Bundle for creating a character with Rapier3D physics.
///
/// Provides the rigid body, velocity tracking, and the external
/// force/impulse components the backend writes to.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use jetpack_locomotion::prelude::*;
/// use jetpack_locomotion::rapier::Rapier3dLocomotionBundle;
///
/// fn spawn_player(mut commands: Commands) {
///     commands.spawn((
///         Transform::from_xyz(0.0, 2.0, 0.0),
///         Locomotion::new(MovementConfig::player()).unwrap(),
///         Rapier3dLocomotionBundle::rotation_locked(),
///         Collider::capsule_y(0.5, 0.4),
///     ));
/// }
/// ```
#[derive(Bundle, Default)]
pub struct Rapier3dLocomotionBundle {
    /// Should be [`RigidBody::Dynamic`] for characters.
    pub rigid_body: RigidBody,
    /// Updated by Rapier each physics step.
    pub velocity: Velocity,
    /// Continuous forces (run, ski, jetpack).
    pub external_force: ExternalForce,
    /// Instantaneous impulses (jump).
    pub external_impulse: ExternalImpulse,
    /// Which axes are locked.
    pub locked_axes: LockedAxes,
    /// Velocity damping.
    pub damping: Damping,
    /// Bookkeeping for force isolation between ticks.
    pub locomotion_force: LocomotionForce,
}

impl Rapier3dLocomotionBundle {
    /// Dynamic body with rotation enabled and light damping.
    pub fn new() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            external_force: ExternalForce::default(),
            external_impulse: ExternalImpulse::default(),
            locked_axes: LockedAxes::empty(),
            damping: Damping {
                linear_damping: 0.1,
                angular_damping: 1.0,
            },
            locomotion_force: LocomotionForce::default(),
        }
    }

    /// Upright character that never tips over.
    pub fn rotation_locked() -> Self {
        Self {
            locked_axes: LockedAxes::ROTATION_LOCKED,
            ..Self::new()
        }
    }

    /// Set the damping coefficients.
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.damping = Damping {
            linear_damping: linear,
            angular_damping: angular,
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    #[test]
    fn sample_reads_transform_and_velocity() {
        let mut world = World::new();
        let entity = world
            .spawn((
                Transform::from_xyz(1.0, 2.0, 3.0),
                Velocity::linear(Vec3::new(4.0, 0.0, -1.0)),
            ))
            .id();

        let sample = Rapier3dBackend::sample_body(&world, entity).unwrap();
        assert_eq!(sample.center, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(sample.linear_velocity, Vec3::new(4.0, 0.0, -1.0));
    }

    #[test]
    fn sample_without_transform_is_none() {
        let mut world = World::new();
        let entity = world.spawn(Velocity::zero()).id();
        assert!(Rapier3dBackend::sample_body(&world, entity).is_none());
    }

    #[test]
    fn commands_land_in_rapier_components() {
        let mut world = World::new();
        let entity = world
            .spawn((Transform::default(), Rapier3dLocomotionBundle::rotation_locked()))
            .id();

        Rapier3dBackend::apply_commands(
            &mut world,
            entity,
            BodyCommands {
                force: Vec3::new(10.0, 0.0, 0.0),
                impulse: Vec3::new(0.0, 6.0, 0.0),
                position: Some(Vec3::new(0.0, 5.0, 0.0)),
                ..default()
            },
        );

        assert_eq!(world.get::<ExternalForce>(entity).unwrap().force.x, 10.0);
        assert_eq!(world.get::<ExternalImpulse>(entity).unwrap().impulse.y, 6.0);
        assert_eq!(world.get::<LocomotionForce>(entity).unwrap().0.x, 10.0);
        assert_eq!(
            world.get::<Transform>(entity).unwrap().translation,
            Vec3::new(0.0, 5.0, 0.0)
        );
    }

    #[test]
    fn clearing_keeps_user_forces() {
        let mut world = World::new();
        let entity = world
            .spawn((
                ExternalForce {
                    force: Vec3::new(1.0, 0.0, 0.0),
                    torque: Vec3::ZERO,
                },
                LocomotionForce::default(),
            ))
            .id();

        Rapier3dBackend::apply_commands(
            &mut world,
            entity,
            BodyCommands {
                force: Vec3::new(0.0, 30.0, 0.0),
                ..default()
            },
        );
        assert_eq!(
            world.get::<ExternalForce>(entity).unwrap().force,
            Vec3::new(1.0, 30.0, 0.0)
        );

        world.run_system_once(clear_locomotion_forces).unwrap();
        assert_eq!(
            world.get::<ExternalForce>(entity).unwrap().force,
            Vec3::new(1.0, 0.0, 0.0)
        );
    }

    #[test]
    fn velocity_overrides_are_applied() {
        let mut world = World::new();
        let entity = world
            .spawn(Velocity::linear(Vec3::new(3.0, 3.0, 3.0)))
            .id();

        Rapier3dBackend::apply_commands(
            &mut world,
            entity,
            BodyCommands {
                linear_velocity: Some(Vec3::ZERO),
                angular_velocity: Some(Vec3::ZERO),
                ..default()
            },
        );

        let velocity = world.get::<Velocity>(entity).unwrap();
        assert_eq!(velocity.linvel, Vec3::ZERO);
        assert_eq!(velocity.angvel, Vec3::ZERO);
    }

    #[test]
    fn capsule_bottom_offset() {
        let collider = Collider::capsule_y(0.5, 0.4);
        assert!((collider_bottom_offset(&collider) - 0.9).abs() < 1e-5);
        assert!((collider_bottom_offset(&Collider::ball(0.3)) - 0.3).abs() < 1e-5);
    }
}

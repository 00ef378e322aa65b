//! Sensor results fed to the core by physics backends.

use bevy::prelude::*;

use crate::collision::CollisionData;

/// Ground probe and contact results for one character, refreshed each
/// physics step by the backend's sensor systems.
///
/// The plugin consumes it right before the simulation step, so contacts
/// are never delivered twice.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use jetpack_locomotion::prelude::*;
///
/// let mut sensor = GroundSensor::default();
/// sensor.record_hit(CollisionData::new(0.02, Vec3::Y, Vec3::ZERO, None));
/// sensor.record_contact(Vec3::Y);
/// assert!(sensor.touching_anything());
/// ```
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct GroundSensor {
    /// Downward probe result from the body center.
    pub hit: Option<CollisionData>,
    /// Normals (pointing toward the character) of resolved contacts.
    pub contacts: Vec<Vec3>,
}

impl GroundSensor {
    /// Store the probe result.
    pub fn record_hit(&mut self, hit: CollisionData) {
        self.hit = Some(hit);
    }

    /// Add a contact normal.
    pub fn record_contact(&mut self, normal: Vec3) {
        self.contacts.push(normal);
    }

    /// Any probe hit or contact.
    pub fn touching_anything(&self) -> bool {
        self.hit.is_some() || !self.contacts.is_empty()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.hit = None;
        self.contacts.clear();
    }
}

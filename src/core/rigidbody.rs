use super::types::{MassProperties, Transform, VisualShape, Velocity};
use glam::{Mat3, Vec3};

/// Rigid body of the vehicle model: kinematic state, inertia and load accumulators.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub name: String,
    pub transform: Transform,
    pub velocity: Velocity,
    pub mass_properties: MassProperties,
    pub accumulated_force: Vec3,
    pub accumulated_torque: Vec3,
    pub shapes: Vec<VisualShape>,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Transform::default(),
            velocity: Velocity::default(),
            mass_properties: MassProperties::default(),
            accumulated_force: Vec3::ZERO,
            accumulated_torque: Vec3::ZERO,
            shapes: Vec::new(),
        }
    }
}

impl RigidBody {
    pub fn new(name: impl Into<String>, transform: Transform, mass_properties: MassProperties) -> Self {
        Self {
            name: name.into(),
            transform,
            mass_properties,
            ..Self::default()
        }
    }

    pub fn with_shape(mut self, shape: VisualShape) -> Self {
        self.shapes.push(shape);
        self
    }

    /// Accumulates a world-frame force acting at a world-frame point.
    pub fn apply_force_at_point(&mut self, force: Vec3, point: Vec3) {
        self.accumulated_force += force;
        self.accumulated_torque += (point - self.transform.position).cross(force);
    }

    pub fn apply_torque(&mut self, torque: Vec3) {
        self.accumulated_torque += torque;
    }

    pub fn clear_accumulators(&mut self) {
        self.accumulated_force = Vec3::ZERO;
        self.accumulated_torque = Vec3::ZERO;
    }

    /// World-frame velocity of a world-frame point rigidly attached to the body.
    pub fn point_velocity(&self, point: Vec3) -> Vec3 {
        self.velocity.linear + self.velocity.angular.cross(point - self.transform.position)
    }

    /// Lumps additional mass onto the body reference point (wheels onto spindles).
    pub fn add_mass(&mut self, extra: &MassProperties) {
        self.mass_properties = self.mass_properties.combined(extra);
    }

    /// Inertia tensor in world axes.
    pub fn world_inertia(&self) -> Mat3 {
        crate::utils::math::world_inertia(self.transform.rotation, self.mass_properties.inertia)
    }
}

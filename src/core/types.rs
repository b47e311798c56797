use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_positive, VehicleError, VehicleResult};

/// Position and orientation of a body reference frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Transform {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Maps a point from this frame into the parent frame.
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    /// Maps a parent-frame point into this frame.
    pub fn inverse_transform_point(&self, world: Vec3) -> Vec3 {
        self.rotation.inverse() * (world - self.position)
    }

    pub fn transform_vector(&self, local: Vec3) -> Vec3 {
        self.rotation * local
    }

    pub fn inverse_transform_vector(&self, world: Vec3) -> Vec3 {
        self.rotation.inverse() * world
    }

    /// Applies another transform on top of this one, returning the composition.
    pub fn combine(&self, other: &Transform) -> Transform {
        Transform {
            position: self.transform_point(other.position),
            rotation: (self.rotation * other.rotation).normalize(),
        }
    }
}

/// Linear and angular velocity of a rigid body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub linear: Vec3,
    pub angular: Vec3,
}

/// Mass and inertia tensor data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassProperties {
    pub mass: f32,
    pub inertia: Mat3,
}

impl Default for MassProperties {
    fn default() -> Self {
        Self {
            mass: 1.0,
            inertia: Mat3::IDENTITY,
        }
    }
}

impl MassProperties {
    /// Mass with a diagonal inertia tensor; every entry must be positive.
    pub fn new(mass: f32, inertia_diagonal: Vec3) -> VehicleResult<Self> {
        ensure_positive("mass", mass)?;
        ensure_positive("inertia.xx", inertia_diagonal.x)?;
        ensure_positive("inertia.yy", inertia_diagonal.y)?;
        ensure_positive("inertia.zz", inertia_diagonal.z)?;
        Ok(Self {
            mass,
            inertia: Mat3::from_diagonal(inertia_diagonal),
        })
    }

    /// Mass with a full inertia tensor; rejects singular or non-finite tensors.
    pub fn with_tensor(mass: f32, inertia: Mat3) -> VehicleResult<Self> {
        ensure_positive("mass", mass)?;
        let det = inertia.determinant();
        if !det.is_finite() || det <= 0.0 {
            return Err(VehicleError::invalid_parameter(
                "inertia.determinant",
                det,
                "must be positive definite",
            ));
        }
        Ok(Self { mass, inertia })
    }

    /// Lumps another set of properties located at the same reference point.
    pub fn combined(&self, other: &MassProperties) -> MassProperties {
        MassProperties {
            mass: self.mass + other.mass,
            inertia: self.inertia + other.inertia,
        }
    }
}

/// Vehicle side of a suspension corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Left, Side::Right];

    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Side::Left => "_L",
            Side::Right => "_R",
        }
    }
}

/// Front or rear axle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axle {
    Front,
    Rear,
}

/// Identifier of one of the four wheels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WheelId {
    FrontLeft,
    FrontRight,
    RearLeft,
    RearRight,
}

impl WheelId {
    pub const ALL: [WheelId; 4] = [
        WheelId::FrontLeft,
        WheelId::FrontRight,
        WheelId::RearLeft,
        WheelId::RearRight,
    ];

    pub fn index(self) -> usize {
        match self {
            WheelId::FrontLeft => 0,
            WheelId::FrontRight => 1,
            WheelId::RearLeft => 2,
            WheelId::RearRight => 3,
        }
    }

    pub fn axle(self) -> Axle {
        match self {
            WheelId::FrontLeft | WheelId::FrontRight => Axle::Front,
            WheelId::RearLeft | WheelId::RearRight => Axle::Rear,
        }
    }

    pub fn side(self) -> Side {
        match self {
            WheelId::FrontLeft | WheelId::RearLeft => Side::Left,
            WheelId::FrontRight | WheelId::RearRight => Side::Right,
        }
    }

    pub fn new(axle: Axle, side: Side) -> Self {
        match (axle, side) {
            (Axle::Front, Side::Left) => WheelId::FrontLeft,
            (Axle::Front, Side::Right) => WheelId::FrontRight,
            (Axle::Rear, Side::Left) => WheelId::RearLeft,
            (Axle::Rear, Side::Right) => WheelId::RearRight,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WheelId::FrontLeft => "FL",
            WheelId::FrontRight => "FR",
            WheelId::RearLeft => "RL",
            WheelId::RearRight => "RR",
        }
    }
}

impl TryFrom<usize> for WheelId {
    type Error = VehicleError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        WheelId::ALL
            .get(index)
            .copied()
            .ok_or(VehicleError::InvalidWheelIndex(index))
    }
}

/// Tire load on one wheel, world frame, acting at the spindle center.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TireForce {
    pub force: Vec3,
    pub moment: Vec3,
}

impl TireForce {
    pub fn new(force: Vec3, moment: Vec3) -> Self {
        Self { force, moment }
    }

    pub fn is_finite(&self) -> bool {
        self.force.is_finite() && self.moment.is_finite()
    }
}

/// Render-agnostic primitive attached to a body, expressed in the body frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VisualShape {
    Cylinder { p1: Vec3, p2: Vec3, radius: f32 },
    Box { center: Vec3, half_extents: Vec3 },
    Mesh { name: String },
}

/// How a subsystem should describe itself to an external renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum VisualizationType {
    #[default]
    None,
    Primitives,
    Mesh(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn transform_round_trips_points() {
        let t = Transform::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_rotation_z(0.7),
        );
        let p = Vec3::new(-0.4, 0.25, 1.5);
        let back = t.inverse_transform_point(t.transform_point(p));
        assert_relative_eq!(back.x, p.x, epsilon = 1e-5);
        assert_relative_eq!(back.y, p.y, epsilon = 1e-5);
        assert_relative_eq!(back.z, p.z, epsilon = 1e-5);
    }

    #[test]
    fn mass_properties_reject_non_physical_values() {
        assert!(MassProperties::new(10.0, Vec3::ONE).is_ok());
        assert!(MassProperties::new(0.0, Vec3::ONE).is_err());
        assert!(MassProperties::new(10.0, Vec3::new(1.0, -1.0, 1.0)).is_err());
        assert!(MassProperties::with_tensor(1.0, Mat3::ZERO).is_err());
    }

    #[test]
    fn wheel_ids_map_to_axle_and_side() {
        for (index, wheel) in WheelId::ALL.iter().enumerate() {
            assert_eq!(wheel.index(), index);
            assert_eq!(WheelId::new(wheel.axle(), wheel.side()), *wheel);
            assert_eq!(WheelId::try_from(index), Ok(*wheel));
        }
        assert_eq!(WheelId::try_from(4), Err(VehicleError::InvalidWheelIndex(4)));
    }
}

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::{rigidbody::RigidBody, types::Transform};
use crate::error::{ensure_non_negative, ensure_positive, VehicleError, VehicleResult};
use crate::utils::allocator::BodyId;

/// Linear spring-damper coefficients; immutable once a force element is built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpringCoefficients {
    /// N/m
    pub stiffness: f32,
    /// N·s/m
    pub damping: f32,
    /// m
    pub rest_length: f32,
}

impl SpringCoefficients {
    pub fn new(stiffness: f32, damping: f32, rest_length: f32) -> VehicleResult<Self> {
        let coefficients = Self {
            stiffness,
            damping,
            rest_length,
        };
        coefficients.validate()?;
        Ok(coefficients)
    }

    pub fn validate(&self) -> VehicleResult<()> {
        ensure_positive("spring.stiffness", self.stiffness)?;
        ensure_non_negative("spring.damping", self.damping)?;
        ensure_positive("spring.rest_length", self.rest_length)?;
        Ok(())
    }

    /// Scalar force, positive in compression: `-(k (L - L0) + c dL/dt)`.
    pub fn force(&self, length: f32, rate: f32) -> f32 {
        -(self.stiffness * (length - self.rest_length) + self.damping * rate)
    }
}

/// Instantaneous state of a spring-damper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpringState {
    pub length: f32,
    /// Rate of change of length, positive when extending.
    pub rate: f32,
    /// Positive when compressed (pushes the bodies apart).
    pub force: f32,
    /// Unit vector from the attachment on body A to the one on body B.
    pub direction: Vec3,
}

impl SpringState {
    pub fn force_on_a(&self) -> Vec3 {
        -self.force * self.direction
    }

    pub fn force_on_b(&self) -> Vec3 {
        self.force * self.direction
    }
}

/// Two-point linear spring-damper between two bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpringDamper {
    pub name: String,
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub local_point_a: Vec3,
    pub local_point_b: Vec3,
    coefficients: SpringCoefficients,
}

impl SpringDamper {
    /// Builds the element from world-frame attachment points at the current poses.
    pub fn new(
        name: impl Into<String>,
        (body_a, pose_a): (BodyId, &Transform),
        (body_b, pose_b): (BodyId, &Transform),
        point_a: Vec3,
        point_b: Vec3,
        coefficients: SpringCoefficients,
    ) -> VehicleResult<Self> {
        let name = name.into();
        coefficients.validate()?;
        if point_a.distance(point_b) <= f32::EPSILON {
            return Err(VehicleError::invalid_parameter(
                format!("{name}.length"),
                0.0,
                "spring attachment points must be distinct",
            ));
        }
        Ok(Self {
            name,
            body_a,
            body_b,
            local_point_a: pose_a.inverse_transform_point(point_a),
            local_point_b: pose_b.inverse_transform_point(point_b),
            coefficients,
        })
    }

    pub fn coefficients(&self) -> &SpringCoefficients {
        &self.coefficients
    }

    /// Length, rate and force from the current state of both bodies.
    pub fn evaluate(&self, body_a: &RigidBody, body_b: &RigidBody) -> SpringState {
        let point_a = body_a.transform.transform_point(self.local_point_a);
        let point_b = body_b.transform.transform_point(self.local_point_b);
        let delta = point_b - point_a;
        let length = delta.length();
        let direction = delta.try_normalize().unwrap_or(Vec3::ZERO);
        let rate = (body_b.point_velocity(point_b) - body_a.point_velocity(point_a)).dot(direction);

        SpringState {
            length,
            rate,
            force: self.coefficients.force(length, rate),
            direction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::MassProperties;
    use crate::utils::allocator::EntityId;
    use approx::assert_relative_eq;

    fn bodies(gap: f32) -> (RigidBody, RigidBody) {
        let a = RigidBody::new("a", Transform::default(), MassProperties::default());
        let b = RigidBody::new(
            "b",
            Transform::from_position(Vec3::new(0.0, 0.0, gap)),
            MassProperties::default(),
        );
        (a, b)
    }

    #[test]
    fn force_is_zero_at_rest_and_opposes_displacement() {
        let c = SpringCoefficients::new(1000.0, 50.0, 0.5).unwrap();
        assert_eq!(c.force(0.5, 0.0), 0.0);
        assert!(c.force(0.4, 0.0) > 0.0);
        assert!(c.force(0.6, 0.0) < 0.0);
        assert!(c.force(0.5, 1.0) < 0.0);
    }

    #[test]
    fn rejects_non_physical_coefficients() {
        assert!(SpringCoefficients::new(0.0, 1.0, 0.5).is_err());
        assert!(SpringCoefficients::new(1.0, -1.0, 0.5).is_err());
        assert!(SpringCoefficients::new(1.0, 1.0, f32::NAN).is_err());
    }

    #[test]
    fn evaluates_length_rate_and_force_from_poses() {
        let (a, mut b) = bodies(0.4);
        let ids = (BodyId::from(EntityId::new(0, 0)), BodyId::from(EntityId::new(1, 0)));
        let spring = SpringDamper::new(
            "shock",
            (ids.0, &a.transform),
            (ids.1, &b.transform),
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, 0.4),
            SpringCoefficients::new(1000.0, 10.0, 0.5).unwrap(),
        )
        .unwrap();

        b.velocity.linear = Vec3::new(0.0, 0.0, 2.0);
        let state = spring.evaluate(&a, &b);
        assert_relative_eq!(state.length, 0.4, epsilon = 1e-6);
        assert_relative_eq!(state.rate, 2.0, epsilon = 1e-6);
        assert_relative_eq!(state.force, 100.0 - 20.0, epsilon = 1e-3);
        assert!(state.force_on_b().z > 0.0);
        assert!(state.force_on_a().z < 0.0);
    }
}

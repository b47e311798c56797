//! Brake acting as friction on a spindle revolute joint.

use serde::{Deserialize, Serialize};

use crate::core::constraints::JointKind;
use crate::error::{ensure_positive, VehicleError, VehicleResult};
use crate::utils::allocator::JointId;
use crate::world::scene::MechanicalScene;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrakeParams {
    /// Friction torque at full modulation, N·m.
    pub max_torque: f32,
}

impl BrakeParams {
    pub fn validate(&self) -> VehicleResult<()> {
        ensure_positive("brake.max_torque", self.max_torque)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brake {
    joint: JointId,
    max_torque: f32,
    modulation: f32,
}

impl Brake {
    /// Attaches to a revolute joint; any other joint kind is rejected.
    pub fn initialize(params: BrakeParams, scene: &dyn MechanicalScene, joint: JointId) -> VehicleResult<Self> {
        params.validate()?;
        let target = scene.joint_ref(joint)?;
        if target.kind() != JointKind::Revolute {
            return Err(VehicleError::JointKindMismatch {
                name: target.name.clone(),
                expected: JointKind::Revolute.name(),
            });
        }
        Ok(Self {
            joint,
            max_torque: params.max_torque,
            modulation: 0.0,
        })
    }

    /// Sets the modulation in [0, 1] and writes the friction torque to the joint.
    pub fn update(&mut self, scene: &mut dyn MechanicalScene, modulation: f32) -> VehicleResult<()> {
        if !modulation.is_finite() {
            return Err(VehicleError::NonFiniteInput {
                name: "braking",
                value: modulation,
            });
        }
        let modulation = modulation.clamp(0.0, 1.0);
        scene
            .joint_ref_mut(self.joint)?
            .set_brake_torque(modulation * self.max_torque)?;
        self.modulation = modulation;
        Ok(())
    }

    pub fn joint(&self) -> JointId {
        self.joint
    }

    pub fn modulation(&self) -> f32 {
        self.modulation
    }

    /// Requested friction torque magnitude.
    pub fn brake_torque(&self) -> f32 {
        self.modulation * self.max_torque
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{constraints::Joint, rigidbody::RigidBody, types::Transform};
    use crate::world::SceneWorld;
    use glam::Vec3;

    #[test]
    fn modulation_scales_max_torque() {
        let mut world = SceneWorld::default();
        let a = world.add_body(RigidBody::default());
        let b = world.add_body(RigidBody::default());
        let pose = Transform::default();
        let joint = Joint::revolute("hub", (a, &pose), (b, &pose), Vec3::ZERO, Vec3::Y).unwrap();
        let joint = world.add_joint(joint).unwrap();

        let mut brake = Brake::initialize(BrakeParams { max_torque: 4000.0 }, &world, joint).unwrap();
        brake.update(&mut world, 0.25).unwrap();
        assert_eq!(brake.brake_torque(), 1000.0);
        assert_eq!(world.joint(joint).unwrap().brake_torque(), Some(1000.0));

        brake.update(&mut world, 3.0).unwrap();
        assert_eq!(brake.modulation(), 1.0);
    }

    #[test]
    fn only_revolute_joints_take_a_brake() {
        let mut world = SceneWorld::default();
        let a = world.add_body(RigidBody::default());
        let b = world.add_body(RigidBody::default());
        let pose = Transform::default();
        let joint = world
            .add_joint(Joint::spherical("ball", (a, &pose), (b, &pose), Vec3::ZERO))
            .unwrap();
        assert!(matches!(
            Brake::initialize(BrakeParams { max_torque: 10.0 }, &world, joint),
            Err(VehicleError::JointKindMismatch { .. })
        ));
    }
}

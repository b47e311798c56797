//! Interface between the vehicle templates and whatever owns the mechanical state.

use glam::Vec3;

use crate::core::{
    constraints::{Joint, JointReaction},
    rigidbody::RigidBody,
    shafts::{RelationReaction, Shaft, ShaftRelation},
    types::Transform,
};
use crate::dynamics::forces::{SpringDamper, SpringState};
use crate::error::{VehicleError, VehicleResult};
use crate::utils::allocator::{BodyId, JointId, RelationId, ShaftId, SpringId};
use crate::utils::logging::{check_finite, check_finite_vec};

/// Owner of bodies, joints, force elements, shafts and shaft relations.
///
/// Templates only create, query and remove items through this trait; moving
/// the bodies is the implementor's job.
pub trait MechanicalScene {
    fn add_body(&mut self, body: RigidBody) -> BodyId;
    fn remove_body(&mut self, id: BodyId) -> Option<RigidBody>;
    fn body(&self, id: BodyId) -> Option<&RigidBody>;
    fn body_mut(&mut self, id: BodyId) -> Option<&mut RigidBody>;

    /// Fails with [`VehicleError::UnknownHandle`] if either body is missing.
    fn add_joint(&mut self, joint: Joint) -> VehicleResult<JointId>;
    fn remove_joint(&mut self, id: JointId) -> Option<Joint>;
    fn joint(&self, id: JointId) -> Option<&Joint>;
    fn joint_mut(&mut self, id: JointId) -> Option<&mut Joint>;

    fn add_spring(&mut self, spring: SpringDamper) -> VehicleResult<SpringId>;
    fn remove_spring(&mut self, id: SpringId) -> Option<SpringDamper>;
    fn spring(&self, id: SpringId) -> Option<&SpringDamper>;

    fn add_shaft(&mut self, shaft: Shaft) -> ShaftId;
    fn remove_shaft(&mut self, id: ShaftId) -> Option<Shaft>;
    fn shaft(&self, id: ShaftId) -> Option<&Shaft>;
    fn shaft_mut(&mut self, id: ShaftId) -> Option<&mut Shaft>;

    /// Fails with [`VehicleError::UnknownHandle`] if a member is missing.
    fn add_relation(&mut self, relation: ShaftRelation) -> VehicleResult<RelationId>;
    fn remove_relation(&mut self, id: RelationId) -> Option<ShaftRelation>;
    fn relation(&self, id: RelationId) -> Option<&ShaftRelation>;
    fn relation_reaction(&self, id: RelationId) -> VehicleResult<RelationReaction>;

    fn time(&self) -> f32;
    fn step(&mut self, dt: f32) -> VehicleResult<()>;

    fn contains_body(&self, id: BodyId) -> bool {
        self.body(id).is_some()
    }

    fn contains_joint(&self, id: JointId) -> bool {
        self.joint(id).is_some()
    }

    fn contains_spring(&self, id: SpringId) -> bool {
        self.spring(id).is_some()
    }

    fn contains_shaft(&self, id: ShaftId) -> bool {
        self.shaft(id).is_some()
    }

    fn contains_relation(&self, id: RelationId) -> bool {
        self.relation(id).is_some()
    }

    fn body_ref(&self, id: BodyId) -> VehicleResult<&RigidBody> {
        self.body(id).ok_or(VehicleError::UnknownHandle { kind: BodyId::KIND })
    }

    fn body_ref_mut(&mut self, id: BodyId) -> VehicleResult<&mut RigidBody> {
        self.body_mut(id).ok_or(VehicleError::UnknownHandle { kind: BodyId::KIND })
    }

    fn joint_ref(&self, id: JointId) -> VehicleResult<&Joint> {
        self.joint(id).ok_or(VehicleError::UnknownHandle { kind: JointId::KIND })
    }

    fn joint_ref_mut(&mut self, id: JointId) -> VehicleResult<&mut Joint> {
        self.joint_mut(id).ok_or(VehicleError::UnknownHandle { kind: JointId::KIND })
    }

    fn shaft_ref(&self, id: ShaftId) -> VehicleResult<&Shaft> {
        self.shaft(id).ok_or(VehicleError::UnknownHandle { kind: ShaftId::KIND })
    }

    fn body_pose(&self, id: BodyId) -> VehicleResult<Transform> {
        Ok(self.body_ref(id)?.transform)
    }

    fn shaft_speed(&self, id: ShaftId) -> VehicleResult<f32> {
        check_finite("shaft speed", self.shaft_ref(id)?.speed)
    }

    fn apply_shaft_torque(&mut self, id: ShaftId, torque: f32) -> VehicleResult<()> {
        self.shaft_mut(id)
            .ok_or(VehicleError::UnknownHandle { kind: ShaftId::KIND })?
            .apply_torque(torque);
        Ok(())
    }

    /// Length, rate and force of a spring-damper at the current body state.
    fn spring_state(&self, id: SpringId) -> VehicleResult<SpringState> {
        let spring = self
            .spring(id)
            .ok_or(VehicleError::UnknownHandle { kind: SpringId::KIND })?;
        let state = spring.evaluate(self.body_ref(spring.body_a)?, self.body_ref(spring.body_b)?);
        check_finite("spring force", state.force)?;
        check_finite("spring length", state.length)?;
        Ok(state)
    }

    /// Reaction load on body B of a joint, in body B's frame.
    fn joint_reaction(&self, id: JointId) -> VehicleResult<JointReaction> {
        let reaction = self.joint_ref(id)?.reaction;
        check_finite_vec("joint reaction force", reaction.force)?;
        check_finite_vec("joint reaction torque", reaction.torque)?;
        Ok(reaction)
    }

    fn joint_violation(&self, id: JointId) -> VehicleResult<Vec<f32>> {
        let joint = self.joint_ref(id)?;
        let pose_a = self.body_pose(joint.body_a)?;
        let pose_b = self.body_pose(joint.body_b)?;
        Ok(joint.violation(&pose_a, &pose_b))
    }

    /// Replaces a body's force and torque accumulators with a single load at its origin.
    fn set_body_load(&mut self, id: BodyId, force: Vec3, torque: Vec3) -> VehicleResult<()> {
        let body = self.body_ref_mut(id)?;
        body.clear_accumulators();
        let origin = body.transform.position;
        body.apply_force_at_point(force, origin);
        body.apply_torque(torque);
        Ok(())
    }
}

/// Record of every item a subsystem created, so it can be released as a unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OwnedHandles {
    pub bodies: Vec<BodyId>,
    pub joints: Vec<JointId>,
    pub springs: Vec<SpringId>,
    pub shafts: Vec<ShaftId>,
    pub relations: Vec<RelationId>,
}

impl OwnedHandles {
    pub fn add_body(&mut self, scene: &mut dyn MechanicalScene, body: RigidBody) -> BodyId {
        let id = scene.add_body(body);
        self.bodies.push(id);
        id
    }

    pub fn add_joint(&mut self, scene: &mut dyn MechanicalScene, joint: Joint) -> VehicleResult<JointId> {
        let id = scene.add_joint(joint)?;
        self.joints.push(id);
        Ok(id)
    }

    pub fn add_spring(
        &mut self,
        scene: &mut dyn MechanicalScene,
        spring: SpringDamper,
    ) -> VehicleResult<SpringId> {
        let id = scene.add_spring(spring)?;
        self.springs.push(id);
        Ok(id)
    }

    pub fn add_shaft(&mut self, scene: &mut dyn MechanicalScene, shaft: Shaft) -> ShaftId {
        let id = scene.add_shaft(shaft);
        self.shafts.push(id);
        id
    }

    pub fn add_relation(
        &mut self,
        scene: &mut dyn MechanicalScene,
        relation: ShaftRelation,
    ) -> VehicleResult<RelationId> {
        let id = scene.add_relation(relation)?;
        self.relations.push(id);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.bodies.len() + self.joints.len() + self.springs.len() + self.shafts.len() + self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every recorded item is still present in `scene`.
    pub fn all_present(&self, scene: &dyn MechanicalScene) -> bool {
        self.bodies.iter().all(|id| scene.contains_body(*id))
            && self.joints.iter().all(|id| scene.contains_joint(*id))
            && self.springs.iter().all(|id| scene.contains_spring(*id))
            && self.shafts.iter().all(|id| scene.contains_shaft(*id))
            && self.relations.iter().all(|id| scene.contains_relation(*id))
    }

    /// Removes everything, dependents first (relations, springs, joints, shafts, bodies).
    pub fn release(self, scene: &mut dyn MechanicalScene) {
        for id in self.relations.into_iter().rev() {
            scene.remove_relation(id);
        }
        for id in self.springs.into_iter().rev() {
            scene.remove_spring(id);
        }
        for id in self.joints.into_iter().rev() {
            scene.remove_joint(id);
        }
        for id in self.shafts.into_iter().rev() {
            scene.remove_shaft(id);
        }
        for id in self.bodies.into_iter().rev() {
            scene.remove_body(id);
        }
    }
}

#![allow(dead_code)]

use vehicle_templates::{
    core::shafts::RelationReaction,
    dynamics::forces::SpringDamper,
    world::SceneWorld,
    BodyId, Joint, JointId, MassProperties, MechanicalScene, RelationId, RigidBody, Shaft, ShaftId,
    ShaftRelation, SpringId, Transform, Vec3, VehicleError, VehicleResult,
};

pub fn add_chassis(world: &mut SceneWorld, pose: Transform) -> BodyId {
    let mass = MassProperties::new(3521.0, Vec3::new(125.8, 497.4, 531.4)).unwrap();
    world.add_body(RigidBody::new("chassis", pose, mass))
}

/// Scene that starts rejecting joints or relations once a budget is used up.
pub struct FailingScene {
    pub inner: SceneWorld,
    pub joint_budget: usize,
    pub relation_budget: usize,
}

impl FailingScene {
    pub fn new(inner: SceneWorld) -> Self {
        Self {
            inner,
            joint_budget: usize::MAX,
            relation_budget: usize::MAX,
        }
    }
}

impl MechanicalScene for FailingScene {
    fn add_body(&mut self, body: RigidBody) -> BodyId {
        self.inner.add_body(body)
    }

    fn remove_body(&mut self, id: BodyId) -> Option<RigidBody> {
        self.inner.remove_body(id)
    }

    fn body(&self, id: BodyId) -> Option<&RigidBody> {
        self.inner.body(id)
    }

    fn body_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        self.inner.body_mut(id)
    }

    fn add_joint(&mut self, joint: Joint) -> VehicleResult<JointId> {
        if self.joint_budget == 0 {
            return Err(VehicleError::UnknownHandle { kind: "body" });
        }
        self.joint_budget -= 1;
        self.inner.add_joint(joint)
    }

    fn remove_joint(&mut self, id: JointId) -> Option<Joint> {
        self.inner.remove_joint(id)
    }

    fn joint(&self, id: JointId) -> Option<&Joint> {
        self.inner.joint(id)
    }

    fn joint_mut(&mut self, id: JointId) -> Option<&mut Joint> {
        self.inner.joint_mut(id)
    }

    fn add_spring(&mut self, spring: SpringDamper) -> VehicleResult<SpringId> {
        self.inner.add_spring(spring)
    }

    fn remove_spring(&mut self, id: SpringId) -> Option<SpringDamper> {
        self.inner.remove_spring(id)
    }

    fn spring(&self, id: SpringId) -> Option<&SpringDamper> {
        self.inner.spring(id)
    }

    fn add_shaft(&mut self, shaft: Shaft) -> ShaftId {
        self.inner.add_shaft(shaft)
    }

    fn remove_shaft(&mut self, id: ShaftId) -> Option<Shaft> {
        self.inner.remove_shaft(id)
    }

    fn shaft(&self, id: ShaftId) -> Option<&Shaft> {
        self.inner.shaft(id)
    }

    fn shaft_mut(&mut self, id: ShaftId) -> Option<&mut Shaft> {
        self.inner.shaft_mut(id)
    }

    fn add_relation(&mut self, relation: ShaftRelation) -> VehicleResult<RelationId> {
        if self.relation_budget == 0 {
            return Err(VehicleError::UnknownHandle { kind: "shaft" });
        }
        self.relation_budget -= 1;
        self.inner.add_relation(relation)
    }

    fn remove_relation(&mut self, id: RelationId) -> Option<ShaftRelation> {
        self.inner.remove_relation(id)
    }

    fn relation(&self, id: RelationId) -> Option<&ShaftRelation> {
        self.inner.relation(id)
    }

    fn relation_reaction(&self, id: RelationId) -> VehicleResult<RelationReaction> {
        self.inner.relation_reaction(id)
    }

    fn time(&self) -> f32 {
        self.inner.time()
    }

    fn step(&mut self, dt: f32) -> VehicleResult<()> {
        self.inner.step(dt)
    }
}

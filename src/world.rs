pub mod scene;

use std::collections::HashMap;

use glam::Vec3;
use log::warn;

pub use scene::{MechanicalScene, OwnedHandles};

use crate::{
    config::{BRAKE_SLIP_SPEED, DEFAULT_TIME_STEP},
    core::{
        constraints::{Constraint, Joint, JointReaction},
        rigidbody::RigidBody,
        shafts::{RelationMember, RelationReaction, Shaft, ShaftRelation},
    },
    dynamics::{
        forces::SpringDamper,
        shafts::{NetworkDof, NetworkRow, ShaftNetworkSolver, ShaftStepMetrics},
    },
    error::{ensure_positive, VehicleError, VehicleResult},
    utils::{
        allocator::{Arena, BodyId, EntityId, JointId, RelationId, ShaftId, SpringId},
        logging::ScopedTimer,
    },
};

#[derive(Debug, Clone)]
struct RelationSlot {
    relation: ShaftRelation,
    reaction: RelationReaction,
}

/// Network degree of freedom backed by either a shaft or a body spin.
#[derive(Debug, Clone, Copy)]
enum DofSource {
    Shaft(ShaftId),
    BodySpin { body: BodyId, axis: Vec3 },
}

/// Shaft network gathered for one step.
struct Network {
    sources: Vec<DofSource>,
    dofs: Vec<NetworkDof>,
    rows: Vec<NetworkRow>,
    /// Brake friction torque on body B of each braked revolute, body-B frame.
    brake_reactions: Vec<(EntityId, Vec3)>,
}

/// Reference scene: stores every mechanical item and integrates the shaft network.
///
/// Body poses and velocities are left to an external rigid-body solver; the
/// only body state changed by [`SceneWorld::step`] is the spin of bodies
/// coupled to shafts. Joint reactions carry the brake friction applied in the
/// last step.
#[derive(Debug, Clone)]
pub struct SceneWorld {
    bodies: Arena<RigidBody>,
    joints: Arena<Joint>,
    springs: Arena<SpringDamper>,
    shafts: Arena<Shaft>,
    relations: Arena<RelationSlot>,
    solver: ShaftNetworkSolver,
    time: f32,
    time_step: f32,
}

impl Default for SceneWorld {
    fn default() -> Self {
        Self::with_step(DEFAULT_TIME_STEP)
    }
}

impl SceneWorld {
    /// Empty scene advancing by `time_step` seconds per [`SceneWorld::advance`].
    pub fn new(time_step: f32) -> VehicleResult<Self> {
        ensure_positive("time_step", time_step)?;
        Ok(Self::with_step(time_step))
    }

    fn with_step(time_step: f32) -> Self {
        Self {
            bodies: Arena::new(),
            joints: Arena::new(),
            springs: Arena::new(),
            shafts: Arena::new(),
            relations: Arena::new(),
            solver: ShaftNetworkSolver::new(),
            time: 0.0,
            time_step,
        }
    }

    pub fn time_step(&self) -> f32 {
        self.time_step
    }

    /// Steps by the configured time step.
    pub fn advance(&mut self) -> VehicleResult<()> {
        self.step(self.time_step)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn spring_count(&self) -> usize {
        self.springs.len()
    }

    pub fn shaft_count(&self) -> usize {
        self.shafts.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
            && self.joints.is_empty()
            && self.springs.is_empty()
            && self.shafts.is_empty()
            && self.relations.is_empty()
    }

    pub fn body_ids(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.bodies.ids().map(BodyId::from)
    }

    pub fn joint_ids(&self) -> impl Iterator<Item = JointId> + '_ {
        self.joints.ids().map(JointId::from)
    }

    pub fn last_shaft_metrics(&self) -> ShaftStepMetrics {
        self.solver.last_metrics()
    }

    fn spin_axis(&self, body: BodyId, local_dir: Vec3) -> VehicleResult<Vec3> {
        Ok(self.body_ref(body)?.transform.transform_vector(local_dir))
    }

    /// Brake friction on every shaft-coupled spin, from revolute joints carrying a brake torque.
    ///
    /// Returns the torque added to each network dof and the friction torque
    /// each braked joint exerts on its body B.
    fn brake_torques(
        &self,
        dofs: &[(DofSource, NetworkDof)],
        spin_index: &HashMap<BodyId, usize>,
        dt: f32,
    ) -> (Vec<f64>, Vec<(EntityId, Vec3)>) {
        let mut torques = vec![0.0_f64; dofs.len()];
        let mut reactions = Vec::new();
        for (joint_id, joint) in self.joints.iter() {
            let Constraint::Revolute {
                local_axis_a,
                brake_torque,
                ..
            } = joint.constraint
            else {
                continue;
            };
            if brake_torque <= 0.0 {
                continue;
            }
            let (Some(body_a), Some(body_b)) = (
                self.bodies.get(joint.body_a.entity()),
                self.bodies.get(joint.body_b.entity()),
            ) else {
                continue;
            };
            let axis = body_a.transform.transform_vector(local_axis_a);
            let relative = (body_b.velocity.angular - body_a.velocity.angular).dot(axis);
            let scale = (relative / BRAKE_SLIP_SPEED).clamp(-1.0, 1.0);

            let coupled = [(joint.body_b, 1.0_f32), (joint.body_a, -1.0)]
                .map(|(body, sign)| spin_index.get(&body).map(|&index| (index, sign)));
            // never reverse the relative spin within one step
            let magnitude = coupled
                .iter()
                .flatten()
                .map(|&(index, _)| relative.abs() * dofs[index].1.inertia as f32 / dt)
                .fold(brake_torque * scale.abs(), f32::min);

            for (index, sign) in coupled.into_iter().flatten() {
                torques[index] += f64::from(-sign * scale.signum() * magnitude);
            }
            let on_b = axis * (-scale.signum() * magnitude);
            reactions.push((joint_id, body_b.transform.inverse_transform_vector(on_b)));
        }
        (torques, reactions)
    }

    fn collect_network(&self, dt: f32) -> VehicleResult<Network> {
        let mut shaft_index: HashMap<ShaftId, usize> = HashMap::new();
        let mut spin_index: HashMap<BodyId, usize> = HashMap::new();
        let mut dofs: Vec<(DofSource, NetworkDof)> = Vec::new();

        for (id, shaft) in self.shafts.iter() {
            let id = ShaftId::from(id);
            shaft_index.insert(id, dofs.len());
            dofs.push((
                DofSource::Shaft(id),
                NetworkDof {
                    inertia: f64::from(shaft.inertia()),
                    speed: f64::from(shaft.speed),
                    torque: f64::from(shaft.applied_torque),
                },
            ));
        }

        for (_, slot) in self.relations.iter() {
            for (member, _) in slot.relation.jacobian() {
                let RelationMember::BodySpin { body, local_dir } = member else {
                    continue;
                };
                if spin_index.contains_key(&body) {
                    continue;
                }
                let rigid = self.body_ref(body)?;
                let axis = self.spin_axis(body, local_dir)?;
                let inertia = axis.dot(rigid.world_inertia() * axis);
                if !(inertia.is_finite() && inertia > 0.0) {
                    return Err(VehicleError::non_finite(format!("spin inertia of {}", rigid.name)));
                }
                spin_index.insert(body, dofs.len());
                dofs.push((
                    DofSource::BodySpin { body, axis },
                    NetworkDof {
                        inertia: f64::from(inertia),
                        speed: f64::from(rigid.velocity.angular.dot(axis)),
                        torque: f64::from(rigid.accumulated_torque.dot(axis)),
                    },
                ));
            }
        }

        let (brakes, brake_reactions) = self.brake_torques(&dofs, &spin_index, dt);
        for ((_, dof), brake) in dofs.iter_mut().zip(brakes) {
            dof.torque += brake;
        }

        let mut rows = Vec::with_capacity(self.relations.len());
        for (_, slot) in self.relations.iter() {
            let entries = slot
                .relation
                .jacobian()
                .into_iter()
                .map(|(member, c)| {
                    let index = match member {
                        RelationMember::Shaft(id) => shaft_index.get(&id).copied(),
                        RelationMember::BodySpin { body, .. } => spin_index.get(&body).copied(),
                    };
                    index
                        .map(|i| (i, f64::from(c)))
                        .ok_or(VehicleError::UnknownHandle { kind: ShaftId::KIND })
                })
                .collect::<VehicleResult<Vec<_>>>()?;
            rows.push(NetworkRow { entries });
        }

        let (sources, dofs): (Vec<_>, Vec<_>) = dofs.into_iter().unzip();
        Ok(Network {
            sources,
            dofs,
            rows,
            brake_reactions,
        })
    }

    fn clear_loads(&mut self) {
        for (_, body) in self.bodies.iter_mut() {
            body.clear_accumulators();
        }
        for (_, shaft) in self.shafts.iter_mut() {
            shaft.applied_torque = 0.0;
        }
    }
}

impl MechanicalScene for SceneWorld {
    fn add_body(&mut self, body: RigidBody) -> BodyId {
        BodyId::from(self.bodies.insert(body))
    }

    fn remove_body(&mut self, id: BodyId) -> Option<RigidBody> {
        self.bodies.remove(id.entity())
    }

    fn body(&self, id: BodyId) -> Option<&RigidBody> {
        self.bodies.get(id.entity())
    }

    fn body_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        self.bodies.get_mut(id.entity())
    }

    fn add_joint(&mut self, joint: Joint) -> VehicleResult<JointId> {
        if !self.contains_body(joint.body_a) || !self.contains_body(joint.body_b) {
            return Err(VehicleError::UnknownHandle { kind: BodyId::KIND });
        }
        Ok(JointId::from(self.joints.insert(joint)))
    }

    fn remove_joint(&mut self, id: JointId) -> Option<Joint> {
        self.joints.remove(id.entity())
    }

    fn joint(&self, id: JointId) -> Option<&Joint> {
        self.joints.get(id.entity())
    }

    fn joint_mut(&mut self, id: JointId) -> Option<&mut Joint> {
        self.joints.get_mut(id.entity())
    }

    fn add_spring(&mut self, spring: SpringDamper) -> VehicleResult<SpringId> {
        if !self.contains_body(spring.body_a) || !self.contains_body(spring.body_b) {
            return Err(VehicleError::UnknownHandle { kind: BodyId::KIND });
        }
        Ok(SpringId::from(self.springs.insert(spring)))
    }

    fn remove_spring(&mut self, id: SpringId) -> Option<SpringDamper> {
        self.springs.remove(id.entity())
    }

    fn spring(&self, id: SpringId) -> Option<&SpringDamper> {
        self.springs.get(id.entity())
    }

    fn add_shaft(&mut self, shaft: Shaft) -> ShaftId {
        ShaftId::from(self.shafts.insert(shaft))
    }

    fn remove_shaft(&mut self, id: ShaftId) -> Option<Shaft> {
        self.shafts.remove(id.entity())
    }

    fn shaft(&self, id: ShaftId) -> Option<&Shaft> {
        self.shafts.get(id.entity())
    }

    fn shaft_mut(&mut self, id: ShaftId) -> Option<&mut Shaft> {
        self.shafts.get_mut(id.entity())
    }

    fn add_relation(&mut self, relation: ShaftRelation) -> VehicleResult<RelationId> {
        if let Some(missing) = relation.shafts().into_iter().find(|id| !self.contains_shaft(*id)) {
            warn!("relation references missing shaft {:?}", missing);
            return Err(VehicleError::UnknownHandle { kind: ShaftId::KIND });
        }
        if relation.bodies().into_iter().any(|id| !self.contains_body(id)) {
            return Err(VehicleError::UnknownHandle { kind: BodyId::KIND });
        }
        let reaction = RelationReaction {
            member_torques: vec![0.0; relation.jacobian().len()],
            truss_torque: Vec3::ZERO,
        };
        Ok(RelationId::from(self.relations.insert(RelationSlot { relation, reaction })))
    }

    fn remove_relation(&mut self, id: RelationId) -> Option<ShaftRelation> {
        self.relations.remove(id.entity()).map(|slot| slot.relation)
    }

    fn relation(&self, id: RelationId) -> Option<&ShaftRelation> {
        self.relations.get(id.entity()).map(|slot| &slot.relation)
    }

    fn relation_reaction(&self, id: RelationId) -> VehicleResult<RelationReaction> {
        let slot = self
            .relations
            .get(id.entity())
            .ok_or(VehicleError::UnknownHandle { kind: RelationId::KIND })?;
        if slot.reaction.member_torques.iter().any(|t| !t.is_finite()) {
            warn!("non-finite reaction torque in shaft relation");
            return Err(VehicleError::non_finite("relation reaction"));
        }
        Ok(slot.reaction.clone())
    }

    fn time(&self) -> f32 {
        self.time
    }

    /// Integrates the shaft network over `dt`, then clears all applied loads.
    fn step(&mut self, dt: f32) -> VehicleResult<()> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(VehicleError::invalid_parameter("dt", dt, "time step must be positive"));
        }
        let _timer = ScopedTimer::new("scene::step");

        let Network {
            sources,
            dofs,
            rows,
            brake_reactions,
        } = self.collect_network(dt)?;
        let solution = self.solver.solve(&dofs, &rows, f64::from(dt))?;
        if let Some(bad) = solution.speeds.iter().position(|w| !w.is_finite()) {
            warn!("shaft network produced a non-finite speed at dof {bad}");
            return Err(VehicleError::non_finite("shaft speed"));
        }

        for (source, (&speed, dof)) in sources.iter().zip(solution.speeds.iter().zip(&dofs)) {
            match *source {
                DofSource::Shaft(id) => {
                    if let Some(shaft) = self.shafts.get_mut(id.entity()) {
                        shaft.speed = speed as f32;
                        shaft.angle += shaft.speed * dt;
                    }
                }
                DofSource::BodySpin { body, axis } => {
                    if let Some(rigid) = self.bodies.get_mut(body.entity()) {
                        rigid.velocity.angular += axis * (speed - dof.speed) as f32;
                    }
                }
            }
        }

        for ((_, slot), torques) in self.relations.iter_mut().zip(&solution.row_torques) {
            slot.reaction.member_torques = torques.iter().map(|t| -(*t as f32)).collect();
            slot.reaction.truss_torque = match slot.relation {
                ShaftRelation::GearboxAngled {
                    input_dir,
                    output_dir,
                    ..
                } => -(input_dir * torques[0] as f32 + output_dir * torques[1] as f32),
                _ => Vec3::ZERO,
            };
        }

        for (_, joint) in self.joints.iter_mut() {
            joint.reaction = JointReaction::default();
        }
        for (id, torque) in brake_reactions {
            if let Some(joint) = self.joints.get_mut(id) {
                joint.reaction.torque = torque;
            }
        }

        self.clear_loads();
        self.time += dt;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{MassProperties, Transform};
    use approx::assert_relative_eq;

    #[test]
    fn joints_require_live_bodies() {
        let mut world = SceneWorld::default();
        let a = world.add_body(RigidBody::default());
        let b = world.add_body(RigidBody::default());
        let pose = Transform::default();
        let joint = Joint::spherical("ball", (a, &pose), (b, &pose), Vec3::ZERO);
        world.remove_body(b);
        assert_eq!(
            world.add_joint(joint),
            Err(VehicleError::UnknownHandle { kind: "body" })
        );
    }

    #[test]
    fn coupled_body_spin_follows_shaft() {
        let mut world = SceneWorld::new(0.01).unwrap();
        let wheel = world.add_body(RigidBody::new(
            "wheel",
            Transform::default(),
            MassProperties::new(10.0, Vec3::new(1.0, 2.0, 1.0)).unwrap(),
        ));
        let shaft = world.add_shaft(Shaft::new("axle", 0.5).unwrap());
        world
            .add_relation(ShaftRelation::body_coupling(shaft, wheel, Vec3::Y).unwrap())
            .unwrap();

        world.apply_shaft_torque(shaft, 25.0).unwrap();
        world.advance().unwrap();

        let expected = 0.01 * 25.0 / 2.5;
        assert_relative_eq!(world.shaft_speed(shaft).unwrap(), expected, epsilon = 1e-6);
        assert_relative_eq!(world.body(wheel).unwrap().velocity.angular.y, expected, epsilon = 1e-6);
        assert_relative_eq!(world.time(), 0.01);
        assert!(world.last_shaft_metrics().max_residual < 1e-9);
        assert_eq!(world.body_ids().collect::<Vec<_>>(), vec![wheel]);
        assert_eq!(world.joint_ids().count(), 0);
    }

    #[test]
    fn rejects_invalid_time_steps() {
        let mut world = SceneWorld::default();
        assert!(world.step(0.0).is_err());
        assert!(world.step(f32::NAN).is_err());
        assert!(matches!(SceneWorld::new(0.0), Err(VehicleError::InvalidParameter { .. })));
        assert!(SceneWorld::new(f32::INFINITY).is_err());
    }
}

//! Suspension templates: hardpoint tables in, bodies, joints and springs out.
//!
//! Each [`SuspensionKind`] carries its parameter object; the construction
//! algorithm for one side is shared between the two sides and only the
//! (mirrored) hardpoints differ.

pub mod double_wishbone;
pub mod solid_axle;

use std::collections::BTreeMap;

use glam::Vec3;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

pub use double_wishbone::{DoubleWishboneParams, DoubleWishbonePoint};
pub use solid_axle::{SolidAxleParams, SolidAxlePoint};

use crate::core::{
    constraints::{Joint, JointKind},
    rigidbody::RigidBody,
    shafts::{Shaft, ShaftRelation},
    types::{MassProperties, Side, TireForce, Transform, VisualShape},
};
use crate::dynamics::forces::{SpringCoefficients, SpringDamper};
use crate::error::{ensure_positive, VehicleError, VehicleResult};
use crate::utils::allocator::{BodyId, JointId, RelationId, ShaftId, SpringId};
use crate::utils::logging::check_finite_vec;
use crate::world::scene::{MechanicalScene, OwnedHandles};

/// Mass, inertia and visual radius of one suspension body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyParams {
    pub mass: f32,
    /// Principal moments about the body axes (aligned with the chassis).
    pub inertia: Vec3,
    /// Radius used for primitive visualization.
    pub radius: f32,
}

impl BodyParams {
    pub fn new(mass: f32, inertia: Vec3, radius: f32) -> Self {
        Self {
            mass,
            inertia,
            radius,
        }
    }

    pub fn mass_properties(&self) -> VehicleResult<MassProperties> {
        MassProperties::new(self.mass, self.inertia)
    }

    pub fn validate(&self, name: &str) -> VehicleResult<()> {
        self.mass_properties().map_err(|err| match err {
            VehicleError::InvalidParameter {
                name: field,
                value,
                reason,
            } => VehicleError::InvalidParameter {
                name: format!("{name}.{field}"),
                value,
                reason,
            },
            other => other,
        })?;
        ensure_positive(&format!("{name}.radius"), self.radius)?;
        Ok(())
    }
}

/// Data-driven suspension variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SuspensionKind {
    SolidAxle(SolidAxleParams),
    DoubleWishboneReduced(DoubleWishboneParams),
}

impl SuspensionKind {
    pub fn label(&self) -> &'static str {
        match self {
            SuspensionKind::SolidAxle(_) => "solid axle",
            SuspensionKind::DoubleWishboneReduced(_) => "reduced double wishbone",
        }
    }

    pub fn validate(&self) -> VehicleResult<()> {
        match self {
            SuspensionKind::SolidAxle(params) => params.validate(),
            SuspensionKind::DoubleWishboneReduced(params) => params.validate(),
        }
    }
}

/// Validated, not-yet-placed suspension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspensionTemplate {
    pub name: String,
    pub steerable: bool,
    pub driven: bool,
    pub kind: SuspensionKind,
}

impl SuspensionTemplate {
    pub fn new(name: impl Into<String>, steerable: bool, driven: bool, kind: SuspensionKind) -> VehicleResult<Self> {
        kind.validate()?;
        Ok(Self {
            name: name.into(),
            steerable,
            driven,
            kind,
        })
    }

    /// Builds both sides at `location` (chassis frame).
    ///
    /// On failure everything created so far is removed from the scene again.
    pub fn initialize(
        &self,
        scene: &mut dyn MechanicalScene,
        chassis: BodyId,
        location: Vec3,
    ) -> VehicleResult<Suspension> {
        let chassis_pose = scene
            .body(chassis)
            .map(|body| body.transform)
            .ok_or(VehicleError::ChassisNotAttached)?;
        check_finite_vec("suspension location", location)?;

        let mut assembly = Assembly {
            scene,
            owned: OwnedHandles::default(),
            prefix: self.name.clone(),
            chassis,
            chassis_pose,
            location,
        };

        let built = match &self.kind {
            SuspensionKind::SolidAxle(params) => solid_axle::build(&mut assembly, params, self.driven),
            SuspensionKind::DoubleWishboneReduced(params) => {
                double_wishbone::build(&mut assembly, params, self.driven)
            }
        };

        match built {
            Ok(sides) => {
                debug!(
                    "initialized {} suspension `{}` ({} bodies, {} joints)",
                    self.kind.label(),
                    self.name,
                    assembly.owned.bodies.len(),
                    assembly.owned.joints.len()
                );
                Ok(Suspension {
                    name: self.name.clone(),
                    kind: self.kind.label(),
                    steerable: self.steerable,
                    driven: self.driven,
                    chassis,
                    location,
                    sides,
                    owned: assembly.owned,
                })
            }
            Err(err) => {
                warn!("initialization of suspension `{}` failed: {err}", self.name);
                let Assembly { scene, owned, .. } = assembly;
                owned.release(scene);
                Err(err)
            }
        }
    }
}

/// Scene-building context shared by the per-kind construction routines.
pub(crate) struct Assembly<'a> {
    pub(crate) scene: &'a mut dyn MechanicalScene,
    pub(crate) owned: OwnedHandles,
    prefix: String,
    pub(crate) chassis: BodyId,
    pub(crate) chassis_pose: Transform,
    location: Vec3,
}

impl Assembly<'_> {
    /// Suspension-frame point to world frame.
    pub(crate) fn global(&self, local: Vec3) -> Vec3 {
        self.chassis_pose.transform_point(self.location + local)
    }

    /// World point to chassis frame.
    pub(crate) fn chassis_local(&self, world: Vec3) -> Vec3 {
        self.chassis_pose.inverse_transform_point(world)
    }

    pub(crate) fn name(&self, part: &str, side: Option<Side>) -> String {
        match side {
            Some(side) => format!("{}_{}{}", self.prefix, part, side.suffix()),
            None => format!("{}_{}", self.prefix, part),
        }
    }

    pub(crate) fn pose(&self, body: BodyId) -> VehicleResult<Transform> {
        self.scene.body_pose(body)
    }

    /// Adds a body at a world position, aligned with the chassis; `shapes` receives the body pose.
    pub(crate) fn add_body(
        &mut self,
        name: String,
        position: Vec3,
        params: &BodyParams,
        shapes: impl FnOnce(&Transform) -> Vec<VisualShape>,
    ) -> VehicleResult<BodyId> {
        let transform = Transform::new(position, self.chassis_pose.rotation);
        let mut body = RigidBody::new(name, transform, params.mass_properties()?);
        body.shapes = shapes(&transform);
        Ok(self.owned.add_body(self.scene, body))
    }

    pub(crate) fn revolute(&mut self, name: String, a: BodyId, b: BodyId, anchor: Vec3, axis: Vec3) -> VehicleResult<JointId> {
        let (pa, pb) = (self.pose(a)?, self.pose(b)?);
        let joint = Joint::revolute(name, (a, &pa), (b, &pb), anchor, axis)?;
        self.owned.add_joint(self.scene, joint)
    }

    pub(crate) fn spherical(&mut self, name: String, a: BodyId, b: BodyId, anchor: Vec3) -> VehicleResult<JointId> {
        let (pa, pb) = (self.pose(a)?, self.pose(b)?);
        let joint = Joint::spherical(name, (a, &pa), (b, &pb), anchor);
        self.owned.add_joint(self.scene, joint)
    }

    pub(crate) fn universal(
        &mut self,
        name: String,
        a: BodyId,
        b: BodyId,
        anchor: Vec3,
        (axis_a, axis_b): (Vec3, Vec3),
    ) -> VehicleResult<JointId> {
        let (pa, pb) = (self.pose(a)?, self.pose(b)?);
        let joint = Joint::universal(name, (a, &pa), (b, &pb), anchor, axis_a, axis_b)?;
        self.owned.add_joint(self.scene, joint)
    }

    pub(crate) fn distance(&mut self, name: String, a: BodyId, point_a: Vec3, b: BodyId, point_b: Vec3) -> VehicleResult<JointId> {
        let (pa, pb) = (self.pose(a)?, self.pose(b)?);
        let joint = Joint::distance(name, (a, &pa), (b, &pb), point_a, point_b)?;
        self.owned.add_joint(self.scene, joint)
    }

    pub(crate) fn spring(
        &mut self,
        name: String,
        a: BodyId,
        point_a: Vec3,
        b: BodyId,
        point_b: Vec3,
        coefficients: SpringCoefficients,
    ) -> VehicleResult<SpringId> {
        let (pa, pb) = (self.pose(a)?, self.pose(b)?);
        let spring = SpringDamper::new(name, (a, &pa), (b, &pb), point_a, point_b, coefficients)?;
        self.owned.add_spring(self.scene, spring)
    }

    /// Records `world` as a hardpoint carried by `body`.
    pub(crate) fn anchor(&self, name: &'static str, body: BodyId, world: Vec3) -> VehicleResult<HardpointAnchor> {
        Ok(HardpointAnchor {
            name,
            body,
            local: self.pose(body)?.inverse_transform_point(world),
        })
    }

    /// Axle shaft rigidly coupled to the spin of `spindle` about its Y axis.
    pub(crate) fn axle_shaft(&mut self, side: Side, spindle: BodyId, inertia: f32) -> VehicleResult<(ShaftId, RelationId)> {
        let shaft = Shaft::new(self.name("axle", Some(side)), inertia)?;
        let shaft = self.owned.add_shaft(self.scene, shaft);
        let coupling = ShaftRelation::body_coupling(shaft, spindle, Vec3::Y)?;
        let coupling = self.owned.add_relation(self.scene, coupling)?;
        Ok((shaft, coupling))
    }
}

/// Visual cylinder between two world points, in the frame of `pose`.
pub(crate) fn cylinder(pose: &Transform, p1: Vec3, p2: Vec3, radius: f32) -> VisualShape {
    VisualShape::Cylinder {
        p1: pose.inverse_transform_point(p1),
        p2: pose.inverse_transform_point(p2),
        radius,
    }
}

/// Spindle disc centered on the body origin, along its Y axis.
pub(crate) fn spindle_shape(radius: f32, width: f32) -> VisualShape {
    VisualShape::Cylinder {
        p1: Vec3::new(0.0, 0.5 * width, 0.0),
        p2: Vec3::new(0.0, -0.5 * width, 0.0),
        radius,
    }
}

/// A hardpoint rigidly attached to one body, kept for location reports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HardpointAnchor {
    pub name: &'static str,
    pub body: BodyId,
    pub local: Vec3,
}

/// Handles owned by one side of a suspension.
#[derive(Debug, Clone, PartialEq)]
pub struct SuspensionSide {
    pub spindle: BodyId,
    /// Knuckle (solid axle) or upright (double wishbone).
    pub steered_body: BodyId,
    pub spindle_revolute: JointId,
    pub tierod: JointId,
    /// Chassis-frame tie-rod anchor at zero steering.
    pub tierod_marker: Vec3,
    pub spring: SpringId,
    pub axle_shaft: Option<ShaftId>,
    pub axle_coupling: Option<RelationId>,
    pub joints: Vec<JointId>,
    pub anchors: Vec<HardpointAnchor>,
}

/// Left and right axle shafts of a driven suspension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxleShafts {
    pub left: ShaftId,
    pub right: ShaftId,
}

/// Current location of one hardpoint relative to a reference point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HardpointLocation {
    pub side: Side,
    pub name: &'static str,
    pub offset: Vec3,
}

/// Residuals of one joint.
#[derive(Debug, Clone, PartialEq)]
pub struct JointViolation {
    pub name: String,
    pub kind: JointKind,
    pub residual: Vec<f32>,
}

impl JointViolation {
    pub fn max_abs(&self) -> f32 {
        self.residual.iter().fold(0.0, |acc, r| acc.max(r.abs()))
    }
}

/// Body/joint bookkeeping of a subsystem.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    pub bodies: usize,
    pub joints: BTreeMap<JointKind, usize>,
    pub constrained_dofs: usize,
}

impl Topology {
    pub fn joint_count(&self) -> usize {
        self.joints.values().sum()
    }

    pub fn joints_of(&self, kind: JointKind) -> usize {
        self.joints.get(&kind).copied().unwrap_or(0)
    }

    /// Grübler count with every external body treated as ground.
    pub fn mobility(&self) -> isize {
        6 * self.bodies as isize - self.constrained_dofs as isize
    }
}

/// An initialized suspension: both sides placed in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Suspension {
    name: String,
    kind: &'static str,
    steerable: bool,
    driven: bool,
    chassis: BodyId,
    location: Vec3,
    sides: [SuspensionSide; 2],
    owned: OwnedHandles,
}

impl Suspension {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind_label(&self) -> &'static str {
        self.kind
    }

    pub fn is_steerable(&self) -> bool {
        self.steerable
    }

    pub fn is_driven(&self) -> bool {
        self.driven
    }

    pub fn chassis(&self) -> BodyId {
        self.chassis
    }

    pub fn location(&self) -> Vec3 {
        self.location
    }

    pub fn side(&self, side: Side) -> &SuspensionSide {
        &self.sides[side.index()]
    }

    pub fn spindle(&self, side: Side) -> BodyId {
        self.side(side).spindle
    }

    pub fn spindle_revolute(&self, side: Side) -> JointId {
        self.side(side).spindle_revolute
    }

    pub fn axle_shaft(&self, side: Side) -> Option<ShaftId> {
        self.side(side).axle_shaft
    }

    pub fn owned(&self) -> &OwnedHandles {
        &self.owned
    }

    /// Shafts the driveline attaches to; only available on a driven suspension.
    pub fn axle_shafts(&self) -> VehicleResult<AxleShafts> {
        match (self.axle_shaft(Side::Left), self.axle_shaft(Side::Right)) {
            (Some(left), Some(right)) => Ok(AxleShafts { left, right }),
            _ => Err(VehicleError::NotDriven {
                name: self.name.clone(),
            }),
        }
    }

    /// Moves the chassis end of both tie rods by `displ` along the chassis Y axis.
    pub fn apply_steering(&self, scene: &mut dyn MechanicalScene, displ: f32) -> VehicleResult<()> {
        self.check_steering(scene, displ)?;
        for side in &self.sides {
            scene
                .joint_ref_mut(side.tierod)?
                .set_local_anchor_b(side.tierod_marker + Vec3::new(0.0, displ, 0.0));
        }
        Ok(())
    }

    /// Everything [`Suspension::apply_steering`] checks, without applying it.
    pub fn check_steering(&self, scene: &dyn MechanicalScene, displ: f32) -> VehicleResult<()> {
        if !self.steerable {
            return Err(VehicleError::NotSteerable {
                name: self.name.clone(),
            });
        }
        if !displ.is_finite() {
            return Err(VehicleError::NonFiniteInput {
                name: "steering displacement",
                value: displ,
            });
        }
        for side in &self.sides {
            scene.joint_ref(side.tierod)?;
        }
        Ok(())
    }

    /// Replaces the spindle load with the tire force and moment.
    pub fn apply_tire_force(&self, scene: &mut dyn MechanicalScene, side: Side, tire: &TireForce) -> VehicleResult<()> {
        scene.set_body_load(self.spindle(side), tire.force, tire.moment)
    }

    pub fn spring_force(&self, scene: &dyn MechanicalScene, side: Side) -> VehicleResult<f32> {
        Ok(scene.spring_state(self.side(side).spring)?.force)
    }

    pub fn spring_length(&self, scene: &dyn MechanicalScene, side: Side) -> VehicleResult<f32> {
        Ok(scene.spring_state(self.side(side).spring)?.length)
    }

    /// Spin rate of the spindle about its own axle.
    pub fn spindle_omega(&self, scene: &dyn MechanicalScene, side: Side) -> VehicleResult<f32> {
        if let Some(shaft) = self.axle_shaft(side) {
            return scene.shaft_speed(shaft);
        }
        let body = scene.body_ref(self.spindle(side))?;
        let axis = body.transform.transform_vector(Vec3::Y);
        Ok(body.velocity.angular.dot(axis))
    }

    /// Current hardpoint locations of both sides relative to `reference` (world frame).
    pub fn hardpoints_relative_to(&self, scene: &dyn MechanicalScene, reference: Vec3) -> VehicleResult<Vec<HardpointLocation>> {
        let mut locations = Vec::new();
        for side in Side::ALL {
            for anchor in &self.side(side).anchors {
                let pose = scene.body_pose(anchor.body)?;
                locations.push(HardpointLocation {
                    side,
                    name: anchor.name,
                    offset: pose.transform_point(anchor.local) - reference,
                });
            }
        }
        Ok(locations)
    }

    /// Residuals of every joint on one side.
    pub fn constraint_violations(&self, scene: &dyn MechanicalScene, side: Side) -> VehicleResult<Vec<JointViolation>> {
        self.side(side)
            .joints
            .iter()
            .map(|&id| {
                let joint = scene.joint_ref(id)?;
                Ok(JointViolation {
                    name: joint.name.clone(),
                    kind: joint.kind(),
                    residual: scene.joint_violation(id)?,
                })
            })
            .collect()
    }

    pub fn topology(&self, scene: &dyn MechanicalScene) -> VehicleResult<Topology> {
        owned_topology(scene, &self.owned)
    }

    /// Removes every body, joint, spring, shaft and relation this suspension created.
    pub fn release(self, scene: &mut dyn MechanicalScene) {
        debug!("releasing suspension `{}`", self.name);
        self.owned.release(scene);
    }
}

pub(crate) fn owned_topology(scene: &dyn MechanicalScene, owned: &OwnedHandles) -> VehicleResult<Topology> {
    let mut topology = Topology {
        bodies: owned.bodies.len(),
        ..Topology::default()
    };
    for &id in &owned.joints {
        let kind = scene.joint_ref(id)?.kind();
        *topology.joints.entry(kind).or_insert(0) += 1;
        topology.constrained_dofs += kind.constrained_dofs();
    }
    Ok(topology)
}

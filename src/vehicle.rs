//! Vehicle assembly: chassis, two suspensions, driveline, powertrain, wheels and brakes.
//!
//! [`Vehicle::initialize`] wires the subsystems together in dependency order and
//! [`Vehicle::update`] distributes driver inputs and tire forces once per step.

pub mod brake;
pub mod driveline;
pub mod driver;
pub mod hardpoints;
pub mod powertrain;
pub mod report;
pub mod suspension;
pub mod wheel;

use std::fmt::Write;

use glam::{Quat, Vec3};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

pub use brake::{Brake, BrakeParams};
pub use driveline::{DriveType, Driveline, DrivelineParams, DrivelineTemplate};
pub use driver::{Driver, DriverInputs, Schedule, ScriptedDriver};
pub use hardpoints::{Hardpoint, HardpointTable};
pub use powertrain::{DriveMode, Powertrain, PowertrainParams};
pub use report::{DebugSections, LengthUnit};
pub use suspension::{Suspension, SuspensionKind, SuspensionTemplate, Topology};
pub use wheel::{Wheel, WheelParams};

use crate::core::{
    rigidbody::RigidBody,
    types::{Axle, MassProperties, TireForce, Transform, VisualShape, WheelId},
};
use crate::error::{ensure_positive, VehicleError, VehicleResult};
use crate::utils::allocator::BodyId;
use crate::utils::logging::{check_finite, check_finite_vec, ScopedTimer};
use crate::world::scene::{MechanicalScene, OwnedHandles};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChassisParams {
    pub mass: f32,
    /// Principal moments about the chassis axes.
    pub inertia: Vec3,
    /// Center of mass in the chassis reference frame.
    pub com: Vec3,
    /// Half extents of the box drawn around the center of mass.
    pub half_extents: Vec3,
}

impl ChassisParams {
    pub fn validate(&self) -> VehicleResult<()> {
        MassProperties::new(self.mass, self.inertia)?;
        check_finite_vec("chassis.com", self.com)?;
        ensure_positive("chassis.half_extents.x", self.half_extents.x)?;
        ensure_positive("chassis.half_extents.y", self.half_extents.y)?;
        ensure_positive("chassis.half_extents.z", self.half_extents.z)?;
        Ok(())
    }
}

/// Complete description of a four-wheeled vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleParams {
    pub name: String,
    pub chassis: ChassisParams,
    pub front: SuspensionTemplate,
    /// Front suspension origin in the chassis frame.
    pub front_location: Vec3,
    pub rear: SuspensionTemplate,
    pub rear_location: Vec3,
    pub driveline: DrivelineTemplate,
    pub powertrain: PowertrainParams,
    pub wheel: WheelParams,
    pub brake: BrakeParams,
    /// Tie-rod displacement at full steering input, m.
    pub steering_gain: f32,
}

impl VehicleParams {
    pub fn suspension(&self, axle: Axle) -> &SuspensionTemplate {
        match axle {
            Axle::Front => &self.front,
            Axle::Rear => &self.rear,
        }
    }

    pub fn validate(&self) -> VehicleResult<()> {
        self.chassis.validate()?;
        self.front.kind.validate()?;
        self.rear.kind.validate()?;
        check_finite_vec("front_location", self.front_location)?;
        check_finite_vec("rear_location", self.rear_location)?;
        self.driveline.params.validate()?;
        self.powertrain.validate()?;
        self.wheel.validate()?;
        self.brake.validate()?;
        ensure_positive("steering_gain", self.steering_gain)?;

        let driven = self.suspension(self.driveline.params.drive_type.driven_axle());
        if !driven.driven {
            return Err(VehicleError::NotDriven {
                name: driven.name.clone(),
            });
        }
        Ok(())
    }
}

/// Subsystems built so far; released together when initialization fails.
#[derive(Default)]
struct Partial {
    chassis: OwnedHandles,
    front: Option<Suspension>,
    rear: Option<Suspension>,
    driveline: Option<Driveline>,
}

impl Partial {
    fn release(self, scene: &mut dyn MechanicalScene) {
        if let Some(driveline) = self.driveline {
            driveline.release(scene);
        }
        if let Some(rear) = self.rear {
            rear.release(scene);
        }
        if let Some(front) = self.front {
            front.release(scene);
        }
        self.chassis.release(scene);
    }
}

/// A vehicle placed in a scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    name: String,
    chassis: BodyId,
    chassis_com: Vec3,
    chassis_owned: OwnedHandles,
    front: Suspension,
    rear: Suspension,
    driveline: Driveline,
    powertrain: Powertrain,
    wheels: [Wheel; 4],
    brakes: [Brake; 4],
    steering_gain: f32,
}

impl Vehicle {
    /// Creates the chassis at `chassis_pose` and builds every subsystem on it.
    ///
    /// On failure the scene is left as it was.
    pub fn initialize(
        params: &VehicleParams,
        scene: &mut dyn MechanicalScene,
        chassis_pose: Transform,
    ) -> VehicleResult<Self> {
        params.validate()?;
        check_finite_vec("chassis position", chassis_pose.position)?;

        let mut partial = Partial::default();
        match Self::assemble(params, scene, chassis_pose, &mut partial) {
            Ok(vehicle) => {
                debug!(
                    "initialized vehicle `{}` ({} + {} suspension, {:?})",
                    params.name,
                    vehicle.front.kind_label(),
                    vehicle.rear.kind_label(),
                    vehicle.driveline.drive_type()
                );
                Ok(vehicle)
            }
            Err(err) => {
                warn!("initialization of vehicle `{}` failed: {err}", params.name);
                partial.release(scene);
                Err(err)
            }
        }
    }

    fn assemble(
        params: &VehicleParams,
        scene: &mut dyn MechanicalScene,
        chassis_pose: Transform,
        partial: &mut Partial,
    ) -> VehicleResult<Self> {
        let mass = MassProperties::new(params.chassis.mass, params.chassis.inertia)?;
        let chassis_body = RigidBody::new(format!("{}_chassis", params.name), chassis_pose, mass).with_shape(
            VisualShape::Box {
                center: params.chassis.com,
                half_extents: params.chassis.half_extents,
            },
        );
        let chassis = partial.chassis.add_body(scene, chassis_body);

        let front = params.front.initialize(scene, chassis, params.front_location)?;
        let front = partial.front.insert(front).clone();
        let rear = params.rear.initialize(scene, chassis, params.rear_location)?;
        let rear = partial.rear.insert(rear).clone();

        let driven = match params.driveline.params.drive_type.driven_axle() {
            Axle::Front => &front,
            Axle::Rear => &rear,
        };
        let driveline = params.driveline.initialize(scene, chassis, driven.axle_shafts()?)?;
        let driveline = partial.driveline.insert(driveline).clone();

        let powertrain = Powertrain::initialize(params.powertrain, &driveline)?;

        let suspension = |id: WheelId| match id.axle() {
            Axle::Front => &front,
            Axle::Rear => &rear,
        };
        let [fl, fr, rl, rr] =
            WheelId::ALL.map(|id| Wheel::initialize(&params.wheel, scene, suspension(id).spindle(id.side()), id.side()));
        let wheels = [fl?, fr?, rl?, rr?];
        let [fl, fr, rl, rr] =
            WheelId::ALL.map(|id| Brake::initialize(params.brake, scene, suspension(id).spindle_revolute(id.side())));
        let brakes = [fl?, fr?, rl?, rr?];

        Ok(Self {
            name: params.name.clone(),
            chassis,
            chassis_com: params.chassis.com,
            chassis_owned: partial.chassis.clone(),
            front,
            rear,
            driveline,
            powertrain,
            wheels,
            brakes,
            steering_gain: params.steering_gain,
        })
    }

    /// Applies one step of driver inputs and tire forces.
    ///
    /// Inputs are checked and every target validated before anything is
    /// written; an `Err` leaves the scene and the vehicle untouched.
    pub fn update(
        &mut self,
        scene: &mut dyn MechanicalScene,
        time: f32,
        inputs: DriverInputs,
        tire_forces: &[TireForce; 4],
    ) -> VehicleResult<()> {
        let _timer = ScopedTimer::new("vehicle::update");

        if !time.is_finite() {
            return Err(VehicleError::NonFiniteInput { name: "time", value: time });
        }
        inputs.check_finite()?;
        for tire in tire_forces {
            if let Some(value) = first_non_finite(tire) {
                return Err(VehicleError::NonFiniteInput {
                    name: "tire force",
                    value,
                });
            }
        }
        let inputs = inputs.clamped();
        let steering_displ = inputs.steering * self.steering_gain;

        for suspension in self.suspensions() {
            if suspension.is_steerable() {
                suspension.check_steering(scene, steering_displ)?;
            }
        }
        for wheel in &self.wheels {
            scene.body_ref(wheel.spindle())?;
        }
        for brake in &self.brakes {
            scene.joint_ref(brake.joint())?;
        }
        let shaft_speed = scene.shaft_speed(self.powertrain.driveshaft())?;

        let mut powertrain = self.powertrain.clone();
        powertrain.update(time, inputs.throttle, shaft_speed);
        let shaft_torque = check_finite("powertrain output torque", powertrain.output_torque())?;

        // nothing below can fail on a validated scene
        for suspension in self.suspensions() {
            if suspension.is_steerable() {
                suspension.apply_steering(scene, steering_displ)?;
            }
        }
        scene.apply_shaft_torque(self.powertrain.driveshaft(), shaft_torque)?;
        for id in WheelId::ALL {
            self.suspension(id.axle())
                .apply_tire_force(scene, id.side(), &tire_forces[id.index()])?;
        }
        for brake in &mut self.brakes {
            brake.update(scene, inputs.braking)?;
        }
        self.powertrain = powertrain;
        Ok(())
    }

    fn suspensions(&self) -> [&Suspension; 2] {
        [&self.front, &self.rear]
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn chassis(&self) -> BodyId {
        self.chassis
    }

    pub fn suspension(&self, axle: Axle) -> &Suspension {
        match axle {
            Axle::Front => &self.front,
            Axle::Rear => &self.rear,
        }
    }

    pub fn driveline(&self) -> &Driveline {
        &self.driveline
    }

    pub fn powertrain(&self) -> &Powertrain {
        &self.powertrain
    }

    pub fn wheel(&self, id: WheelId) -> &Wheel {
        &self.wheels[id.index()]
    }

    pub fn brake(&self, id: WheelId) -> &Brake {
        &self.brakes[id.index()]
    }

    pub fn set_drive_mode(&mut self, mode: DriveMode) {
        self.powertrain.set_drive_mode(mode);
    }

    pub fn drive_mode(&self) -> DriveMode {
        self.powertrain.drive_mode()
    }

    pub fn chassis_pose(&self, scene: &dyn MechanicalScene) -> VehicleResult<Transform> {
        scene.body_pose(self.chassis)
    }

    pub fn chassis_position(&self, scene: &dyn MechanicalScene) -> VehicleResult<Vec3> {
        Ok(self.chassis_pose(scene)?.position)
    }

    pub fn chassis_rotation(&self, scene: &dyn MechanicalScene) -> VehicleResult<Quat> {
        Ok(self.chassis_pose(scene)?.rotation)
    }

    /// World position of the chassis center of mass.
    pub fn chassis_com_position(&self, scene: &dyn MechanicalScene) -> VehicleResult<Vec3> {
        Ok(self.chassis_pose(scene)?.transform_point(self.chassis_com))
    }

    /// Forward speed: the chassis velocity along -X of the chassis frame.
    pub fn forward_speed(&self, scene: &dyn MechanicalScene) -> VehicleResult<f32> {
        let body = scene.body_ref(self.chassis)?;
        let forward = body.transform.transform_vector(-Vec3::X);
        check_finite("vehicle speed", body.velocity.linear.dot(forward))
    }

    /// Spindle body carrying the wheel.
    pub fn wheel_body(&self, id: WheelId) -> BodyId {
        self.suspension(id.axle()).spindle(id.side())
    }

    pub fn wheel_position(&self, scene: &dyn MechanicalScene, id: WheelId) -> VehicleResult<Vec3> {
        Ok(scene.body_ref(self.wheel_body(id))?.transform.position)
    }

    pub fn wheel_rotation(&self, scene: &dyn MechanicalScene, id: WheelId) -> VehicleResult<Quat> {
        Ok(scene.body_ref(self.wheel_body(id))?.transform.rotation)
    }

    pub fn wheel_linear_velocity(&self, scene: &dyn MechanicalScene, id: WheelId) -> VehicleResult<Vec3> {
        Ok(scene.body_ref(self.wheel_body(id))?.velocity.linear)
    }

    pub fn wheel_angular_velocity(&self, scene: &dyn MechanicalScene, id: WheelId) -> VehicleResult<Vec3> {
        Ok(scene.body_ref(self.wheel_body(id))?.velocity.angular)
    }

    /// Spin rate about the axle: axle shaft speed when driven, spindle spin otherwise.
    pub fn wheel_omega(&self, scene: &dyn MechanicalScene, id: WheelId) -> VehicleResult<f32> {
        self.suspension(id.axle()).spindle_omega(scene, id.side())
    }

    pub fn wheel_torque(&self, scene: &dyn MechanicalScene, id: WheelId) -> VehicleResult<f32> {
        self.driveline.wheel_torque(scene, id)
    }

    pub fn spring_force(&self, scene: &dyn MechanicalScene, id: WheelId) -> VehicleResult<f32> {
        self.suspension(id.axle()).spring_force(scene, id.side())
    }

    pub fn spring_length(&self, scene: &dyn MechanicalScene, id: WheelId) -> VehicleResult<f32> {
        self.suspension(id.axle()).spring_length(scene, id.side())
    }

    pub fn driveshaft_speed(&self, scene: &dyn MechanicalScene) -> VehicleResult<f32> {
        self.driveline.driveshaft_speed(scene)
    }

    /// Bodies and joints of the chassis plus every subsystem.
    pub fn topology(&self, scene: &dyn MechanicalScene) -> VehicleResult<Topology> {
        let mut total = Topology {
            bodies: self.chassis_owned.bodies.len(),
            ..Topology::default()
        };
        for part in [
            self.front.topology(scene)?,
            self.rear.topology(scene)?,
            self.driveline.topology(scene)?,
        ] {
            total.bodies += part.bodies;
            total.constrained_dofs += part.constrained_dofs;
            for (kind, count) in part.joints {
                *total.joints.entry(kind).or_insert(0) += count;
            }
        }
        Ok(total)
    }

    /// Writes the selected debug sections to `out`.
    pub fn debug_log(&self, scene: &dyn MechanicalScene, out: &mut dyn Write, sections: DebugSections) -> VehicleResult<()> {
        writeln!(out, "==== vehicle `{}` at t = {:.4} s", self.name, scene.time())?;
        if sections.shocks {
            let records = WheelId::ALL
                .iter()
                .map(|&wheel| {
                    let state = scene.spring_state(self.suspension(wheel.axle()).side(wheel.side()).spring)?;
                    Ok(report::ShockRecord {
                        wheel,
                        length: state.length,
                        force: state.force,
                    })
                })
                .collect::<VehicleResult<Vec<_>>>()?;
            report::write_shocks(out, &records)?;
        }
        if sections.constraints {
            for id in WheelId::ALL {
                let violations = self
                    .suspension(id.axle())
                    .constraint_violations(scene, id.side())?;
                report::write_constraint_violations(out, id.label(), &violations)?;
            }
        }
        Ok(())
    }

    /// Writes the current hardpoint locations of one suspension relative to its mount point.
    pub fn log_hardpoint_locations(
        &self,
        scene: &dyn MechanicalScene,
        axle: Axle,
        out: &mut dyn Write,
        unit: LengthUnit,
    ) -> VehicleResult<()> {
        let suspension = self.suspension(axle);
        let reference = self.chassis_pose(scene)?.transform_point(suspension.location());
        let locations = suspension.hardpoints_relative_to(scene, reference)?;
        report::write_hardpoints(out, suspension.name(), &locations, unit)
    }

    /// Removes everything the vehicle created from the scene.
    pub fn release(self, scene: &mut dyn MechanicalScene) {
        debug!("releasing vehicle `{}`", self.name);
        self.driveline.release(scene);
        self.rear.release(scene);
        self.front.release(scene);
        self.chassis_owned.release(scene);
    }
}

fn first_non_finite(tire: &TireForce) -> Option<f32> {
    tire.force
        .to_array()
        .into_iter()
        .chain(tire.moment.to_array())
        .find(|v| !v.is_finite())
}

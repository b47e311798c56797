//! Vehicle Templates – multibody wheeled-vehicle assembly for Rust.
//!
//! Parametrized suspension, driveline and powertrain templates turn named
//! hardpoints and physical parameters into bodies, joints, force elements and
//! shafts inside any [`MechanicalScene`], and a [`Vehicle`] coordinates them
//! once per step from driver inputs and tire forces.

pub mod config;
pub mod core;
pub mod dynamics;
pub mod error;
pub mod models;
pub mod utils;
pub mod vehicle;
pub mod world;

pub use glam::{Mat3, Quat, Vec3};

pub use crate::core::{
    constraints::{Joint, JointKind},
    rigidbody::RigidBody,
    shafts::{Shaft, ShaftRelation},
    types::{Axle, MassProperties, Side, TireForce, Transform, Velocity, VisualShape, VisualizationType, WheelId},
};
pub use crate::dynamics::forces::{SpringCoefficients, SpringDamper, SpringState};
pub use error::{VehicleError, VehicleResult};
pub use utils::allocator::{Arena, BodyId, EntityId, GenerationalId, JointId, RelationId, ShaftId, SpringId};
pub use vehicle::{
    DriveMode, DriveType, Driver, DriverInputs, ScriptedDriver, Suspension, SuspensionKind, SuspensionTemplate,
    Topology, Vehicle, VehicleParams,
};
pub use world::{MechanicalScene, OwnedHandles, SceneWorld};

/// High-level convenience wrapper that owns a [`SceneWorld`] and one [`Vehicle`].
pub struct VehicleSimulation {
    world: SceneWorld,
    vehicle: Vehicle,
}

impl VehicleSimulation {
    /// Builds the vehicle at `chassis_pose` in a fresh scene with the given timestep.
    pub fn new(params: &VehicleParams, chassis_pose: Transform, timestep: f32) -> VehicleResult<Self> {
        let mut world = SceneWorld::new(timestep)?;
        let vehicle = Vehicle::initialize(params, &mut world, chassis_pose)?;
        Ok(Self { world, vehicle })
    }

    /// Applies the inputs at the current scene time, then advances one timestep.
    pub fn step(&mut self, inputs: DriverInputs, tire_forces: &[TireForce; 4]) -> VehicleResult<()> {
        let time = self.world.time();
        self.vehicle.update(&mut self.world, time, inputs, tire_forces)?;
        self.world.advance()
    }

    /// Same as [`VehicleSimulation::step`] with inputs taken from `driver`.
    pub fn step_with(&mut self, driver: &mut dyn Driver, tire_forces: &[TireForce; 4]) -> VehicleResult<()> {
        let inputs = driver.inputs(self.world.time());
        self.step(inputs, tire_forces)
    }

    pub fn time(&self) -> f32 {
        self.world.time()
    }

    pub fn world(&self) -> &SceneWorld {
        &self.world
    }

    /// Mutable scene access, e.g. for an external rigid-body solver.
    pub fn world_mut(&mut self) -> &mut SceneWorld {
        &mut self.world
    }

    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    pub fn vehicle_mut(&mut self) -> &mut Vehicle {
        &mut self.vehicle
    }

    /// Splits into scene and vehicle, e.g. to release the vehicle.
    pub fn into_parts(self) -> (SceneWorld, Vehicle) {
        (self.world, self.vehicle)
    }
}

//! Two-wheel-drive shaft driveline: driveshaft, conical gear, open differential.

use glam::Vec3;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::suspension::{owned_topology, AxleShafts, Topology};
use crate::config::DIFFERENTIAL_ORDINARY_RATIO;
use crate::core::{
    shafts::{Shaft, ShaftRelation},
    types::{Axle, Side, WheelId},
};
use crate::error::{ensure_positive, VehicleError, VehicleResult};
use crate::utils::allocator::{BodyId, RelationId, ShaftId};
use crate::utils::logging::{check_finite, check_finite_vec};
use crate::world::scene::{MechanicalScene, OwnedHandles};

/// Which axle receives the engine torque.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriveType {
    FrontWheelDrive,
    #[default]
    RearWheelDrive,
}

impl DriveType {
    pub fn driven_axle(self) -> Axle {
        match self {
            DriveType::FrontWheelDrive => Axle::Front,
            DriveType::RearWheelDrive => Axle::Rear,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrivelineParams {
    pub driveshaft_inertia: f32,
    pub differential_box_inertia: f32,
    /// Speed ratio differential box / driveshaft of the bevel gear pair.
    pub conical_gear_ratio: f32,
    /// Driveshaft direction in chassis coordinates.
    pub motor_block_dir: Vec3,
    /// Axle direction in chassis coordinates.
    pub axle_dir: Vec3,
    pub drive_type: DriveType,
}

impl DrivelineParams {
    pub fn validate(&self) -> VehicleResult<()> {
        ensure_positive("driveline.driveshaft_inertia", self.driveshaft_inertia)?;
        ensure_positive("driveline.differential_box_inertia", self.differential_box_inertia)?;
        if !self.conical_gear_ratio.is_finite() || self.conical_gear_ratio == 0.0 {
            return Err(VehicleError::invalid_parameter(
                "driveline.conical_gear_ratio",
                self.conical_gear_ratio,
                "must be finite and non-zero",
            ));
        }
        for (name, dir) in [
            ("driveline.motor_block_dir", self.motor_block_dir),
            ("driveline.axle_dir", self.axle_dir),
        ] {
            check_finite_vec(name, dir)?;
            if dir.length_squared() <= f32::EPSILON {
                return Err(VehicleError::invalid_parameter(name, dir.length(), "direction must be non-zero"));
            }
        }
        Ok(())
    }
}

/// Validated, not-yet-placed driveline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrivelineTemplate {
    pub name: String,
    pub params: DrivelineParams,
}

impl DrivelineTemplate {
    pub fn new(name: impl Into<String>, params: DrivelineParams) -> VehicleResult<Self> {
        params.validate()?;
        Ok(Self {
            name: name.into(),
            params,
        })
    }

    /// Connects the driveline to the axle shafts of the driven suspension.
    ///
    /// The conical gear reacts on `chassis`; on failure nothing is left in the scene.
    pub fn initialize(
        &self,
        scene: &mut dyn MechanicalScene,
        chassis: BodyId,
        axles: AxleShafts,
    ) -> VehicleResult<Driveline> {
        if !scene.contains_body(chassis) {
            return Err(VehicleError::ChassisNotAttached);
        }
        scene.shaft_ref(axles.left)?;
        scene.shaft_ref(axles.right)?;

        let mut owned = OwnedHandles::default();
        match self.build(scene, &mut owned, chassis, axles) {
            Ok((driveshaft, differential_box, conical_gear, differential)) => {
                debug!(
                    "initialized driveline `{}` ({:?}, conical ratio {})",
                    self.name, self.params.drive_type, self.params.conical_gear_ratio
                );
                Ok(Driveline {
                    name: self.name.clone(),
                    drive_type: self.params.drive_type,
                    driveshaft,
                    differential_box,
                    conical_gear,
                    differential,
                    axles,
                    owned,
                })
            }
            Err(err) => {
                warn!("initialization of driveline `{}` failed: {err}", self.name);
                owned.release(scene);
                Err(err)
            }
        }
    }

    fn build(
        &self,
        scene: &mut dyn MechanicalScene,
        owned: &mut OwnedHandles,
        chassis: BodyId,
        axles: AxleShafts,
    ) -> VehicleResult<(ShaftId, ShaftId, RelationId, RelationId)> {
        let p = &self.params;
        let driveshaft = owned.add_shaft(scene, Shaft::new(format!("{}_driveshaft", self.name), p.driveshaft_inertia)?);
        let differential_box = owned.add_shaft(
            scene,
            Shaft::new(format!("{}_differentialBox", self.name), p.differential_box_inertia)?,
        );
        let conical_gear = owned.add_relation(
            scene,
            ShaftRelation::gearbox_angled(
                driveshaft,
                differential_box,
                chassis,
                p.motor_block_dir,
                p.axle_dir,
                p.conical_gear_ratio,
            )?,
        )?;
        let differential = owned.add_relation(
            scene,
            ShaftRelation::planetary(differential_box, axles.left, axles.right, DIFFERENTIAL_ORDINARY_RATIO)?,
        )?;
        Ok((driveshaft, differential_box, conical_gear, differential))
    }
}

/// An initialized driveline. The axle shafts belong to the suspension.
#[derive(Debug, Clone, PartialEq)]
pub struct Driveline {
    name: String,
    drive_type: DriveType,
    driveshaft: ShaftId,
    differential_box: ShaftId,
    conical_gear: RelationId,
    differential: RelationId,
    axles: AxleShafts,
    owned: OwnedHandles,
}

impl Driveline {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn drive_type(&self) -> DriveType {
        self.drive_type
    }

    /// Shaft the powertrain drives.
    pub fn driveshaft(&self) -> ShaftId {
        self.driveshaft
    }

    pub fn differential_box(&self) -> ShaftId {
        self.differential_box
    }

    pub fn conical_gear(&self) -> RelationId {
        self.conical_gear
    }

    pub fn differential(&self) -> RelationId {
        self.differential
    }

    pub fn axles(&self) -> AxleShafts {
        self.axles
    }

    pub fn owned(&self) -> &OwnedHandles {
        &self.owned
    }

    pub fn driveshaft_speed(&self, scene: &dyn MechanicalScene) -> VehicleResult<f32> {
        scene.shaft_speed(self.driveshaft)
    }

    /// Torque delivered to a wheel through its axle shaft; zero on the undriven axle.
    pub fn wheel_torque(&self, scene: &dyn MechanicalScene, wheel: WheelId) -> VehicleResult<f32> {
        if wheel.axle() != self.drive_type.driven_axle() {
            return Ok(0.0);
        }
        let shaft = match wheel.side() {
            Side::Left => self.axles.left,
            Side::Right => self.axles.right,
        };
        let relation = scene
            .relation(self.differential)
            .ok_or(VehicleError::UnknownHandle { kind: RelationId::KIND })?;
        let reaction = scene.relation_reaction(self.differential)?;
        let on_differential = reaction
            .torque_from_shaft(relation, shaft)
            .ok_or(VehicleError::UnknownHandle { kind: ShaftId::KIND })?;
        check_finite("wheel torque", -on_differential)
    }

    /// Support torque the conical gear puts on the chassis, world frame.
    pub fn chassis_reaction(&self, scene: &dyn MechanicalScene) -> VehicleResult<Vec3> {
        check_finite_vec("conical gear reaction", scene.relation_reaction(self.conical_gear)?.truss_torque)
    }

    pub fn topology(&self, scene: &dyn MechanicalScene) -> VehicleResult<Topology> {
        owned_topology(scene, &self.owned)
    }

    pub fn release(self, scene: &mut dyn MechanicalScene) {
        debug!("releasing driveline `{}`", self.name);
        self.owned.release(scene);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> DrivelineParams {
        DrivelineParams {
            driveshaft_inertia: 0.5,
            differential_box_inertia: 0.6,
            conical_gear_ratio: -0.2433,
            motor_block_dir: Vec3::X,
            axle_dir: Vec3::Y,
            drive_type: DriveType::RearWheelDrive,
        }
    }

    #[test]
    fn rejects_degenerate_parameters() {
        assert!(params().validate().is_ok());

        let mut bad = params();
        bad.conical_gear_ratio = 0.0;
        assert!(bad.validate().is_err());

        let mut bad = params();
        bad.axle_dir = Vec3::ZERO;
        assert!(bad.validate().is_err());

        let mut bad = params();
        bad.driveshaft_inertia = -0.5;
        assert!(DrivelineTemplate::new("driveline", bad).is_err());
    }

    #[test]
    fn drive_type_selects_axle() {
        assert_eq!(DriveType::RearWheelDrive.driven_axle(), Axle::Rear);
        assert_eq!(DriveType::FrontWheelDrive.driven_axle(), Axle::Front);
    }
}

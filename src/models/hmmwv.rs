//! HMMWV-like parameter sets. Hardpoints are given in inches and converted.

use glam::Vec3;

use crate::config::{DEFAULT_STEERING_GAIN, INCHES_TO_METERS};
use crate::core::types::VisualizationType;
use crate::dynamics::forces::SpringCoefficients;
use crate::error::VehicleResult;
use crate::vehicle::{
    brake::BrakeParams,
    driveline::{DriveType, DrivelineParams, DrivelineTemplate},
    hardpoints::HardpointTable,
    powertrain::PowertrainParams,
    suspension::{
        BodyParams, DoubleWishboneParams, DoubleWishbonePoint, SolidAxleParams, SolidAxlePoint, SuspensionKind,
        SuspensionTemplate,
    },
    wheel::WheelParams,
    ChassisParams, VehicleParams,
};

fn inches(x: f32, y: f32, z: f32) -> Vec3 {
    Vec3::new(x, y, z) * INCHES_TO_METERS
}

pub fn chassis() -> ChassisParams {
    ChassisParams {
        mass: 7747.0 / 2.2,
        inertia: Vec3::new(125.8, 497.4, 531.4),
        com: inches(3.8, 0.585, -18.329),
        half_extents: Vec3::new(1.0, 0.5, 0.2),
    }
}

pub fn front_location() -> Vec3 {
    inches(-66.59, 0.0, 1.039)
}

pub fn rear_location() -> Vec3 {
    inches(66.4, 0.0, 1.039)
}

pub fn wheel() -> WheelParams {
    WheelParams {
        mass: 54.7,
        inertia: Vec3::new(3.7958, 7.0037, 3.7958),
        radius: 18.5 * INCHES_TO_METERS,
        width: 10.0 * INCHES_TO_METERS,
        visualization: VisualizationType::Primitives,
    }
}

pub fn brake() -> BrakeParams {
    BrakeParams { max_torque: 4000.0 }
}

pub fn driveline() -> DrivelineParams {
    DrivelineParams {
        driveshaft_inertia: 0.5,
        differential_box_inertia: 0.6,
        conical_gear_ratio: -0.2433,
        motor_block_dir: Vec3::X,
        axle_dir: Vec3::Y,
        drive_type: DriveType::RearWheelDrive,
    }
}

pub fn powertrain() -> PowertrainParams {
    PowertrainParams {
        forward_gear_ratio: 0.3,
        reverse_gear_ratio: -0.3,
        // 2400 lb·ft
        max_torque: 2400.0 / 0.737_562_15,
        max_speed: 2000.0,
    }
}

/// Right-side solid-axle table. `link_sign` is +1 when the links run towards
/// the rear of the vehicle (front axle) and -1 otherwise.
pub fn solid_axle_hardpoints(link_sign: f32) -> VehicleResult<HardpointTable<SolidAxlePoint>> {
    use SolidAxlePoint as P;
    let table = HardpointTable::builder()
        .set(P::Spindle, Vec3::new(0.0, 35.82, 0.0))
        .set(P::AxleOuter, Vec3::new(0.0, 31.0, 0.0))
        .set(P::KnuckleU, Vec3::new(0.0, 30.5, 4.5))
        .set(P::KnuckleL, Vec3::new(0.0, 31.0, -4.5))
        .set(P::UpperLinkA, Vec3::new(2.0 * link_sign, 14.0, 6.0))
        .set(P::UpperLinkC, Vec3::new(22.0 * link_sign, 16.0, 9.0))
        .set(P::LowerLinkA, Vec3::new(0.0, 22.0, -4.0))
        .set(P::LowerLinkC, Vec3::new(24.0 * link_sign, 24.0, -2.0))
        .set(P::ShockA, Vec3::new(-3.0 * link_sign, 24.0, 1.0))
        .set(P::ShockC, Vec3::new(-3.0 * link_sign, 22.0, 16.0))
        .set(P::TierodK, Vec3::new(-6.0 * link_sign, 30.0, -1.0))
        .set(P::TierodC, Vec3::new(-6.0 * link_sign, 12.0, -1.0))
        .build()?;
    Ok(table.scaled(INCHES_TO_METERS))
}

fn solid_axle(link_sign: f32, rest_length: f32) -> VehicleResult<SolidAxleParams> {
    Ok(SolidAxleParams {
        hardpoints: solid_axle_hardpoints(link_sign)?,
        axle_tube: BodyParams::new(124.0, Vec3::new(22.21, 0.0775, 22.21), 0.0476),
        spindle: BodyParams::new(14.705, Vec3::new(0.04117, 0.07352, 0.04117), 0.1),
        upper_link: BodyParams::new(1.446, Vec3::new(0.011, 0.011, 0.000142), 0.03),
        lower_link: BodyParams::new(2.892, Vec3::new(0.022, 0.022, 0.000284), 0.03),
        knuckle: BodyParams::new(10.0, Vec3::new(0.05, 0.05, 0.05), 0.05),
        spindle_width: 0.06,
        axle_inertia: 0.4,
        spring: SpringCoefficients::new(167_062.0, 22_459.0, rest_length)?,
    })
}

/// Right-side reduced double-wishbone table.
pub fn double_wishbone_hardpoints() -> VehicleResult<HardpointTable<DoubleWishbonePoint>> {
    use DoubleWishbonePoint as P;
    let table = HardpointTable::builder()
        .set(P::Spindle, Vec3::new(-1.59, 35.815, -1.035))
        .set(P::Upright, Vec3::new(-1.59, 29.5675, -1.035))
        .set(P::UcaF, Vec3::new(-1.8914, 17.61, 9.515))
        .set(P::UcaB, Vec3::new(-10.549, 18.72, 7.648))
        .set(P::UcaU, Vec3::new(-2.709, 27.7, 8.3))
        .set(P::LcaF, Vec3::new(8.7, 12.0, 0.0))
        .set(P::LcaB, Vec3::new(-8.3, 12.0, 0.0))
        .set(P::LcaU, Vec3::new(-1.4, 30.0, -2.0))
        .set(P::ShockC, Vec3::new(4.1, 15.9, 15.1))
        .set(P::ShockU, Vec3::new(3.8, 23.6, -1.0))
        .set(P::TierodC, Vec3::new(-13.0, 13.0, 4.5))
        .set(P::TierodU, Vec3::new(-6.4, 30.3, 4.5))
        .build()?;
    Ok(table.scaled(INCHES_TO_METERS))
}

fn double_wishbone(stiffness: f32, damping: f32, rest_length: f32) -> VehicleResult<DoubleWishboneParams> {
    Ok(DoubleWishboneParams {
        hardpoints: double_wishbone_hardpoints()?,
        spindle: BodyParams::new(1.103, Vec3::new(0.000478, 0.000496, 0.000478), 0.15),
        upright: BodyParams::new(1.397, Vec3::new(0.0138, 0.0146, 0.00283), 0.025),
        spindle_width: 0.06,
        axle_inertia: 0.4,
        spring: SpringCoefficients::new(stiffness, damping, rest_length)?,
    })
}

fn assemble(name: &str, front: SuspensionKind, rear: SuspensionKind) -> VehicleResult<VehicleParams> {
    let driveline = driveline();
    let rear_driven = driveline.drive_type == DriveType::RearWheelDrive;
    Ok(VehicleParams {
        name: name.to_string(),
        chassis: chassis(),
        front: SuspensionTemplate::new("front", true, !rear_driven, front)?,
        front_location: front_location(),
        rear: SuspensionTemplate::new("rear", false, rear_driven, rear)?,
        rear_location: rear_location(),
        driveline: DrivelineTemplate::new("driveline", driveline)?,
        powertrain: powertrain(),
        wheel: wheel(),
        brake: brake(),
        steering_gain: DEFAULT_STEERING_GAIN,
    })
}

/// Solid axles front and rear, rear-wheel drive.
pub fn hmmwv_solid_axle() -> VehicleResult<VehicleParams> {
    assemble(
        "hmmwv",
        SuspensionKind::SolidAxle(solid_axle(1.0, 0.4774)?),
        SuspensionKind::SolidAxle(solid_axle(-1.0, 0.4774)?),
    )
}

/// Reduced double wishbones front and rear, rear-wheel drive.
pub fn hmmwv_double_wishbone() -> VehicleResult<VehicleParams> {
    assemble(
        "hmmwv",
        SuspensionKind::DoubleWishboneReduced(double_wishbone(167_062.0, 60_068.0, 0.4626)?),
        SuspensionKind::DoubleWishboneReduced(double_wishbone(369_149.0, 41_528.0, 0.4574)?),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicle::hardpoints::Hardpoint;

    #[test]
    fn model_parameters_validate() {
        hmmwv_solid_axle().unwrap().validate().unwrap();
        hmmwv_double_wishbone().unwrap().validate().unwrap();
    }

    #[test]
    fn rear_links_point_forward() {
        let front = solid_axle_hardpoints(1.0).unwrap();
        let rear = solid_axle_hardpoints(-1.0).unwrap();
        assert!(front.get(SolidAxlePoint::UpperLinkC).x > 0.0);
        assert!(rear.get(SolidAxlePoint::UpperLinkC).x < 0.0);
        for point in SolidAxlePoint::ALL {
            assert_eq!(front.get(*point).y, rear.get(*point).y);
        }
    }
}

mod common;

use approx::assert_relative_eq;
use common::add_chassis;
use vehicle_templates::{
    config::NEUTRAL_GEAR_RATIO,
    models::hmmwv,
    vehicle::{
        driveline::DrivelineTemplate,
        powertrain::{DriveMode, Powertrain, PowertrainParams},
        suspension::AxleShafts,
    },
    world::SceneWorld,
    MechanicalScene, Shaft, Transform,
};

fn powertrain(params: PowertrainParams) -> Powertrain {
    let mut world = SceneWorld::default();
    let chassis = add_chassis(&mut world, Transform::default());
    let axles = AxleShafts {
        left: world.add_shaft(Shaft::new("axle_L", 0.4).unwrap()),
        right: world.add_shaft(Shaft::new("axle_R", 0.4).unwrap()),
    };
    let driveline = DrivelineTemplate::new("driveline", hmmwv::driveline())
        .unwrap()
        .initialize(&mut world, chassis, axles)
        .unwrap();
    Powertrain::initialize(params, &driveline).unwrap()
}

#[test]
fn starts_in_forward_gear() {
    let params = hmmwv::powertrain();
    let p = powertrain(params);
    assert_eq!(p.drive_mode(), DriveMode::Forward);
    assert_eq!(p.current_gear_ratio(), params.forward_gear_ratio);
    assert_eq!(p.output_torque(), 0.0);
}

#[test]
fn zero_throttle_gives_zero_torque() {
    let mut p = powertrain(hmmwv::powertrain());
    for speed in [-50.0, 0.0, 120.0] {
        p.update(0.0, 0.0, speed);
        assert_eq!(p.output_torque(), 0.0);
        assert_eq!(p.motor_torque(), 0.0);
    }
}

#[test]
fn torque_vanishes_at_max_speed() {
    let params = hmmwv::powertrain();
    let mut p = powertrain(params);
    p.update(0.0, 1.0, params.max_speed * params.forward_gear_ratio);

    assert_relative_eq!(p.motor_speed(), params.max_speed, max_relative = 1e-5);
    assert_relative_eq!(p.motor_torque(), 0.0, epsilon = 1e-2);
}

#[test]
fn stall_torque_is_scaled_by_ratio_and_throttle() {
    let params = hmmwv::powertrain();
    let mut p = powertrain(params);
    p.update(0.0, 0.5, 0.0);

    assert_relative_eq!(p.motor_torque(), 0.5 * params.max_torque, max_relative = 1e-6);
    assert_relative_eq!(p.output_torque(), 0.5 * params.max_torque / 0.3, max_relative = 1e-6);
}

#[test]
fn neutral_decouples_the_motor() {
    let mut p = powertrain(hmmwv::powertrain());
    p.set_drive_mode(DriveMode::Neutral);
    assert_eq!(p.current_gear_ratio(), NEUTRAL_GEAR_RATIO);

    p.update(1.0, 1.0, 35.0);
    assert!(p.output_torque().abs() < 1e-6);
    assert!(p.motor_speed().abs() < 1e-6);
}

#[test]
fn reverse_flips_the_output() {
    let mut p = powertrain(hmmwv::powertrain());
    p.set_drive_mode(DriveMode::Reverse);
    p.update(0.0, 1.0, 0.0);
    assert!(p.output_torque() < 0.0);

    p.set_drive_mode(DriveMode::Forward);
    p.update(0.0, 1.0, 0.0);
    assert!(p.output_torque() > 0.0);
}

#[test]
fn invalid_limits_are_rejected() {
    let mut params = hmmwv::powertrain();
    params.max_speed = 0.0;
    assert!(params.validate().is_err());

    let mut params = hmmwv::powertrain();
    params.max_torque = f32::NAN;
    assert!(params.validate().is_err());
}

mod common;

use approx::assert_relative_eq;
use common::{add_chassis, FailingScene};
use vehicle_templates::{
    config::INCHES_TO_METERS,
    models::hmmwv,
    vehicle::{
        hardpoints::HardpointTable,
        suspension::{DoubleWishbonePoint, SolidAxlePoint, Suspension, SuspensionKind},
    },
    world::SceneWorld,
    JointKind, MechanicalScene, Quat, Side, SuspensionTemplate, Transform, Vec3, VehicleError,
};

fn solid_axle_front() -> SuspensionTemplate {
    hmmwv::hmmwv_solid_axle().unwrap().front
}

fn solid_axle_rear() -> SuspensionTemplate {
    hmmwv::hmmwv_solid_axle().unwrap().rear
}

fn double_wishbone_front() -> SuspensionTemplate {
    hmmwv::hmmwv_double_wishbone().unwrap().front
}

fn build(template: &SuspensionTemplate, location: Vec3) -> (SceneWorld, Suspension) {
    let mut world = SceneWorld::default();
    let chassis = add_chassis(&mut world, Transform::default());
    let suspension = template.initialize(&mut world, chassis, location).unwrap();
    (world, suspension)
}

fn assert_mirrored(world: &SceneWorld, suspension: &Suspension) {
    let left = world.body(suspension.spindle(Side::Left)).unwrap().transform.position;
    let right = world.body(suspension.spindle(Side::Right)).unwrap().transform.position;
    assert_relative_eq!(left.x, right.x, epsilon = 1e-6);
    assert_relative_eq!(left.y, -right.y, epsilon = 1e-6);
    assert_relative_eq!(left.z, right.z, epsilon = 1e-6);
}

#[test]
fn solid_axle_spindles_are_mirrored() {
    let (world, suspension) = build(&solid_axle_front(), Vec3::ZERO);
    assert_mirrored(&world, &suspension);

    let right = world.body(suspension.spindle(Side::Right)).unwrap().transform.position;
    assert_relative_eq!(right.y, 35.82 * INCHES_TO_METERS, epsilon = 1e-5);
}

#[test]
fn double_wishbone_spindles_are_mirrored() {
    let (world, suspension) = build(&double_wishbone_front(), Vec3::ZERO);
    assert_mirrored(&world, &suspension);
}

#[test]
fn solid_axle_topology() {
    let (world, suspension) = build(&solid_axle_front(), Vec3::ZERO);
    let topology = suspension.topology(&world).unwrap();

    assert_eq!(topology.bodies, 9);
    assert_eq!(topology.joints_of(JointKind::Revolute), 4);
    assert_eq!(topology.joints_of(JointKind::Spherical), 4);
    assert_eq!(topology.joints_of(JointKind::Universal), 4);
    assert_eq!(topology.joints_of(JointKind::Distance), 2);
    assert_eq!(topology.constrained_dofs, 50);
    assert_eq!(topology.mobility(), 4);
    assert_eq!(world.spring_count(), 2);
}

#[test]
fn double_wishbone_topology() {
    let (world, suspension) = build(&double_wishbone_front(), Vec3::ZERO);
    let topology = suspension.topology(&world).unwrap();

    assert_eq!(topology.bodies, 4);
    assert_eq!(topology.joints_of(JointKind::Revolute), 2);
    assert_eq!(topology.joints_of(JointKind::Distance), 10);
    assert_eq!(topology.joint_count(), 12);
    assert_eq!(topology.constrained_dofs, 20);
    assert_eq!(topology.mobility(), 4);
}

#[test]
fn joints_are_satisfied_after_initialization() {
    for template in [solid_axle_front(), double_wishbone_front()] {
        let mut world = SceneWorld::default();
        let pose = Transform::new(Vec3::new(1.0, -2.0, 0.5), Quat::from_rotation_z(0.3));
        let chassis = add_chassis(&mut world, pose);
        let suspension = template.initialize(&mut world, chassis, Vec3::new(-1.7, 0.0, 0.03)).unwrap();

        for side in Side::ALL {
            for violation in suspension.constraint_violations(&world, side).unwrap() {
                assert!(
                    violation.max_abs() < 1e-4,
                    "{} violated by {}",
                    violation.name,
                    violation.max_abs()
                );
            }
        }
    }
}

#[test]
fn zero_steering_keeps_initial_configuration() {
    for template in [solid_axle_front(), double_wishbone_front()] {
        let (mut world, suspension) = build(&template, Vec3::ZERO);
        let before = Side::ALL.map(|side| world.body(suspension.side(side).steered_body).unwrap().transform);

        suspension.apply_steering(&mut world, 0.0).unwrap();

        for side in Side::ALL {
            let steered = suspension.side(side).steered_body;
            assert_eq!(world.body(steered).unwrap().transform, before[side.index()], "{side:?}");
            let residual = world.joint_violation(suspension.side(side).tierod).unwrap();
            assert_relative_eq!(residual[0], 0.0, epsilon = 1e-5);
        }
    }
}

#[test]
fn steering_moves_chassis_end_of_tie_rods() {
    let (mut world, suspension) = build(&solid_axle_front(), Vec3::ZERO);
    suspension.apply_steering(&mut world, 0.05).unwrap();

    // tie rods lie along Y: the right one shortens, the left one lengthens
    let right = world.joint_violation(suspension.side(Side::Right).tierod).unwrap();
    let left = world.joint_violation(suspension.side(Side::Left).tierod).unwrap();
    assert_relative_eq!(right[0], -0.05, epsilon = 1e-4);
    assert_relative_eq!(left[0], 0.05, epsilon = 1e-4);

    let side = suspension.side(Side::Right);
    let anchor = world.joint(side.tierod).unwrap().local_anchor_b();
    assert_relative_eq!(anchor.y, side.tierod_marker.y + 0.05, epsilon = 1e-6);
}

#[test]
fn double_wishbone_steering_moves_tie_rod_anchors() {
    let (mut world, suspension) = build(&double_wishbone_front(), Vec3::ZERO);
    suspension.apply_steering(&mut world, 0.05).unwrap();

    for side in Side::ALL {
        let side = suspension.side(side);
        let anchor = world.joint(side.tierod).unwrap().local_anchor_b();
        assert_relative_eq!(anchor.x, side.tierod_marker.x, epsilon = 1e-6);
        assert_relative_eq!(anchor.y, side.tierod_marker.y + 0.05, epsilon = 1e-6);
        assert_relative_eq!(anchor.z, side.tierod_marker.z, epsilon = 1e-6);
    }
    let left = world.joint_violation(suspension.side(Side::Left).tierod).unwrap();
    let right = world.joint_violation(suspension.side(Side::Right).tierod).unwrap();
    // rack moves toward the right: that rod shortens, the other lengthens
    assert!(right[0] < 0.0 && left[0] > 0.0, "left {} right {}", left[0], right[0]);
}

#[test]
fn non_steerable_suspension_rejects_steering() {
    let (mut world, suspension) = build(&solid_axle_rear(), Vec3::ZERO);
    let err = suspension.apply_steering(&mut world, 0.01).unwrap_err();
    assert!(matches!(err, VehicleError::NotSteerable { .. }));
}

#[test]
fn spring_force_follows_hooke_at_rest() {
    let template = solid_axle_front();
    let (world, suspension) = build(&template, Vec3::ZERO);

    let length = suspension.spring_length(&world, Side::Left).unwrap();
    let expected_length = (2.0f32 * 2.0 + 15.0 * 15.0).sqrt() * INCHES_TO_METERS;
    assert_relative_eq!(length, expected_length, epsilon = 1e-4);

    let force = suspension.spring_force(&world, Side::Left).unwrap();
    assert_relative_eq!(force, -167_062.0 * (length - 0.4774), max_relative = 1e-4);
    // shorter than free length: pushes apart
    assert!(force > 0.0);
    assert_relative_eq!(force, suspension.spring_force(&world, Side::Right).unwrap(), max_relative = 1e-5);
}

#[test]
fn hardpoints_are_reported_relative_to_mount() {
    let location = Vec3::new(-1.69, 0.0, 0.026);
    let (world, suspension) = build(&solid_axle_front(), location);
    let locations = suspension.hardpoints_relative_to(&world, location).unwrap();

    let table = hmmwv::solid_axle_hardpoints(1.0).unwrap();
    let spindle = locations
        .iter()
        .find(|l| l.side == Side::Right && l.name == "SPINDLE")
        .unwrap();
    let expected = table.get(SolidAxlePoint::Spindle);
    assert_relative_eq!(spindle.offset.x, expected.x, epsilon = 1e-5);
    assert_relative_eq!(spindle.offset.y, expected.y, epsilon = 1e-5);
    assert_relative_eq!(spindle.offset.z, expected.z, epsilon = 1e-5);
    assert_eq!(locations.len(), 24);
}

#[test]
fn driven_flag_controls_axle_shafts() {
    let (world, rear) = build(&solid_axle_rear(), Vec3::ZERO);
    let shafts = rear.axle_shafts().unwrap();
    assert!(world.contains_shaft(shafts.left));
    assert!(world.contains_shaft(shafts.right));
    assert_eq!(world.relation_count(), 2);

    let (_, front) = build(&solid_axle_front(), Vec3::ZERO);
    assert!(matches!(front.axle_shafts(), Err(VehicleError::NotDriven { .. })));
}

#[test]
fn release_removes_every_owned_item() {
    let (mut world, suspension) = build(&solid_axle_rear(), Vec3::ZERO);
    assert!(suspension.owned().all_present(&world));
    suspension.release(&mut world);

    assert_eq!(world.body_count(), 1);
    assert_eq!(world.joint_count(), 0);
    assert_eq!(world.spring_count(), 0);
    assert_eq!(world.shaft_count(), 0);
    assert_eq!(world.relation_count(), 0);
}

#[test]
fn unattached_chassis_is_rejected() {
    let mut world = SceneWorld::default();
    let chassis = add_chassis(&mut world, Transform::default());
    world.remove_body(chassis);

    let err = solid_axle_front()
        .initialize(&mut world, chassis, Vec3::ZERO)
        .unwrap_err();
    assert_eq!(err, VehicleError::ChassisNotAttached);
    assert!(world.is_empty());
}

#[test]
fn failed_initialization_leaves_no_items_behind() {
    let mut inner = SceneWorld::default();
    let chassis = add_chassis(&mut inner, Transform::default());
    let mut scene = FailingScene::new(inner);
    scene.joint_budget = 9;

    assert!(solid_axle_rear().initialize(&mut scene, chassis, Vec3::ZERO).is_err());

    assert_eq!(scene.inner.body_count(), 1);
    assert_eq!(scene.inner.joint_count(), 0);
    assert_eq!(scene.inner.spring_count(), 0);
    assert_eq!(scene.inner.shaft_count(), 0);
    assert_eq!(scene.inner.relation_count(), 0);
}

#[test]
fn construction_validates_physical_parameters() {
    let SuspensionKind::SolidAxle(params) = solid_axle_front().kind else {
        panic!("expected a solid axle");
    };

    let mut bad = params.clone();
    bad.knuckle.mass = 0.0;
    let err = SuspensionTemplate::new("front", true, false, SuspensionKind::SolidAxle(bad)).unwrap_err();
    assert!(matches!(err, VehicleError::InvalidParameter { .. }));

    let mut bad = params.clone();
    bad.spring.damping = -1.0;
    assert!(SuspensionTemplate::new("front", true, false, SuspensionKind::SolidAxle(bad)).is_err());

    let mut bad = params.clone();
    let tierod_c = bad.hardpoints.get(SolidAxlePoint::TierodC);
    let table = bad.hardpoints.clone();
    bad.hardpoints = HardpointTable::from_fn(|p| match p {
        SolidAxlePoint::TierodK => tierod_c,
        other => table.get(other),
    });
    assert!(SuspensionTemplate::new("front", true, false, SuspensionKind::SolidAxle(bad)).is_err());

    assert!(SuspensionTemplate::new("front", true, false, SuspensionKind::SolidAxle(params)).is_ok());

    let SuspensionKind::DoubleWishboneReduced(params) = double_wishbone_front().kind else {
        panic!("expected a double wishbone");
    };
    let collapse = |from: DoubleWishbonePoint, onto: DoubleWishbonePoint| {
        let mut bad = params.clone();
        let table = params.hardpoints.clone();
        bad.hardpoints = HardpointTable::from_fn(|p| if p == from { table.get(onto) } else { table.get(p) });
        SuspensionTemplate::new("front", true, false, SuspensionKind::DoubleWishboneReduced(bad))
    };
    for (from, onto) in [
        (DoubleWishbonePoint::ShockU, DoubleWishbonePoint::ShockC),
        (DoubleWishbonePoint::TierodU, DoubleWishbonePoint::TierodC),
        (DoubleWishbonePoint::UcaU, DoubleWishbonePoint::UcaF),
        (DoubleWishbonePoint::LcaB, DoubleWishbonePoint::LcaF),
    ] {
        let err = collapse(from, onto).unwrap_err();
        assert!(matches!(err, VehicleError::InvalidParameter { .. }), "{from:?} onto {onto:?}");
    }
    assert!(SuspensionTemplate::new("front", true, false, SuspensionKind::DoubleWishboneReduced(params)).is_ok());
}

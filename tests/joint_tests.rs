use approx::assert_relative_eq;
use vehicle_templates::{
    core::{
        constraints::Joint,
        rigidbody::RigidBody,
    },
    world::SceneWorld,
    BodyId, JointKind, MassProperties, MechanicalScene, Quat, Transform, Vec3, VehicleError,
};

fn make_world() -> (SceneWorld, BodyId, BodyId) {
    let mut world = SceneWorld::default();

    let base_id = world.add_body(RigidBody::new("base", Transform::default(), MassProperties::default()));

    let arm = RigidBody::new(
        "arm",
        Transform::from_position(Vec3::new(0.5, 0.0, 0.0)),
        MassProperties::new(2.0, Vec3::splat(0.1)).unwrap(),
    );
    let arm_id = world.add_body(arm);
    (world, base_id, arm_id)
}

fn pose(world: &SceneWorld, id: BodyId) -> Transform {
    world.body(id).unwrap().transform
}

#[test]
fn revolute_allows_rotation_about_its_axis_only() {
    let (mut world, base, arm) = make_world();
    let joint = Joint::revolute(
        "hinge",
        (base, &pose(&world, base)),
        (arm, &pose(&world, arm)),
        Vec3::ZERO,
        Vec3::Z,
    )
    .unwrap();
    let id = world.add_joint(joint).unwrap();
    assert_eq!(world.joint_violation(id).unwrap().len(), 5);

    // swing the arm about the hinge
    let swing = Quat::from_rotation_z(0.7);
    world.body_mut(arm).unwrap().transform = Transform::new(swing * Vec3::new(0.5, 0.0, 0.0), swing);
    for r in world.joint_violation(id).unwrap() {
        assert_relative_eq!(r, 0.0, epsilon = 1e-6);
    }

    // tilt it off the axis
    world.body_mut(arm).unwrap().transform.rotation = Quat::from_rotation_x(0.1) * swing;
    let residual = world.joint_violation(id).unwrap();
    let angular = residual[3].hypot(residual[4]);
    assert_relative_eq!(angular, 0.1f32.sin(), epsilon = 1e-4);
}

#[test]
fn spherical_and_universal_residuals() {
    let (mut world, base, arm) = make_world();
    let (pb, pa) = (pose(&world, base), pose(&world, arm));
    let ball = world
        .add_joint(Joint::spherical("ball", (base, &pb), (arm, &pa), Vec3::new(0.25, 0.0, 0.0)))
        .unwrap();
    let cross = world
        .add_joint(
            Joint::universal("cross", (base, &pb), (arm, &pa), Vec3::new(0.25, 0.0, 0.0), Vec3::Y, Vec3::Z).unwrap(),
        )
        .unwrap();

    world.body_mut(arm).unwrap().transform.position += Vec3::new(0.0, 0.0, 0.02);
    let ball_residual = world.joint_violation(ball).unwrap();
    assert_eq!(ball_residual.len(), 3);
    assert_relative_eq!(ball_residual[2], 0.02, epsilon = 1e-6);

    let cross_residual = world.joint_violation(cross).unwrap();
    assert_eq!(cross_residual.len(), 4);
    assert_relative_eq!(cross_residual[3], 0.0, epsilon = 1e-6);
}

#[test]
fn universal_axes_must_be_perpendicular() {
    let (world, base, arm) = make_world();
    let result = Joint::universal(
        "cross",
        (base, &pose(&world, base)),
        (arm, &pose(&world, arm)),
        Vec3::ZERO,
        Vec3::X,
        Vec3::new(1.0, 1.0, 0.0),
    );
    assert!(matches!(result, Err(VehicleError::InvalidParameter { .. })));
}

#[test]
fn distance_joint_tracks_moved_anchor() {
    let (mut world, base, arm) = make_world();
    let joint = Joint::distance(
        "rod",
        (arm, &pose(&world, arm)),
        (base, &pose(&world, base)),
        Vec3::new(0.5, 0.0, 0.0),
        Vec3::new(0.5, 0.3, 0.0),
    )
    .unwrap();
    let id = world.add_joint(joint).unwrap();
    assert_eq!(world.joint(id).unwrap().kind(), JointKind::Distance);
    assert_relative_eq!(world.joint_violation(id).unwrap()[0], 0.0, epsilon = 1e-6);

    let anchor = world.joint(id).unwrap().local_anchor_b();
    world
        .joint_mut(id)
        .unwrap()
        .set_local_anchor_b(anchor + Vec3::new(0.0, 0.1, 0.0));
    assert_relative_eq!(world.joint_violation(id).unwrap()[0], 0.1, epsilon = 1e-6);
}

#[test]
fn distance_joint_rejects_coincident_points() {
    let (world, base, arm) = make_world();
    let result = Joint::distance(
        "rod",
        (arm, &pose(&world, arm)),
        (base, &pose(&world, base)),
        Vec3::ONE,
        Vec3::ONE,
    );
    assert!(result.is_err());
}

#[test]
fn only_revolute_joints_carry_brake_torque() {
    let (mut world, base, arm) = make_world();
    let (pb, pa) = (pose(&world, base), pose(&world, arm));
    let hinge = world
        .add_joint(Joint::revolute("hinge", (base, &pb), (arm, &pa), Vec3::ZERO, Vec3::Y).unwrap())
        .unwrap();
    let ball = world
        .add_joint(Joint::spherical("ball", (base, &pb), (arm, &pa), Vec3::ZERO))
        .unwrap();

    world.joint_mut(hinge).unwrap().set_brake_torque(120.0).unwrap();
    assert_eq!(world.joint(hinge).unwrap().brake_torque(), Some(120.0));
    assert_eq!(world.joint(ball).unwrap().brake_torque(), None);
    assert!(matches!(
        world.joint_mut(ball).unwrap().set_brake_torque(1.0),
        Err(VehicleError::JointKindMismatch { .. })
    ));
}

#[test]
fn stale_handles_are_rejected() {
    let (mut world, base, arm) = make_world();
    let (pb, pa) = (pose(&world, base), pose(&world, arm));
    let id = world
        .add_joint(Joint::spherical("ball", (base, &pb), (arm, &pa), Vec3::ZERO))
        .unwrap();
    world.remove_joint(id);
    assert!(!world.contains_joint(id));
    assert!(matches!(world.joint_violation(id), Err(VehicleError::UnknownHandle { .. })));

    // a new joint may reuse the slot but not the handle
    let fresh = world
        .add_joint(Joint::spherical("ball", (base, &pb), (arm, &pa), Vec3::ZERO))
        .unwrap();
    assert_ne!(fresh, id);
    assert!(world.joint(id).is_none());
}

#[test]
fn joint_reaction_must_be_finite() {
    let (mut world, base, arm) = make_world();
    let joint = Joint::spherical("ball", (base, &pose(&world, base)), (arm, &pose(&world, arm)), Vec3::ZERO);
    let id = world.add_joint(joint).unwrap();
    let reaction = world.joint_reaction(id).unwrap();
    assert_eq!(reaction.force, Vec3::ZERO);
    assert_eq!(reaction.torque, Vec3::ZERO);

    world.joint_mut(id).unwrap().reaction.force = Vec3::new(f32::NAN, 0.0, 0.0);
    assert!(matches!(world.joint_reaction(id), Err(VehicleError::NonFiniteState { .. })));
}

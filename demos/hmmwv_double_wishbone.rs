use vehicle_templates::{models::hmmwv, *};

const DT: f32 = 1.0e-3;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let params = hmmwv::hmmwv_double_wishbone()?;
    let mut world = SceneWorld::new(DT)?;
    let mut vehicle = Vehicle::initialize(&params, &mut world, Transform::from_position(Vec3::new(0.0, 0.0, 0.8)))?;

    let topology = vehicle.topology(&world)?;
    println!(
        "{}: {} bodies, {} joints, mobility {}",
        vehicle.name(),
        topology.bodies,
        topology.joint_count(),
        topology.mobility()
    );

    let tires = [TireForce::default(); 4];
    // accelerate for two seconds, then brake to a stop
    for step in 0..4000 {
        let time = world.time();
        let inputs = if step < 2000 {
            DriverInputs::new(0.8, 0.0, 0.0)
        } else {
            DriverInputs::new(0.0, 0.0, 1.0)
        };
        vehicle.update(&mut world, time, inputs, &tires)?;
        world.advance()?;

        if step % 500 == 499 {
            println!(
                "t = {:4.2} s  motor {:8.2} rad/s  RL {:8.3} rad/s  FL {:8.3} rad/s",
                world.time(),
                vehicle.powertrain().motor_speed(),
                vehicle.wheel_omega(&world, WheelId::RearLeft)?,
                vehicle.wheel_omega(&world, WheelId::FrontLeft)?,
            );
        }
    }

    for id in WheelId::ALL {
        println!(
            "{} shock: length {:.4} m, force {:.1} N",
            id.label(),
            vehicle.spring_length(&world, id)?,
            vehicle.spring_force(&world, id)?
        );
    }
    Ok(())
}

use vehicle_templates::{
    models::hmmwv,
    vehicle::{DebugSections, LengthUnit},
    *,
};

const DT: f32 = 1.0e-3;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let params = hmmwv::hmmwv_solid_axle()?;
    let pose = Transform::from_position(Vec3::new(0.0, 0.0, 1.0));
    let mut sim = VehicleSimulation::new(&params, pose, DT)?;
    let mut driver = ScriptedDriver::ramp_and_sweep();

    // static share of the chassis weight on each tire
    let load = params.chassis.mass * 9.81 / 4.0;
    let tires = [TireForce::new(Vec3::new(0.0, 0.0, load), Vec3::ZERO); 4];

    let steps = (10.0 / DT) as usize;
    for step in 0..steps {
        sim.step_with(&mut driver, &tires)?;
        if step % 1000 == 999 {
            let vehicle = sim.vehicle();
            let world = sim.world();
            println!(
                "t = {:5.2} s  driveshaft {:8.3} rad/s  rear wheels {:8.3} / {:8.3} rad/s  torque {:9.2} N m",
                sim.time(),
                vehicle.driveshaft_speed(world)?,
                vehicle.wheel_omega(world, WheelId::RearLeft)?,
                vehicle.wheel_omega(world, WheelId::RearRight)?,
                vehicle.wheel_torque(world, WheelId::RearLeft)?,
            );
        }
    }

    let mut report = String::new();
    sim.vehicle().debug_log(sim.world(), &mut report, DebugSections::ALL)?;
    sim.vehicle()
        .log_hardpoint_locations(sim.world(), Axle::Front, &mut report, LengthUnit::Inches)?;
    print!("{report}");

    let (mut world, vehicle) = sim.into_parts();
    vehicle.release(&mut world);
    println!("released, scene empty: {}", world.is_empty());
    Ok(())
}

//! Plain-text reports written to a caller-supplied sink.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use super::suspension::{HardpointLocation, JointViolation};
use crate::config::METERS_TO_INCHES;
use crate::core::types::WheelId;
use crate::error::VehicleResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LengthUnit {
    #[default]
    Meters,
    Inches,
}

impl LengthUnit {
    fn scale(self) -> f32 {
        match self {
            LengthUnit::Meters => 1.0,
            LengthUnit::Inches => METERS_TO_INCHES,
        }
    }

    fn label(self) -> &'static str {
        match self {
            LengthUnit::Meters => "m",
            LengthUnit::Inches => "in",
        }
    }
}

/// Spring state of one wheel corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShockRecord {
    pub wheel: WheelId,
    pub length: f32,
    pub force: f32,
}

/// Which sections [`super::Vehicle::debug_log`] writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugSections {
    pub shocks: bool,
    pub constraints: bool,
}

impl DebugSections {
    pub const ALL: DebugSections = DebugSections {
        shocks: true,
        constraints: true,
    };
}

pub fn write_hardpoints(
    out: &mut dyn Write,
    title: &str,
    locations: &[HardpointLocation],
    unit: LengthUnit,
) -> VehicleResult<()> {
    writeln!(out, "---- {title} hardpoints [{}]", unit.label())?;
    let scale = unit.scale();
    for loc in locations {
        let p = loc.offset * scale;
        writeln!(
            out,
            "{:>12}{:<3} {:>10.4} {:>10.4} {:>10.4}",
            loc.name,
            loc.side.suffix(),
            p.x,
            p.y,
            p.z
        )?;
    }
    Ok(())
}

pub fn write_constraint_violations(
    out: &mut dyn Write,
    title: &str,
    violations: &[JointViolation],
) -> VehicleResult<()> {
    writeln!(out, "---- {title} constraint violations")?;
    for v in violations {
        write!(out, "{:<32} {:<10}", v.name, v.kind.name())?;
        for r in &v.residual {
            write!(out, " {r:>11.3e}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn write_shocks(out: &mut dyn Write, records: &[ShockRecord]) -> VehicleResult<()> {
    writeln!(out, "---- shocks (length [m], force [N])")?;
    for r in records {
        writeln!(out, "{:<3} {:>10.5} {:>12.3}", r.wheel.label(), r.length, r.force)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{constraints::JointKind, types::Side};
    use glam::Vec3;

    #[test]
    fn hardpoints_are_scaled_to_inches() {
        let mut out = String::new();
        let locations = [HardpointLocation {
            side: Side::Right,
            name: "SPINDLE",
            offset: Vec3::new(0.0254, 0.0, 0.0),
        }];
        write_hardpoints(&mut out, "front", &locations, LengthUnit::Inches).unwrap();
        assert!(out.contains("[in]"));
        assert!(out.contains("SPINDLE_R"));
        assert!(out.contains("1.0000"));
    }

    #[test]
    fn violations_list_every_residual() {
        let mut out = String::new();
        let violations = [JointViolation {
            name: "front_distTierod_L".into(),
            kind: JointKind::Distance,
            residual: vec![0.5],
        }];
        write_constraint_violations(&mut out, "front left", &violations).unwrap();
        assert!(out.contains("front_distTierod_L"));
        assert!(out.contains("distance"));
        assert!(out.contains("5.000e-1"));
    }
}

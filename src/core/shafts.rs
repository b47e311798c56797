//! One-dimensional rotational elements and the relations that couple them.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_positive, VehicleError, VehicleResult};
use crate::utils::allocator::{BodyId, ShaftId};

/// Rotational element with a single degree of freedom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shaft {
    pub name: String,
    inertia: f32,
    /// rad/s
    pub speed: f32,
    /// rad
    pub angle: f32,
    /// Torque accumulated for the next step, N·m.
    pub applied_torque: f32,
}

impl Shaft {
    pub fn new(name: impl Into<String>, inertia: f32) -> VehicleResult<Self> {
        let name = name.into();
        ensure_positive(&format!("{name}.inertia"), inertia)?;
        Ok(Self {
            name,
            inertia,
            speed: 0.0,
            angle: 0.0,
            applied_torque: 0.0,
        })
    }

    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    pub fn apply_torque(&mut self, torque: f32) {
        self.applied_torque += torque;
    }
}

/// One participant of a shaft relation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RelationMember {
    Shaft(ShaftId),
    /// Spin of a body about a direction fixed in the body frame.
    BodySpin { body: BodyId, local_dir: Vec3 },
}

/// Kinematic relation between shafts (and body spins), linear in the speeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShaftRelation {
    /// `speed(output) = ratio * speed(input)`.
    Gear {
        input: ShaftId,
        output: ShaftId,
        ratio: f32,
    },
    /// Gear whose input and output axes are not parallel; the support torque is
    /// carried by the `truss` body.
    GearboxAngled {
        input: ShaftId,
        output: ShaftId,
        truss: BodyId,
        input_dir: Vec3,
        output_dir: Vec3,
        ratio: f32,
    },
    /// Willis relation `(w1 - wc) / (w2 - wc) = ordinary_ratio`.
    Planetary {
        carrier: ShaftId,
        output1: ShaftId,
        output2: ShaftId,
        ordinary_ratio: f32,
    },
    /// Rigid 1:1 coupling between a shaft and a body spin.
    BodyCoupling {
        shaft: ShaftId,
        body: BodyId,
        local_dir: Vec3,
    },
}

impl ShaftRelation {
    pub fn gear(input: ShaftId, output: ShaftId, ratio: f32) -> VehicleResult<Self> {
        Ok(Self::Gear {
            input,
            output,
            ratio: check_ratio("gear.ratio", ratio)?,
        })
    }

    pub fn gearbox_angled(
        input: ShaftId,
        output: ShaftId,
        truss: BodyId,
        input_dir: Vec3,
        output_dir: Vec3,
        ratio: f32,
    ) -> VehicleResult<Self> {
        Ok(Self::GearboxAngled {
            input,
            output,
            truss,
            input_dir: check_dir("gearbox.input_dir", input_dir)?,
            output_dir: check_dir("gearbox.output_dir", output_dir)?,
            ratio: check_ratio("gearbox.ratio", ratio)?,
        })
    }

    pub fn planetary(
        carrier: ShaftId,
        output1: ShaftId,
        output2: ShaftId,
        ordinary_ratio: f32,
    ) -> VehicleResult<Self> {
        // t0 = 1 removes the carrier from the relation
        if !ordinary_ratio.is_finite() || (ordinary_ratio - 1.0).abs() < f32::EPSILON {
            return Err(VehicleError::invalid_parameter(
                "planetary.ordinary_ratio",
                ordinary_ratio,
                "must be finite and different from 1",
            ));
        }
        Ok(Self::Planetary {
            carrier,
            output1,
            output2,
            ordinary_ratio,
        })
    }

    pub fn body_coupling(shaft: ShaftId, body: BodyId, local_dir: Vec3) -> VehicleResult<Self> {
        Ok(Self::BodyCoupling {
            shaft,
            body,
            local_dir: check_dir("coupling.local_dir", local_dir)?,
        })
    }

    /// Members and their coefficients in the velocity constraint `Σ cᵢ wᵢ = 0`.
    pub fn jacobian(&self) -> Vec<(RelationMember, f32)> {
        match *self {
            Self::Gear {
                input,
                output,
                ratio,
            }
            | Self::GearboxAngled {
                input,
                output,
                ratio,
                ..
            } => vec![
                (RelationMember::Shaft(input), -ratio),
                (RelationMember::Shaft(output), 1.0),
            ],
            Self::Planetary {
                carrier,
                output1,
                output2,
                ordinary_ratio,
            } => vec![
                (RelationMember::Shaft(carrier), -(1.0 - ordinary_ratio)),
                (RelationMember::Shaft(output1), 1.0),
                (RelationMember::Shaft(output2), -ordinary_ratio),
            ],
            Self::BodyCoupling {
                shaft,
                body,
                local_dir,
            } => vec![
                (RelationMember::Shaft(shaft), 1.0),
                (RelationMember::BodySpin { body, local_dir }, -1.0),
            ],
        }
    }

    pub fn shafts(&self) -> Vec<ShaftId> {
        self.jacobian()
            .into_iter()
            .filter_map(|(member, _)| match member {
                RelationMember::Shaft(id) => Some(id),
                RelationMember::BodySpin { .. } => None,
            })
            .collect()
    }

    pub fn bodies(&self) -> Vec<BodyId> {
        let mut bodies: Vec<BodyId> = self
            .jacobian()
            .into_iter()
            .filter_map(|(member, _)| match member {
                RelationMember::BodySpin { body, .. } => Some(body),
                RelationMember::Shaft(_) => None,
            })
            .collect();
        if let Self::GearboxAngled { truss, .. } = self {
            bodies.push(*truss);
        }
        bodies
    }
}

/// Reaction torques of a relation after a step.
///
/// `member_torques[i]` is the torque member `i` (in [`ShaftRelation::jacobian`]
/// order) exerts on the relation; the relation exerts the opposite on the member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationReaction {
    pub member_torques: Vec<f32>,
    /// Support torque on the truss body of an angled gearbox, world frame.
    pub truss_torque: Vec3,
}

impl RelationReaction {
    /// Torque the given shaft exerts on the relation, if it is a member.
    pub fn torque_from_shaft(&self, relation: &ShaftRelation, shaft: ShaftId) -> Option<f32> {
        relation
            .jacobian()
            .iter()
            .zip(&self.member_torques)
            .find_map(|((member, _), torque)| match member {
                RelationMember::Shaft(id) if *id == shaft => Some(*torque),
                _ => None,
            })
    }
}

fn check_ratio(name: &str, ratio: f32) -> VehicleResult<f32> {
    if !ratio.is_finite() || ratio == 0.0 {
        return Err(VehicleError::invalid_parameter(name, ratio, "must be finite and non-zero"));
    }
    Ok(ratio)
}

fn check_dir(name: &str, dir: Vec3) -> VehicleResult<Vec3> {
    dir.try_normalize().ok_or_else(|| {
        VehicleError::invalid_parameter(name, dir.length(), "direction must be non-zero")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::allocator::EntityId;

    fn shaft(i: usize) -> ShaftId {
        ShaftId::from(EntityId::new(i, 0))
    }

    #[test]
    fn open_differential_row_averages_outputs() {
        let relation = ShaftRelation::planetary(shaft(0), shaft(1), shaft(2), -1.0).unwrap();
        let coefficients: Vec<f32> = relation.jacobian().iter().map(|(_, c)| *c).collect();
        assert_eq!(coefficients, vec![-2.0, 1.0, 1.0]);
    }

    #[test]
    fn rejects_degenerate_relations() {
        assert!(ShaftRelation::gear(shaft(0), shaft(1), 0.0).is_err());
        assert!(ShaftRelation::planetary(shaft(0), shaft(1), shaft(2), 1.0).is_err());
        assert!(Shaft::new("driveshaft", 0.0).is_err());
    }
}

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::types::Transform;
use crate::error::{VehicleError, VehicleResult};
use crate::utils::allocator::BodyId;
use crate::utils::math::orthonormal_pair;

/// Kinematic joint kinds used by the suspension templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JointKind {
    Revolute,
    Spherical,
    Universal,
    Distance,
}

impl JointKind {
    pub const ALL: [JointKind; 4] = [
        JointKind::Revolute,
        JointKind::Spherical,
        JointKind::Universal,
        JointKind::Distance,
    ];

    /// Relative degrees of freedom removed between the two bodies.
    pub fn constrained_dofs(self) -> usize {
        match self {
            JointKind::Revolute => 5,
            JointKind::Spherical => 3,
            JointKind::Universal => 4,
            JointKind::Distance => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            JointKind::Revolute => "revolute",
            JointKind::Spherical => "spherical",
            JointKind::Universal => "universal",
            JointKind::Distance => "distance",
        }
    }
}

/// Joint geometry, stored in the local frames of the two bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constraint {
    Revolute {
        local_anchor_a: Vec3,
        local_anchor_b: Vec3,
        local_axis_a: Vec3,
        local_axis_b: Vec3,
        /// Friction torque magnitude requested by a brake, N·m.
        brake_torque: f32,
    },
    Spherical {
        local_anchor_a: Vec3,
        local_anchor_b: Vec3,
    },
    /// Cross joint: `local_axis_a` is fixed in body A, `local_axis_b` in body B,
    /// and the two stay perpendicular.
    Universal {
        local_anchor_a: Vec3,
        local_anchor_b: Vec3,
        local_axis_a: Vec3,
        local_axis_b: Vec3,
    },
    Distance {
        local_anchor_a: Vec3,
        local_anchor_b: Vec3,
        distance: f32,
    },
}

/// Reaction load acting on body B, in body B's frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JointReaction {
    pub force: Vec3,
    pub torque: Vec3,
}

/// Joint between two scene bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    pub name: String,
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub constraint: Constraint,
    pub reaction: JointReaction,
}

impl Joint {
    fn new(name: impl Into<String>, body_a: BodyId, body_b: BodyId, constraint: Constraint) -> Self {
        Self {
            name: name.into(),
            body_a,
            body_b,
            constraint,
            reaction: JointReaction::default(),
        }
    }

    /// Revolute joint at a world anchor about a world axis.
    pub fn revolute(
        name: impl Into<String>,
        (body_a, pose_a): (BodyId, &Transform),
        (body_b, pose_b): (BodyId, &Transform),
        anchor: Vec3,
        axis: Vec3,
    ) -> VehicleResult<Self> {
        let name = name.into();
        let axis = unit_axis(&name, axis)?;
        Ok(Self::new(
            name,
            body_a,
            body_b,
            Constraint::Revolute {
                local_anchor_a: pose_a.inverse_transform_point(anchor),
                local_anchor_b: pose_b.inverse_transform_point(anchor),
                local_axis_a: pose_a.inverse_transform_vector(axis),
                local_axis_b: pose_b.inverse_transform_vector(axis),
                brake_torque: 0.0,
            },
        ))
    }

    pub fn spherical(
        name: impl Into<String>,
        (body_a, pose_a): (BodyId, &Transform),
        (body_b, pose_b): (BodyId, &Transform),
        anchor: Vec3,
    ) -> Self {
        Self::new(
            name,
            body_a,
            body_b,
            Constraint::Spherical {
                local_anchor_a: pose_a.inverse_transform_point(anchor),
                local_anchor_b: pose_b.inverse_transform_point(anchor),
            },
        )
    }

    /// Universal joint; `axis_a` and `axis_b` must be perpendicular world directions.
    pub fn universal(
        name: impl Into<String>,
        (body_a, pose_a): (BodyId, &Transform),
        (body_b, pose_b): (BodyId, &Transform),
        anchor: Vec3,
        axis_a: Vec3,
        axis_b: Vec3,
    ) -> VehicleResult<Self> {
        let name = name.into();
        let axis_a = unit_axis(&name, axis_a)?;
        let axis_b = unit_axis(&name, axis_b)?;
        if axis_a.dot(axis_b).abs() > 1.0e-4 {
            return Err(VehicleError::invalid_parameter(
                format!("{name}.cross_axes"),
                axis_a.dot(axis_b),
                "universal joint axes must be perpendicular",
            ));
        }
        Ok(Self::new(
            name,
            body_a,
            body_b,
            Constraint::Universal {
                local_anchor_a: pose_a.inverse_transform_point(anchor),
                local_anchor_b: pose_b.inverse_transform_point(anchor),
                local_axis_a: pose_a.inverse_transform_vector(axis_a),
                local_axis_b: pose_b.inverse_transform_vector(axis_b),
            },
        ))
    }

    /// Distance joint holding `point_a` and `point_b` at their current separation.
    pub fn distance(
        name: impl Into<String>,
        (body_a, pose_a): (BodyId, &Transform),
        (body_b, pose_b): (BodyId, &Transform),
        point_a: Vec3,
        point_b: Vec3,
    ) -> VehicleResult<Self> {
        let name = name.into();
        let distance = point_a.distance(point_b);
        if !distance.is_finite() || distance <= f32::EPSILON {
            return Err(VehicleError::invalid_parameter(
                format!("{name}.distance"),
                distance,
                "distance joint endpoints must be distinct",
            ));
        }
        Ok(Self::new(
            name,
            body_a,
            body_b,
            Constraint::Distance {
                local_anchor_a: pose_a.inverse_transform_point(point_a),
                local_anchor_b: pose_b.inverse_transform_point(point_b),
                distance,
            },
        ))
    }

    pub fn kind(&self) -> JointKind {
        match self.constraint {
            Constraint::Revolute { .. } => JointKind::Revolute,
            Constraint::Spherical { .. } => JointKind::Spherical,
            Constraint::Universal { .. } => JointKind::Universal,
            Constraint::Distance { .. } => JointKind::Distance,
        }
    }

    pub fn constrained_dofs(&self) -> usize {
        self.kind().constrained_dofs()
    }

    /// Anchor on body B, in body B's frame.
    pub fn local_anchor_b(&self) -> Vec3 {
        match self.constraint {
            Constraint::Revolute { local_anchor_b, .. }
            | Constraint::Spherical { local_anchor_b, .. }
            | Constraint::Universal { local_anchor_b, .. }
            | Constraint::Distance { local_anchor_b, .. } => local_anchor_b,
        }
    }

    /// Moves the anchor on body B; used to actuate the chassis end of a tie rod.
    pub fn set_local_anchor_b(&mut self, anchor: Vec3) {
        match &mut self.constraint {
            Constraint::Revolute { local_anchor_b, .. }
            | Constraint::Spherical { local_anchor_b, .. }
            | Constraint::Universal { local_anchor_b, .. }
            | Constraint::Distance { local_anchor_b, .. } => *local_anchor_b = anchor,
        }
    }

    pub fn brake_torque(&self) -> Option<f32> {
        match self.constraint {
            Constraint::Revolute { brake_torque, .. } => Some(brake_torque),
            _ => None,
        }
    }

    /// Sets the brake friction torque; only revolute joints carry one.
    pub fn set_brake_torque(&mut self, torque: f32) -> VehicleResult<()> {
        match &mut self.constraint {
            Constraint::Revolute { brake_torque, .. } => {
                *brake_torque = torque;
                Ok(())
            }
            _ => Err(VehicleError::JointKindMismatch {
                name: self.name.clone(),
                expected: JointKind::Revolute.name(),
            }),
        }
    }

    /// Constraint residuals for the given body poses; one entry per constrained DOF.
    pub fn violation(&self, pose_a: &Transform, pose_b: &Transform) -> Vec<f32> {
        match self.constraint {
            Constraint::Revolute {
                local_anchor_a,
                local_anchor_b,
                local_axis_a,
                local_axis_b,
                ..
            } => {
                let gap = pose_b.transform_point(local_anchor_b) - pose_a.transform_point(local_anchor_a);
                let axis_a = pose_a.transform_vector(local_axis_a);
                let axis_b = pose_b.transform_vector(local_axis_b);
                let (u, v) = orthonormal_pair(axis_a);
                vec![gap.x, gap.y, gap.z, axis_b.dot(u), axis_b.dot(v)]
            }
            Constraint::Spherical {
                local_anchor_a,
                local_anchor_b,
            } => {
                let gap = pose_b.transform_point(local_anchor_b) - pose_a.transform_point(local_anchor_a);
                vec![gap.x, gap.y, gap.z]
            }
            Constraint::Universal {
                local_anchor_a,
                local_anchor_b,
                local_axis_a,
                local_axis_b,
            } => {
                let gap = pose_b.transform_point(local_anchor_b) - pose_a.transform_point(local_anchor_a);
                let cross = pose_a
                    .transform_vector(local_axis_a)
                    .dot(pose_b.transform_vector(local_axis_b));
                vec![gap.x, gap.y, gap.z, cross]
            }
            Constraint::Distance {
                local_anchor_a,
                local_anchor_b,
                distance,
            } => {
                let a = pose_a.transform_point(local_anchor_a);
                let b = pose_b.transform_point(local_anchor_b);
                vec![a.distance(b) - distance]
            }
        }
    }
}

fn unit_axis(name: &str, axis: Vec3) -> VehicleResult<Vec3> {
    axis.try_normalize().ok_or_else(|| {
        VehicleError::invalid_parameter(
            format!("{name}.axis"),
            axis.length(),
            "joint axis must be a finite non-zero vector",
        )
    })
}

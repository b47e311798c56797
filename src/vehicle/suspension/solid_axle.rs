//! Solid-axle suspension: one axle tube, a knuckle and two links per side.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{cylinder, spindle_shape, Assembly, BodyParams, SuspensionSide};
use crate::core::types::Side;
use crate::dynamics::forces::SpringCoefficients;
use crate::error::{ensure_positive, VehicleError, VehicleResult};
use crate::utils::allocator::BodyId;
use crate::utils::math::{direction, midpoint, universal_axes};
use crate::vehicle::hardpoints::{hardpoint_enum, Hardpoint, HardpointTable};

hardpoint_enum! {
    /// Solid-axle hardpoints (right side).
    pub enum SolidAxlePoint {
        /// Outer end of the axle tube.
        AxleOuter => "AXLE_OUTER",
        ShockA => "SHOCK_A",
        ShockC => "SHOCK_C",
        KnuckleL => "KNUCKLE_L",
        KnuckleU => "KNUCKLE_U",
        LowerLinkA => "LL_A",
        LowerLinkC => "LL_C",
        UpperLinkA => "UL_A",
        UpperLinkC => "UL_C",
        TierodC => "TIEROD_C",
        TierodK => "TIEROD_K",
        Spindle => "SPINDLE",
    }
}

use SolidAxlePoint as P;

/// Parameters of a solid-axle suspension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolidAxleParams {
    pub hardpoints: HardpointTable<SolidAxlePoint>,
    pub axle_tube: BodyParams,
    pub spindle: BodyParams,
    pub upper_link: BodyParams,
    pub lower_link: BodyParams,
    pub knuckle: BodyParams,
    pub spindle_width: f32,
    /// Inertia of each axle shaft when the suspension is driven.
    pub axle_inertia: f32,
    pub spring: SpringCoefficients,
}

impl SolidAxleParams {
    pub fn validate(&self) -> VehicleResult<()> {
        self.hardpoints.validate()?;
        self.axle_tube.validate("axle_tube")?;
        self.spindle.validate("spindle")?;
        self.upper_link.validate("upper_link")?;
        self.lower_link.validate("lower_link")?;
        self.knuckle.validate("knuckle")?;
        ensure_positive("spindle_width", self.spindle_width)?;
        ensure_positive("axle_inertia", self.axle_inertia)?;
        self.spring.validate()?;

        let pairs = [
            (P::KnuckleL, P::KnuckleU),
            (P::LowerLinkA, P::LowerLinkC),
            (P::UpperLinkA, P::UpperLinkC),
            (P::ShockA, P::ShockC),
            (P::TierodC, P::TierodK),
        ];
        for (a, b) in pairs {
            if direction(self.hardpoints.get(a), self.hardpoints.get(b)).is_none() {
                return Err(VehicleError::invalid_parameter(
                    format!("hardpoint.{:?}-{:?}", a, b),
                    0.0,
                    "points must be distinct",
                ));
            }
        }
        Ok(())
    }
}

pub(super) fn build(
    asm: &mut Assembly<'_>,
    params: &SolidAxleParams,
    driven: bool,
) -> VehicleResult<[SuspensionSide; 2]> {
    let points = Side::ALL.map(|side| {
        params
            .hardpoints
            .for_side(side)
            .map(|local| asm.global(local))
    });
    let [left, right] = &points;

    let outer_l = left.get(P::AxleOuter);
    let outer_r = right.get(P::AxleOuter);
    let link_radius = params.lower_link.radius;
    let tube_radius = params.axle_tube.radius;
    let axle_tube = asm.add_body(
        asm.name("axleTube", None),
        midpoint(outer_l, outer_r),
        &params.axle_tube,
        |pose| {
            let mut shapes = vec![cylinder(pose, outer_l, outer_r, tube_radius)];
            for pts in [left, right] {
                shapes.push(cylinder(pose, pts.get(P::AxleOuter), pts.get(P::LowerLinkA), link_radius));
                shapes.push(cylinder(pose, pts.get(P::AxleOuter), pts.get(P::UpperLinkA), link_radius));
            }
            shapes
        },
    )?;

    let left_side = build_side(asm, Side::Left, left, axle_tube, params, driven)?;
    let right_side = build_side(asm, Side::Right, right, axle_tube, params, driven)?;
    Ok([left_side, right_side])
}

fn build_side(
    asm: &mut Assembly<'_>,
    side: Side,
    pts: &HardpointTable<SolidAxlePoint>,
    axle_tube: BodyId,
    params: &SolidAxleParams,
    driven: bool,
) -> VehicleResult<SuspensionSide> {
    let chassis = asm.chassis;
    let knuckle_axis = pts.get(P::KnuckleU) - pts.get(P::KnuckleL);
    let knuckle_center = midpoint(pts.get(P::KnuckleU), pts.get(P::KnuckleL));

    let knuckle = asm.add_body(asm.name("knuckle", Some(side)), knuckle_center, &params.knuckle, |pose| {
        vec![
            cylinder(pose, pts.get(P::KnuckleU), pts.get(P::KnuckleL), params.knuckle.radius),
            cylinder(pose, knuckle_center, pts.get(P::TierodK), params.knuckle.radius),
            cylinder(pose, knuckle_center, pts.get(P::Spindle), params.knuckle.radius),
        ]
    })?;
    let upper_link = asm.add_body(
        asm.name("upperLink", Some(side)),
        midpoint(pts.get(P::UpperLinkA), pts.get(P::UpperLinkC)),
        &params.upper_link,
        |pose| vec![cylinder(pose, pts.get(P::UpperLinkA), pts.get(P::UpperLinkC), params.upper_link.radius)],
    )?;
    let lower_link = asm.add_body(
        asm.name("lowerLink", Some(side)),
        midpoint(pts.get(P::LowerLinkA), pts.get(P::LowerLinkC)),
        &params.lower_link,
        |pose| vec![cylinder(pose, pts.get(P::LowerLinkA), pts.get(P::LowerLinkC), params.lower_link.radius)],
    )?;
    let spindle = asm.add_body(asm.name("spindle", Some(side)), pts.get(P::Spindle), &params.spindle, |_| {
        vec![spindle_shape(params.spindle.radius, params.spindle_width)]
    })?;

    let lateral = asm.chassis_pose.transform_vector(Vec3::Y);
    let kingpin = asm.revolute(asm.name("revoluteKingpin", Some(side)), axle_tube, knuckle, knuckle_center, knuckle_axis)?;
    let spindle_revolute = asm.revolute(asm.name("revolute", Some(side)), knuckle, spindle, pts.get(P::Spindle), lateral)?;
    let upper_axle = asm.spherical(asm.name("sphericalUpperLink", Some(side)), axle_tube, upper_link, pts.get(P::UpperLinkA))?;
    let lower_axle = asm.spherical(asm.name("sphericalLowerLink", Some(side)), axle_tube, lower_link, pts.get(P::LowerLinkA))?;
    let upper_chassis = asm.universal(
        asm.name("universalUpperLink", Some(side)),
        chassis,
        upper_link,
        pts.get(P::UpperLinkC),
        universal_axes(pts.get(P::UpperLinkA) - pts.get(P::UpperLinkC)),
    )?;
    let lower_chassis = asm.universal(
        asm.name("universalLowerLink", Some(side)),
        chassis,
        lower_link,
        pts.get(P::LowerLinkC),
        universal_axes(pts.get(P::LowerLinkA) - pts.get(P::LowerLinkC)),
    )?;
    let tierod = asm.distance(asm.name("distTierod", Some(side)), knuckle, pts.get(P::TierodK), chassis, pts.get(P::TierodC))?;
    let spring = asm.spring(
        asm.name("shock", Some(side)),
        axle_tube,
        pts.get(P::ShockA),
        chassis,
        pts.get(P::ShockC),
        params.spring,
    )?;

    let (axle_shaft, axle_coupling) = if driven {
        let (shaft, coupling) = asm.axle_shaft(side, spindle, params.axle_inertia)?;
        (Some(shaft), Some(coupling))
    } else {
        (None, None)
    };

    let owners = [
        (P::AxleOuter, axle_tube),
        (P::ShockA, axle_tube),
        (P::ShockC, chassis),
        (P::KnuckleL, knuckle),
        (P::KnuckleU, knuckle),
        (P::LowerLinkA, lower_link),
        (P::LowerLinkC, lower_link),
        (P::UpperLinkA, upper_link),
        (P::UpperLinkC, upper_link),
        (P::TierodC, chassis),
        (P::TierodK, knuckle),
        (P::Spindle, spindle),
    ];
    let anchors = owners
        .iter()
        .map(|&(point, body)| asm.anchor(point.name(), body, pts.get(point)))
        .collect::<VehicleResult<Vec<_>>>()?;

    Ok(SuspensionSide {
        spindle,
        steered_body: knuckle,
        spindle_revolute,
        tierod,
        tierod_marker: asm.chassis_local(pts.get(P::TierodC)),
        spring,
        axle_shaft,
        axle_coupling,
        joints: vec![
            kingpin,
            spindle_revolute,
            upper_axle,
            lower_axle,
            upper_chassis,
            lower_chassis,
            tierod,
        ],
        anchors,
    })
}
